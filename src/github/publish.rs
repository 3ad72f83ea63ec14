//! Report publishing: repository files and issues.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::GitHubError;

const PER_PAGE: u32 = 100;
const MAX_PAGES: u32 = 50;

/// Where a published report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub html_url: Option<String>,
    /// Issue number when published as an issue.
    pub number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentSha {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutContentResponse {
    content: Option<ContentLink>,
}

#[derive(Debug, Deserialize)]
struct ContentLink {
    html_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    number: u64,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenIssue {
    number: u64,
    title: String,
    created_at: DateTime<Utc>,
    /// Present when the item is a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct OpenIssueParams {
    state: &'static str,
    per_page: u32,
    page: u32,
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct StateBody {
    state: &'static str,
}

fn is_not_found(e: &octocrab::Error) -> bool {
    e.to_string().contains("Not Found") || format!("{:?}", e).contains("Not Found")
}

/// Blob sha of the file at `path`, or `None` if it does not exist yet.
async fn existing_file_sha(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    path: &str,
) -> Result<Option<String>, GitHubError> {
    let route = format!("/repos/{}/{}/contents/{}", owner, repo, path);
    match octocrab.get::<ContentSha, _, _>(route, None::<&()>).await {
        Ok(content) => Ok(Some(content.sha)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(GitHubError::from_octocrab(e, owner, repo)),
    }
}

/// Create `path` with `content`, or replace it if it already exists.
pub async fn write_report_file(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    path: &str,
    content: &str,
    message: &str,
) -> Result<Published, GitHubError> {
    let sha = existing_file_sha(octocrab, owner, repo, path).await?;
    let updating = sha.is_some();

    let body = PutContentBody {
        message,
        content: STANDARD.encode(content.as_bytes()),
        sha,
    };
    let route = format!("/repos/{}/{}/contents/{}", owner, repo, path);
    let response: PutContentResponse = octocrab
        .put(route, Some(&body))
        .await
        .map_err(|e| GitHubError::from_octocrab(e, owner, repo))?;

    info!(
        "{} {} in {}/{}",
        if updating { "Updated" } else { "Created" },
        path,
        owner,
        repo
    );

    Ok(Published {
        html_url: response.content.and_then(|c| c.html_url),
        number: None,
    })
}

pub async fn create_issue(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    title: &str,
    body: &str,
) -> Result<Published, GitHubError> {
    let route = format!("/repos/{}/{}/issues", owner, repo);
    let issue: IssueResponse = octocrab
        .post(route, Some(&NewIssue { title, body }))
        .await
        .map_err(|e| GitHubError::from_octocrab(e, owner, repo))?;

    info!("Created issue #{} in {}/{}", issue.number, owner, repo);

    Ok(Published {
        html_url: issue.html_url,
        number: Some(issue.number),
    })
}

/// Comment on and close every open issue created before `cutoff`.
///
/// Pull requests are skipped. A failure on one issue is logged and the rest
/// are still processed; returns the number closed.
pub async fn close_old_issues(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    cutoff: DateTime<Utc>,
    age_days: i64,
) -> Result<usize, GitHubError> {
    let route = format!("/repos/{}/{}/issues", owner, repo);
    let mut stale = Vec::new();
    let mut page = 1u32;

    loop {
        let params = OpenIssueParams {
            state: "open",
            per_page: PER_PAGE,
            page,
        };
        let issues: Vec<OpenIssue> = octocrab
            .get(&route, Some(&params))
            .await
            .map_err(|e| GitHubError::from_octocrab(e, owner, repo))?;

        let count = issues.len();
        stale.extend(
            issues
                .into_iter()
                .filter(|i| i.pull_request.is_none() && i.created_at < cutoff),
        );

        page += 1;
        if count < PER_PAGE as usize || page > MAX_PAGES {
            break;
        }
    }

    info!(
        "Found {} open issues older than {} days in {}/{}",
        stale.len(),
        age_days,
        owner,
        repo
    );

    let comment = format!(
        "This report has been open for more than {} days and is being closed automatically.",
        age_days
    );

    let mut closed = 0;
    for issue in stale {
        let issue_route = format!("{}/{}", route, issue.number);
        let result = async {
            let _: serde_json::Value = octocrab
                .post(
                    format!("{}/comments", issue_route),
                    Some(&CommentBody { body: &comment }),
                )
                .await?;
            let _: serde_json::Value = octocrab
                .patch(&issue_route, Some(&StateBody { state: "closed" }))
                .await?;
            Ok::<(), octocrab::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                debug!("Closed issue #{} ({})", issue.number, issue.title);
                closed += 1;
            }
            Err(e) => error!("Failed to close issue #{}: {}", issue.number, e),
        }
    }

    info!("Closed {} old issues", closed);
    Ok(closed)
}
