//! Commit retrieval via octocrab.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GitHubError;
use crate::model::{Commit, FileChange, FileStatus, RepoContext};

const PER_PAGE: u32 = 100;

/// Safety limit on list pages per window.
const MAX_PAGES: u32 = 50;

/// Build an authenticated client for api.github.com.
pub fn build_client(token: &str) -> Result<Octocrab, GitHubError> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| GitHubError::Request(Box::new(e)))
}

/// Split `owner/name` into its two parts.
pub fn parse_repo_name(full_name: &str) -> Result<(String, String), GitHubError> {
    let full_name = full_name.trim().trim_end_matches('/');
    let full_name = full_name.strip_suffix(".git").unwrap_or(full_name);

    match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GitHubError::InvalidRepositoryName(full_name.to_string())),
    }
}

/// UTC bounds of `date` as a calendar day in `offset`, inclusive.
pub fn day_window(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN);
    let end = start + chrono::Duration::days(1) - chrono::Duration::seconds(1);
    let to_utc = |naive: chrono::NaiveDateTime| {
        (naive - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
    };
    (to_utc(start), to_utc(end))
}

/// The day before `now` in `offset`.
pub fn yesterday(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    let today = now.with_timezone(&offset).date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    full_name: String,
    language: Option<String>,
    stargazers_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CommitListItem {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    sha: String,
    commit: CommitData,
    #[serde(default)]
    files: Vec<FileData>,
}

#[derive(Debug, Deserialize)]
struct CommitData {
    message: String,
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct FileData {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    patch: Option<String>,
}

#[derive(Debug, Serialize)]
struct WindowParams {
    since: String,
    until: String,
    per_page: u32,
    page: u32,
}

impl From<FileData> for FileChange {
    fn from(file: FileData) -> Self {
        let status = file.status.parse().unwrap_or(FileStatus::Changed);
        FileChange {
            path: file.filename,
            status,
            additions: file.additions,
            deletions: file.deletions,
            patch: file.patch,
        }
    }
}

impl From<CommitDetail> for Commit {
    fn from(detail: CommitDetail) -> Self {
        let (author, timestamp) = match detail.commit.author {
            Some(sig) => (
                sig.name.unwrap_or_else(|| "unknown".to_string()),
                sig.date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            ),
            None => ("unknown".to_string(), DateTime::<Utc>::UNIX_EPOCH),
        };
        Commit {
            hash: detail.sha,
            author,
            timestamp,
            message: detail.commit.message,
            files: detail.files.into_iter().map(FileChange::from).collect(),
        }
    }
}

/// Fetch name, language and star count of a repository.
pub async fn fetch_repo_context(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
) -> Result<RepoContext, GitHubError> {
    let route = format!("/repos/{}/{}", owner, repo);
    let response: RepoResponse = octocrab
        .get(route, None::<&()>)
        .await
        .map_err(|e| GitHubError::from_octocrab(e, owner, repo))?;

    Ok(RepoContext {
        name: response.full_name,
        language: response.language,
        stars: response.stargazers_count,
    })
}

/// Fetch every commit in `[since, until]` on the default branch, with
/// per-file stats and patches, in API order (newest first).
pub async fn fetch_commits(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<Commit>, GitHubError> {
    let route = format!("/repos/{}/{}/commits", owner, repo);
    let mut shas = Vec::new();
    let mut page = 1u32;

    loop {
        let params = WindowParams {
            since: since.to_rfc3339_opts(SecondsFormat::Secs, true),
            until: until.to_rfc3339_opts(SecondsFormat::Secs, true),
            per_page: PER_PAGE,
            page,
        };
        let items: Vec<CommitListItem> = octocrab
            .get(&route, Some(&params))
            .await
            .map_err(|e| GitHubError::from_octocrab(e, owner, repo))?;

        let count = items.len();
        shas.extend(items.into_iter().map(|item| item.sha));

        if count < PER_PAGE as usize {
            break;
        }

        page += 1;
        if page > MAX_PAGES {
            warn!(
                "Reached {}-page safety limit while fetching commits for {}/{}",
                MAX_PAGES, owner, repo
            );
            break;
        }
    }

    info!("Found {} commits in {}/{}", shas.len(), owner, repo);

    let mut commits = Vec::with_capacity(shas.len());
    for sha in shas {
        let detail: CommitDetail = octocrab
            .get(format!("{}/{}", route, sha), None::<&()>)
            .await
            .map_err(|e| GitHubError::from_octocrab(e, owner, repo))?;
        debug!("Fetched commit {} ({} files)", detail.sha, detail.files.len());
        commits.push(Commit::from(detail));
    }

    Ok(commits)
}
