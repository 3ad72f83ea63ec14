//! argus - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use octocrab::Octocrab;
use tracing::{error, info, warn};

use argus::config::{DigestConfig, load_config};
use argus::github::{
    build_client, close_old_issues, create_issue, day_window, fetch_commits, fetch_repo_context,
    get_github_token, parse_repo_name, write_report_file, yesterday,
};
use argus::llm::{HttpChatClient, LlmSettings, TokioSleeper, analyze_commits, score_commits};
use argus::report::{issue_title, render_report, report_file_path};
use argus::report::writer::report_offset;

/// Repositories watched when no `--repo` is given.
const DEFAULT_REPOSITORIES: [&str; 3] = [
    "vllm-project/vllm",
    "sgl-project/sglang",
    "ai-dynamo/dynamo",
];

/// Repository the reports are published to.
const TARGET_REPO_VAR: &str = "REPOSITORY";

/// Daily commit digests with importance scoring and LLM analysis.
#[derive(Parser, Debug)]
#[command(name = "argus")]
#[command(about = "Daily commit digests with importance scoring and LLM analysis")]
#[command(version)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(long)]
    debug: bool,

    /// Print reports to stdout instead of publishing them
    #[arg(long)]
    dry_run: bool,

    /// Send each commit to the LLM for a written analysis
    #[arg(long)]
    enable_analysis: bool,

    /// Path to the YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Publish as an issue instead of a report file
    #[arg(long)]
    issue: bool,

    /// Close report issues older than this many days after publishing one
    #[arg(long, default_value_t = 30)]
    close_issues_after: i64,

    /// Repository to watch, as owner/name (repeatable)
    #[arg(long = "repo")]
    repos: Vec<String>,

    /// Day to report on (defaults to yesterday in the configured offset)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    check_environment(&cli)?;

    let config = load_config(cli.config.as_deref());
    let offset = report_offset(&config.format);
    let date = cli.date.unwrap_or_else(|| yesterday(Utc::now(), offset));

    let token = get_github_token().context("GitHub authentication is required")?;
    let octocrab = build_client(&token).context("Failed to build GitHub client")?;

    let llm = if cli.enable_analysis {
        let settings = LlmSettings::from_env().map_err(|missing| {
            anyhow::anyhow!("Missing environment variables: {}", missing.join(", "))
        })?;
        let client = HttpChatClient::new(settings, &config.llm)
            .context("Failed to build LLM client")?;
        info!("LLM analysis enabled with model {}", client.model());
        Some(client)
    } else {
        None
    };

    let repos: Vec<String> = if cli.repos.is_empty() {
        DEFAULT_REPOSITORIES.iter().map(|r| r.to_string()).collect()
    } else {
        cli.repos.clone()
    };

    let mut failures = 0usize;
    for repo_name in &repos {
        let result =
            process_repository(&cli, &config, &octocrab, llm.as_ref(), repo_name, date).await;
        if let Err(e) = result {
            error!("Skipping {}: {:#}", repo_name, e);
            failures += 1;
        }
    }

    if cli.issue && !cli.dry_run {
        if let Err(e) = close_stale_reports(&octocrab, cli.close_issues_after).await {
            warn!("Could not close old issues: {:#}", e);
        }
    }

    if failures == repos.len() {
        bail!("All {} repositories failed", failures);
    }
    Ok(())
}

/// Report missing variables together instead of one at a time.
fn check_environment(cli: &Cli) -> Result<()> {
    let mut missing = Vec::new();
    if !cli.dry_run && std::env::var(TARGET_REPO_VAR).map_or(true, |v| v.trim().is_empty()) {
        missing.push(TARGET_REPO_VAR);
    }
    if cli.enable_analysis {
        if let Err(vars) = LlmSettings::from_env() {
            missing.extend(vars);
        }
    }
    if !missing.is_empty() {
        bail!("Missing environment variables: {}", missing.join(", "));
    }
    Ok(())
}

fn target_repository() -> Result<(String, String)> {
    let name = std::env::var(TARGET_REPO_VAR)
        .with_context(|| format!("{} is not set", TARGET_REPO_VAR))?;
    Ok(parse_repo_name(&name)?)
}

async fn process_repository(
    cli: &Cli,
    config: &DigestConfig,
    octocrab: &Octocrab,
    llm: Option<&HttpChatClient>,
    repo_name: &str,
    date: NaiveDate,
) -> Result<()> {
    let (owner, name) = parse_repo_name(repo_name)?;
    let repo = fetch_repo_context(octocrab, &owner, &name)
        .await
        .with_context(|| format!("Failed to fetch repository {}", repo_name))?;

    let (since, until) = day_window(date, report_offset(&config.format));
    info!("Fetching {} commits from {} to {} (UTC)", repo.name, since, until);

    let commits = fetch_commits(octocrab, &owner, &name, since, until)
        .await
        .context("Failed to fetch commits")?;

    if commits.is_empty() {
        info!("No commits in {} on {}; nothing to report", repo.name, date);
        return Ok(());
    }

    let records = match llm {
        Some(client) => {
            analyze_commits(&commits, Some(&repo), client, &TokioSleeper, config).await
        }
        None => score_commits(&commits, config),
    };

    let body = render_report(&repo, date, &commits, Some(records.as_slice()), &config.format);

    if cli.dry_run {
        println!("{}", body);
        return Ok(());
    }

    let (target_owner, target_name) = target_repository()?;
    let published = if cli.issue {
        create_issue(octocrab, &target_owner, &target_name, &issue_title(&repo, date), &body)
            .await
            .context("Failed to create issue")?
    } else {
        let path = report_file_path(&repo, date);
        let message = format!("Add daily report for {} ({})", repo.name, date);
        write_report_file(octocrab, &target_owner, &target_name, &path, &body, &message)
            .await
            .context("Failed to write report file")?
    };

    if let Some(url) = published.html_url {
        println!("Published {} report: {}", repo.name, url);
    }
    Ok(())
}

async fn close_stale_reports(octocrab: &Octocrab, age_days: i64) -> Result<()> {
    let (owner, name) = target_repository()?;
    let cutoff = Utc::now() - chrono::Duration::days(age_days);
    close_old_issues(octocrab, &owner, &name, cutoff, age_days).await?;
    Ok(())
}
