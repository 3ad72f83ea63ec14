//! Per-commit analysis: scoring, prompting, and the paced retry loop.
//!
//! Every input commit yields exactly one [`AnalysisRecord`], in input order.
//! A commit whose calls all fail gets an error in its record; the batch
//! always runs to the end.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::DigestConfig;
use crate::error::LlmError;
use crate::importance::{ImportanceResult, score_commit};
use crate::model::{Commit, RepoContext};

use super::client::ChatClient;
use super::prompt::{system_prompt, user_prompt};
use super::rate::RateController;

/// Suspends the run between calls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, secs: u64);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, secs: u64) {
        if secs > 0 {
            tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
        }
    }
}

/// Outcome of analyzing one commit.
///
/// `analysis` and `error` are never both set; both are `None` only if the
/// call was never attempted.
#[derive(Debug, Clone)]
pub struct AnalysisRecord<'a> {
    pub commit: &'a Commit,
    pub analysis: Option<String>,
    pub importance: ImportanceResult,
    pub error: Option<String>,
}

impl<'a> AnalysisRecord<'a> {
    /// Record for a commit that was scored but not sent to the model.
    pub fn scored_only(commit: &'a Commit, importance: ImportanceResult) -> Self {
        Self {
            commit,
            analysis: None,
            importance,
            error: None,
        }
    }
}

/// Score every commit without calling the model.
pub fn score_commits<'a>(commits: &'a [Commit], config: &DigestConfig) -> Vec<AnalysisRecord<'a>> {
    commits
        .iter()
        .map(|c| AnalysisRecord::scored_only(c, score_commit(c, &config.importance)))
        .collect()
}

/// Analyze commits one at a time. Never fails.
pub async fn analyze_commits<'a, C, S>(
    commits: &'a [Commit],
    repo: Option<&RepoContext>,
    client: &C,
    sleeper: &S,
    config: &DigestConfig,
) -> Vec<AnalysisRecord<'a>>
where
    C: ChatClient + ?Sized,
    S: Sleeper + ?Sized,
{
    let rate = RateController::from_config(&config.rate_limit);
    let max_attempts = u32::try_from(config.rate_limit.retry.max_attempts)
        .unwrap_or(1)
        .max(1);

    let mut records = Vec::with_capacity(commits.len());

    for (idx, commit) in commits.iter().enumerate() {
        info!("Analyzing commit {}", commit.hash);

        let importance = score_commit(commit, &config.importance);

        let mut prompt_importance = importance.clone();
        if let Some(level) = config.llm.force_level {
            prompt_importance.level = level;
        }
        let system = system_prompt(prompt_importance.level);
        let user = user_prompt(commit, repo, &prompt_importance, &config.format.diff);

        let is_last = idx + 1 == commits.len();

        match call_with_retry(client, sleeper, &rate, max_attempts, system, &user).await {
            Ok((reply, attempts)) => {
                debug!("Analysis for {}: {}", commit.short_hash(), reply);
                records.push(AnalysisRecord {
                    commit,
                    analysis: Some(reply),
                    importance,
                    error: None,
                });

                // A retried success was already paced by its backoff
                if attempts == 1 && !is_last {
                    sleeper.sleep(rate.steady_state_delay()).await;
                }
            }
            Err(e) => {
                let message = format!("LLM analysis failed after {} attempts: {}", max_attempts, e);
                error!("{}", message);
                records.push(AnalysisRecord {
                    commit,
                    analysis: None,
                    importance,
                    error: Some(message),
                });
            }
        }
    }

    records
}

/// Call the model up to `max_attempts` times.
///
/// Returns the reply and the attempt that produced it, or the last error.
/// There is no wait after the final failed attempt.
async fn call_with_retry<C, S>(
    client: &C,
    sleeper: &S,
    rate: &RateController,
    max_attempts: u32,
    system: &str,
    user: &str,
) -> Result<(String, u32), LlmError>
where
    C: ChatClient + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match client.complete(system, user).await {
            Ok(reply) => return Ok((reply.content, attempt)),
            Err(e) if attempt < max_attempts => {
                let delay = rate.next_delay(e.elapsed_secs(), e.is_rate_limited(), attempt);
                warn!(
                    "LLM call failed (attempt {}/{}): {}; retrying in {}s",
                    attempt, max_attempts, e, delay
                );
                sleeper.sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
