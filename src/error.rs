//! Error types for argus modules using thiserror.

use thiserror::Error;

/// Errors from a single chat-completion call.
///
/// `elapsed_secs` is set whenever the endpoint actually answered, so the
/// caller can still pace the next attempt by observed latency.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM request failed: {message}")]
    Connection {
        message: String,
        status: Option<u16>,
        elapsed_secs: Option<f64>,
    },

    #[error("Could not parse LLM response: {message}")]
    Parse { message: String, elapsed_secs: f64 },

    #[error("Invalid LLM response (missing choices[0].message.content): {body}")]
    Protocol { body: String, elapsed_secs: f64 },
}

impl LlmError {
    /// Whether the endpoint explicitly rejected the call for rate limiting.
    ///
    /// Prefers the HTTP status; the message check covers gateways that wrap
    /// the 429 in another status or only mention it in text.
    pub fn is_rate_limited(&self) -> bool {
        if let LlmError::Connection {
            status: Some(429), ..
        } = self
        {
            return true;
        }
        let text = self.to_string();
        text.contains("429") || text.to_lowercase().contains("rate limit")
    }

    /// Latency of the failed call, if the endpoint responded at all.
    pub fn elapsed_secs(&self) -> Option<f64> {
        match self {
            LlmError::Connection { elapsed_secs, .. } => *elapsed_secs,
            LlmError::Parse { elapsed_secs, .. } | LlmError::Protocol { elapsed_secs, .. } => {
                Some(*elapsed_secs)
            }
        }
    }
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Run 'gh auth login' or set GITHUB_TOKEN environment variable"
    )]
    AuthenticationFailed,

    #[error("GitHub request failed: {0}")]
    Request(#[source] Box<octocrab::Error>),

    #[error("Rate limited by GitHub API")]
    RateLimited,

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Invalid repository name '{0}', expected owner/name")]
    InvalidRepositoryName(String),
}

impl GitHubError {
    /// Classify an octocrab error for a request against `owner/repo`.
    pub(crate) fn from_octocrab(e: octocrab::Error, owner: &str, repo: &str) -> Self {
        // octocrab formats differ between versions; check both renderings
        let err_display = e.to_string();
        let err_debug = format!("{:?}", e);

        if err_display.to_lowercase().contains("rate limit")
            || err_debug.to_lowercase().contains("rate limit")
        {
            return GitHubError::RateLimited;
        }
        if err_display.contains("Not Found") || err_debug.contains("Not Found") {
            return GitHubError::RepositoryNotFound {
                owner: owner.to_string(),
                repo: repo.to_string(),
            };
        }
        GitHubError::Request(Box::new(e))
    }
}

/// Errors from loading the YAML configuration.
///
/// These never abort a run: the loader logs them and falls back to defaults.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseFailed(#[source] serde_yaml::Error),
}
