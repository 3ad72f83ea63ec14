//! GitHub authentication detection.
//!
//! Order: `gh auth token`, then `GITHUB_TOKEN`, then `GH_TOKEN`.

use std::env;
use std::process::Command;

use crate::error::GitHubError;

const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Get a GitHub token from the gh CLI or the environment.
pub fn get_github_token() -> Result<String, GitHubError> {
    if let Some(token) = get_token_from_gh_cli() {
        return Ok(token);
    }
    token_from_env().ok_or(GitHubError::AuthenticationFailed)
}

/// First non-empty token variable.
fn token_from_env() -> Option<String> {
    TOKEN_VARS
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

fn get_token_from_gh_cli() -> Option<String> {
    let status = Command::new("gh").args(["auth", "status"]).output().ok()?;
    if !status.status.success() {
        return None;
    }

    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
