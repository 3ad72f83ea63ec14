//! argus - Daily commit digests for a set of GitHub repositories.
//!
//! # Overview
//!
//! argus fetches one day of commits per repository, ranks each commit with a
//! fixed rule set (commit type, change size, file types, scope), optionally
//! asks an OpenAI-compatible model for a technical summary at a depth chosen
//! by that rank, and publishes a Markdown report as a repository file or an
//! issue.

pub mod config;
pub mod error;
pub mod github;
pub mod importance;
pub mod llm;
pub mod model;
pub mod report;

// Re-export commonly used types
pub use config::{DigestConfig, load_config};
pub use error::{ConfigError, GitHubError, LlmError};
pub use importance::{ImportanceLevel, ImportanceResult, score_commit};
pub use llm::{AnalysisRecord, ChatClient, analyze_commits};
pub use model::{Commit, FileChange, FileStatus, RepoContext};
pub use report::{ReportStats, render_report};
