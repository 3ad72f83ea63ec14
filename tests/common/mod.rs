//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use argus::model::{Commit, FileChange, FileStatus, RepoContext};
use chrono::{TimeZone, Utc};
use octocrab::Octocrab;
use wiremock::MockServer;

/// A file change with the given path and line counts.
pub fn file(path: &str, additions: u64, deletions: u64) -> FileChange {
    FileChange {
        path: path.to_string(),
        status: FileStatus::Modified,
        additions,
        deletions,
        patch: Some(format!("@@ -1 +1 @@\n-old {}\n+new {}", path, path)),
    }
}

/// Builder for test commits.
pub struct CommitBuilder {
    commit: Commit,
}

impl CommitBuilder {
    pub fn new(hash: &str, message: &str) -> Self {
        Self {
            commit: Commit {
                hash: hash.to_string(),
                author: "Test User".to_string(),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
                message: message.to_string(),
                files: Vec::new(),
            },
        }
    }

    pub fn author(mut self, author: &str) -> Self {
        self.commit.author = author.to_string();
        self
    }

    pub fn file(mut self, path: &str, additions: u64, deletions: u64) -> Self {
        self.commit.files.push(file(path, additions, deletions));
        self
    }

    pub fn build(self) -> Commit {
        self.commit
    }
}

/// A commit with one small core-file change.
pub fn commit(hash: &str, message: &str) -> Commit {
    CommitBuilder::new(hash, message).file("src/core.rs", 10, 2).build()
}

pub fn repo_context() -> RepoContext {
    RepoContext {
        name: "owner/repo".to_string(),
        language: Some("Rust".to_string()),
        stars: Some(1234),
    }
}

/// Octocrab client pointing at a mock server.
pub async fn mock_github(server: &MockServer) -> Octocrab {
    Octocrab::builder()
        .base_uri(server.uri())
        .expect("Failed to set base URI")
        .build()
        .expect("Failed to build octocrab")
}
