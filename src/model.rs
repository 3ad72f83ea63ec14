//! Commit data shared by the scorer, the prompt builder and the report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a file in a commit, as reported by the hosting API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Changed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
            FileStatus::Changed => "changed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileStatus {
    type Err = String;

    /// Unknown statuses (`copied`, `unchanged`) collapse into `Changed`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "added" => Ok(Self::Added),
            "modified" => Ok(Self::Modified),
            "removed" => Ok(Self::Removed),
            "renamed" => Ok(Self::Renamed),
            "" => Err("Empty file status".to_string()),
            _ => Ok(Self::Changed),
        }
    }
}

/// One file touched by a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    /// Unified diff text; the API omits it for binary or very large files.
    pub patch: Option<String>,
}

/// A commit as read from the source repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub files: Vec<FileChange>,
}

impl Commit {
    /// First seven characters of the hash.
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map(|(idx, _)| idx)
            .unwrap_or(self.hash.len());
        &self.hash[..end]
    }

    /// First line of the message, trimmed.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    pub fn additions(&self) -> u64 {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn deletions(&self) -> u64 {
        self.files.iter().map(|f| f.deletions).sum()
    }
}

/// Repository metadata passed to the prompt builder and the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoContext {
    /// `owner/name`.
    pub name: String,
    pub language: Option<String>,
    pub stars: Option<u64>,
}

impl RepoContext {
    /// Repository name without the owner.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(hash: &str, message: &str) -> Commit {
        Commit {
            hash: hash.to_string(),
            author: "Ada".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            message: message.to_string(),
            files: vec![
                FileChange {
                    path: "src/lib.rs".to_string(),
                    status: FileStatus::Modified,
                    additions: 10,
                    deletions: 4,
                    patch: None,
                },
                FileChange {
                    path: "README.md".to_string(),
                    status: FileStatus::Added,
                    additions: 3,
                    deletions: 0,
                    patch: None,
                },
            ],
        }
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(commit("0123456789abcdef", "x").short_hash(), "0123456");
        assert_eq!(commit("abc", "x").short_hash(), "abc");
    }

    #[test]
    fn test_subject_is_first_line() {
        let c = commit("abc", "  fix: thing  \n\nbody text");
        assert_eq!(c.subject(), "fix: thing");
    }

    #[test]
    fn test_totals_sum_files() {
        let c = commit("abc", "x");
        assert_eq!(c.additions(), 13);
        assert_eq!(c.deletions(), 4);
    }

    #[test]
    fn test_file_status_from_str() {
        assert_eq!("removed".parse::<FileStatus>().unwrap(), FileStatus::Removed);
        assert_eq!("copied".parse::<FileStatus>().unwrap(), FileStatus::Changed);
        assert!("".parse::<FileStatus>().is_err());
    }

    #[test]
    fn test_repo_short_name() {
        let ctx = RepoContext {
            name: "vllm-project/vllm".to_string(),
            language: Some("Python".to_string()),
            stars: Some(1),
        };
        assert_eq!(ctx.short_name(), "vllm");
        assert_eq!(ctx.html_url(), "https://github.com/vllm-project/vllm");
    }
}
