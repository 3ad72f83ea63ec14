//! Rule-based importance scoring for commits.

pub mod scorer;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use scorer::{
    ChangeSize, FileCategory, classify_change_size, classify_file, get_commit_type,
    primary_file_type, score_commit,
};

/// Coarse importance bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceLevel {
    Low,
    Medium,
    High,
}

impl ImportanceLevel {
    /// Report order: most important first.
    pub const REPORT_ORDER: [ImportanceLevel; 3] =
        [ImportanceLevel::High, ImportanceLevel::Medium, ImportanceLevel::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::Medium => "🟡",
            Self::High => "🔴",
        }
    }

    /// Human-readable label used in report headings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for ImportanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImportanceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown importance level: {}", s)),
        }
    }
}

/// Per-factor breakdown of a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreDetails {
    pub type_weight: u32,
    pub size_weight: u32,
    pub file_type_weight: u32,
    pub scope_weight: u32,
    pub commit_type: String,
    pub change_size: ChangeSize,
    pub primary_file_type: FileCategory,
}

/// Score and level assigned to one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportanceResult {
    pub score: u32,
    pub level: ImportanceLevel,
    pub details: ScoreDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!("HIGH".parse::<ImportanceLevel>().unwrap(), ImportanceLevel::High);
        assert!("urgent".parse::<ImportanceLevel>().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(ImportanceLevel::High > ImportanceLevel::Medium);
        assert!(ImportanceLevel::Medium > ImportanceLevel::Low);
    }
}
