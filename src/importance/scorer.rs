//! Importance score computation.
//!
//! The score is the sum of four weights: commit type, change size, primary
//! file type and scope (number of files). Each factor is reported in
//! [`ScoreDetails`] so the result stays explainable.

use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ScoringConfig;
use crate::model::{Commit, FileChange};

use super::{ImportanceLevel, ImportanceResult, ScoreDetails};

/// Weight for commit types missing from the configured table.
const DEFAULT_TYPE_WEIGHT: u32 = 3;

/// Commit type used when the subject has no conventional prefix.
pub const OTHER_TYPE: &str = "other";

const CORE_SUFFIXES: &[&str] = &[
    ".py", ".rs", ".cpp", ".cc", ".c", ".h", ".hpp", ".go", ".js", ".ts",
];
const CONFIG_SUFFIXES: &[&str] = &[".yaml", ".yml", ".json", ".toml", ".ini", ".cfg", ".conf"];
const TEST_PATTERNS: &[&str] = &["_test.py", "test_.py", "_test.rs", "_test.go"];
const DOC_SUFFIXES: &[&str] = &[".md", ".rst", ".txt", "adoc"];

/// Change size bucket by total changed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSize {
    Tiny,
    Small,
    Medium,
    Large,
}

impl ChangeSize {
    pub fn weight(&self) -> u32 {
        match self {
            ChangeSize::Tiny => 0,
            ChangeSize::Small => 1,
            ChangeSize::Medium => 2,
            ChangeSize::Large => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSize::Tiny => "tiny",
            ChangeSize::Small => "small",
            ChangeSize::Medium => "medium",
            ChangeSize::Large => "large",
        }
    }
}

impl fmt::Display for ChangeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File category. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Core,
    Config,
    Test,
    Doc,
}

impl FileCategory {
    pub const ALL: [FileCategory; 4] = [
        FileCategory::Core,
        FileCategory::Config,
        FileCategory::Test,
        FileCategory::Doc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Core => "core",
            FileCategory::Config => "config",
            FileCategory::Test => "test",
            FileCategory::Doc => "doc",
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            FileCategory::Core => CORE_SUFFIXES.iter().any(|s| path.ends_with(s)),
            FileCategory::Config => CONFIG_SUFFIXES.iter().any(|s| path.ends_with(s)),
            FileCategory::Test => TEST_PATTERNS.iter().any(|p| path.contains(p)),
            FileCategory::Doc => DOC_SUFFIXES.iter().any(|s| path.ends_with(s)),
        }
    }

    fn weight(&self, config: &ScoringConfig) -> u32 {
        let weights = &config.file_type_weights;
        match self {
            FileCategory::Core => weights.core,
            FileCategory::Config => weights.config,
            FileCategory::Test => weights.test,
            FileCategory::Doc => weights.doc,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn commit_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z]+)(\(.+\))?:").expect("commit type pattern is valid"))
}

/// Extract the Conventional Commits type from a message.
///
/// Only the first line is inspected. Returns `"other"` when there is no
/// lowercase `type:` or `type(scope):` prefix.
pub fn get_commit_type(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or("").trim();

    match commit_type_regex().captures(first_line) {
        Some(caps) => {
            let commit_type = caps.get(1).map(|m| m.as_str()).unwrap_or(OTHER_TYPE);
            debug!("Parsed commit type: {}", commit_type);
            commit_type.to_string()
        }
        None => {
            debug!("No conventional commit prefix, using '{}'", OTHER_TYPE);
            OTHER_TYPE.to_string()
        }
    }
}

/// Bucket a change by its total number of added and removed lines.
pub fn classify_change_size(additions: u64, deletions: u64, config: &ScoringConfig) -> ChangeSize {
    let total = additions.saturating_add(deletions);
    let buckets = &config.size_buckets;

    if total > buckets.large {
        ChangeSize::Large
    } else if total > buckets.medium {
        ChangeSize::Medium
    } else if total > buckets.small {
        ChangeSize::Small
    } else {
        ChangeSize::Tiny
    }
}

/// Category of a single path; the first matching category wins.
pub fn classify_file(path: &str) -> Option<FileCategory> {
    FileCategory::ALL.into_iter().find(|c| c.matches(path))
}

/// Category with the strictly highest file count.
///
/// Ties go to the earlier category in [`FileCategory::ALL`]; an empty list
/// counts as `core`.
pub fn primary_file_type(files: &[FileChange]) -> FileCategory {
    let mut counts = [0usize; 4];
    for file in files.iter().filter(|f| !f.path.is_empty()) {
        if let Some(category) = classify_file(&file.path) {
            counts[category as usize] += 1;
        }
    }

    let mut primary = FileCategory::Core;
    let mut best = counts[0];
    for category in FileCategory::ALL.into_iter().skip(1) {
        if counts[category as usize] > best {
            best = counts[category as usize];
            primary = category;
        }
    }

    debug!(
        "Primary file type: {} (core={}, config={}, test={}, doc={})",
        primary, counts[0], counts[1], counts[2], counts[3]
    );
    primary
}

fn scope_weight(file_count: usize, config: &ScoringConfig) -> u32 {
    let scopes = &config.scope_thresholds;
    if file_count > scopes.wide {
        2
    } else if file_count >= scopes.medium {
        1
    } else {
        0
    }
}

/// Map a score to a level. Thresholds are used as given, even if ill-ordered.
pub fn level_for_score(score: u32, config: &ScoringConfig) -> ImportanceLevel {
    let thresholds = &config.level_thresholds;
    if score >= thresholds.high {
        ImportanceLevel::High
    } else if score >= thresholds.medium {
        ImportanceLevel::Medium
    } else {
        ImportanceLevel::Low
    }
}

/// Score a commit. Never fails; absent statistics count as zero.
pub fn score_commit(commit: &Commit, config: &ScoringConfig) -> ImportanceResult {
    let commit_type = get_commit_type(&commit.message);
    let type_weight = config
        .commit_type_weights
        .get(&commit_type)
        .copied()
        .unwrap_or(DEFAULT_TYPE_WEIGHT);

    let change_size = classify_change_size(commit.additions(), commit.deletions(), config);
    let size_weight = change_size.weight();

    let primary = primary_file_type(&commit.files);
    let file_type_weight = primary.weight(config);

    let scope_weight = scope_weight(commit.files.len(), config);

    let score = type_weight
        .saturating_add(size_weight)
        .saturating_add(file_type_weight)
        .saturating_add(scope_weight);
    let level = level_for_score(score, config);

    let details = ScoreDetails {
        type_weight,
        size_weight,
        file_type_weight,
        scope_weight,
        commit_type,
        change_size,
        primary_file_type: primary,
    };

    info!("Commit {} importance score: {} ({})", commit.short_hash(), score, level);
    debug!("Score details: {:?}", details);

    ImportanceResult {
        score,
        level,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileStatus;
    use chrono::Utc;

    fn file(path: &str, additions: u64, deletions: u64) -> FileChange {
        FileChange {
            path: path.to_string(),
            status: FileStatus::Modified,
            additions,
            deletions,
            patch: None,
        }
    }

    fn commit(message: &str, files: Vec<FileChange>) -> Commit {
        Commit {
            hash: "abcdef0123456789".to_string(),
            author: "Test User".to_string(),
            timestamp: Utc::now(),
            message: message.to_string(),
            files,
        }
    }

    #[test]
    fn test_commit_type_with_scope() {
        assert_eq!(get_commit_type("fix(parser): handle empty input"), "fix");
    }

    #[test]
    fn test_commit_type_without_prefix() {
        assert_eq!(get_commit_type("Merge pull request #12"), "other");
        assert_eq!(get_commit_type(""), "other");
        assert_eq!(get_commit_type("FEAT: shouting"), "other");
    }

    #[test]
    fn test_commit_type_only_first_line() {
        assert_eq!(get_commit_type("update things\n\nfeat: not a subject"), "other");
    }

    #[test]
    fn test_change_size_boundaries() {
        let config = ScoringConfig::default();
        assert_eq!(classify_change_size(50, 0, &config), ChangeSize::Tiny);
        assert_eq!(classify_change_size(51, 0, &config), ChangeSize::Small);
        assert_eq!(classify_change_size(60, 41, &config), ChangeSize::Medium);
        assert_eq!(classify_change_size(500, 0, &config), ChangeSize::Medium);
        assert_eq!(classify_change_size(500, 1, &config), ChangeSize::Large);
    }

    #[test]
    fn test_classify_file_first_match_wins() {
        assert_eq!(classify_file("src/main.rs"), Some(FileCategory::Core));
        // `_test.py` still ends in `.py`, so core is checked first
        assert_eq!(classify_file("tests/foo_test.py"), Some(FileCategory::Core));
        assert_eq!(classify_file("Cargo.toml"), Some(FileCategory::Config));
        assert_eq!(classify_file("docs/guide.md"), Some(FileCategory::Doc));
        assert_eq!(classify_file("docs/guide.adoc"), Some(FileCategory::Doc));
        assert_eq!(classify_file("logo.png"), None);
    }

    #[test]
    fn test_primary_file_type_majority() {
        let files = vec![file("a.md", 1, 0), file("b.md", 1, 0), file("c.rs", 1, 0)];
        assert_eq!(primary_file_type(&files), FileCategory::Doc);
    }

    #[test]
    fn test_primary_file_type_tie_prefers_earlier_category() {
        let files = vec![file("a.md", 1, 0), file("b.yaml", 1, 0)];
        assert_eq!(primary_file_type(&files), FileCategory::Config);
    }

    #[test]
    fn test_primary_file_type_empty_is_core() {
        assert_eq!(primary_file_type(&[]), FileCategory::Core);
        assert_eq!(primary_file_type(&[file("image.png", 1, 0)]), FileCategory::Core);
    }

    #[test]
    fn test_score_feat_large_core_wide() {
        let files = (0..6).map(|i| file(&format!("src/m{}.rs", i), 100, 0)).collect();
        let result = score_commit(&commit("feat: big feature", files), &ScoringConfig::default());

        assert_eq!(result.details.type_weight, 8);
        assert_eq!(result.details.size_weight, 3);
        assert_eq!(result.details.file_type_weight, 2);
        assert_eq!(result.details.scope_weight, 2);
        assert_eq!(result.score, 15);
        assert_eq!(result.level, ImportanceLevel::High);
    }

    #[test]
    fn test_score_unknown_type_uses_default_weight() {
        let mut config = ScoringConfig::default();
        config.commit_type_weights.remove("other");
        let result = score_commit(&commit("wip", vec![file("notes.md", 1, 0)]), &config);
        assert_eq!(result.details.commit_type, "other");
        assert_eq!(result.details.type_weight, 3);
        assert_eq!(result.score, 3);
        assert_eq!(result.level, ImportanceLevel::Low);
    }

    #[test]
    fn test_huge_weight_saturates() {
        let config =
            crate::config::DigestConfig::from_yaml_str("importance:\n  commit_types:\n    feat: 4294967295\n")
                .unwrap();
        let result = score_commit(
            &commit("feat: x", vec![file("src/lib.rs", 600, 0)]),
            &config.importance,
        );
        assert_eq!(result.details.type_weight, u32::MAX);
        assert_eq!(result.score, u32::MAX);
        assert_eq!(result.level, ImportanceLevel::High);
    }

    #[test]
    fn test_level_boundaries() {
        let config = ScoringConfig::default();
        assert_eq!(level_for_score(10, &config), ImportanceLevel::High);
        assert_eq!(level_for_score(6, &config), ImportanceLevel::Medium);
        assert_eq!(level_for_score(5, &config), ImportanceLevel::Low);
    }

    #[test]
    fn test_scope_weight_thresholds() {
        let config = ScoringConfig::default();
        assert_eq!(scope_weight(2, &config), 0);
        assert_eq!(scope_weight(3, &config), 1);
        assert_eq!(scope_weight(5, &config), 1);
        assert_eq!(scope_weight(6, &config), 2);
    }

    #[test]
    fn test_size_and_scope_weights_are_monotonic() {
        let config = ScoringConfig::default();
        let mut previous = 0;
        for total in 0..1200u64 {
            let weight = classify_change_size(total, 0, &config).weight();
            assert!(weight >= previous, "size weight dropped at {}", total);
            previous = weight;
        }

        let mut previous = 0;
        for count in 0..20 {
            let weight = scope_weight(count, &config);
            assert!(weight >= previous, "scope weight dropped at {}", count);
            previous = weight;
        }
    }
}
