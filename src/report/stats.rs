//! Aggregate counts and level grouping of analysis records.

use serde::Serialize;

use crate::importance::ImportanceLevel;
use crate::llm::AnalysisRecord;

/// Record counts per importance level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Records whose analysis failed after all attempts.
    pub failed: usize,
}

impl ReportStats {
    pub fn count(&self, level: ImportanceLevel) -> usize {
        match level {
            ImportanceLevel::High => self.high,
            ImportanceLevel::Medium => self.medium,
            ImportanceLevel::Low => self.low,
        }
    }
}

pub fn calculate_stats(records: &[AnalysisRecord<'_>]) -> ReportStats {
    let mut stats = ReportStats {
        total: records.len(),
        ..ReportStats::default()
    };
    for record in records {
        match record.importance.level {
            ImportanceLevel::High => stats.high += 1,
            ImportanceLevel::Medium => stats.medium += 1,
            ImportanceLevel::Low => stats.low += 1,
        }
        if record.error.is_some() {
            stats.failed += 1;
        }
    }
    stats
}

/// Records split by level, input order kept within each group.
#[derive(Debug, Default)]
pub struct LevelGroups<'r, 'a> {
    pub high: Vec<&'r AnalysisRecord<'a>>,
    pub medium: Vec<&'r AnalysisRecord<'a>>,
    pub low: Vec<&'r AnalysisRecord<'a>>,
}

impl<'r, 'a> LevelGroups<'r, 'a> {
    pub fn get(&self, level: ImportanceLevel) -> &[&'r AnalysisRecord<'a>] {
        match level {
            ImportanceLevel::High => &self.high,
            ImportanceLevel::Medium => &self.medium,
            ImportanceLevel::Low => &self.low,
        }
    }

    /// Non-empty groups in report order (high, medium, low).
    pub fn non_empty(&self) -> impl Iterator<Item = (ImportanceLevel, &[&'r AnalysisRecord<'a>])> {
        ImportanceLevel::REPORT_ORDER
            .into_iter()
            .map(|level| (level, self.get(level)))
            .filter(|(_, group)| !group.is_empty())
    }
}

pub fn group_by_importance<'r, 'a>(records: &'r [AnalysisRecord<'a>]) -> LevelGroups<'r, 'a> {
    let mut groups = LevelGroups::default();
    for record in records {
        match record.importance.level {
            ImportanceLevel::High => groups.high.push(record),
            ImportanceLevel::Medium => groups.medium.push(record),
            ImportanceLevel::Low => groups.low.push(record),
        }
    }
    groups
}
