//! Daily report rendering.

pub mod anchor;
pub mod stats;
pub mod writer;

pub use anchor::{AnchorRegistry, sanitize_title, slugify};
pub use stats::{LevelGroups, ReportStats, calculate_stats, group_by_importance};
pub use writer::{
    analysis_sections, commit_table, format_commit_message, issue_title, render_report,
    report_file_path, truncate_report,
};
