//! Markdown rendering of the daily report.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};

use crate::config::FormatConfig;
use crate::importance::ImportanceLevel;
use crate::llm::AnalysisRecord;
use crate::model::{Commit, RepoContext};

use super::anchor::{AnchorRegistry, MAX_TOC_TITLE_CHARS, sanitize_title, slugify, truncate_visible};
use super::stats::{ReportStats, calculate_stats, group_by_importance};

/// Anchor of the statistics section.
pub const STATS_ANCHOR: &str = "statistics";

const TRUNCATION_NOTICE: &str =
    "\n\n---\n\n> ⚠️ This report was truncated to fit the platform size limit.\n";

const NO_ANALYSIS: &str = "_No analysis available._";

/// Anchor of a level group section.
pub fn level_anchor(level: ImportanceLevel) -> String {
    format!("{}-importance", level.as_str())
}

/// A commit section as placed in the document: heading text and anchor.
#[derive(Debug, Clone)]
struct PlacedRecord<'r, 'a> {
    record: &'r AnalysisRecord<'a>,
    title: String,
    anchor: String,
}

/// Computes titles and anchors once, so the table of contents and the body
/// link to the same ids.
fn place<'r, 'a>(
    records: impl IntoIterator<Item = &'r AnalysisRecord<'a>>,
    registry: &mut AnchorRegistry,
) -> Vec<PlacedRecord<'r, 'a>>
where
    'a: 'r,
{
    records
        .into_iter()
        .map(|record| {
            let short_hash = record.commit.short_hash();
            let mut title = sanitize_title(record.commit.subject());
            if title.is_empty() {
                title = short_hash.to_string();
            }
            let anchor = registry.register(&slugify(&title, short_hash), short_hash);
            PlacedRecord {
                record,
                title,
                anchor,
            }
        })
        .collect()
}

/// Fixed offset from the configured hours; out-of-range values fall back to UTC.
pub fn report_offset(format: &FormatConfig) -> FixedOffset {
    FixedOffset::east_opt(format.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Commit message as a single table cell.
///
/// Drops blank lines and `Signed-off-by`/`Co-authored-by` trailers, escapes
/// pipes, and joins the remaining lines with `<br>`.
pub fn format_commit_message(message: &str) -> String {
    message
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with("Signed-off-by") && !line.starts_with("Co-authored-by"))
        .map(|line| line.replace('|', "\\|"))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn format_time(timestamp: &DateTime<Utc>, offset: &FixedOffset) -> String {
    timestamp
        .with_timezone(offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Table of every commit in the window: time, author, message.
pub fn commit_table(commits: &[Commit], format: &FormatConfig) -> String {
    let offset = report_offset(format);
    let mut table = String::from("| Time | Author | Message |\n|------|--------|---------|\n");
    for commit in commits {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            format_time(&commit.timestamp, &offset),
            commit.author.replace('|', "\\|"),
            format_commit_message(&commit.message)
        ));
    }
    table.push('\n');
    table
}

/// Statistics section.
pub fn stats_summary(stats: &ReportStats) -> String {
    let mut out = format!("<a id=\"{}\"></a>\n\n## 📊 Statistics\n\n", STATS_ANCHOR);
    out.push_str("| Importance | Commits |\n|------------|---------|\n");
    for level in ImportanceLevel::REPORT_ORDER {
        out.push_str(&format!(
            "| {} {} | {} |\n",
            level.emoji(),
            level.label(),
            stats.count(level)
        ));
    }
    out.push_str(&format!("| **Total** | **{}** |\n", stats.total));
    if stats.failed > 0 {
        out.push_str(&format!(
            "\n> ⚠️ {} of {} analyses failed.\n",
            stats.failed, stats.total
        ));
    }
    out.push('\n');
    out
}

fn toc_link(title: &str, anchor: &str) -> String {
    format!("[{}](#{})", truncate_visible(title, MAX_TOC_TITLE_CHARS), anchor)
}

fn table_of_contents(
    repo: &RepoContext,
    groups: &[(Option<ImportanceLevel>, Vec<PlacedRecord<'_, '_>>)],
    stats: Option<&ReportStats>,
) -> String {
    let mut toc = String::from("## 📑 Table of Contents\n\n");
    toc.push_str(&format!("- [{}]({})\n", repo.name, repo.html_url()));
    if stats.is_some() {
        toc.push_str(&format!("  - [📊 Statistics](#{})\n", STATS_ANCHOR));
    }

    for (level, placed) in groups {
        let indent = match level {
            Some(level) => {
                toc.push_str(&format!(
                    "  - [{} {} ({})](#{})\n",
                    level.emoji(),
                    level.label(),
                    placed.len(),
                    level_anchor(*level)
                ));
                "    "
            }
            None => "  ",
        };
        for p in placed {
            toc.push_str(&format!("{}- {}\n", indent, toc_link(&p.title, &p.anchor)));
        }
    }
    toc.push('\n');
    toc
}

fn commit_section(out: &mut String, repo: &RepoContext, placed: &PlacedRecord<'_, '_>, format: &FormatConfig) {
    let record = placed.record;
    let commit = record.commit;

    out.push_str(&format!("<a id=\"{}\"></a>\n\n", placed.anchor));
    out.push_str(&format!("### {} {}\n\n", record.importance.level.emoji(), placed.title));
    out.push_str(&format!(
        "- **Commit**: [`{}`]({}/commit/{}) · **Author**: {} · **Time**: {} · **Score**: {}\n\n",
        commit.short_hash(),
        repo.html_url(),
        commit.hash,
        commit.author,
        format_time(&commit.timestamp, &report_offset(format)),
        record.importance.score
    ));

    if let Some(error) = &record.error {
        out.push_str(&format!("> ⚠️ Analysis failed: {}\n\n", error.replace('\n', " ")));
    }

    match record.analysis.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(analysis) => {
            out.push_str(analysis);
            out.push_str("\n\n");
        }
        None => {
            out.push_str(NO_ANALYSIS);
            out.push_str("\n\n");
        }
    }
    out.push_str("---\n\n");
}

/// Statistics, table of contents and per-commit analysis for one repository.
///
/// Anchors are unique within the returned text; each call starts from an
/// empty registry.
pub fn analysis_sections(
    repo: &RepoContext,
    records: &[AnalysisRecord<'_>],
    format: &FormatConfig,
) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut registry = AnchorRegistry::new();
    registry.reserve(STATS_ANCHOR);
    for level in ImportanceLevel::REPORT_ORDER {
        registry.reserve(&level_anchor(level));
    }

    let groups: Vec<(Option<ImportanceLevel>, Vec<PlacedRecord<'_, '_>>)> = if format.enable_grouping {
        let by_level = group_by_importance(records);
        by_level
            .non_empty()
            .map(|(level, group)| (Some(level), place(group.iter().copied(), &mut registry)))
            .collect()
    } else {
        vec![(None, place(records, &mut registry))]
    };

    let stats = format.enable_stats.then(|| calculate_stats(records));

    let mut out = String::new();
    if let Some(stats) = &stats {
        out.push_str(&stats_summary(stats));
    }
    if format.enable_toc {
        out.push_str(&table_of_contents(repo, &groups, stats.as_ref()));
    }

    for (level, placed) in &groups {
        match level {
            Some(level) => {
                out.push_str(&format!(
                    "<a id=\"{}\"></a>\n\n## {} {} Importance ({})\n\n",
                    level_anchor(*level),
                    level.emoji(),
                    level.label(),
                    placed.len()
                ));
            }
            None => out.push_str("## 🔍 Commit Analysis\n\n"),
        }
        for p in placed {
            commit_section(&mut out, repo, p, format);
        }
    }

    out
}

/// Full report document for one repository and day.
///
/// `records` holds one entry per commit: model analyses, or scored-only
/// records when analysis is disabled. With `None` the report only holds the
/// commit table.
pub fn render_report(
    repo: &RepoContext,
    date: NaiveDate,
    commits: &[Commit],
    records: Option<&[AnalysisRecord<'_>]>,
    format: &FormatConfig,
) -> String {
    let mut doc = format!("# Daily Report ({})\n\n", date.format("%Y-%m-%d"));
    doc.push_str(&format!("## {}\n\n", repo.name));

    if commits.is_empty() {
        doc.push_str("_No commits in this period._\n\n");
    } else {
        doc.push_str(&commit_table(commits, format));
    }

    if let Some(records) = records {
        doc.push_str(&analysis_sections(repo, records, format));
    }

    truncate_report(doc, format.max_body_chars)
}

/// Fit `doc` into `max_chars` characters, cutting on a line boundary and
/// appending a notice when anything was dropped.
pub fn truncate_report(doc: String, max_chars: usize) -> String {
    if doc.chars().count() <= max_chars {
        return doc;
    }

    let notice_chars = TRUNCATION_NOTICE.chars().count();
    if max_chars < notice_chars {
        // No room for the notice
        return doc.chars().take(max_chars).collect();
    }

    let budget = max_chars - notice_chars;
    let byte_end = doc
        .char_indices()
        .nth(budget)
        .map(|(idx, _)| idx)
        .unwrap_or(doc.len());
    let head = &doc[..byte_end];
    let head = match head.rfind('\n') {
        Some(idx) => &head[..idx],
        None => head,
    };

    let mut truncated = head.to_string();
    truncated.push_str(TRUNCATION_NOTICE);
    truncated
}

/// Repository path of the report file: `reports/<year>/<repo>/<date>.md`.
pub fn report_file_path(repo: &RepoContext, date: NaiveDate) -> String {
    format!(
        "reports/{}/{}/{}.md",
        date.year(),
        repo.short_name(),
        date.format("%Y-%m-%d")
    )
}

pub fn issue_title(repo: &RepoContext, date: NaiveDate) -> String {
    format!("Daily Report: {} ({})", repo.name, date.format("%Y-%m-%d"))
}
