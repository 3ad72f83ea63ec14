//! Prompt construction for per-commit analysis.
//!
//! The system prompt is one of three fixed templates chosen by importance
//! level. Each template names the exact bold Markdown field labels the model
//! must emit, so reports stay uniform across commits. The reply itself is
//! never parsed; it is rendered as-is.

use std::borrow::Cow;

use tracing::debug;

use crate::config::DiffConfig;
use crate::importance::{ImportanceLevel, ImportanceResult};
use crate::model::{Commit, RepoContext};

/// Marker appended after a patch that was cut.
pub const TRUNCATION_MARKER: &str = "(diff too large, truncated)";

const LOW_SYSTEM_PROMPT: &str = r#"You are a code review expert. Give a brief analysis of this change.

**🎯 Change Type**: [one of: Documentation/Configuration/Tests/Refactor/Other]
**⚡ Importance**: 🟢 Low
**📋 Summary**: [1-2 sentences describing the change]

Keep it short: no more than 60 words."#;

const MEDIUM_SYSTEM_PROMPT: &str = r#"You are a code review expert. Give a moderately detailed analysis of this change.

**🎯 Change Type**: [Feature/Bug Fix/Performance/Refactor/Other]
**⚡ Importance**: 🟡 Medium
**📋 Summary**: [2-3 sentences on what changed and why]
**🎯 Scope of Impact**: [the main modules affected]
**💡 Recommendations**: [concrete advice for developers and users]

Focus on the core change and give actionable advice, around 150 words."#;

const HIGH_SYSTEM_PROMPT: &str = r#"You are a senior software engineer and code review expert who analyzes changes in open source projects.

## Expertise
- Identify the technical impact and value of a change
- Assess risk and blast radius
- Analyze architecture, performance, security and maintainability
- Give developers concise, useful technical insight

## Principles
1. Focus on real impact, not surface details
2. Call out risks and opportunities
3. Give actionable advice
4. Stay objective and professional

## Output Format
Use exactly the following format and fill in every field:

**🎯 Change Type**: [Feature/Bug Fix/Performance/Refactor/Architecture/Security Fix]
**⚡ Importance**: 🔴 High
**📋 Summary**: [2-3 sentences on what changed, the goal and the expected effect]
**🎯 Scope of Impact**: [the main modules or components affected]
**🔍 Technical Insights**:
- Architecture: [impact on the system architecture]
- Performance: [potential performance impact]
- Security: [whether security-relevant code changed]
**⚠️ Potential Risks**: [possible risk points]
**💡 Recommendations**: [concrete advice for developers and users]

## Answer Requirements
- Be concise but informative
- Do not repeat information; every field should add something"#;

/// System prompt for the given level.
pub fn system_prompt(level: ImportanceLevel) -> &'static str {
    match level {
        ImportanceLevel::Low => LOW_SYSTEM_PROMPT,
        ImportanceLevel::Medium => MEDIUM_SYSTEM_PROMPT,
        ImportanceLevel::High => HIGH_SYSTEM_PROMPT,
    }
}

/// Cut a patch that exceeds `config.truncate_threshold` bytes down to
/// `config.truncate_to` bytes.
///
/// The cut moves back to the nearest UTF-8 boundary. Returns whether the
/// patch was truncated.
pub fn truncate_patch<'a>(patch: &'a str, config: &DiffConfig) -> (Cow<'a, str>, bool) {
    if patch.len() <= config.truncate_threshold {
        return (Cow::Borrowed(patch), false);
    }

    let mut end = config.truncate_to.min(patch.len());
    while end > 0 && !patch.is_char_boundary(end) {
        end -= 1;
    }
    (Cow::Borrowed(&patch[..end]), true)
}

/// Build the user prompt: repository context, commit metadata, per-file
/// changes with patches, then the requested analysis depth.
pub fn user_prompt(
    commit: &Commit,
    repo: Option<&RepoContext>,
    importance: &ImportanceResult,
    diff_config: &DiffConfig,
) -> String {
    let mut prompt = String::from("## Repository\n");
    if let Some(repo) = repo {
        prompt.push_str(&format!("- Project: {}\n", repo.name));
        prompt.push_str(&format!(
            "- Primary language: {}\n",
            repo.language.as_deref().unwrap_or("Unknown")
        ));
        if let Some(stars) = repo.stars {
            prompt.push_str(&format!("- Stars: {}\n", stars));
        }
    }
    prompt.push('\n');

    prompt.push_str("## Commit\n");
    prompt.push_str(&format!("- SHA: {}\n", commit.hash));
    prompt.push_str(&format!("- Author: {}\n", commit.author));
    prompt.push_str(&format!("- Message: {}\n", commit.message));
    prompt.push_str(&format!("- Type: {}\n", importance.details.commit_type));
    prompt.push_str(&format!(
        "- Change size: {}+ / {}-\n",
        commit.additions(),
        commit.deletions()
    ));
    prompt.push_str(&format!(
        "- Primary file type: {}\n",
        importance.details.primary_file_type
    ));

    prompt.push_str("\n## Changed Files\n");
    for file in &commit.files {
        prompt.push_str(&format!(
            "  * {}: {} (+{}/-{})\n",
            file.status, file.path, file.additions, file.deletions
        ));

        if let Some(patch) = file.patch.as_deref().filter(|p| !p.is_empty()) {
            let (text, truncated) = truncate_patch(patch, diff_config);
            prompt.push_str(&format!("```diff\n{}\n```\n", text));
            if truncated {
                prompt.push_str(&format!("{}\n", TRUNCATION_MARKER));
            }
        }
    }

    prompt.push_str("\n## Analysis Depth\n");
    match importance.level {
        ImportanceLevel::High => {
            prompt.push_str("- Provide a thorough technical analysis\n");
            prompt.push_str("- Cover architecture, performance and security impact\n");
        }
        ImportanceLevel::Medium => {
            prompt.push_str("- Provide a moderately detailed analysis\n");
            prompt.push_str("- Focus on the core change and its scope\n");
        }
        ImportanceLevel::Low => {
            prompt.push_str("- A brief summary is enough\n");
        }
    }
    prompt.push_str("\n---\n\n");

    debug!("User prompt for {}: {} bytes", commit.short_hash(), prompt.len());
    prompt
}
