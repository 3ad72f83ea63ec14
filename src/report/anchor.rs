//! Heading titles and collision-free anchors for commit sections.

use std::collections::HashMap;

/// Maximum visible characters of a commit heading.
pub const MAX_TITLE_CHARS: usize = 80;

/// Maximum visible characters of a table-of-contents entry.
pub const MAX_TOC_TITLE_CHARS: usize = 50;

/// Minimum slug length before falling back to the short hash.
const MIN_SLUG_CHARS: usize = 3;

const ELLIPSIS: &str = "...";

/// Slugs already handed out during one render.
///
/// Create one per report and drop it afterwards: anchors only need to be
/// unique within a single document. The first commit to claim a slug keeps
/// it unchanged; later ones get the short hash appended.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    seen: HashMap<String, Vec<String>>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a slug for a fixed section so no commit anchor reuses it.
    pub fn reserve(&mut self, slug: &str) {
        self.seen.entry(slug.to_string()).or_default();
    }

    /// Register `base` for the commit `short_hash` and return the anchor to use.
    ///
    /// Suffixed anchors are claimed too, so a later title that slugs to
    /// `base-hash` gets its own suffix instead of a duplicate id.
    pub fn register(&mut self, base: &str, short_hash: &str) -> String {
        let Some(hashes) = self.seen.get_mut(base) else {
            self.seen
                .insert(base.to_string(), vec![short_hash.to_string()]);
            return base.to_string();
        };
        hashes.push(short_hash.to_string());

        let mut anchor = format!("{}-{}", base, short_hash);
        let mut n = 2;
        while self.seen.contains_key(&anchor) {
            anchor = format!("{}-{}-{}", base, short_hash, n);
            n += 1;
        }
        self.seen
            .insert(anchor.clone(), vec![short_hash.to_string()]);
        anchor
    }

    /// Short hashes that produced `slug`, in registration order.
    pub fn hashes(&self, slug: &str) -> Option<&[String]> {
        self.seen.get(slug).map(Vec::as_slice)
    }
}

/// Heading text for a commit subject.
///
/// Drops bracket characters, turns whitespace runs into single hyphens and
/// caps the result at [`MAX_TITLE_CHARS`] characters plus an ellipsis.
pub fn sanitize_title(subject: &str) -> String {
    let stripped: String = subject
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')' | '{' | '}'))
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join("-");
    truncate_visible(&collapsed, MAX_TITLE_CHARS)
}

/// Cut `text` to `max` characters, appending `...` when something was cut.
pub fn truncate_visible(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str(ELLIPSIS);
    cut
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // Hiragana, Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK Extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK Unified Ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
        | '\u{F900}'..='\u{FAFF}' // CJK Compatibility Ideographs
    )
}

fn is_slug_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || is_cjk(c)
}

/// Normalize a title into an anchor slug.
///
/// Lower-cases, replaces every other character with a hyphen, collapses
/// hyphen runs and trims them from both ends. Slugs shorter than three
/// characters fall back to `short_hash`.
pub fn slugify(title: &str, short_hash: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if is_slug_char(c) {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');

    if slug.chars().count() < MIN_SLUG_CHARS {
        short_hash.to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_brackets_and_collapses_whitespace() {
        assert_eq!(
            sanitize_title("[Bugfix] fix(sched):  handle   (rare) case"),
            "Bugfix-fixsched:-handle-rare-case"
        );
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "word ".repeat(40);
        let title = sanitize_title(&long);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS + ELLIPSIS.len());
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_truncate_visible_counts_chars() {
        assert_eq!(truncate_visible("修复调度器", 3), "修复调...");
        assert_eq!(truncate_visible("short", 50), "short");
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("feat:-Add-KV-cache", "abc1234"), "feat-add-kv-cache");
        assert_eq!(slugify("--Hello!!World--", "abc1234"), "hello-world");
    }

    #[test]
    fn test_slugify_keeps_cjk() {
        assert_eq!(slugify("fix:-修复调度器", "abc1234"), "fix-修复调度器");
    }

    #[test]
    fn test_slugify_short_falls_back_to_hash() {
        assert_eq!(slugify("!!", "abc1234"), "abc1234");
        assert_eq!(slugify("a-", "abc1234"), "abc1234");
        assert_eq!(slugify("", "abc1234"), "abc1234");
    }

    #[test]
    fn test_registry_first_keeps_slug() {
        let mut registry = AnchorRegistry::new();
        let first = registry.register("fix-typo", "aaaaaaa");
        let second = registry.register("fix-typo", "bbbbbbb");

        assert_eq!(first, "fix-typo");
        assert_eq!(second, "fix-typo-bbbbbbb");
        assert_ne!(first, second);
        assert_eq!(
            registry.hashes("fix-typo").unwrap(),
            &["aaaaaaa".to_string(), "bbbbbbb".to_string()]
        );
    }

    #[test]
    fn test_suffixed_anchor_is_claimed() {
        let mut registry = AnchorRegistry::new();
        assert_eq!(registry.register("fix-typo", "aaaaaaa"), "fix-typo");
        assert_eq!(registry.register("fix-typo", "bbbbbbb"), "fix-typo-bbbbbbb");
        assert_eq!(
            registry.register("fix-typo-bbbbbbb", "ccccccc"),
            "fix-typo-bbbbbbb-ccccccc"
        );
    }

    #[test]
    fn test_suffix_collision_gets_counter() {
        let mut registry = AnchorRegistry::new();
        registry.register("fix-typo-bbbbbbb", "ccccccc");
        registry.register("fix-typo", "aaaaaaa");
        assert_eq!(registry.register("fix-typo", "bbbbbbb"), "fix-typo-bbbbbbb-2");
    }

    #[test]
    fn test_reserved_slug_is_never_reused() {
        let mut registry = AnchorRegistry::new();
        registry.reserve("statistics");
        assert_eq!(registry.register("statistics", "ccccccc"), "statistics-ccccccc");
    }

    #[test]
    fn test_fresh_registry_per_render() {
        let mut first = AnchorRegistry::new();
        first.register("same", "aaaaaaa");
        let mut second = AnchorRegistry::new();
        assert_eq!(second.register("same", "bbbbbbb"), "same");
    }
}
