//! Text normalization and line classification for raw input.
//!
//! Handles line endings, Unicode composition, whitespace runs, and the
//! markers that give plain text its structure (bullets, headings, rules,
//! table rows).

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse multiple whitespace characters into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

/// Regex to match a bullet marker with its indentation.
static BULLET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent> *)(?:[-*+\u{2022}\u{25E6}\u{25AA}]|\d{1,3}[.)])\s+(?P<text>\S.*)$")
        .unwrap()
});

/// Regex to match a markdown ATX heading.
static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<hashes>#{1,6})\s+(?P<text>.*?)\s*#*\s*$").unwrap());

/// Regex to match a horizontal rule.
static RULE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:-{3,}|\*{3,}|_{3,})\s*$").unwrap());

/// Regex to match a markdown table separator row such as `|---|:--:|`.
static TABLE_SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|?(?:\s*:?-+:?\s*\|)+\s*:?-*:?\s*$").unwrap());

/// Spaces per indentation level of a nested bullet.
const INDENT_WIDTH: usize = 2;

/// Spaces a tab expands to.
const TAB_WIDTH: usize = 4;

/// Characters that end a sentence.
pub(crate) const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', ';', ':', ',', '\u{0964}'];

/// Classification of one normalized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    Blank,
    /// `---`, `***` or `___` on its own line.
    Rule,
    /// Markdown heading with its level.
    Heading { level: u8, text: String },
    Bullet { depth: u8, text: String },
    /// `|`-delimited cells. `None` for separator rows.
    TableRow(Option<Vec<String>>),
    Text { indent: usize, text: String },
}

/// Text normalizer for raw extracted content.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    /// Whether to keep leading indentation (needed for nested bullets).
    preserve_indent: bool,
}

impl TextNormalizer {
    /// Create a new text normalizer with default settings.
    pub fn new() -> Self {
        Self {
            preserve_indent: true,
        }
    }

    /// Set whether to preserve leading indentation.
    pub fn with_preserve_indent(mut self, preserve: bool) -> Self {
        self.preserve_indent = preserve;
        self
    }

    /// Normalize raw text.
    ///
    /// - Converts CRLF and CR line endings to LF
    /// - Applies Unicode NFC composition
    /// - Expands tabs in indentation and drops control characters
    /// - Collapses whitespace runs inside a line and trims line ends
    pub fn normalize(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        let composed: String = unified
            .nfc()
            .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
            .collect();

        composed
            .lines()
            .map(|line| self.normalize_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_line(&self, line: &str) -> String {
        let body = line.trim_start_matches([' ', '\t']);
        let indent: usize = line[..line.len() - body.len()]
            .chars()
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum();

        let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(body, " ");
        let collapsed = collapsed.trim_end();
        if collapsed.is_empty() {
            return String::new();
        }

        if self.preserve_indent {
            format!("{}{}", " ".repeat(indent), collapsed)
        } else {
            collapsed.to_string()
        }
    }

    /// Classify a normalized line.
    pub(crate) fn classify(&self, line: &str) -> LineKind {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineKind::Blank;
        }
        if RULE_REGEX.is_match(line) {
            return LineKind::Rule;
        }
        if let Some(caps) = HEADING_REGEX.captures(trimmed) {
            let text = caps["text"].trim().to_string();
            if !text.is_empty() {
                return LineKind::Heading {
                    level: caps["hashes"].len() as u8,
                    text,
                };
            }
        }
        if let Some(caps) = BULLET_REGEX.captures(line) {
            let depth = (caps["indent"].len() / INDENT_WIDTH).min(u8::MAX as usize) as u8;
            return LineKind::Bullet {
                depth,
                text: caps["text"].trim().to_string(),
            };
        }
        if trimmed.starts_with('|') && trimmed.len() > 1 {
            if TABLE_SEPARATOR_REGEX.is_match(trimmed) {
                return LineKind::TableRow(None);
            }
            return LineKind::TableRow(Some(split_table_row(trimmed)));
        }

        LineKind::Text {
            indent: line.len() - line.trim_start().len(),
            text: trimmed.to_string(),
        }
    }
}

/// Split `| a | b |` into trimmed cells.
fn split_table_row(row: &str) -> Vec<String> {
    let inner = row.strip_prefix('|').unwrap_or(row);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Whether a line ends like a sentence rather than a title.
pub(crate) fn ends_with_terminal_punctuation(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .is_some_and(|c| TERMINAL_PUNCTUATION.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_normalized() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_collapse_whitespace() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("Hello    world  "), "Hello world");
        assert_eq!(normalizer.normalize("   \t  "), "");
    }

    #[test]
    fn test_indent_preserved_and_tabs_expanded() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("\t- nested"), "    - nested");

        let flat = TextNormalizer::new().with_preserve_indent(false);
        assert_eq!(flat.normalize("\t- nested"), "- nested");
    }

    #[test]
    fn test_nfc_composition() {
        let normalizer = TextNormalizer::new();
        // "e" followed by a combining acute accent composes to U+00E9.
        assert_eq!(normalizer.normalize("caf\u{0065}\u{0301}"), "caf\u{00E9}");
    }

    #[test]
    fn test_classify_bullets() {
        let normalizer = TextNormalizer::new();
        assert_eq!(
            normalizer.classify("- first"),
            LineKind::Bullet {
                depth: 0,
                text: "first".into()
            }
        );
        assert_eq!(
            normalizer.classify("    2) second"),
            LineKind::Bullet {
                depth: 2,
                text: "second".into()
            }
        );
        assert_eq!(
            normalizer.classify("\u{2022} dot"),
            LineKind::Bullet {
                depth: 0,
                text: "dot".into()
            }
        );
        // A hyphenated word is not a bullet.
        assert!(matches!(normalizer.classify("-not a bullet"), LineKind::Text { .. }));
    }

    #[test]
    fn test_classify_headings_rules_tables() {
        let normalizer = TextNormalizer::new();
        assert_eq!(
            normalizer.classify("## Results ##"),
            LineKind::Heading {
                level: 2,
                text: "Results".into()
            }
        );
        assert_eq!(normalizer.classify("---"), LineKind::Rule);
        assert_eq!(normalizer.classify("|---|:-:|"), LineKind::TableRow(None));
        assert_eq!(
            normalizer.classify("| a | b |"),
            LineKind::TableRow(Some(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_terminal_punctuation() {
        assert!(ends_with_terminal_punctuation("Done."));
        assert!(ends_with_terminal_punctuation("\u{0928}\u{092E}\u{0938}\u{094D}\u{0924}\u{0947}\u{0964}"));
        assert!(!ends_with_terminal_punctuation("Intro"));
    }
}
