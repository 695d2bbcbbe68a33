//! Segmentation of normalized text into proposed slides and blocks.

use super::normalize::{ends_with_terminal_punctuation, LineKind, TextNormalizer};
use crate::config::AnalysisConfig;
use crate::types::{BlockContent, BulletItem};
use serde::Serialize;

/// Most words a stand-alone line may have to count as a heading.
const HEADING_MAX_WORDS: usize = 10;

/// A proposed slide: blocks in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposedSlide {
    pub blocks: Vec<BlockContent>,
}

impl ProposedSlide {
    pub fn new(blocks: Vec<BlockContent>) -> Self {
        Self { blocks }
    }
}

/// Structural units found while scanning lines.
#[derive(Debug)]
enum Unit {
    /// Start a new slide if the current one has content.
    Break,
    Block(BlockContent),
}

/// Lines being collected into one block.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    None,
    Paragraph(Vec<String>),
    Bullets(Vec<BulletItem>),
    Table(Vec<Vec<String>>),
}

/// Splits normalized text into slides.
#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    config: &'a AnalysisConfig,
    normalizer: &'a TextNormalizer,
}

impl<'a> Segmenter<'a> {
    pub fn new(config: &'a AnalysisConfig, normalizer: &'a TextNormalizer) -> Self {
        Self { config, normalizer }
    }

    /// Segment normalized text into proposed slides, preserving order.
    pub fn segment(&self, text: &str) -> Vec<ProposedSlide> {
        let units = self.scan(text);

        let mut slides: Vec<Vec<BlockContent>> = Vec::new();
        let mut current: Vec<BlockContent> = Vec::new();
        for unit in units {
            match unit {
                Unit::Break => {
                    if !current.is_empty() {
                        slides.push(std::mem::take(&mut current));
                    }
                }
                Unit::Block(block) => current.push(block),
            }
        }
        if !current.is_empty() {
            slides.push(current);
        }

        // Oversized sections continue on following slides.
        let cap = self.config.max_blocks_per_slide.max(1);
        slides
            .into_iter()
            .flat_map(|blocks| {
                blocks
                    .chunks(cap)
                    .map(|chunk| ProposedSlide::new(chunk.to_vec()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn scan(&self, text: &str) -> Vec<Unit> {
        let mut units = Vec::new();
        let mut pending = Pending::None;
        let mut blank_run = 0usize;

        for line in text.lines() {
            let kind = self.normalizer.classify(line);

            if kind == LineKind::Blank {
                self.flush(&mut pending, &mut units);
                blank_run += 1;
                if blank_run == 2 {
                    units.push(Unit::Break);
                }
                continue;
            }
            blank_run = 0;

            match kind {
                LineKind::Blank => unreachable!("handled above"),
                LineKind::Rule => {
                    self.flush(&mut pending, &mut units);
                    units.push(Unit::Break);
                }
                LineKind::Heading { level, text } => {
                    self.flush(&mut pending, &mut units);
                    if level <= 2 {
                        units.push(Unit::Break);
                    }
                    units.push(Unit::Block(BlockContent::Heading { text, level }));
                }
                LineKind::Bullet { depth, text } => {
                    if !matches!(pending, Pending::Bullets(_)) {
                        self.flush(&mut pending, &mut units);
                        pending = Pending::Bullets(Vec::new());
                    }
                    if let Pending::Bullets(items) = &mut pending {
                        items.push(BulletItem::new(text, depth));
                    }
                }
                LineKind::TableRow(row) => {
                    if !matches!(pending, Pending::Table(_)) {
                        self.flush(&mut pending, &mut units);
                        pending = Pending::Table(Vec::new());
                    }
                    if let (Pending::Table(rows), Some(row)) = (&mut pending, row) {
                        rows.push(row);
                    }
                }
                LineKind::Text { indent, text } => match &mut pending {
                    // An indented line under a bullet continues that item.
                    Pending::Bullets(items) if indent > 0 => {
                        if let Some(last) = items.last_mut() {
                            last.text.push(' ');
                            last.text.push_str(&text);
                        }
                    }
                    Pending::Paragraph(lines) => lines.push(text),
                    _ => {
                        self.flush(&mut pending, &mut units);
                        pending = Pending::Paragraph(vec![text]);
                    }
                },
            }
        }

        self.flush(&mut pending, &mut units);
        units
    }

    fn flush(&self, pending: &mut Pending, units: &mut Vec<Unit>) {
        match std::mem::take(pending) {
            Pending::None => {}
            Pending::Paragraph(lines) => {
                if lines.len() == 1 && self.is_plain_heading(&lines[0]) {
                    units.push(Unit::Break);
                    units.push(Unit::Block(BlockContent::Heading {
                        text: lines[0].clone(),
                        level: 1,
                    }));
                } else {
                    for text in split_text(&lines.join("\n"), self.config.max_block_chars) {
                        units.push(Unit::Block(BlockContent::BodyText { text }));
                    }
                }
            }
            Pending::Bullets(items) => {
                for chunk in items.chunks(self.config.max_bullets_per_list.max(1)) {
                    units.push(Unit::Block(BlockContent::BulletList {
                        items: chunk.to_vec(),
                    }));
                }
            }
            Pending::Table(rows) => {
                for chunk in rows.chunks(self.config.max_table_rows.max(1)) {
                    units.push(Unit::Block(BlockContent::Table {
                        rows: chunk.to_vec(),
                    }));
                }
            }
        }
    }

    /// A short line standing alone, without sentence punctuation.
    fn is_plain_heading(&self, line: &str) -> bool {
        line.chars().count() <= self.config.heading_max_chars
            && line.split_whitespace().count() <= HEADING_MAX_WORDS
            && !ends_with_terminal_punctuation(line)
    }
}

/// Split text into pieces of at most `max_chars` characters.
///
/// Cuts fall after sentence punctuation when possible, then between words,
/// and only as a last resort inside a word. Pieces are trimmed.
pub(crate) fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut rest = text.trim();
    while rest.chars().count() > max_chars {
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..limit];
        let word_ends_at_limit = rest[limit..].starts_with(char::is_whitespace);

        let cut = sentence_cut(rest, limit)
            .or_else(|| word_ends_at_limit.then_some(limit))
            .or_else(|| window.rfind(char::is_whitespace).filter(|&i| i > 0))
            .unwrap_or(limit);

        let (head, tail) = rest.split_at(cut);
        pieces.push(head.trim().to_string());
        rest = tail.trim_start();
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Byte index just after the last sentence end within the first `limit`
/// bytes of `text` that is followed by whitespace.
fn sentence_cut(text: &str, limit: usize) -> Option<usize> {
    let mut cut = None;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if i + c.len_utf8() > limit {
            break;
        }
        if matches!(c, '.' | '!' | '?' | '\u{0964}') {
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    cut = Some(i + c.len_utf8());
                }
            }
        }
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_with(text: &str, config: &AnalysisConfig) -> Vec<ProposedSlide> {
        let normalizer = TextNormalizer::new();
        let normalized = normalizer.normalize(text);
        Segmenter::new(config, &normalizer).segment(&normalized)
    }

    fn segment(text: &str) -> Vec<ProposedSlide> {
        segment_with(text, &AnalysisConfig::default())
    }

    #[test]
    fn test_heading_and_body() {
        let slides = segment("Intro\n\nBody line one.\nBody line two.");
        assert_eq!(slides.len(), 1);
        assert_eq!(
            slides[0].blocks,
            vec![
                BlockContent::Heading {
                    text: "Intro".into(),
                    level: 1
                },
                BlockContent::BodyText {
                    text: "Body line one.\nBody line two.".into()
                },
            ]
        );
    }

    #[test]
    fn test_headings_start_new_slides() {
        let slides = segment("# One\nText here.\n\n# Two\nMore text.\n### Detail\nDeep.");
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].blocks.len(), 2);
        // Level 3 headings stay on the current slide.
        assert_eq!(slides[1].blocks.len(), 4);
    }

    #[test]
    fn test_blank_line_runs_and_rules_break_slides() {
        let slides = segment("First para.\n\n\nSecond para.\n---\nThird para.");
        assert_eq!(slides.len(), 3);
    }

    #[test]
    fn test_bullets_with_depth_and_continuation() {
        let slides = segment("- top\n  - nested\n    wrapped tail\n- last");
        assert_eq!(
            slides[0].blocks,
            vec![BlockContent::BulletList {
                items: vec![
                    BulletItem::new("top", 0),
                    BulletItem::new("nested wrapped tail", 1),
                    BulletItem::new("last", 0),
                ]
            }]
        );
    }

    #[test]
    fn test_table_rows() {
        let slides = segment("| Name | Score |\n|---|---|\n| Ada | 9 |");
        assert_eq!(
            slides[0].blocks,
            vec![BlockContent::Table {
                rows: vec![
                    vec!["Name".into(), "Score".into()],
                    vec!["Ada".into(), "9".into()],
                ]
            }]
        );
    }

    #[test]
    fn test_block_cap_splits_in_order() {
        let config = AnalysisConfig {
            max_blocks_per_slide: 2,
            ..AnalysisConfig::default()
        };
        let slides = segment_with("A one.\n\nB two.\n\nC three.", &config);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].blocks.len(), 2);
        assert_eq!(
            slides[1].blocks,
            vec![BlockContent::BodyText {
                text: "C three.".into()
            }]
        );
    }

    #[test]
    fn test_long_bullet_list_split() {
        let config = AnalysisConfig {
            max_bullets_per_list: 2,
            ..AnalysisConfig::default()
        };
        let slides = segment_with("- a\n- b\n- c", &config);
        assert_eq!(slides[0].blocks.len(), 2);
    }

    #[test]
    fn test_split_text_prefers_sentences() {
        let pieces = split_text("One two. Three four. Five six.", 20);
        assert_eq!(pieces, vec!["One two. Three four.", "Five six."]);
    }

    #[test]
    fn test_split_text_falls_back_to_words_and_chars() {
        assert_eq!(split_text("alpha beta gamma", 11), vec!["alpha beta", "gamma"]);
        assert_eq!(split_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }
}
