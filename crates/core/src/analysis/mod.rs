//! Analysis of raw extracted text.
//!
//! Produces language, tone and theme suggestions plus proposed slide
//! boundaries. Suggestions are advisory: the caller decides which theme,
//! tone and language the export actually uses.

mod language;
mod normalize;
mod segment;
mod signals;

pub use language::{detect_language, DetectionSource, LanguageDetection};
pub use normalize::TextNormalizer;
pub use segment::{ProposedSlide, Segmenter};
pub use signals::{assess_tone, suggest_theme, ToneAssessment, ToneScore};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, InputError};
use crate::style::{Language, Theme, Tone};
use crate::types::{Block, Deck, DeckMeta, Slide};
use serde::{Deserialize, Serialize};

/// Optional caller hints, used only when the text itself is inconclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHints {
    pub language_hint: Option<Language>,
    pub tone_hint: Option<Tone>,
}

impl AnalysisHints {
    pub fn with_language(mut self, language: Language) -> Self {
        self.language_hint = Some(language);
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone_hint = Some(tone);
        self
    }
}

/// Everything analysis learned about a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub detected_tone: Tone,
    pub tone_scores: Vec<ToneScore>,
    pub detected_theme: Option<Theme>,
    pub detected_language: Language,
    pub language_detection: LanguageDetection,
    pub proposed_slides: Vec<ProposedSlide>,
}

impl AnalysisResult {
    /// Build an unstyled deck from the proposed slides.
    pub fn to_deck(&self, meta: DeckMeta) -> Result<Deck, InputError> {
        let slides = self
            .proposed_slides
            .iter()
            .map(|proposed| Slide::new(proposed.blocks.iter().cloned().map(Block::new).collect()))
            .collect();

        Deck::new(meta, slides)
    }

    /// Deck metadata using the detected language.
    pub fn meta(&self, theme: Theme, tone: Tone) -> DeckMeta {
        DeckMeta::new(theme, tone, self.detected_language)
    }

    pub fn block_count(&self) -> usize {
        self.proposed_slides.iter().map(|s| s.blocks.len()).sum()
    }
}

/// Runs normalization, detection and segmentation over raw text.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    normalizer: TextNormalizer,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let normalizer = TextNormalizer::new().with_preserve_indent(config.nested_bullets);
        Self { config, normalizer }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `raw_text`.
    ///
    /// All-or-nothing: either a complete result or an error. Text with no
    /// content beyond whitespace and rules is [`AnalysisError::EmptyInput`].
    pub fn analyze(
        &self,
        raw_text: &str,
        hints: &AnalysisHints,
    ) -> Result<AnalysisResult, AnalysisError> {
        if raw_text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let text = self.normalizer.normalize(raw_text);
        let proposed_slides = Segmenter::new(&self.config, &self.normalizer).segment(&text);
        if proposed_slides.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let language_detection =
            detect_language(&text, hints.language_hint, self.config.default_language);
        let tone = assess_tone(&text, hints.tone_hint);
        let detected_theme = suggest_theme(&text);

        log::debug!(
            "Analyzed {} chars into {} proposed slides (language {}, tone {})",
            raw_text.len(),
            proposed_slides.len(),
            language_detection.language,
            tone.tone
        );

        Ok(AnalysisResult {
            detected_tone: tone.tone,
            tone_scores: tone.scores,
            detected_theme,
            detected_language: language_detection.language,
            language_detection,
            proposed_slides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockContent;

    #[test]
    fn test_intro_example() {
        let result = Analyzer::default()
            .analyze("Intro\n\nBody line one.\nBody line two.", &AnalysisHints::default())
            .unwrap();
        assert_eq!(result.proposed_slides.len(), 1);
        assert_eq!(
            result.proposed_slides[0].blocks,
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
        assert_eq!(result.detected_language, Language::En);
    }

    #[test]
    fn test_blank_input_rejected() {
        let analyzer = Analyzer::default();
        let hints = AnalysisHints::default();
        assert_eq!(analyzer.analyze("", &hints), Err(AnalysisError::EmptyInput));
        assert_eq!(
            analyzer.analyze(" \n\t\r\n ", &hints),
            Err(AnalysisError::EmptyInput)
        );
        assert_eq!(analyzer.analyze("---\n***", &hints), Err(AnalysisError::EmptyInput));
    }

    #[test]
    fn test_hints_used_when_text_is_inconclusive() {
        let hints = AnalysisHints::default()
            .with_language(Language::Hi)
            .with_tone(Tone::Storytelling);
        let result = Analyzer::default().analyze("42\n\n7 + 5", &hints).unwrap();
        assert_eq!(result.detected_language, Language::Hi);
        assert_eq!(result.language_detection.source, DetectionSource::Hint);
        assert_eq!(result.detected_tone, Tone::Storytelling);
    }

    #[test]
    fn test_to_deck_keeps_order() {
        let result = Analyzer::default()
            .analyze("# First\nAlpha.\n\n# Second\nBeta.", &AnalysisHints::default())
            .unwrap();
        let deck = result
            .to_deck(result.meta(Theme::Minimalist, Tone::Formal))
            .unwrap();
        assert_eq!(deck.slides().len(), 2);
        assert_eq!(deck.block_count(), result.block_count());
        assert_eq!(deck.title(), Some("First"));
        assert_eq!(deck.meta().language, Language::En);
    }

    #[test]
    fn test_flat_bullets_when_nesting_disabled() {
        let text = "# Steps\n- plan\n  - research\n    - interviews\n- build";
        let depths = |analyzer: Analyzer| -> Vec<u8> {
            let result = analyzer.analyze(text, &AnalysisHints::default()).unwrap();
            result.proposed_slides[0]
                .blocks
                .iter()
                .filter_map(|b| match b {
                    BlockContent::BulletList { items } => Some(items.iter().map(|i| i.depth)),
                    _ => None,
                })
                .flatten()
                .collect()
        };

        assert_eq!(depths(Analyzer::default()), vec![0, 1, 2, 0]);
        let flat = AnalysisConfig {
            nested_bullets: false,
            ..AnalysisConfig::default()
        };
        assert_eq!(depths(Analyzer::new(flat)), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = Analyzer::default()
            .analyze("Clinical treatment for patients.", &AnalysisHints::default())
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["detectedTheme"], "medical");
        assert_eq!(json["detectedLanguage"], "en");
        assert!(json["proposedSlides"].is_array());
        assert_eq!(json["proposedSlides"][0]["blocks"][0]["kind"], "bodyText");
    }
}
