//! End-to-end export: resolve, analyze, lay out, encode.
//!
//! Every call builds its own deck and style table, so one [`Pipeline`] can
//! serve concurrent requests from several threads.

use crate::analysis::{AnalysisHints, AnalysisResult, Analyzer};
use crate::config::EngineConfig;
use crate::error::{CodecError, Result};
use crate::layout::LayoutEngine;
use crate::style::StyleResolver;
use crate::types::{Deck, SlideSize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pptx,
    Pdf,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pptx => "pptx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pptx" => Ok(ExportFormat::Pptx),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serializes a laid-out deck into one document format.
pub trait DeckEncoder: Send + Sync {
    fn format(&self) -> ExportFormat;

    /// Encode `deck`. All-or-nothing: no bytes are returned on failure.
    fn encode(&self, deck: &Deck) -> std::result::Result<Vec<u8>, CodecError>;
}

/// A finished document, handed over to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    bytes: Vec<u8>,
    mime_type: &'static str,
    filename: String,
}

impl ExportArtifact {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Suggested download name.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// What the caller wants exported. Enum values are raw ids and are
/// validated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest<'a> {
    pub raw_text: &'a str,
    pub theme: &'a str,
    pub tone: &'a str,
    pub language: &'a str,
    /// Written into document metadata. Left out, documents carry no date.
    pub created: Option<DateTime<Utc>>,
}

impl<'a> ExportRequest<'a> {
    pub fn new(raw_text: &'a str, theme: &'a str, tone: &'a str, language: &'a str) -> Self {
        Self {
            raw_text,
            theme,
            tone,
            language,
            created: None,
        }
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

/// Runs analysis, styling, layout and encoding in sequence.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EngineConfig,
    analyzer: Analyzer,
    resolver: StyleResolver,
    layout: LayoutEngine,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            analyzer: Analyzer::new(config.analysis.clone()),
            resolver: StyleResolver::new(),
            layout: LayoutEngine::new(config.layout.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analysis only.
    pub fn analyze(&self, raw_text: &str, hints: &AnalysisHints) -> Result<AnalysisResult> {
        Ok(self.analyzer.analyze(raw_text, hints)?)
    }

    /// Build the laid-out deck for a request.
    ///
    /// Enum ids are checked before the text is looked at, so an unknown
    /// theme fails fast even for unusable text.
    pub fn prepare(&self, request: &ExportRequest<'_>) -> Result<Deck> {
        let rule = self
            .resolver
            .resolve(request.theme, request.tone, request.language)?;

        let hints = AnalysisHints::default()
            .with_language(rule.language)
            .with_tone(rule.tone);
        let analysis = self.analyzer.analyze(request.raw_text, &hints)?;

        let mut meta = analysis.meta(rule.theme, rule.tone);
        meta.language = rule.language;
        if let Some(created) = request.created {
            meta = meta.with_created(created);
        }

        let size = SlideSize {
            width: self.config.layout.slide_width,
            height: self.config.layout.slide_height,
        };
        let styled = analysis.to_deck(meta)?.with_size(size).with_style(rule.clone());
        log::debug!(
            "Styled deck: {} slides, {} blocks",
            styled.slides().len(),
            styled.block_count()
        );

        Ok(self.layout.layout(&styled, &rule)?)
    }

    /// Run the whole pipeline and encode with `encoder`.
    pub fn export(
        &self,
        request: &ExportRequest<'_>,
        encoder: &dyn DeckEncoder,
    ) -> Result<ExportArtifact> {
        let deck = self.prepare(request)?;
        self.encode(&deck, encoder)
    }

    /// Encode an already laid-out deck.
    pub fn encode(&self, deck: &Deck, encoder: &dyn DeckEncoder) -> Result<ExportArtifact> {
        let format = encoder.format();
        let bytes = encoder.encode(deck)?;
        log::debug!("Encoded {} ({} bytes)", format, bytes.len());

        Ok(ExportArtifact {
            bytes,
            mime_type: format.mime_type(),
            filename: format!("{}.{}", file_stem(deck.title()), format.extension()),
        })
    }
}

/// Longest file stem derived from a title.
const MAX_STEM_CHARS: usize = 60;

/// ASCII slug of `title`, or `presentation` if nothing usable remains.
pub fn file_stem(title: Option<&str>) -> String {
    let mut slug = String::new();
    for c in title.unwrap_or_default().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_STEM_CHARS {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "presentation".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorClass, StyleError};
    use crate::style::{Language, Theme, Tone};
    use crate::types::{BlockKind, Joint};
    use chrono::TimeZone;

    /// Writes one line per slide with its block kinds and frame tops.
    struct OutlineEncoder;

    impl DeckEncoder for OutlineEncoder {
        fn format(&self) -> ExportFormat {
            ExportFormat::Pdf
        }

        fn encode(&self, deck: &Deck) -> std::result::Result<Vec<u8>, CodecError> {
            let mut out = String::new();
            for (i, slide) in deck.slides().iter().enumerate() {
                out.push_str(&format!("{}:", i));
                for block in slide.blocks() {
                    let placement = block.placement().ok_or(CodecError::InvalidBlock {
                        slide: i,
                        block: 0,
                        reason: "no placement".into(),
                    })?;
                    out.push_str(&format!(" {}@{:.3}", block.kind(), placement.frame.y));
                }
                out.push('\n');
            }
            Ok(out.into_bytes())
        }
    }

    #[test]
    fn test_unknown_theme_fails_before_analysis() {
        let pipeline = Pipeline::default();
        let err = pipeline
            .export(&ExportRequest::new("   ", "neon", "formal", "en"), &OutlineEncoder)
            .unwrap_err();
        assert!(matches!(err, Error::Style(StyleError::UnknownTheme(_))));
        assert_eq!(err.class(), ErrorClass::Input);
    }

    #[test]
    fn test_blank_text_is_input_error() {
        let err = Pipeline::default()
            .export(&ExportRequest::new("\n\n", "academic", "formal", "en"), &OutlineEncoder)
            .unwrap_err();
        assert!(matches!(err, Error::Analysis(_)));
        assert_eq!(err.class(), ErrorClass::Input);
    }

    #[test]
    fn test_export_artifact() {
        let request = ExportRequest::new(
            "# Quarterly Results!\nRevenue grew.\n\n# Outlook\n- hire\n- ship",
            "professional",
            "formal",
            "hi",
        );
        let pipeline = Pipeline::default();
        let artifact = pipeline.export(&request, &OutlineEncoder).unwrap();
        assert_eq!(artifact.mime_type(), "application/pdf");
        assert_eq!(artifact.filename(), "quarterly-results.pdf");

        let text = String::from_utf8(artifact.into_bytes()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("0: heading@"));

        // The requested language wins over the detected one.
        let deck = pipeline.prepare(&request).unwrap();
        assert_eq!(deck.meta().language, Language::Hi);
    }

    #[test]
    fn test_export_is_deterministic() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let request = ExportRequest::new("Intro\n\nBody line one.\nBody line two.", "medical", "casual", "en")
            .with_created(created);
        let pipeline = Pipeline::default();
        let a = pipeline.export(&request, &OutlineEncoder).unwrap();
        let b = pipeline.export(&request, &OutlineEncoder).unwrap();
        assert_eq!(a, b);
        assert_eq!(pipeline.prepare(&request).unwrap().meta().created, Some(created));
    }

    #[test]
    fn test_prepare_keeps_every_payload() {
        let mut text = format!(
            "# Plan\n- {}\n- next step\n\n# Scores\n| Item | Notes |\n|---|---|\n",
            "word ".repeat(1500)
        );
        for i in 0..8 {
            text.push_str(&format!("| row {} | {} |\n", i, "note ".repeat(140)));
        }

        let pipeline = Pipeline::default();
        let deck = pipeline
            .prepare(&ExportRequest::new(&text, "professional", "formal", "en"))
            .unwrap();

        let hints = AnalysisHints::default()
            .with_language(Language::En)
            .with_tone(Tone::Formal);
        let analysis = pipeline.analyze(&text, &hints).unwrap();
        let before = analysis
            .to_deck(analysis.meta(Theme::Professional, Tone::Formal))
            .unwrap();

        assert_eq!(deck.payloads(), before.payloads());
        assert!(deck.slides().len() > before.slides().len() + 2);

        // Both the long bullet item and the table were carried over.
        let joints: Vec<(BlockKind, Joint)> = deck
            .slides()
            .iter()
            .flat_map(|s| s.blocks())
            .filter_map(|b| b.joint().map(|j| (b.kind(), j)))
            .collect();
        assert!(joints.contains(&(BlockKind::BulletList, Joint::Within(' '))));
        assert!(joints.contains(&(BlockKind::Table, Joint::Between)));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Some("Hello, World!")), "hello-world");
        assert_eq!(file_stem(Some("  --  ")), "presentation");
        assert_eq!(file_stem(Some("\u{0928}\u{092E}\u{0938}\u{094D}\u{0924}\u{0947}")), "presentation");
        assert_eq!(file_stem(None), "presentation");
        assert!(file_stem(Some(&"a".repeat(200))).len() <= MAX_STEM_CHARS);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!(ExportFormat::Pptx.to_string(), "pptx");
        assert!("docx".parse::<ExportFormat>().is_err());
    }
}
