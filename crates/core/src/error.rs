//! Error types for deck analysis, styling, layout and export.

use crate::types::BlockKind;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur anywhere in the export pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// The request itself is malformed.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Raw text could not be analyzed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// A theme, tone or language id is outside its closed set.
    #[error(transparent)]
    Style(#[from] StyleError),

    /// A block cannot be placed on a slide.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A codec failed to serialize the deck.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Engine configuration is unreadable or inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification used by adapters to pick a user-facing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller supplied bad content or an unknown enum value.
    Input,
    /// Content cannot be laid out; caller may adjust and resubmit.
    Layout,
    /// Internal fault; details are not exposed.
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Input(_) | Error::Analysis(_) | Error::Style(_) => ErrorClass::Input,
            Error::Codec(CodecError::MissingGlyph { .. }) => ErrorClass::Input,
            Error::Layout(_) => ErrorClass::Layout,
            Error::Codec(_) | Error::Config(_) => ErrorClass::Internal,
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Codec faults collapse to a generic message so object-graph and
    /// archive details never leak through an adapter.
    pub fn public_message(&self) -> String {
        match self.class() {
            ErrorClass::Internal => "Failed to generate the presentation".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Malformed request content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A deck must contain at least one slide.
    #[error("A deck needs at least one slide")]
    EmptyDeck,

    /// Image bytes could not be recognized.
    #[error("Unsupported image '{name}': {reason}")]
    UnsupportedImage { name: String, reason: String },
}

/// Failures of the analysis pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Text was empty or whitespace only.
    #[error("Input text is empty")]
    EmptyInput,
}

/// Closed-enum classification failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Unknown tone: {0}")]
    UnknownTone(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
}

/// Layout failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A single block exceeds the slide even at the smallest allowed size.
    #[error("Block {block} ({kind}) on slide {slide} cannot be placed: {reason}")]
    Unplaceable {
        /// 0-based index of the source slide.
        slide: usize,
        /// 0-based index of the block within the source slide.
        block: usize,
        kind: BlockKind,
        reason: String,
    },
}

/// Codec failures. Apart from [`CodecError::MissingGlyph`] these indicate
/// an internal fault rather than bad input.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A block cannot be mapped to the target format.
    #[error("Invalid block {block} on slide {slide}: {reason}")]
    InvalidBlock {
        slide: usize,
        block: usize,
        reason: String,
    },

    /// The object graph has a cycle through ownership edges.
    #[error("Object graph cycle involving object {0}")]
    ObjectGraphCycle(u32),

    /// An object references another object that was never defined.
    #[error("Object {from} references undefined object {to}")]
    DanglingReference { from: u32, to: u32 },

    /// No available font can show a character of the text.
    #[error("No PDF font has a glyph for {ch:?} (block {block} on slide {slide}); configure a Unicode font")]
    MissingGlyph { slide: usize, block: usize, ch: char },

    /// A font file could not be parsed or embedded.
    #[error("Font error: {0}")]
    Font(String),

    /// ZIP archive error (for PPTX).
    #[error("Archive error: {0}")]
    Archive(String),

    /// XML writing or parsing error (for PPTX).
    #[error("XML error: {0}")]
    Xml(String),

    /// Embedded image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// Failed to write output bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Config validation failed: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            Error::from(AnalysisError::EmptyInput).class(),
            ErrorClass::Input
        );
        assert_eq!(
            Error::from(StyleError::UnknownTheme("x".into())).class(),
            ErrorClass::Input
        );
        assert_eq!(
            Error::from(CodecError::ObjectGraphCycle(3)).class(),
            ErrorClass::Internal
        );
        let missing = Error::from(CodecError::MissingGlyph {
            slide: 1,
            block: 0,
            ch: '\u{0928}',
        });
        assert_eq!(missing.class(), ErrorClass::Input);
        assert!(missing.public_message().contains("glyph"));
    }

    #[test]
    fn test_public_message_hides_codec_details() {
        let err = Error::from(CodecError::DanglingReference { from: 4, to: 9 });
        assert_eq!(err.public_message(), "Failed to generate the presentation");

        let err = Error::from(StyleError::UnknownTheme("neon".into()));
        assert_eq!(err.public_message(), "Unknown theme: neon");
    }
}
