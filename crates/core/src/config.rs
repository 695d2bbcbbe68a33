//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. Reading the file is the caller's job; the engine only
//! parses text.

use crate::error::ConfigError;
use crate::style::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
}

/// Segmentation limits and detection fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum blocks on one proposed slide.
    #[serde(default = "default_max_blocks_per_slide")]
    pub max_blocks_per_slide: usize,
    /// Maximum items in one bullet list block.
    #[serde(default = "default_max_bullets_per_list")]
    pub max_bullets_per_list: usize,
    /// Maximum rows in one table block.
    #[serde(default = "default_max_table_rows")]
    pub max_table_rows: usize,
    /// Maximum characters in one body text block.
    #[serde(default = "default_max_block_chars")]
    pub max_block_chars: usize,
    /// Longest stand-alone line still treated as a heading.
    #[serde(default = "default_heading_max_chars")]
    pub heading_max_chars: usize,
    /// Language used when detection and hints both come up empty.
    #[serde(default = "default_language")]
    pub default_language: Language,
    /// Keep indented bullets nested. When off, every item is top level.
    #[serde(default = "default_true")]
    pub nested_bullets: bool,
}

/// Slide geometry and overflow policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Slide width in points.
    #[serde(default = "default_slide_width")]
    pub slide_width: f64,
    /// Slide height in points.
    #[serde(default = "default_slide_height")]
    pub slide_height: f64,
    /// Smallest font scale tried before spacing is reduced.
    #[serde(default = "default_min_font_scale")]
    pub min_font_scale: f64,
    /// Decrement between font scales tried.
    #[serde(default = "default_font_scale_step")]
    pub font_scale_step: f64,
    /// Block spacing multiplier used once font shrinking is exhausted.
    #[serde(default = "default_reduced_spacing_ratio")]
    pub reduced_spacing_ratio: f64,
    /// Smallest fraction of its natural size an image may be scaled to.
    #[serde(default = "default_min_image_scale")]
    pub min_image_scale: f64,
    /// Pixel density assumed for images without physical size.
    #[serde(default = "default_image_dpi")]
    pub image_dpi: f64,
}

/// PDF serialization switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Flate-compress page content streams.
    #[serde(default = "default_true")]
    pub compress_streams: bool,
    /// TrueType font embedded for text the standard fonts cannot show,
    /// such as Devanagari. Loading it is the caller's job.
    #[serde(default)]
    pub unicode_font: Option<PathBuf>,
}

fn default_max_blocks_per_slide() -> usize {
    6
}

fn default_max_bullets_per_list() -> usize {
    8
}

fn default_max_table_rows() -> usize {
    10
}

fn default_max_block_chars() -> usize {
    600
}

fn default_heading_max_chars() -> usize {
    80
}

fn default_language() -> Language {
    Language::En
}

fn default_slide_width() -> f64 {
    720.0
}

fn default_slide_height() -> f64 {
    405.0
}

fn default_min_font_scale() -> f64 {
    0.7
}

fn default_font_scale_step() -> f64 {
    0.05
}

fn default_reduced_spacing_ratio() -> f64 {
    0.5
}

fn default_min_image_scale() -> f64 {
    0.25
}

fn default_image_dpi() -> f64 {
    96.0
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_blocks_per_slide: default_max_blocks_per_slide(),
            max_bullets_per_list: default_max_bullets_per_list(),
            max_table_rows: default_max_table_rows(),
            max_block_chars: default_max_block_chars(),
            heading_max_chars: default_heading_max_chars(),
            default_language: default_language(),
            nested_bullets: default_true(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            slide_width: default_slide_width(),
            slide_height: default_slide_height(),
            min_font_scale: default_min_font_scale(),
            font_scale_step: default_font_scale_step(),
            reduced_spacing_ratio: default_reduced_spacing_ratio(),
            min_image_scale: default_min_image_scale(),
            image_dpi: default_image_dpi(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            compress_streams: default_true(),
            unicode_font: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Segmentation caps are at least 1
    /// - Slide dimensions are positive
    /// - Scale ratios lie in (0, 1] and the scale step is positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if a.max_blocks_per_slide == 0
            || a.max_bullets_per_list == 0
            || a.max_table_rows == 0
            || a.max_block_chars == 0
        {
            return Err(ConfigError::Invalid(
                "analysis limits must be at least 1".to_string(),
            ));
        }

        let l = &self.layout;
        if !(l.slide_width > 0.0 && l.slide_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "slide size must be positive, got {}x{}",
                l.slide_width, l.slide_height
            )));
        }
        for (name, value) in [
            ("min_font_scale", l.min_font_scale),
            ("reduced_spacing_ratio", l.reduced_spacing_ratio),
            ("min_image_scale", l.min_image_scale),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if !(l.font_scale_step > 0.0) || !(l.image_dpi > 0.0) {
            return Err(ConfigError::Invalid(
                "font_scale_step and image_dpi must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            [analysis]
            max_blocks_per_slide = 4
            default_language = "hi"

            [pdf]
            compress_streams = false
            unicode_font = "fonts/NotoSansDevanagari-Regular.ttf"
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.max_blocks_per_slide, 4);
        assert_eq!(config.analysis.max_bullets_per_list, 8);
        assert_eq!(config.analysis.default_language, Language::Hi);
        assert!(!config.pdf.compress_streams);
        assert_eq!(
            config.pdf.unicode_font.as_deref(),
            Some(std::path::Path::new("fonts/NotoSansDevanagari-Regular.ttf"))
        );
        assert!(config.analysis.nested_bullets);
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_ratios() {
        let err = EngineConfig::from_toml_str("[layout]\nmin_font_scale = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_toml_str("[analysis]\nmax_blocks_per_slide = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = EngineConfig::from_toml_str("[layout\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
