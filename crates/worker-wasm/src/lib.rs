//! WASM-compatible wrapper for deck analysis and export.
//!
//! This crate exposes the analysis and export pipeline to JavaScript
//! for use in Cloudflare Workers. The worker extracts the text; this
//! side returns analysis results or finished documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slide_core::style::{list_languages, list_themes, list_tones, ThemeInfo};
use slide_core::{
    AnalysisHints, AnalysisResult, DeckEncoder, ExportArtifact, ExportFormat, ExportRequest,
    Language, Pipeline, Tone,
};
use slide_pdf::PdfEncoder;
use slide_pptx::PptxEncoder;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Export request as sent by the worker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInput {
    pub raw_text: String,
    pub theme: String,
    pub tone: String,
    pub language: String,
    /// Creation time recorded in document metadata. Omit for
    /// reproducible output.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Analysis request as sent by the worker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeInput {
    pub raw_text: String,
    #[serde(default)]
    pub language_hint: Option<String>,
    #[serde(default)]
    pub tone_hint: Option<String>,
}

/// Available themes, tones and languages.
#[derive(Debug, Serialize)]
pub struct Catalog {
    pub themes: Vec<ThemeInfo>,
    pub tones: Vec<&'static str>,
    pub languages: Vec<&'static str>,
}

/// A finished document handed back to JavaScript.
#[wasm_bindgen]
pub struct ExportedDeck {
    artifact: ExportArtifact,
}

#[wasm_bindgen]
impl ExportedDeck {
    /// Document bytes, as a `Uint8Array`.
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.artifact.bytes().to_vec()
    }

    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        self.artifact.mime_type().to_string()
    }

    #[wasm_bindgen(getter, js_name = suggestedFilename)]
    pub fn suggested_filename(&self) -> String {
        self.artifact.filename().to_string()
    }
}

/// Analyze raw text.
///
/// # Arguments
/// * `input` - `{ rawText, languageHint?, toneHint? }`
///
/// # Returns
/// A JavaScript object with the analysis result, or throws on error.
#[wasm_bindgen]
pub fn analyze_content(input: JsValue) -> Result<JsValue, JsValue> {
    let input: AnalyzeInput = serde_wasm_bindgen::from_value(input)
        .map_err(|e| JsValue::from_str(&format!("Invalid analyze request: {}", e)))?;

    let result = analyze_content_impl(&input).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn analyze_content_impl(input: &AnalyzeInput) -> Result<AnalysisResult, String> {
    let mut hints = AnalysisHints::default();
    if let Some(language) = &input.language_hint {
        hints = hints.with_language(language.parse::<Language>().map_err(|e| e.to_string())?);
    }
    if let Some(tone) = &input.tone_hint {
        hints = hints.with_tone(tone.parse::<Tone>().map_err(|e| e.to_string())?);
    }

    Pipeline::default()
        .analyze(&input.raw_text, &hints)
        .map_err(|e| e.public_message())
}

/// Export raw text as a PowerPoint deck.
///
/// # Arguments
/// * `input` - `{ rawText, theme, tone, language, createdAt? }`
#[wasm_bindgen]
pub fn export_pptx(input: JsValue) -> Result<ExportedDeck, JsValue> {
    export(input, ExportFormat::Pptx)
}

/// Export raw text as a PDF document.
///
/// # Arguments
/// * `input` - `{ rawText, theme, tone, language, createdAt? }`
#[wasm_bindgen]
pub fn export_pdf(input: JsValue) -> Result<ExportedDeck, JsValue> {
    export(input, ExportFormat::Pdf)
}

fn export(input: JsValue, format: ExportFormat) -> Result<ExportedDeck, JsValue> {
    let input: ExportInput = serde_wasm_bindgen::from_value(input)
        .map_err(|e| JsValue::from_str(&format!("Invalid export request: {}", e)))?;

    let artifact = export_impl(&input, format).map_err(|e| JsValue::from_str(&e))?;
    Ok(ExportedDeck { artifact })
}

fn export_impl(input: &ExportInput, format: ExportFormat) -> Result<ExportArtifact, String> {
    let pipeline = Pipeline::default();
    let encoder: Box<dyn DeckEncoder> = match format {
        ExportFormat::Pptx => Box::new(PptxEncoder::new()),
        ExportFormat::Pdf => Box::new(PdfEncoder::new(pipeline.config().pdf.clone())),
    };

    let mut request =
        ExportRequest::new(&input.raw_text, &input.theme, &input.tone, &input.language);
    if let Some(created) = input.created_at {
        request = request.with_created(created);
    }

    pipeline
        .export(&request, encoder.as_ref())
        .map_err(|e| e.public_message())
}

/// List the available themes (with colors), tones and languages.
#[wasm_bindgen]
pub fn list_options() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&list_options_impl())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn list_options_impl() -> Catalog {
    Catalog {
        themes: list_themes(),
        tones: list_tones(),
        languages: list_languages(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(theme: &str) -> ExportInput {
        ExportInput {
            raw_text: "# Launch Plan\n- Design\n- Build\n- Ship".to_string(),
            theme: theme.to_string(),
            tone: "technical".to_string(),
            language: "en".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_export_pptx() {
        let artifact = export_impl(&request("creative"), ExportFormat::Pptx).unwrap();
        assert!(artifact.bytes().starts_with(b"PK"));
        assert_eq!(artifact.filename(), "launch-plan.pptx");
    }

    #[test]
    fn test_export_pdf() {
        let artifact = export_impl(&request("medical"), ExportFormat::Pdf).unwrap();
        assert!(artifact.bytes().starts_with(b"%PDF-1.7"));
        assert_eq!(artifact.mime_type(), "application/pdf");
    }

    #[test]
    fn test_unknown_theme_is_reported() {
        let err = export_impl(&request("neon"), ExportFormat::Pdf).unwrap_err();
        assert!(err.contains("neon"));
    }

    #[test]
    fn test_analyze_with_hints() {
        let input = AnalyzeInput {
            raw_text: "# Intro\nHello there".to_string(),
            language_hint: Some("en".to_string()),
            tone_hint: None,
        };
        let result = analyze_content_impl(&input).unwrap();
        assert_eq!(result.detected_language, Language::En);
        assert!(!result.proposed_slides.is_empty());

        let bad = AnalyzeInput {
            tone_hint: Some("angry".to_string()),
            ..input
        };
        assert!(analyze_content_impl(&bad).is_err());
    }

    #[test]
    fn test_list_options() {
        let catalog = list_options_impl();
        assert_eq!(catalog.themes.len(), 5);
        assert_eq!(catalog.tones.len(), 5);
        assert_eq!(catalog.languages, vec!["en", "hi"]);
    }
}
