//! Theme, tone and language catalogs and the style resolver.
//!
//! The catalogs are closed: any id outside them is rejected before layout
//! starts. Tone only changes weight and spacing, so a theme keeps its colors
//! and font families under every tone. Text direction depends on language
//! alone.

use crate::error::StyleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visual theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Professional,
    Academic,
    Creative,
    Minimalist,
    Medical,
}

impl Theme {
    /// All themes in catalog order.
    pub const ALL: [Theme; 5] = [
        Theme::Professional,
        Theme::Academic,
        Theme::Creative,
        Theme::Minimalist,
        Theme::Medical,
    ];

    /// Stable lowercase id.
    pub fn id(self) -> &'static str {
        match self {
            Theme::Professional => "professional",
            Theme::Academic => "academic",
            Theme::Creative => "creative",
            Theme::Minimalist => "minimalist",
            Theme::Medical => "medical",
        }
    }

    fn entry(self) -> &'static ThemeEntry {
        &THEMES[self as usize]
    }
}

impl FromStr for Theme {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        Theme::ALL
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| StyleError::UnknownTheme(s.to_string()))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Writing tone. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    Technical,
    Storytelling,
    Humorous,
}

impl Tone {
    /// All tones in priority order.
    pub const ALL: [Tone; 5] = [
        Tone::Formal,
        Tone::Casual,
        Tone::Technical,
        Tone::Storytelling,
        Tone::Humorous,
    ];

    /// Stable lowercase id.
    pub fn id(self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Technical => "technical",
            Tone::Storytelling => "storytelling",
            Tone::Humorous => "humorous",
        }
    }

    fn entry(self) -> &'static ToneEntry {
        &TONES[self as usize]
    }
}

impl FromStr for Tone {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        Tone::ALL
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| StyleError::UnknownTone(s.to_string()))
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Content language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Hi];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }

    /// English display name.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
        }
    }

    /// BCP 47 tag used in document metadata.
    pub fn tag(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Hi => "hi-IN",
        }
    }

    /// Writing direction of the language's script.
    pub fn direction(self) -> TextDirection {
        match self {
            // Latin and Devanagari both run left to right.
            Language::En | Language::Hi => TextDirection::Ltr,
        }
    }

    /// Typeface for complex-script runs, if the script needs one.
    pub fn script_typeface(self) -> Option<&'static str> {
        match self {
            Language::En => None,
            Language::Hi => Some("Mangal"),
        }
    }
}

impl FromStr for Language {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or_else(|| StyleError::UnknownLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// 24-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Uppercase hex without `#`, as OOXML expects.
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Components scaled to 0.0..=1.0, as PDF color operators expect.
    pub fn unit(self) -> [f64; 3] {
        [
            f64::from(self.0) / 255.0,
            f64::from(self.1) / 255.0,
            f64::from(self.2) / 255.0,
        ]
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("#{}", self.hex()))
    }
}

/// Font family class. Each maps to an office typeface and a PDF base font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    /// Typeface name written into PPTX runs and the theme font scheme.
    pub fn typeface(self) -> &'static str {
        match self {
            FontFamily::Sans => "Arial",
            FontFamily::Serif => "Times New Roman",
            FontFamily::Mono => "Courier New",
        }
    }

    /// Standard-14 PDF base font.
    pub fn pdf_base_font(self, bold: bool) -> &'static str {
        match (self, bold) {
            (FontFamily::Sans, false) => "Helvetica",
            (FontFamily::Sans, true) => "Helvetica-Bold",
            (FontFamily::Serif, false) => "Times-Roman",
            (FontFamily::Serif, true) => "Times-Bold",
            (FontFamily::Mono, false) => "Courier",
            (FontFamily::Mono, true) => "Courier-Bold",
        }
    }
}

/// Horizontal alignment in physical terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn mirrored(self) -> Self {
        match self {
            Align::Left => Align::Right,
            Align::Right => Align::Left,
            Align::Center => Align::Center,
        }
    }
}

/// Slide edge carrying a decorative accent bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Right,
    Top,
}

/// A solid bar in the theme's primary color along one slide edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Accent {
    pub edge: Edge,
    /// Thickness in points.
    pub thickness: f64,
}

/// Margins and alignment shared by every slide of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutTemplate {
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub heading_align: Align,
    pub body_align: Align,
    pub accent: Option<Accent>,
}

impl LayoutTemplate {
    /// Mirror for right-to-left scripts: margins and alignment swap sides.
    pub fn mirrored(self) -> Self {
        Self {
            margin_left: self.margin_right,
            margin_right: self.margin_left,
            heading_align: self.heading_align.mirrored(),
            body_align: self.body_align.mirrored(),
            accent: self.accent.map(|a| Accent {
                edge: match a.edge {
                    Edge::Left => Edge::Right,
                    Edge::Right => Edge::Left,
                    Edge::Top => Edge::Top,
                },
                ..a
            }),
            ..self
        }
    }
}

struct ThemeEntry {
    primary: Rgb,
    secondary: Rgb,
    background: Rgb,
    text: Rgb,
    heading_font: FontFamily,
    body_font: FontFamily,
    base_font_size: f64,
    heading_scale: f64,
    bullet_glyph: char,
    template: LayoutTemplate,
}

struct ToneEntry {
    heading_bold: bool,
    line_spacing: f64,
    block_spacing: f64,
}

// Indexed by `Theme as usize`.
static THEMES: [ThemeEntry; 5] = [
    // professional
    ThemeEntry {
        primary: Rgb(0x1F, 0x47, 0x88),
        secondary: Rgb(0x2E, 0x50, 0x90),
        background: Rgb(0xFF, 0xFF, 0xFF),
        text: Rgb(0x22, 0x22, 0x22),
        heading_font: FontFamily::Sans,
        body_font: FontFamily::Sans,
        base_font_size: 20.0,
        heading_scale: 1.6,
        bullet_glyph: '\u{2022}',
        template: LayoutTemplate {
            margin_left: 48.0,
            margin_right: 36.0,
            margin_top: 32.0,
            margin_bottom: 28.0,
            heading_align: Align::Left,
            body_align: Align::Left,
            accent: Some(Accent {
                edge: Edge::Left,
                thickness: 12.0,
            }),
        },
    },
    // academic
    ThemeEntry {
        primary: Rgb(0x2C, 0x3E, 0x50),
        secondary: Rgb(0x34, 0x49, 0x5E),
        background: Rgb(0xFD, 0xFD, 0xFB),
        text: Rgb(0x2C, 0x3E, 0x50),
        heading_font: FontFamily::Serif,
        body_font: FontFamily::Serif,
        base_font_size: 18.0,
        heading_scale: 1.5,
        bullet_glyph: '\u{2013}',
        template: LayoutTemplate {
            margin_left: 40.0,
            margin_right: 40.0,
            margin_top: 36.0,
            margin_bottom: 30.0,
            heading_align: Align::Left,
            body_align: Align::Left,
            accent: Some(Accent {
                edge: Edge::Top,
                thickness: 6.0,
            }),
        },
    },
    // creative
    ThemeEntry {
        primary: Rgb(0xE7, 0x4C, 0x3C),
        secondary: Rgb(0xE6, 0x7E, 0x22),
        background: Rgb(0xFF, 0xF8, 0xF0),
        text: Rgb(0x33, 0x33, 0x33),
        heading_font: FontFamily::Sans,
        body_font: FontFamily::Serif,
        base_font_size: 20.0,
        heading_scale: 1.8,
        bullet_glyph: '\u{00BB}',
        template: LayoutTemplate {
            margin_left: 44.0,
            margin_right: 44.0,
            margin_top: 40.0,
            margin_bottom: 32.0,
            heading_align: Align::Center,
            body_align: Align::Left,
            accent: Some(Accent {
                edge: Edge::Top,
                thickness: 14.0,
            }),
        },
    },
    // minimalist
    ThemeEntry {
        primary: Rgb(0x00, 0x00, 0x00),
        secondary: Rgb(0xFF, 0xFF, 0xFF),
        background: Rgb(0xFF, 0xFF, 0xFF),
        text: Rgb(0x00, 0x00, 0x00),
        heading_font: FontFamily::Sans,
        body_font: FontFamily::Sans,
        base_font_size: 18.0,
        heading_scale: 1.4,
        bullet_glyph: '-',
        template: LayoutTemplate {
            margin_left: 56.0,
            margin_right: 56.0,
            margin_top: 44.0,
            margin_bottom: 36.0,
            heading_align: Align::Left,
            body_align: Align::Left,
            accent: None,
        },
    },
    // medical
    ThemeEntry {
        primary: Rgb(0x1A, 0xBC, 0x9C),
        secondary: Rgb(0x16, 0xA0, 0x85),
        background: Rgb(0xF7, 0xFC, 0xFB),
        text: Rgb(0x1B, 0x2A, 0x2F),
        heading_font: FontFamily::Sans,
        body_font: FontFamily::Sans,
        base_font_size: 19.0,
        heading_scale: 1.5,
        bullet_glyph: '\u{2022}',
        template: LayoutTemplate {
            margin_left: 40.0,
            margin_right: 40.0,
            margin_top: 34.0,
            margin_bottom: 28.0,
            heading_align: Align::Left,
            body_align: Align::Left,
            accent: Some(Accent {
                edge: Edge::Left,
                thickness: 8.0,
            }),
        },
    },
];

// Indexed by `Tone as usize`.
static TONES: [ToneEntry; 5] = [
    // formal
    ToneEntry {
        heading_bold: true,
        line_spacing: 1.2,
        block_spacing: 14.0,
    },
    // casual
    ToneEntry {
        heading_bold: false,
        line_spacing: 1.3,
        block_spacing: 18.0,
    },
    // technical
    ToneEntry {
        heading_bold: true,
        line_spacing: 1.15,
        block_spacing: 10.0,
    },
    // storytelling
    ToneEntry {
        heading_bold: false,
        line_spacing: 1.4,
        block_spacing: 20.0,
    },
    // humorous
    ToneEntry {
        heading_bold: true,
        line_spacing: 1.3,
        block_spacing: 16.0,
    },
];

/// Resolved appearance for one theme, tone and language combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    pub theme: Theme,
    pub tone: Tone,
    pub language: Language,
    pub primary: Rgb,
    pub secondary: Rgb,
    pub background: Rgb,
    pub text_color: Rgb,
    pub heading_font: FontFamily,
    pub body_font: FontFamily,
    /// Body font size in points.
    pub base_font_size: f64,
    /// Level-1 heading size relative to the body size.
    pub heading_scale: f64,
    pub heading_bold: bool,
    /// Line height as a multiple of the font size.
    pub line_spacing: f64,
    /// Vertical gap between blocks in points.
    pub block_spacing: f64,
    pub direction: TextDirection,
    pub bullet_glyph: char,
    pub template: LayoutTemplate,
}

impl StyleRule {
    /// Heading size in points for a heading level (1 is the largest).
    pub fn heading_size(&self, level: u8) -> f64 {
        match level {
            0 | 1 => self.base_font_size * self.heading_scale,
            _ => self.base_font_size * (1.0 + (self.heading_scale - 1.0) / 2.0),
        }
    }

    /// Body text size in points.
    pub fn body_size(&self) -> f64 {
        self.base_font_size
    }

    /// Table cell text size in points.
    pub fn table_size(&self) -> f64 {
        self.base_font_size * 0.8
    }

    pub fn is_rtl(&self) -> bool {
        self.direction == TextDirection::Rtl
    }

    /// Color for accents drawn on the background. Falls back to the
    /// primary color when the secondary one would vanish into it.
    pub fn accent_color(&self) -> Rgb {
        if self.secondary == self.background {
            self.primary
        } else {
            self.secondary
        }
    }
}

/// Maps (theme, tone, language) to a [`StyleRule`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleResolver;

impl StyleResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve from string ids, rejecting anything outside the catalogs.
    ///
    /// The theme is checked first so an unknown theme is always reported as
    /// [`StyleError::UnknownTheme`], whatever the other two ids are.
    pub fn resolve(&self, theme: &str, tone: &str, language: &str) -> Result<StyleRule, StyleError> {
        let theme: Theme = theme.parse()?;
        let tone: Tone = tone.parse()?;
        let language: Language = language.parse()?;
        Ok(self.resolve_with(theme, tone, language))
    }

    /// Resolve from already-validated catalog values. Infallible.
    pub fn resolve_with(&self, theme: Theme, tone: Tone, language: Language) -> StyleRule {
        let t = theme.entry();
        let w = tone.entry();
        let direction = language.direction();
        let template = match direction {
            TextDirection::Ltr => t.template,
            TextDirection::Rtl => t.template.mirrored(),
        };

        log::debug!("Resolved style {}/{}/{}", theme, tone, language);

        StyleRule {
            theme,
            tone,
            language,
            primary: t.primary,
            secondary: t.secondary,
            background: t.background,
            text_color: t.text,
            heading_font: t.heading_font,
            body_font: t.body_font,
            base_font_size: t.base_font_size,
            heading_scale: t.heading_scale,
            heading_bold: w.heading_bold,
            line_spacing: w.line_spacing,
            block_spacing: w.block_spacing,
            direction,
            bullet_glyph: t.bullet_glyph,
            template,
        }
    }
}

/// Catalog entry for a theme, as listed to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ThemeInfo {
    pub id: &'static str,
    pub colors: [String; 2],
}

/// List every theme with its primary and secondary colors.
pub fn list_themes() -> Vec<ThemeInfo> {
    Theme::ALL
        .into_iter()
        .map(|theme| {
            let entry = theme.entry();
            ThemeInfo {
                id: theme.id(),
                colors: [
                    format!("#{}", entry.primary.hex()),
                    format!("#{}", entry.secondary.hex()),
                ],
            }
        })
        .collect()
}

/// List every tone id in priority order.
pub fn list_tones() -> Vec<&'static str> {
    Tone::ALL.into_iter().map(Tone::id).collect()
}

/// List every language code.
pub fn list_languages() -> Vec<&'static str> {
    Language::ALL.into_iter().map(Language::code).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_theme_rejected() {
        let resolver = StyleResolver::new();
        assert_eq!(
            resolver.resolve("not-a-theme", "formal", "en"),
            Err(StyleError::UnknownTheme("not-a-theme".to_string()))
        );
        // Theme is validated before tone and language.
        assert_eq!(
            resolver.resolve("not-a-theme", "bogus", "xx"),
            Err(StyleError::UnknownTheme("not-a-theme".to_string()))
        );
    }

    #[test]
    fn test_unknown_tone_and_language_rejected() {
        let resolver = StyleResolver::new();
        assert_eq!(
            resolver.resolve("academic", "sarcastic", "en"),
            Err(StyleError::UnknownTone("sarcastic".to_string()))
        );
        assert_eq!(
            resolver.resolve("academic", "formal", "fr"),
            Err(StyleError::UnknownLanguage("fr".to_string()))
        );
    }

    #[test]
    fn test_ids_are_case_insensitive() {
        let rule = StyleResolver::new()
            .resolve(" Medical ", "TECHNICAL", "Hi")
            .unwrap();
        assert_eq!(rule.theme, Theme::Medical);
        assert_eq!(rule.tone, Tone::Technical);
        assert_eq!(rule.language, Language::Hi);
    }

    #[test]
    fn test_tone_never_changes_color_identity() {
        let resolver = StyleResolver::new();
        for theme in Theme::ALL {
            let reference = resolver.resolve_with(theme, Tone::Formal, Language::En);
            for tone in Tone::ALL {
                let rule = resolver.resolve_with(theme, tone, Language::En);
                assert_eq!(rule.primary, reference.primary);
                assert_eq!(rule.secondary, reference.secondary);
                assert_eq!(rule.background, reference.background);
                assert_eq!(rule.heading_font, reference.heading_font);
                assert_eq!(rule.body_font, reference.body_font);
                assert_eq!(rule.base_font_size, reference.base_font_size);
            }
        }
    }

    #[test]
    fn test_accent_visible_on_background() {
        let resolver = StyleResolver::new();
        for theme in Theme::ALL {
            let rule = resolver.resolve_with(theme, Tone::Formal, Language::En);
            assert_ne!(rule.accent_color(), rule.background, "{}", theme);
        }

        let minimalist = resolver.resolve_with(Theme::Minimalist, Tone::Formal, Language::En);
        assert_eq!(minimalist.secondary, minimalist.background);
        assert_eq!(minimalist.accent_color(), minimalist.primary);
        let creative = resolver.resolve_with(Theme::Creative, Tone::Formal, Language::En);
        assert_eq!(creative.accent_color(), creative.secondary);
    }

    #[test]
    fn test_tone_changes_spacing() {
        let resolver = StyleResolver::new();
        let formal = resolver.resolve_with(Theme::Professional, Tone::Formal, Language::En);
        let story = resolver.resolve_with(Theme::Professional, Tone::Storytelling, Language::En);
        assert!(story.line_spacing > formal.line_spacing);
        assert!(story.block_spacing > formal.block_spacing);
    }

    #[test]
    fn test_direction_depends_on_language_only() {
        let resolver = StyleResolver::new();
        for theme in Theme::ALL {
            for tone in Tone::ALL {
                for language in Language::ALL {
                    let rule = resolver.resolve_with(theme, tone, language);
                    assert_eq!(rule.direction, language.direction());
                }
            }
        }
    }

    #[test]
    fn test_template_mirroring() {
        let template = Theme::Professional.entry().template;
        let mirrored = template.mirrored();
        assert_eq!(mirrored.margin_left, template.margin_right);
        assert_eq!(mirrored.margin_right, template.margin_left);
        assert_eq!(mirrored.body_align, Align::Right);
        assert_eq!(mirrored.accent.map(|a| a.edge), Some(Edge::Right));
        assert_eq!(mirrored.mirrored(), template);
    }

    #[test]
    fn test_catalogs() {
        let themes = list_themes();
        assert_eq!(themes.len(), 5);
        assert_eq!(themes[0].id, "professional");
        assert_eq!(themes[0].colors, ["#1F4788".to_string(), "#2E5090".to_string()]);
        assert_eq!(themes[4].colors, ["#1ABC9C".to_string(), "#16A085".to_string()]);
        assert_eq!(
            list_tones(),
            vec!["formal", "casual", "technical", "storytelling", "humorous"]
        );
        assert_eq!(list_languages(), vec!["en", "hi"]);
    }
}
