//! Embedded TrueType font for text the standard-14 fonts cannot show.
//!
//! The whole font file is embedded as a `CIDFontType2` descendant of a
//! `Type0` font with `Identity-H` encoding, so text is written as 2-byte
//! glyph ids. A `ToUnicode` CMap maps the glyphs back for extraction.
//! Characters map to glyphs one to one; there is no shaping.

use crate::graph::Result;
use slide_core::CodecError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use ttf_parser::{name_id, Face, GlyphId};

/// A parsed TrueType font, cheap to clone.
#[derive(Debug, Clone)]
pub struct UnicodeFont {
    data: Arc<Vec<u8>>,
    name: String,
    metrics: FaceMetrics,
}

/// Font-wide metrics in thousandths of an em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FaceMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub bbox: [f32; 4],
}

impl UnicodeFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let face = parse(&data)?;
        let scale = 1000.0 / f32::from(face.units_per_em().max(1));
        let bbox = face.global_bounding_box();
        let metrics = FaceMetrics {
            ascent: f32::from(face.ascender()) * scale,
            descent: f32::from(face.descender()) * scale,
            cap_height: f32::from(face.capital_height().unwrap_or(face.ascender())) * scale,
            bbox: [
                f32::from(bbox.x_min) * scale,
                f32::from(bbox.y_min) * scale,
                f32::from(bbox.x_max) * scale,
                f32::from(bbox.y_max) * scale,
            ],
        };
        let name = postscript_name(&face);
        log::debug!("Loaded font {} ({} glyphs)", name, face.number_of_glyphs());

        Ok(Self {
            data: Arc::new(data),
            name,
            metrics,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| CodecError::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data)
    }

    /// PostScript name, restricted to characters valid in a PDF name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    /// Glyph lookup over this font, parsed once per document.
    pub(crate) fn glyphs(&self) -> Result<GlyphMap<'_>> {
        let face = parse(&self.data)?;
        Ok(GlyphMap {
            scale: 1000.0 / f32::from(face.units_per_em().max(1)),
            face,
            used: BTreeMap::new(),
        })
    }
}

fn parse(data: &[u8]) -> Result<Face<'_>> {
    Face::parse(data, 0).map_err(|e| CodecError::Font(e.to_string()))
}

fn postscript_name(face: &Face<'_>) -> String {
    let name: String = face
        .names()
        .into_iter()
        .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
        .find_map(|n| n.to_string())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        name
    }
}

/// Glyphs of one font used by a document, with their advances.
pub(crate) struct GlyphMap<'a> {
    face: Face<'a>,
    scale: f32,
    /// Glyph id to the character it was first used for and its width.
    used: BTreeMap<u16, (char, f32)>,
}

impl GlyphMap<'_> {
    /// Encode `text` as big-endian glyph ids, or return the first
    /// character the font has no glyph for.
    pub(crate) fn encode(&mut self, text: &str) -> std::result::Result<Vec<u8>, char> {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let c = if c == '\t' { ' ' } else { c };
            let GlyphId(id) = self.face.glyph_index(c).ok_or(c)?;
            let advance = self.face.glyph_hor_advance(GlyphId(id)).unwrap_or(0);
            let width = f32::from(advance) * self.scale;
            self.used.entry(id).or_insert((c, width));
            bytes.extend_from_slice(&id.to_be_bytes());
        }
        Ok(bytes)
    }

    /// Whether every character of `text` has a glyph.
    #[cfg(test)]
    pub(crate) fn covers(&self, text: &str) -> bool {
        text.chars()
            .all(|c| c == '\t' || self.face.glyph_index(c).is_some())
    }

    /// Used glyphs in id order.
    pub(crate) fn used(&self) -> impl Iterator<Item = (u16, char, f32)> + '_ {
        self.used.iter().map(|(&id, &(c, width))| (id, c, width))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// First of `candidates` that exists and parses.
#[cfg(test)]
pub(crate) fn find_font(candidates: &[&str]) -> Option<UnicodeFont> {
    candidates
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .and_then(|p| UnicodeFont::open(p).ok())
}

#[cfg(test)]
pub(crate) const LATIN_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

#[cfg(test)]
pub(crate) const DEVANAGARI_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/truetype/lohit-devanagari/Lohit-Devanagari.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/gnu-free/FreeSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_rejected() {
        let err = UnicodeFont::from_bytes(b"not a font".to_vec()).unwrap_err();
        assert!(matches!(err, CodecError::Font(_)));
        assert!(matches!(
            UnicodeFont::open("/nonexistent/font.ttf"),
            Err(CodecError::Font(_))
        ));
    }

    #[test]
    fn test_glyph_encoding() {
        let Some(font) = find_font(LATIN_FONTS) else {
            eprintln!("no TrueType font found, skipping");
            return;
        };
        assert!(!font.name().is_empty());
        assert!(font.metrics().ascent > 0.0);
        assert!(font.metrics().descent < 0.0);

        let mut glyphs = font.glyphs().unwrap();
        assert!(glyphs.is_empty());
        let bytes = glyphs.encode("\u{03A9}\u{03A9}a").unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(bytes[..2], bytes[2..4]);

        let used: Vec<(u16, char, f32)> = glyphs.used().collect();
        assert_eq!(used.len(), 2);
        assert!(used.iter().any(|&(_, c, w)| c == '\u{03A9}' && w > 0.0));
        assert!(glyphs.covers("a\tb"));
        assert!(!glyphs.covers("\u{4E2D}"));
        assert_eq!(glyphs.encode("x\u{4E2D}"), Err('\u{4E2D}'));
    }
}
