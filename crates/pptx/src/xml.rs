//! Small XML writing helpers and unit conversions.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use slide_core::CodecError;

pub(crate) type Result<T> = std::result::Result<T, CodecError>;

pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub(crate) const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URIs.
pub(crate) mod rel {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
}

/// EMUs per point.
pub(crate) const EMU_PER_POINT: f64 = 12_700.0;

/// Points to EMU, rounding half to even.
pub(crate) fn emu(points: f64) -> i64 {
    (points * EMU_PER_POINT).round_ties_even() as i64
}

/// Points to the hundredths-of-a-point font size unit, rounding half to
/// even and clamping to the range OOXML accepts.
pub(crate) fn font_hundredths(points: f64) -> i64 {
    ((points * 100.0).round_ties_even() as i64).clamp(100, 400_000)
}

/// Drop characters XML 1.0 cannot carry.
pub(crate) fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .filter(|&c| !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        .collect()
}

/// Event-based XML document builder.
pub(crate) struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    /// Start a document with a standalone UTF-8 declaration.
    pub(crate) fn new() -> Result<Self> {
        let mut builder = Self {
            writer: Writer::new(Vec::with_capacity(4096)),
        };
        builder.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(builder)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| CodecError::Xml(e.to_string()))
    }

    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Start(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))
    }

    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Empty(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    pub(crate) fn text(&mut self, text: &str) -> Result<()> {
        let safe = xml_safe(text);
        self.write(Event::Text(BytesText::new(&safe)))
    }

    /// `<name attrs>text</name>`
    pub(crate) fn leaf(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// Write a relationships part.
pub(crate) fn relationships(rels: &[(String, &str, String)]) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start("Relationships", &[("xmlns", NS_RELS)])?;
    for (id, kind, target) in rels {
        xml.empty(
            "Relationship",
            &[("Id", id.as_str()), ("Type", *kind), ("Target", target.as_str())],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emu_rounding() {
        assert_eq!(emu(720.0), 9_144_000);
        assert_eq!(emu(405.0), 5_143_500);
        // 1/8 pt is 1587.5 EMU; 3/8 pt is 4762.5 EMU.
        assert_eq!(emu(0.125), 1588);
        assert_eq!(emu(0.375), 4762);
    }

    #[test]
    fn test_font_hundredths() {
        assert_eq!(font_hundredths(20.0), 2000);
        assert_eq!(font_hundredths(13.125), 1312);
        assert_eq!(font_hundredths(0.1), 100);
    }

    #[test]
    fn test_builder_escapes_text() {
        let mut xml = XmlBuilder::new().unwrap();
        xml.leaf("a:t", &[], "R&D <fast>\u{0007}").unwrap();
        let out = String::from_utf8(xml.finish()).unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(out.ends_with("<a:t>R&amp;D &lt;fast&gt;</a:t>"));
    }
}
