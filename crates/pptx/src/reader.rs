//! Structural reader for PPTX packages.
//!
//! Recovers slide order and the shapes on each slide from a package
//! written by [`PptxEncoder`](crate::PptxEncoder) or by an office suite.
//! Only structure and text are read back; formatting is ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use slide_core::{BlockKind, CodecError};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

use crate::xml::{Result, EMU_PER_POINT};

/// Shapes of one slide, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSummary {
    /// Part name, e.g. `ppt/slides/slide1.xml`.
    pub part: String,
    pub shapes: Vec<ShapeSummary>,
}

/// One shape on a slide.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ShapeSummary {
    pub name: String,
    /// Block kind, inferred from the shape name.
    pub kind: Option<BlockKind>,
    /// Paragraphs joined by newlines.
    pub text: String,
    /// Offset in points.
    pub x: f64,
    pub y: f64,
    /// Relationship id of an embedded picture.
    pub embed: Option<String>,
}

/// Everything read back from a package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PptxSummary {
    pub slides: Vec<SlideSummary>,
    /// Media part names, sorted.
    pub media: Vec<String>,
}

impl PptxSummary {
    pub fn shape_count(&self) -> usize {
        self.slides.iter().map(|s| s.shapes.len()).sum()
    }
}

/// Reader for PPTX packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxReader;

impl PptxReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<PptxSummary> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| CodecError::Archive(format!("Failed to open ZIP: {}", e)))?;

        let mut media: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/media/"))
            .map(str::to_string)
            .collect();
        media.sort();

        let order = self.slide_order(&mut archive)?;
        let mut slides = Vec::with_capacity(order.len());
        for part in order {
            let content = read_part(&mut archive, &part)?;
            let shapes = extract_shapes(&content)?;
            slides.push(SlideSummary { part, shapes });
        }

        Ok(PptxSummary { slides, media })
    }

    /// Slide part names in presentation order.
    ///
    /// `p:sldIdLst` decides the order. If it is missing, slides are sorted
    /// by the number in their relationship id or part name.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = read_part(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut targets: HashMap<String, String> = HashMap::new();
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let id = attribute(e, b"Id").unwrap_or_default();
                    let rel_type = attribute(e, b"Type").unwrap_or_default();
                    let target = attribute(e, b"Target").unwrap_or_default();

                    if rel_type.ends_with("/slide") {
                        let path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        let order = extract_slide_number(&id).or_else(|| extract_slide_number(&path));
                        targets.insert(id, path.clone());
                        slides.push((path, order));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(CodecError::Xml(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        let listed = self.listed_slide_ids(archive)?;
        if !listed.is_empty() {
            return Ok(listed
                .iter()
                .filter_map(|id| targets.get(id).cloned())
                .collect());
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });
        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Relationship ids of `p:sldId` entries, in list order.
    fn listed_slide_ids<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let content = read_part(archive, "ppt/presentation.xml")?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        let mut ids = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"sldId" =>
                {
                    if let Some(id) = attribute(e, b"r:id") {
                        ids.push(id);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(CodecError::Xml(format!(
                        "Error parsing presentation: {}",
                        e
                    )));
                }
                _ => {}
            }
        }
        Ok(ids)
    }
}

/// Shapes with text and position from slide XML.
fn extract_shapes(xml_content: &str) -> Result<Vec<ShapeSummary>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    // Depth of nested shapes; table cells and group members fold into the
    // outermost one.
    let mut depth = 0usize;
    let mut current: Option<ShapeSummary> = None;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut seen_offset = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" | b"pic" | b"graphicFrame" => {
                        depth += 1;
                        if depth == 1 {
                            current = Some(ShapeSummary::default());
                            paragraphs.clear();
                            seen_offset = false;
                        }
                    }
                    b"p" if current.is_some() => paragraphs.push(String::new()),
                    b"t" => in_text = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                if let Some(shape) = current.as_mut() {
                    match local_name(name.as_ref()) {
                        b"cNvPr" if shape.name.is_empty() => {
                            shape.name = attribute(e, b"name").unwrap_or_default();
                            shape.kind = kind_from_name(&shape.name);
                        }
                        b"off" if !seen_offset => {
                            seen_offset = true;
                            shape.x = emu_attribute(e, b"x");
                            shape.y = emu_attribute(e, b"y");
                        }
                        b"blip" => shape.embed = attribute(e, b"r:embed"),
                        b"p" => paragraphs.push(String::new()),
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text {
                    let text = e.unescape().unwrap_or_default();
                    if let Some(last) = paragraphs.last_mut() {
                        last.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" | b"pic" | b"graphicFrame" => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            if let Some(mut shape) = current.take() {
                                shape.text = paragraphs.join("\n").trim().to_string();
                                shapes.push(shape);
                            }
                        }
                    }
                    b"t" => in_text = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error, stopping slide read: {}", e);
                break;
            }
            _ => {}
        }
    }

    Ok(shapes)
}

fn kind_from_name(name: &str) -> Option<BlockKind> {
    let prefix = name.rsplit_once(' ').map_or(name, |(prefix, _)| prefix);
    match prefix {
        "Heading" | "Title" => Some(BlockKind::Heading),
        "Text" => Some(BlockKind::BodyText),
        "List" => Some(BlockKind::BulletList),
        "Picture" => Some(BlockKind::Image),
        "Table" => Some(BlockKind::Table),
        _ => None,
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn emu_attribute(e: &BytesStart<'_>, key: &[u8]) -> f64 {
    attribute(e, key)
        .and_then(|v| v.parse::<f64>().ok())
        .map(|emu| emu / EMU_PER_POINT)
        .unwrap_or(0.0)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| CodecError::Archive(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| CodecError::Archive(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Local part of a possibly prefixed element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Trailing number of a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("ppt/slides/slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(kind_from_name("Heading 1"), Some(BlockKind::Heading));
        assert_eq!(kind_from_name("List 3"), Some(BlockKind::BulletList));
        assert_eq!(kind_from_name("Accent Bar"), None);
        assert_eq!(kind_from_name(""), None);
    }

    #[test]
    fn test_extract_shapes() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p" xmlns:r="r"><p:cSld><p:spTree>
            <p:sp><p:nvSpPr><p:cNvPr id="2" name="Heading 1"/></p:nvSpPr>
              <p:spPr><a:xfrm><a:off x="12700" y="25400"/><a:ext cx="1" cy="1"/></a:xfrm></p:spPr>
              <p:txBody><a:p><a:r><a:t>R&amp;D</a:t></a:r></a:p><a:p><a:endParaRPr/></a:p><a:p><a:r><a:t>Plan</a:t></a:r></a:p></p:txBody></p:sp>
            <p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture 2" descr="logo"/></p:nvPicPr>
              <p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>
            </p:spTree></p:cSld></p:sld>"#;
        let shapes = extract_shapes(xml).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].kind, Some(BlockKind::Heading));
        assert_eq!(shapes[0].text, "R&D\n\nPlan");
        assert_eq!((shapes[0].x, shapes[0].y), (1.0, 2.0));
        assert_eq!(shapes[1].kind, Some(BlockKind::Image));
        assert_eq!(shapes[1].embed.as_deref(), Some("rId2"));
    }
}
