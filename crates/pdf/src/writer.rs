//! PDF document writer.

use crate::content::PageContent;
use crate::encoding::encode_win_ansi;
use crate::font::{GlyphMap, UnicodeFont};
use crate::graph::{NodeId, ObjectGraph, Result};
use crate::node::{DocumentInfo, ImageEncoding, ImageNode, PageNode, PdfNode, IDENTITY};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder, ImageFormat};
use pdf_writer::types::UnicodeCmap;
use pdf_writer::{Name, Pdf};
use slide_core::style::{Edge, Rgb, StyleResolver, StyleRule};
use slide_core::types::FontRole;
use slide_core::{
    Block, BlockContent, CodecError, Deck, DeckEncoder, ExportFormat, ImageRef, PdfConfig, Slide,
};
use std::io::{Cursor, Write};
use std::sync::Arc;

/// Width of table grid strokes, in points.
const GRID_LINE_WIDTH: f64 = 0.75;

/// Encodes laid-out decks as PDF documents, one page per slide.
///
/// Text that WinAnsi covers is set in the standard-14 fonts. Any other
/// line needs the Unicode font given with
/// [`PdfEncoder::with_unicode_font`]; without one, or when that font
/// lacks a glyph, encoding fails with [`CodecError::MissingGlyph`].
#[derive(Debug, Clone, Default)]
pub struct PdfEncoder {
    config: PdfConfig,
    unicode_font: Option<UnicodeFont>,
}

impl PdfEncoder {
    pub fn new(config: PdfConfig) -> Self {
        Self {
            config,
            unicode_font: None,
        }
    }

    pub fn with_unicode_font(mut self, font: UnicodeFont) -> Self {
        self.unicode_font = Some(font);
        self
    }

    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    /// Build the document in memory.
    pub fn write(&self, deck: &Deck) -> Result<Vec<u8>> {
        let meta = deck.meta();
        let fallback = StyleResolver::new().resolve_with(meta.theme, meta.tone, meta.language);
        let page_rule = deck
            .slides()
            .iter()
            .flat_map(|s| s.blocks())
            .find_map(|b| deck.style_of(b))
            .unwrap_or(&fallback);

        let mut doc = DocumentBuilder {
            graph: ObjectGraph::new(),
            fonts: Vec::new(),
            images: Vec::new(),
            glyphs: self.unicode_font.as_ref().map(UnicodeFont::glyphs).transpose()?,
            compress: self.config.compress_streams,
        };

        let catalog = doc.graph.reserve();
        let pages = doc.graph.reserve();
        let info = doc.graph.add(PdfNode::Info(DocumentInfo {
            title: deck.title().unwrap_or("Presentation").to_string(),
            keywords: format!("{}, {}", meta.theme, meta.tone),
            producer: env!("CARGO_PKG_NAME").to_string(),
            created: meta.created,
        }));

        let mut kids = Vec::with_capacity(deck.slides().len());
        for (index, slide) in deck.slides().iter().enumerate() {
            kids.push(doc.page(deck, index, slide, page_rule, &fallback, pages)?);
        }
        let page_count = kids.len();
        doc.graph.set(pages, PdfNode::Pages { kids });
        doc.graph.set(
            catalog,
            PdfNode::Catalog {
                pages,
                lang: meta.language.tag().to_string(),
            },
        );
        if let Some(font) = &self.unicode_font {
            doc.embed_unicode_font(font)?;
        }

        let numbering = doc.graph.number(&[catalog, info])?;
        let mut pdf = Pdf::new();
        for &id in numbering.order() {
            if let Some(node) = doc.graph.get(id) {
                node.write(&mut pdf, id, &numbering)?;
            }
        }
        let bytes = pdf.finish();
        log::debug!(
            "Wrote PDF: {} pages, {} fonts, {} images, {} bytes",
            page_count,
            doc.fonts.len(),
            doc.images.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

impl DeckEncoder for PdfEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn encode(&self, deck: &Deck) -> std::result::Result<Vec<u8>, CodecError> {
        self.write(deck)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontKey {
    Standard(&'static str),
    Unicode,
}

/// Resources used by one page, in first-use order.
#[derive(Default)]
struct PageResources {
    fonts: Vec<(String, NodeId)>,
    images: Vec<(String, NodeId)>,
}

impl PageResources {
    fn use_font(&mut self, name: &str, id: NodeId) {
        if !self.fonts.iter().any(|(n, _)| n == name) {
            self.fonts.push((name.to_string(), id));
        }
    }

    fn use_image(&mut self, name: &str, id: NodeId) {
        if !self.images.iter().any(|(n, _)| n == name) {
            self.images.push((name.to_string(), id));
        }
    }
}

/// Graph under construction plus the document-wide resource tables.
struct DocumentBuilder<'f> {
    graph: ObjectGraph<PdfNode>,
    /// `(font, resource name, object)`.
    fonts: Vec<(FontKey, String, NodeId)>,
    /// `(encoded bytes, resource name, object)`.
    images: Vec<(Arc<Vec<u8>>, String, NodeId)>,
    glyphs: Option<GlyphMap<'f>>,
    compress: bool,
}

impl DocumentBuilder<'_> {
    fn page(
        &mut self,
        deck: &Deck,
        index: usize,
        slide: &Slide,
        page_rule: &StyleRule,
        fallback: &StyleRule,
        pages: NodeId,
    ) -> Result<NodeId> {
        let size = deck.size();
        let mut content = PageContent::new(size.height);
        let mut resources = PageResources::default();

        content.fill_color(page_rule.background);
        content.fill_rect(0.0, 0.0, size.width, size.height);
        if let Some(accent) = page_rule.template.accent {
            let (x, y, w, h) = match accent.edge {
                Edge::Left => (0.0, 0.0, accent.thickness, size.height),
                Edge::Right => (size.width - accent.thickness, 0.0, accent.thickness, size.height),
                Edge::Top => (0.0, 0.0, size.width, accent.thickness),
            };
            content.fill_color(page_rule.primary);
            content.fill_rect(x, y, w, h);
        }

        for (block_index, block) in slide.blocks().iter().enumerate() {
            let rule = deck.style_of(block).unwrap_or(fallback);
            self.block(index, block_index, block, rule, &mut content, &mut resources)?;
        }

        let data = content.finish();
        let contents = if self.compress {
            PdfNode::Content {
                data: deflate(&data)?,
                compressed: true,
            }
        } else {
            PdfNode::Content {
                data,
                compressed: false,
            }
        };
        let contents = self.graph.add(contents);
        Ok(self.graph.add(PdfNode::Page(PageNode {
            parent: pages,
            width: size.width,
            height: size.height,
            contents,
            fonts: resources.fonts,
            images: resources.images,
        })))
    }

    fn block(
        &mut self,
        slide: usize,
        index: usize,
        block: &Block,
        rule: &StyleRule,
        content: &mut PageContent,
        resources: &mut PageResources,
    ) -> Result<()> {
        let placement = block.placement().ok_or_else(|| CodecError::InvalidBlock {
            slide,
            block: index,
            reason: "block has no placement".into(),
        })?;

        if let BlockContent::Image(image) = block.content() {
            let (name, id) = self.image(slide, index, image)?;
            resources.use_image(&name, id);
            let frame = placement.frame;
            content.image(&name, frame.x, frame.y, frame.width, frame.height);
            return Ok(());
        }

        if !placement.strokes.is_empty() {
            content.stroke_color(rule.text_color);
            for stroke in &placement.strokes {
                content.line(stroke.x1, stroke.y1, stroke.x2, stroke.y2, GRID_LINE_WIDTH);
            }
        }

        let mut fill: Option<Rgb> = None;
        for line in &placement.lines {
            let (family, color) = match line.role {
                FontRole::Heading => (rule.heading_font, rule.primary),
                FontRole::Body => (rule.body_font, rule.text_color),
            };
            if fill != Some(color) {
                content.fill_color(color);
                fill = Some(color);
            }

            let missing = |ch| CodecError::MissingGlyph {
                slide,
                block: index,
                ch,
            };
            let (key, encoded) = match encode_win_ansi(&line.text) {
                Ok(bytes) => (FontKey::Standard(family.pdf_base_font(line.bold)), bytes),
                Err(ch) => {
                    let glyphs = self.glyphs.as_mut().ok_or_else(|| missing(ch))?;
                    (FontKey::Unicode, glyphs.encode(&line.text).map_err(missing)?)
                }
            };
            let (name, id) = self.font(key);
            resources.use_font(&name, id);
            content.text(&name, line.size, line.x, line.baseline, &encoded);
        }
        Ok(())
    }

    /// Shared font object. The Unicode font is only reserved here and
    /// filled in by [`DocumentBuilder::embed_unicode_font`].
    fn font(&mut self, key: FontKey) -> (String, NodeId) {
        if let Some((_, name, id)) = self.fonts.iter().find(|(k, _, _)| *k == key) {
            return (name.clone(), *id);
        }
        let name = format!("F{}", self.fonts.len() + 1);
        let id = match key {
            FontKey::Standard(base) => self.graph.add(PdfNode::Type1Font { base }),
            FontKey::Unicode => self.graph.reserve(),
        };
        self.fonts.push((key, name.clone(), id));
        (name, id)
    }

    /// Type0 font with the glyphs used so far.
    fn embed_unicode_font(&mut self, font: &UnicodeFont) -> Result<()> {
        let Some(type0) = self
            .fonts
            .iter()
            .find(|(key, _, _)| *key == FontKey::Unicode)
            .map(|(_, _, id)| *id)
        else {
            return Ok(());
        };
        let Some(glyphs) = self.glyphs.as_ref().filter(|g| !g.is_empty()) else {
            return Ok(());
        };

        let mut cmap = UnicodeCmap::new(Name(b"Custom"), IDENTITY);
        let mut widths = Vec::new();
        for (glyph, ch, width) in glyphs.used() {
            cmap.pair(glyph, ch);
            widths.push((glyph, width));
        }
        let cmap = cmap.finish().as_slice().to_vec();

        let base = font.name().to_string();
        let file = self.graph.add(PdfNode::FontFile {
            data: deflate(font.data())?,
            length: font.data().len(),
        });
        let descriptor = self.graph.add(PdfNode::FontDescriptor {
            base: base.clone(),
            metrics: font.metrics(),
            file,
        });
        let descendant = self.graph.add(PdfNode::CidFont {
            base: base.clone(),
            descriptor,
            widths,
        });
        let to_unicode = self.graph.add(PdfNode::ToUnicode { cmap });
        self.graph.set(
            type0,
            PdfNode::Type0Font {
                base,
                descendant,
                to_unicode,
            },
        );
        log::debug!("Embedded font {} with {} glyphs", font.name(), glyphs.used().count());
        Ok(())
    }

    /// Shared image XObject, keyed by encoded bytes.
    fn image(&mut self, slide: usize, block: usize, image: &ImageRef) -> Result<(String, NodeId)> {
        if let Some((_, name, id)) = self
            .images
            .iter()
            .find(|(data, _, _)| Arc::ptr_eq(data, &image.data) || **data == *image.data)
        {
            return Ok((name.clone(), *id));
        }

        if image.data.is_empty() {
            return Err(CodecError::InvalidBlock {
                slide,
                block,
                reason: format!("image '{}' has no data", image.name),
            });
        }
        let node = match jpeg_as_is(&image.data) {
            Some(node) => node,
            None => self.decoded_image(image)?,
        };

        let name = format!("Im{}", self.images.len() + 1);
        let id = self.graph.add(PdfNode::Image(node));
        self.images.push((Arc::clone(&image.data), name.clone(), id));
        Ok((name, id))
    }

    /// Flate-compressed RGB samples, with the alpha channel as a soft
    /// mask when any pixel is not opaque.
    fn decoded_image(&mut self, image: &ImageRef) -> Result<ImageNode> {
        let decoded = image::load_from_memory(&image.data)
            .map_err(|e| CodecError::Image(format!("{}: {}", image.name, e)))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();

        let pixels = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for pixel in decoded.pixels() {
            let [r, g, b, a] = pixel.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let smask = if alpha.iter().any(|&a| a < u8::MAX) {
            Some(self.graph.add(PdfNode::Image(ImageNode {
                data: deflate(&alpha)?,
                encoding: ImageEncoding::Flate,
                width,
                height,
                gray: true,
                smask: None,
            })))
        } else {
            None
        };
        Ok(ImageNode {
            data: deflate(&rgb)?,
            encoding: ImageEncoding::Flate,
            width,
            height,
            gray: false,
            smask,
        })
    }
}

/// Gray or RGB JPEG bytes, embedded without re-encoding.
fn jpeg_as_is(data: &[u8]) -> Option<ImageNode> {
    if image::guess_format(data).ok()? != ImageFormat::Jpeg {
        return None;
    }
    let decoder = JpegDecoder::new(Cursor::new(data)).ok()?;
    let gray = match decoder.original_color_type() {
        ExtendedColorType::L8 => true,
        ExtendedColorType::Rgb8 => false,
        _ => return None,
    };
    let (width, height) = decoder.dimensions();
    Some(ImageNode {
        data: data.to_vec(),
        encoding: ImageEncoding::Dct,
        width,
        height,
        gray,
        smask: None,
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 64), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
