//! Document objects and their serialization through `pdf-writer`.

use crate::font::FaceMetrics;
use crate::graph::{Linked, NodeId, Numbering, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::{Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

/// Registry and ordering of `Identity` CID fonts.
pub(crate) const IDENTITY: SystemInfo<'static> = SystemInfo {
    registry: Str(b"Adobe"),
    ordering: Str(b"Identity"),
    supplement: 0,
};

/// One indirect object of the document.
#[derive(Debug)]
pub(crate) enum PdfNode {
    Catalog { pages: NodeId, lang: String },
    Info(DocumentInfo),
    Pages { kids: Vec<NodeId> },
    Page(PageNode),
    /// Page content stream, Flate-compressed when `compressed` is set.
    Content { data: Vec<u8>, compressed: bool },
    Type1Font { base: &'static str },
    Type0Font {
        base: String,
        descendant: NodeId,
        to_unicode: NodeId,
    },
    CidFont {
        base: String,
        descriptor: NodeId,
        /// `(glyph id, width)` of every glyph used.
        widths: Vec<(u16, f32)>,
    },
    FontDescriptor {
        base: String,
        metrics: FaceMetrics,
        file: NodeId,
    },
    /// Compressed TrueType file with its uncompressed length.
    FontFile { data: Vec<u8>, length: usize },
    ToUnicode { cmap: Vec<u8> },
    Image(ImageNode),
}

#[derive(Debug)]
pub(crate) struct DocumentInfo {
    pub title: String,
    pub keywords: String,
    pub producer: String,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub(crate) struct PageNode {
    pub parent: NodeId,
    pub width: f64,
    pub height: f64,
    pub contents: NodeId,
    pub fonts: Vec<(String, NodeId)>,
    pub images: Vec<(String, NodeId)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageEncoding {
    /// JPEG file bytes, embedded as they are.
    Dct,
    /// Flate-compressed 8-bit samples.
    Flate,
}

#[derive(Debug)]
pub(crate) struct ImageNode {
    pub data: Vec<u8>,
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
    pub gray: bool,
    /// Alpha channel as a gray image.
    pub smask: Option<NodeId>,
}

impl Linked for PdfNode {
    fn owned(&self) -> Vec<NodeId> {
        match self {
            PdfNode::Catalog { pages, .. } => vec![*pages],
            PdfNode::Pages { kids } => kids.clone(),
            PdfNode::Page(page) => std::iter::once(page.contents)
                .chain(page.fonts.iter().map(|(_, id)| *id))
                .chain(page.images.iter().map(|(_, id)| *id))
                .collect(),
            PdfNode::Type0Font {
                descendant,
                to_unicode,
                ..
            } => vec![*descendant, *to_unicode],
            PdfNode::CidFont { descriptor, .. } => vec![*descriptor],
            PdfNode::FontDescriptor { file, .. } => vec![*file],
            PdfNode::Image(image) => image.smask.into_iter().collect(),
            PdfNode::Info(_)
            | PdfNode::Content { .. }
            | PdfNode::Type1Font { .. }
            | PdfNode::FontFile { .. }
            | PdfNode::ToUnicode { .. } => Vec::new(),
        }
    }

    fn back_links(&self) -> Vec<NodeId> {
        match self {
            PdfNode::Page(page) => vec![page.parent],
            _ => Vec::new(),
        }
    }
}

impl PdfNode {
    /// Write this node as object `id`.
    pub(crate) fn write(&self, pdf: &mut Pdf, id: NodeId, numbering: &Numbering) -> Result<()> {
        let this = numbering.resolve(id, id)?;
        let link = |to: NodeId| numbering.resolve(id, to);

        match self {
            PdfNode::Catalog { pages, lang } => {
                let pages = link(*pages)?;
                pdf.catalog(this).pages(pages).lang(TextStr(lang));
            }
            PdfNode::Info(info) => {
                let mut dict = pdf.document_info(this);
                dict.title(TextStr(&info.title))
                    .keywords(TextStr(&info.keywords))
                    .producer(TextStr(&info.producer));
                if let Some(created) = info.created {
                    dict.creation_date(pdf_date(created))
                        .modified_date(pdf_date(created));
                }
            }
            PdfNode::Pages { kids } => {
                let kids = kids.iter().map(|kid| link(*kid)).collect::<Result<Vec<Ref>>>()?;
                pdf.pages(this).count(kids.len() as i32).kids(kids);
            }
            PdfNode::Page(page) => {
                let parent = link(page.parent)?;
                let contents = link(page.contents)?;
                let fonts = resolve_all(&page.fonts, link)?;
                let images = resolve_all(&page.images, link)?;

                let mut writer = pdf.page(this);
                writer
                    .media_box(Rect::new(0.0, 0.0, page.width as f32, page.height as f32))
                    .parent(parent)
                    .contents(contents);
                let mut resources = writer.resources();
                if !fonts.is_empty() {
                    let mut dict = resources.fonts();
                    for (name, font) in &fonts {
                        dict.pair(Name(name.as_bytes()), *font);
                    }
                }
                if !images.is_empty() {
                    let mut dict = resources.x_objects();
                    for (name, image) in &images {
                        dict.pair(Name(name.as_bytes()), *image);
                    }
                }
            }
            PdfNode::Content { data, compressed } => {
                let mut stream = pdf.stream(this, data);
                if *compressed {
                    stream.filter(Filter::FlateDecode);
                }
            }
            PdfNode::Type1Font { base } => {
                pdf.type1_font(this)
                    .base_font(Name(base.as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
            PdfNode::Type0Font {
                base,
                descendant,
                to_unicode,
            } => {
                let descendant = link(*descendant)?;
                let to_unicode = link(*to_unicode)?;
                pdf.type0_font(this)
                    .base_font(Name(base.as_bytes()))
                    .encoding_predefined(Name(b"Identity-H"))
                    .descendant_font(descendant)
                    .to_unicode(to_unicode);
            }
            PdfNode::CidFont {
                base,
                descriptor,
                widths,
            } => {
                let descriptor = link(*descriptor)?;
                let mut font = pdf.cid_font(this);
                font.subtype(CidFontType::Type2)
                    .base_font(Name(base.as_bytes()))
                    .system_info(IDENTITY)
                    .font_descriptor(descriptor)
                    .cid_to_gid_map_predefined(Name(b"Identity"));
                let mut table = font.widths();
                for &(glyph, width) in widths {
                    table.consecutive(glyph, [width]);
                }
            }
            PdfNode::FontDescriptor {
                base,
                metrics,
                file,
            } => {
                let file = link(*file)?;
                let [x1, y1, x2, y2] = metrics.bbox;
                pdf.font_descriptor(this)
                    .name(Name(base.as_bytes()))
                    .flags(FontFlags::SYMBOLIC)
                    .bbox(Rect::new(x1, y1, x2, y2))
                    .italic_angle(0.0)
                    .ascent(metrics.ascent)
                    .descent(metrics.descent)
                    .cap_height(metrics.cap_height)
                    .stem_v(80.0)
                    .font_file2(file);
            }
            PdfNode::FontFile { data, length } => {
                pdf.stream(this, data)
                    .filter(Filter::FlateDecode)
                    .pair(Name(b"Length1"), *length as i32);
            }
            PdfNode::ToUnicode { cmap } => {
                pdf.stream(this, cmap);
            }
            PdfNode::Image(image) => {
                let smask = image.smask.map(link).transpose()?;
                let mut xobject = pdf.image_xobject(this, &image.data);
                xobject.filter(match image.encoding {
                    ImageEncoding::Dct => Filter::DctDecode,
                    ImageEncoding::Flate => Filter::FlateDecode,
                });
                xobject.width(image.width as i32);
                xobject.height(image.height as i32);
                if image.gray {
                    xobject.color_space().device_gray();
                } else {
                    xobject.color_space().device_rgb();
                }
                xobject.bits_per_component(8);
                if let Some(mask) = smask {
                    xobject.s_mask(mask);
                }
            }
        }
        Ok(())
    }
}

fn resolve_all(
    pairs: &[(String, NodeId)],
    link: impl Fn(NodeId) -> Result<Ref>,
) -> Result<Vec<(String, Ref)>> {
    pairs
        .iter()
        .map(|(name, id)| Ok((name.clone(), link(*id)?)))
        .collect()
}

fn pdf_date(time: DateTime<Utc>) -> Date {
    Date::new(time.year() as u16)
        .month(time.month() as u8)
        .day(time.day() as u8)
        .hour(time.hour() as u8)
        .minute(time.minute() as u8)
        .second(time.second() as u8)
        .utc_offset_hour(0)
}
