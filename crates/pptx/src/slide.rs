//! Slide parts: one shape per placed block.

use crate::media::MediaStore;
use crate::package::{layout_number, shape_tree_header};
use crate::xml::{emu, font_hundredths, rel, relationships, Result, XmlBuilder, NS_A, NS_P, NS_R};
use slide_core::style::{Align, FontFamily, Rgb, StyleRule};
use slide_core::{
    Block, BlockContent, BulletItem, CodecError, Deck, ImageRef, Placement, Rect, Slide,
    SlideTemplate,
};

const TABLE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";

/// Hanging indent of a bullet relative to its text, in ems.
const BULLET_HANG_EM: f64 = 1.0;

/// Extra left margin per nesting level, in ems.
const BULLET_LEVEL_EM: f64 = 1.2;

/// Serialized slide part and its relationships.
#[derive(Debug)]
pub(crate) struct SlidePart {
    pub xml: Vec<u8>,
    pub rels: Vec<u8>,
}

/// Character formatting shared by the runs of one block.
#[derive(Debug, Clone, Copy)]
struct RunStyle<'a> {
    size: f64,
    bold: bool,
    color: Rgb,
    family: FontFamily,
    lang: &'a str,
    script: Option<&'a str>,
}

/// Paragraph formatting shared by the paragraphs of one block.
#[derive(Debug, Clone, Copy)]
struct ParaStyle {
    align: Align,
    line_height: f64,
    rtl: bool,
}

/// Writes the shapes of one slide, collecting image relationships as it
/// goes.
struct SlideWriter<'a> {
    deck: &'a Deck,
    fallback: &'a StyleRule,
    media: &'a mut MediaStore,
    slide_index: usize,
    xml: XmlBuilder,
    /// `(rId, target)` of each image linked from this slide.
    images: Vec<(String, String)>,
}

pub(crate) fn write_slide(
    deck: &Deck,
    slide_index: usize,
    slide: &Slide,
    fallback: &StyleRule,
    media: &mut MediaStore,
) -> Result<SlidePart> {
    let mut writer = SlideWriter {
        deck,
        fallback,
        media,
        slide_index,
        xml: XmlBuilder::new()?,
        images: Vec::new(),
    };

    writer
        .xml
        .start("p:sld", &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)])?;
    writer.xml.start("p:cSld", &[])?;
    writer.xml.start("p:spTree", &[])?;
    shape_tree_header(&mut writer.xml)?;
    for (block_index, block) in slide.blocks().iter().enumerate() {
        writer.block(block_index, block)?;
    }
    writer.xml.end("p:spTree")?;
    writer.xml.end("p:cSld")?;
    writer.xml.start("p:clrMapOvr", &[])?;
    writer.xml.empty("a:masterClrMapping", &[])?;
    writer.xml.end("p:clrMapOvr")?;
    writer.xml.end("p:sld")?;

    let template = slide.template().unwrap_or(SlideTemplate::Content);
    let mut rels = vec![(
        "rId1".to_string(),
        rel::SLIDE_LAYOUT,
        format!("../slideLayouts/slideLayout{}.xml", layout_number(template)),
    )];
    for (id, target) in writer.images {
        rels.push((id, rel::IMAGE, target));
    }

    Ok(SlidePart {
        xml: writer.xml.finish(),
        rels: relationships(&rels)?,
    })
}

impl SlideWriter<'_> {
    fn invalid(&self, block: usize, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidBlock {
            slide: self.slide_index,
            block,
            reason: reason.into(),
        }
    }

    fn block(&mut self, index: usize, block: &Block) -> Result<()> {
        let placement = block
            .placement()
            .ok_or_else(|| self.invalid(index, "block has no placement"))?;
        let frame = placement.frame;
        if !(frame.width.is_finite() && frame.height.is_finite())
            || frame.width <= 0.0
            || frame.height < 0.0
        {
            return Err(self.invalid(index, format!("degenerate frame {:?}", frame)));
        }

        let deck = self.deck;
        let rule = deck.style_of(block).unwrap_or(self.fallback);
        // Shape id 1 is the tree itself.
        let id = (index + 2).to_string();
        let number = index + 1;

        match block.content() {
            BlockContent::Heading { text, .. } => {
                let run = RunStyle {
                    size: placement.font_size,
                    bold: rule.heading_bold,
                    color: rule.primary,
                    family: rule.heading_font,
                    lang: rule.language.tag(),
                    script: rule.language.script_typeface(),
                };
                let para = para_style(rule, rule.template.heading_align, placement);
                self.text_shape(&id, &format!("Heading {}", number), frame, |xml| {
                    paragraphs(xml, text, run, para)
                })
            }
            BlockContent::BodyText { text } => {
                let run = body_run(rule, placement.font_size, false);
                let para = para_style(rule, rule.template.body_align, placement);
                self.text_shape(&id, &format!("Text {}", number), frame, |xml| {
                    paragraphs(xml, text, run, para)
                })
            }
            BlockContent::BulletList { items } => {
                let run = body_run(rule, placement.font_size, false);
                let para = para_style(rule, rule.template.body_align, placement);
                let glyph = rule.bullet_glyph;
                self.text_shape(&id, &format!("List {}", number), frame, |xml| {
                    for item in items {
                        bullet(xml, item, glyph, run, para)?;
                    }
                    Ok(())
                })
            }
            BlockContent::Image(image) => self.picture(index, &id, number, frame, image),
            BlockContent::Table { rows } => {
                // A table continued from the previous slide has no header row.
                let header = block.joint().is_none();
                self.table(&id, number, rule, placement, rows, header)
            }
        }
    }

    fn text_shape<F>(&mut self, id: &str, name: &str, frame: Rect, body: F) -> Result<()>
    where
        F: FnOnce(&mut XmlBuilder) -> Result<()>,
    {
        let xml = &mut self.xml;
        xml.start("p:sp", &[])?;
        xml.start("p:nvSpPr", &[])?;
        xml.empty("p:cNvPr", &[("id", id), ("name", name)])?;
        xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
        xml.empty("p:nvPr", &[])?;
        xml.end("p:nvSpPr")?;
        xml.start("p:spPr", &[])?;
        transform(xml, "a:xfrm", frame)?;
        xml.start("a:prstGeom", &[("prst", "rect")])?;
        xml.empty("a:avLst", &[])?;
        xml.end("a:prstGeom")?;
        xml.empty("a:noFill", &[])?;
        xml.end("p:spPr")?;
        xml.start("p:txBody", &[])?;
        xml.start(
            "a:bodyPr",
            &[
                ("wrap", "square"),
                ("lIns", "0"),
                ("tIns", "0"),
                ("rIns", "0"),
                ("bIns", "0"),
                ("anchor", "t"),
            ],
        )?;
        xml.empty("a:noAutofit", &[])?;
        xml.end("a:bodyPr")?;
        xml.empty("a:lstStyle", &[])?;
        body(xml)?;
        xml.end("p:txBody")?;
        xml.end("p:sp")
    }

    fn picture(
        &mut self,
        index: usize,
        id: &str,
        number: usize,
        frame: Rect,
        image: &ImageRef,
    ) -> Result<()> {
        if image.data.is_empty() || image.width_px == 0 || image.height_px == 0 {
            return Err(self.invalid(index, format!("image '{}' has no data", image.name)));
        }

        let part = self.media.add(image).to_string();
        let target = format!("../{}", part.trim_start_matches("ppt/"));
        let rid = match self.images.iter().find(|(_, t)| *t == target) {
            Some((rid, _)) => rid.clone(),
            None => {
                let rid = format!("rId{}", self.images.len() + 2);
                self.images.push((rid.clone(), target));
                rid
            }
        };

        let xml = &mut self.xml;
        xml.start("p:pic", &[])?;
        xml.start("p:nvPicPr", &[])?;
        xml.empty(
            "p:cNvPr",
            &[
                ("id", id),
                ("name", &format!("Picture {}", number)),
                ("descr", &image.name),
            ],
        )?;
        xml.start("p:cNvPicPr", &[])?;
        xml.empty("a:picLocks", &[("noChangeAspect", "1")])?;
        xml.end("p:cNvPicPr")?;
        xml.empty("p:nvPr", &[])?;
        xml.end("p:nvPicPr")?;
        xml.start("p:blipFill", &[])?;
        xml.empty("a:blip", &[("r:embed", &rid)])?;
        xml.start("a:stretch", &[])?;
        xml.empty("a:fillRect", &[])?;
        xml.end("a:stretch")?;
        xml.end("p:blipFill")?;
        xml.start("p:spPr", &[])?;
        transform(xml, "a:xfrm", frame)?;
        xml.start("a:prstGeom", &[("prst", "rect")])?;
        xml.empty("a:avLst", &[])?;
        xml.end("a:prstGeom")?;
        xml.end("p:spPr")?;
        xml.end("p:pic")
    }

    fn table(
        &mut self,
        id: &str,
        number: usize,
        rule: &StyleRule,
        placement: &Placement,
        rows: &[Vec<String>],
        header: bool,
    ) -> Result<()> {
        let frame = placement.frame;
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let column_width = emu(frame.width / columns as f64);
        let padding = emu(placement.font_size * 0.3).to_string();
        let para = ParaStyle {
            align: if rule.is_rtl() { Align::Right } else { Align::Left },
            line_height: placement.line_height,
            rtl: rule.is_rtl(),
        };

        let xml = &mut self.xml;
        xml.start("p:graphicFrame", &[])?;
        xml.start("p:nvGraphicFramePr", &[])?;
        xml.empty("p:cNvPr", &[("id", id), ("name", &format!("Table {}", number))])?;
        xml.start("p:cNvGraphicFramePr", &[])?;
        xml.empty("a:graphicFrameLocks", &[("noGrp", "1")])?;
        xml.end("p:cNvGraphicFramePr")?;
        xml.empty("p:nvPr", &[])?;
        xml.end("p:nvGraphicFramePr")?;
        transform(xml, "p:xfrm", frame)?;
        xml.start("a:graphic", &[])?;
        xml.start("a:graphicData", &[("uri", TABLE_URI)])?;
        xml.start("a:tbl", &[])?;
        let first_row = if header { "1" } else { "0" };
        let mut table_attrs = vec![("firstRow", first_row), ("bandRow", "0")];
        if rule.is_rtl() {
            table_attrs.push(("rtl", "1"));
        }
        xml.empty("a:tblPr", &table_attrs)?;
        xml.start("a:tblGrid", &[])?;
        for _ in 0..columns {
            xml.empty("a:gridCol", &[("w", &column_width.to_string())])?;
        }
        xml.end("a:tblGrid")?;

        for (r, row) in rows.iter().enumerate() {
            let height = placement
                .row_heights
                .get(r)
                .copied()
                .unwrap_or(placement.line_height);
            let run = body_run(rule, placement.font_size, header && r == 0);
            xml.start("a:tr", &[("h", &emu(height).to_string())])?;
            for c in 0..columns {
                let cell = row.get(c).map(String::as_str).unwrap_or("");
                xml.start("a:tc", &[])?;
                xml.start("a:txBody", &[])?;
                xml.empty("a:bodyPr", &[])?;
                xml.empty("a:lstStyle", &[])?;
                paragraphs(xml, cell, run, para)?;
                xml.end("a:txBody")?;
                xml.start(
                    "a:tcPr",
                    &[
                        ("marL", &padding),
                        ("marR", &padding),
                        ("marT", &padding),
                        ("marB", &padding),
                    ],
                )?;
                for edge in ["a:lnL", "a:lnR", "a:lnT", "a:lnB"] {
                    xml.start(edge, &[("w", "9525")])?;
                    xml.start("a:solidFill", &[])?;
                    xml.empty("a:srgbClr", &[("val", &rule.text_color.hex())])?;
                    xml.end("a:solidFill")?;
                    xml.end(edge)?;
                }
                xml.empty("a:noFill", &[])?;
                xml.end("a:tcPr")?;
                xml.end("a:tc")?;
            }
            xml.end("a:tr")?;
        }

        xml.end("a:tbl")?;
        xml.end("a:graphicData")?;
        xml.end("a:graphic")?;
        xml.end("p:graphicFrame")
    }
}

fn body_run(rule: &StyleRule, size: f64, bold: bool) -> RunStyle<'static> {
    RunStyle {
        size,
        bold,
        color: rule.text_color,
        family: rule.body_font,
        lang: rule.language.tag(),
        script: rule.language.script_typeface(),
    }
}

fn para_style(rule: &StyleRule, align: Align, placement: &Placement) -> ParaStyle {
    ParaStyle {
        align,
        line_height: placement.line_height,
        rtl: rule.is_rtl(),
    }
}

fn transform(xml: &mut XmlBuilder, name: &str, frame: Rect) -> Result<()> {
    xml.start(name, &[])?;
    xml.empty(
        "a:off",
        &[
            ("x", &emu(frame.x).to_string()),
            ("y", &emu(frame.y).to_string()),
        ],
    )?;
    xml.empty(
        "a:ext",
        &[
            ("cx", &emu(frame.width).to_string()),
            ("cy", &emu(frame.height).to_string()),
        ],
    )?;
    xml.end(name)
}

fn align_value(align: Align) -> &'static str {
    match align {
        Align::Left => "l",
        Align::Center => "ctr",
        Align::Right => "r",
    }
}

/// Line spacing in hundredths of a point, within the range `a:spcPts` accepts.
fn spacing_points(line_height: f64) -> String {
    ((line_height * 100.0).round_ties_even() as i64)
        .clamp(0, 158_400)
        .to_string()
}

/// One paragraph per source line.
fn paragraphs(xml: &mut XmlBuilder, text: &str, run: RunStyle<'_>, para: ParaStyle) -> Result<()> {
    for line in text.split('\n') {
        paragraph(xml, line, run, para, &[], None)?;
    }
    Ok(())
}

fn bullet(
    xml: &mut XmlBuilder,
    item: &BulletItem,
    glyph: char,
    run: RunStyle<'_>,
    para: ParaStyle,
) -> Result<()> {
    let depth = item.depth.min(8);
    let margin = emu(run.size * (BULLET_LEVEL_EM * f64::from(depth) + BULLET_HANG_EM));
    let indent = -emu(run.size * BULLET_HANG_EM);
    let attrs = [
        ("marL", margin.to_string()),
        ("lvl", depth.to_string()),
        ("indent", indent.to_string()),
    ];
    // Wrapped item lines belong to one paragraph.
    let text = item.text.replace('\n', " ");
    paragraph(xml, &text, run, para, &attrs, Some(glyph))
}

fn paragraph(
    xml: &mut XmlBuilder,
    text: &str,
    run: RunStyle<'_>,
    para: ParaStyle,
    extra: &[(&str, String)],
    glyph: Option<char>,
) -> Result<()> {
    let mut attrs: Vec<(&str, &str)> = extra.iter().map(|(k, v)| (*k, v.as_str())).collect();
    attrs.push(("algn", align_value(para.align)));
    if para.rtl {
        attrs.push(("rtl", "1"));
    }

    xml.start("a:p", &[])?;
    xml.start("a:pPr", &attrs)?;
    xml.start("a:lnSpc", &[])?;
    xml.empty("a:spcPts", &[("val", &spacing_points(para.line_height))])?;
    xml.end("a:lnSpc")?;
    match glyph {
        Some(glyph) => {
            xml.empty("a:buFont", &[("typeface", run.family.typeface())])?;
            xml.empty("a:buChar", &[("char", &glyph.to_string())])?;
        }
        None => xml.empty("a:buNone", &[])?,
    }
    xml.end("a:pPr")?;

    if text.is_empty() {
        run_properties(xml, "a:endParaRPr", run)?;
    } else {
        xml.start("a:r", &[])?;
        run_properties(xml, "a:rPr", run)?;
        xml.leaf("a:t", &[], text)?;
        xml.end("a:r")?;
    }
    xml.end("a:p")
}

fn run_properties(xml: &mut XmlBuilder, name: &str, run: RunStyle<'_>) -> Result<()> {
    let size = font_hundredths(run.size).to_string();
    let mut attrs = vec![("lang", run.lang), ("sz", size.as_str())];
    if run.bold {
        attrs.push(("b", "1"));
    }
    attrs.push(("dirty", "0"));

    xml.start(name, &attrs)?;
    xml.start("a:solidFill", &[])?;
    xml.empty("a:srgbClr", &[("val", &run.color.hex())])?;
    xml.end("a:solidFill")?;
    xml.empty("a:latin", &[("typeface", run.family.typeface())])?;
    if let Some(script) = run.script {
        xml.empty("a:cs", &[("typeface", script)])?;
    }
    xml.end(name)
}
