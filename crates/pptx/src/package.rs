//! Package-level parts: content types, relationships, document
//! properties, presentation, master, layouts and theme.

use crate::xml::{emu, rel, relationships, Result, XmlBuilder, NS_A, NS_P, NS_R};
use chrono::SecondsFormat;
use slide_core::style::{Edge, StyleRule};
use slide_core::{Deck, ImageFormat, SlideSize, SlideTemplate};

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// First id of the slide id list; lower values are reserved.
const FIRST_SLIDE_ID: usize = 256;

/// Master and layout ids share a range above 2^31.
const MASTER_ID: u32 = 2_147_483_648;

pub(crate) const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Layout part number for a slide template.
pub(crate) fn layout_number(template: SlideTemplate) -> usize {
    match template {
        SlideTemplate::Title => 1,
        SlideTemplate::Content => 2,
    }
}

pub(crate) fn content_types(slide_count: usize, media: &[ImageFormat]) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "Types",
        &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
    )?;
    xml.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for format in media {
        xml.empty(
            "Default",
            &[("Extension", format.extension()), ("ContentType", format.mime_type())],
        )?;
    }

    let mut overrides = vec![
        (format!("/{}", PRESENTATION_PART), CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_SLIDE_LAYOUT),
        ("/ppt/slideLayouts/slideLayout2.xml".to_string(), CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
    ];
    for n in 1..=slide_count {
        overrides.push((format!("/ppt/slides/slide{}.xml", n), CT_SLIDE));
    }
    overrides.push(("/docProps/core.xml".to_string(), CT_CORE));
    overrides.push(("/docProps/app.xml".to_string(), CT_APP));

    for (part, content_type) in &overrides {
        xml.empty(
            "Override",
            &[("PartName", part.as_str()), ("ContentType", content_type)],
        )?;
    }
    xml.end("Types")?;
    Ok(xml.finish())
}

pub(crate) fn root_rels() -> Result<Vec<u8>> {
    relationships(&[
        ("rId1".into(), rel::OFFICE_DOCUMENT, PRESENTATION_PART.into()),
        ("rId2".into(), rel::CORE_PROPERTIES, "docProps/core.xml".into()),
        ("rId3".into(), rel::EXTENDED_PROPERTIES, "docProps/app.xml".into()),
    ])
}

pub(crate) fn core_props(deck: &Deck) -> Result<Vec<u8>> {
    let meta = deck.meta();
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    xml.leaf("dc:title", &[], deck.title().unwrap_or("Presentation"))?;
    xml.leaf("dc:language", &[], meta.language.tag())?;
    xml.leaf(
        "cp:keywords",
        &[],
        &format!("{}, {}", meta.theme, meta.tone),
    )?;
    if let Some(created) = meta.created {
        let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
        xml.leaf("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
        xml.leaf("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
    }
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

pub(crate) fn app_props(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "Properties",
        &[
            (
                "xmlns",
                "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
            ),
            (
                "xmlns:vt",
                "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
            ),
        ],
    )?;
    xml.leaf("Application", &[], env!("CARGO_PKG_NAME"))?;
    xml.leaf("PresentationFormat", &[], "Custom")?;
    xml.leaf("Slides", &[], &slide_count.to_string())?;
    xml.end("Properties")?;
    Ok(xml.finish())
}

/// `ppt/presentation.xml`. Slide relationships are `rId2..`, the master is
/// `rId1` and the theme follows the slides.
pub(crate) fn presentation(slide_count: usize, size: SlideSize) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "p:presentation",
        &[
            ("xmlns:a", NS_A),
            ("xmlns:r", NS_R),
            ("xmlns:p", NS_P),
            ("saveSubsetFonts", "1"),
        ],
    )?;

    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty(
        "p:sldMasterId",
        &[("id", &MASTER_ID.to_string()), ("r:id", "rId1")],
    )?;
    xml.end("p:sldMasterIdLst")?;

    xml.start("p:sldIdLst", &[])?;
    for i in 0..slide_count {
        xml.empty(
            "p:sldId",
            &[
                ("id", &(FIRST_SLIDE_ID + i).to_string()),
                ("r:id", &format!("rId{}", i + 2)),
            ],
        )?;
    }
    xml.end("p:sldIdLst")?;

    xml.empty(
        "p:sldSz",
        &[
            ("cx", &emu(size.width).to_string()),
            ("cy", &emu(size.height).to_string()),
        ],
    )?;
    xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
    xml.end("p:presentation")?;
    Ok(xml.finish())
}

pub(crate) fn presentation_rels(slide_count: usize) -> Result<Vec<u8>> {
    let mut rels = vec![(
        "rId1".to_string(),
        rel::SLIDE_MASTER,
        "slideMasters/slideMaster1.xml".to_string(),
    )];
    for n in 1..=slide_count {
        rels.push((format!("rId{}", n + 1), rel::SLIDE, format!("slides/slide{}.xml", n)));
    }
    rels.push((
        format!("rId{}", slide_count + 2),
        rel::THEME,
        "theme/theme1.xml".to_string(),
    ));
    relationships(&rels)
}

/// Empty group properties every shape tree starts with.
pub(crate) fn shape_tree_header(xml: &mut XmlBuilder) -> Result<()> {
    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.start("p:grpSpPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    xml.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
    xml.end("a:xfrm")?;
    xml.end("p:grpSpPr")
}

/// The slide master carries the background and the theme's accent bar,
/// so every slide inherits them.
pub(crate) fn slide_master(rule: &StyleRule, size: SlideSize) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "p:sldMaster",
        &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
    )?;
    xml.start("p:cSld", &[])?;
    xml.start("p:bg", &[])?;
    xml.start("p:bgPr", &[])?;
    xml.start("a:solidFill", &[])?;
    xml.empty("a:schemeClr", &[("val", "bg1")])?;
    xml.end("a:solidFill")?;
    xml.empty("a:effectLst", &[])?;
    xml.end("p:bgPr")?;
    xml.end("p:bg")?;

    xml.start("p:spTree", &[])?;
    shape_tree_header(&mut xml)?;
    if let Some(accent) = rule.template.accent {
        let (x, y, cx, cy) = match accent.edge {
            Edge::Left => (0.0, 0.0, accent.thickness, size.height),
            Edge::Right => (size.width - accent.thickness, 0.0, accent.thickness, size.height),
            Edge::Top => (0.0, 0.0, size.width, accent.thickness),
        };
        xml.start("p:sp", &[])?;
        xml.start("p:nvSpPr", &[])?;
        xml.empty("p:cNvPr", &[("id", "2"), ("name", "Accent Bar")])?;
        xml.empty("p:cNvSpPr", &[])?;
        xml.empty("p:nvPr", &[("userDrawn", "1")])?;
        xml.end("p:nvSpPr")?;
        xml.start("p:spPr", &[])?;
        xml.start("a:xfrm", &[])?;
        xml.empty(
            "a:off",
            &[("x", &emu(x).to_string()), ("y", &emu(y).to_string())],
        )?;
        xml.empty(
            "a:ext",
            &[("cx", &emu(cx).to_string()), ("cy", &emu(cy).to_string())],
        )?;
        xml.end("a:xfrm")?;
        xml.start("a:prstGeom", &[("prst", "rect")])?;
        xml.empty("a:avLst", &[])?;
        xml.end("a:prstGeom")?;
        xml.start("a:solidFill", &[])?;
        xml.empty("a:schemeClr", &[("val", "accent1")])?;
        xml.end("a:solidFill")?;
        xml.start("a:ln", &[])?;
        xml.empty("a:noFill", &[])?;
        xml.end("a:ln")?;
        xml.end("p:spPr")?;
        xml.end("p:sp")?;
    }
    xml.end("p:spTree")?;
    xml.end("p:cSld")?;

    xml.empty(
        "p:clrMap",
        &[
            ("bg1", "lt1"),
            ("tx1", "dk1"),
            ("bg2", "lt2"),
            ("tx2", "dk2"),
            ("accent1", "accent1"),
            ("accent2", "accent2"),
            ("accent3", "accent3"),
            ("accent4", "accent4"),
            ("accent5", "accent5"),
            ("accent6", "accent6"),
            ("hlink", "hlink"),
            ("folHlink", "folHlink"),
        ],
    )?;
    xml.start("p:sldLayoutIdLst", &[])?;
    for n in 1..=2u32 {
        xml.empty(
            "p:sldLayoutId",
            &[
                ("id", &(MASTER_ID + n).to_string()),
                ("r:id", &format!("rId{}", n)),
            ],
        )?;
    }
    xml.end("p:sldLayoutIdLst")?;
    xml.end("p:sldMaster")?;
    Ok(xml.finish())
}

pub(crate) fn master_rels() -> Result<Vec<u8>> {
    relationships(&[
        ("rId1".into(), rel::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".into()),
        ("rId2".into(), rel::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml".into()),
        ("rId3".into(), rel::THEME, "../theme/theme1.xml".into()),
    ])
}

pub(crate) fn slide_layout(template: SlideTemplate) -> Result<Vec<u8>> {
    let (kind, name) = match template {
        SlideTemplate::Title => ("title", "Title Slide"),
        SlideTemplate::Content => ("obj", "Title and Content"),
    };
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "p:sldLayout",
        &[
            ("xmlns:a", NS_A),
            ("xmlns:r", NS_R),
            ("xmlns:p", NS_P),
            ("type", kind),
            ("preserve", "1"),
        ],
    )?;
    xml.start("p:cSld", &[("name", name)])?;
    xml.start("p:spTree", &[])?;
    shape_tree_header(&mut xml)?;
    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sldLayout")?;
    Ok(xml.finish())
}

pub(crate) fn layout_rels() -> Result<Vec<u8>> {
    relationships(&[(
        "rId1".into(),
        rel::SLIDE_MASTER,
        "../slideMasters/slideMaster1.xml".into(),
    )])
}

/// Theme part carrying the resolved palette and font pair.
pub(crate) fn theme(rule: &StyleRule) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    let name = format!("{} {}", rule.theme, rule.tone);
    xml.start("a:theme", &[("xmlns:a", NS_A), ("name", &name)])?;
    xml.start("a:themeElements", &[])?;

    xml.start("a:clrScheme", &[("name", &name)])?;
    let palette = [
        ("a:dk1", rule.text_color.hex()),
        ("a:lt1", rule.background.hex()),
        ("a:dk2", rule.primary.hex()),
        ("a:lt2", rule.secondary.hex()),
        ("a:accent1", rule.primary.hex()),
        ("a:accent2", rule.accent_color().hex()),
        ("a:accent3", "A5A5A5".to_string()),
        ("a:accent4", "FFC000".to_string()),
        ("a:accent5", "5B9BD5".to_string()),
        ("a:accent6", "70AD47".to_string()),
        ("a:hlink", rule.primary.hex()),
        ("a:folHlink", rule.accent_color().hex()),
    ];
    for (slot, hex) in &palette {
        xml.start(slot, &[])?;
        xml.empty("a:srgbClr", &[("val", hex.as_str())])?;
        xml.end(slot)?;
    }
    xml.end("a:clrScheme")?;

    xml.start("a:fontScheme", &[("name", &name)])?;
    let script = rule.language.script_typeface().unwrap_or("");
    for (slot, family) in [("a:majorFont", rule.heading_font), ("a:minorFont", rule.body_font)] {
        xml.start(slot, &[])?;
        xml.empty("a:latin", &[("typeface", family.typeface())])?;
        xml.empty("a:ea", &[("typeface", "")])?;
        xml.empty("a:cs", &[("typeface", script)])?;
        xml.end(slot)?;
    }
    xml.end("a:fontScheme")?;

    xml.start("a:fmtScheme", &[("name", &name)])?;
    let solid = |xml: &mut XmlBuilder| -> Result<()> {
        xml.start("a:solidFill", &[])?;
        xml.empty("a:schemeClr", &[("val", "phClr")])?;
        xml.end("a:solidFill")
    };
    xml.start("a:fillStyleLst", &[])?;
    for _ in 0..3 {
        solid(&mut xml)?;
    }
    xml.end("a:fillStyleLst")?;
    xml.start("a:lnStyleLst", &[])?;
    for width in ["6350", "12700", "19050"] {
        xml.start("a:ln", &[("w", width)])?;
        solid(&mut xml)?;
        xml.end("a:ln")?;
    }
    xml.end("a:lnStyleLst")?;
    xml.start("a:effectStyleLst", &[])?;
    for _ in 0..3 {
        xml.start("a:effectStyle", &[])?;
        xml.empty("a:effectLst", &[])?;
        xml.end("a:effectStyle")?;
    }
    xml.end("a:effectStyleLst")?;
    xml.start("a:bgFillStyleLst", &[])?;
    for _ in 0..3 {
        solid(&mut xml)?;
    }
    xml.end("a:bgFillStyleLst")?;
    xml.end("a:fmtScheme")?;

    xml.end("a:themeElements")?;
    xml.end("a:theme")?;
    Ok(xml.finish())
}
