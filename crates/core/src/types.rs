//! Domain types for representing a deck before and after layout.

use crate::error::InputError;
use crate::style::{Language, StyleRule, Theme, Tone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

/// Handle to a rule in a deck's [`StyleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StyleId(u32);

impl StyleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of style rules owned by one pipeline invocation.
///
/// Blocks only hold a [`StyleId`], so replacing a rule here restyles every
/// block bound to it.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    rules: Vec<StyleRule>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule and return its id.
    pub fn insert(&mut self, rule: StyleRule) -> StyleId {
        self.rules.push(rule);
        StyleId((self.rules.len() - 1) as u32)
    }

    pub fn get(&self, id: StyleId) -> Option<&StyleRule> {
        self.rules.get(id.index())
    }

    /// Replace the rule behind `id`, returning the previous one.
    pub fn replace(&mut self, id: StyleId, rule: StyleRule) -> Option<StyleRule> {
        self.rules
            .get_mut(id.index())
            .map(|slot| std::mem::replace(slot, rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Raster image formats accepted for embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// An embedded image: encoded bytes plus what layout needs to size it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Name used as alt text and for diagnostics.
    pub name: String,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    /// Encoded file bytes, shared between clones.
    #[serde(skip)]
    pub data: Arc<Vec<u8>>,
}

impl ImageRef {
    /// Sniff encoded bytes for format and pixel size.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, InputError> {
        let name = name.into();
        let unsupported = |reason: String| InputError::UnsupportedImage {
            name: name.clone(),
            reason,
        };

        let reader = image::ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| unsupported(e.to_string()))?;
        let format = match reader.format() {
            Some(image::ImageFormat::Png) => ImageFormat::Png,
            Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Some(other) => return Err(unsupported(format!("{:?} is not supported", other))),
            None => return Err(unsupported("unrecognized format".to_string())),
        };
        let (width_px, height_px) = reader
            .into_dimensions()
            .map_err(|e| unsupported(e.to_string()))?;

        Ok(Self {
            name,
            format,
            width_px,
            height_px,
            data: Arc::new(data),
        })
    }
}

/// One item of a bullet list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletItem {
    pub text: String,
    /// Nesting depth, 0 for top level.
    pub depth: u8,
}

impl BulletItem {
    pub fn new(text: impl Into<String>, depth: u8) -> Self {
        Self {
            text: text.into(),
            depth,
        }
    }
}

/// Payload of a block. The set of variants is closed; codecs match it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockContent {
    Heading { text: String, level: u8 },
    BodyText { text: String },
    BulletList { items: Vec<BulletItem> },
    Image(ImageRef),
    Table { rows: Vec<Vec<String>> },
}

impl BlockContent {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockContent::Heading { .. } => BlockKind::Heading,
            BlockContent::BodyText { .. } => BlockKind::BodyText,
            BlockContent::BulletList { .. } => BlockKind::BulletList,
            BlockContent::Image(_) => BlockKind::Image,
            BlockContent::Table { .. } => BlockKind::Table,
        }
    }

    /// Flattened text of the payload, used to compare content across passes.
    pub fn payload(&self) -> String {
        match self {
            BlockContent::Heading { text, .. } | BlockContent::BodyText { text } => text.clone(),
            BlockContent::BulletList { items } => items
                .iter()
                .map(|i| i.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            BlockContent::Image(image) => image.name.clone(),
            BlockContent::Table { rows } => rows
                .iter()
                .map(|r| r.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BlockContent::Image(_) => false,
            _ => self.payload().trim().is_empty(),
        }
    }

    /// Append a fragment split off this content by layout.
    ///
    /// Returns `false`, leaving `self` untouched, when `tail` is a
    /// different kind of content or cannot be split at all.
    pub fn append(&mut self, tail: &BlockContent, joint: Joint) -> bool {
        match (self, tail) {
            (BlockContent::BodyText { text }, BlockContent::BodyText { text: rest }) => {
                text.push(joint.separator());
                text.push_str(rest);
                true
            }
            (BlockContent::BulletList { items }, BlockContent::BulletList { items: rest }) => {
                let mut rest = rest.iter();
                if let (Joint::Within(sep), Some(last)) = (joint, items.last_mut()) {
                    if let Some(first) = rest.next() {
                        last.text.push(sep);
                        last.text.push_str(&first.text);
                    }
                }
                items.extend(rest.cloned());
                true
            }
            (BlockContent::Table { rows }, BlockContent::Table { rows: rest }) => {
                rows.extend(rest.iter().cloned());
                true
            }
            _ => false,
        }
    }
}

/// Where a block fragment attaches to the fragment before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    /// The cut fell between bullet items or table rows.
    Between,
    /// The cut fell inside a run of text, at this whitespace character.
    Within(char),
}

impl Joint {
    fn separator(self) -> char {
        match self {
            Joint::Between => '\n',
            Joint::Within(sep) => sep,
        }
    }
}

/// Discriminant of [`BlockContent`], for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Heading,
    BodyText,
    BulletList,
    Image,
    Table,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Heading => "heading",
            BlockKind::BodyText => "body text",
            BlockKind::BulletList => "bullet list",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
        };
        f.write_str(name)
    }
}

/// Axis-aligned rectangle in points, origin at the slide's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `other` lies fully inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-6;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

/// Which typographic role a line of text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontRole {
    Heading,
    Body,
}

/// A positioned line of text. Coordinates are absolute slide points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    /// Left edge of the line.
    pub x: f64,
    /// Baseline, measured down from the slide top.
    pub baseline: f64,
    pub width: f64,
    pub size: f64,
    pub role: FontRole,
    pub bold: bool,
}

/// A straight stroke, used for table grids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Geometry computed by layout for one block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub frame: Rect,
    /// Font size of the block's primary text, in points.
    pub font_size: f64,
    pub line_height: f64,
    pub lines: Vec<TextLine>,
    pub strokes: Vec<Stroke>,
    /// Row heights for tables, top to bottom.
    pub row_heights: Vec<f64>,
}

/// One placeable unit of content within a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    content: BlockContent,
    style: Option<StyleId>,
    placement: Option<Placement>,
    joint: Option<Joint>,
}

impl Block {
    pub fn new(content: BlockContent) -> Self {
        Self {
            content,
            style: None,
            placement: None,
            joint: None,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(BlockContent::Heading {
            text: text.into(),
            level: 1,
        })
    }

    pub fn body(text: impl Into<String>) -> Self {
        Self::new(BlockContent::BodyText { text: text.into() })
    }

    pub fn bullets(items: Vec<BulletItem>) -> Self {
        Self::new(BlockContent::BulletList { items })
    }

    pub fn image(image: ImageRef) -> Self {
        Self::new(BlockContent::Image(image))
    }

    pub fn table(rows: Vec<Vec<String>>) -> Self {
        Self::new(BlockContent::Table { rows })
    }

    pub fn content(&self) -> &BlockContent {
        &self.content
    }

    pub fn kind(&self) -> BlockKind {
        self.content.kind()
    }

    pub fn style(&self) -> Option<StyleId> {
        self.style
    }

    /// Geometry from the most recent layout pass, if any.
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Set when layout split this block off the end of the previous one.
    pub fn joint(&self) -> Option<Joint> {
        self.joint
    }

    /// A copy of this block bound to `style`, without placement.
    pub fn bound_to(&self, style: StyleId) -> Block {
        Block {
            content: self.content.clone(),
            style: Some(style),
            placement: None,
            joint: self.joint,
        }
    }

    /// A new block carrying this block's content and style at `placement`.
    pub(crate) fn placed(&self, placement: Placement) -> Block {
        Block {
            content: self.content.clone(),
            style: self.style,
            placement: Some(placement),
            joint: self.joint,
        }
    }

    /// An unplaced piece of this block holding `content`.
    pub(crate) fn fragment(&self, content: BlockContent, joint: Option<Joint>) -> Block {
        Block {
            content,
            style: self.style,
            placement: None,
            joint,
        }
    }
}

/// Slide-level layout template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideTemplate {
    /// A lone heading, centered on the slide.
    Title,
    /// Heading and content stacked from the top.
    Content,
}

/// One slide: blocks in stacking order.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    blocks: Vec<Block>,
    template: Option<SlideTemplate>,
    continuation: bool,
}

impl Slide {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            template: None,
            continuation: false,
        }
    }

    pub fn with_template(mut self, template: SlideTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub(crate) fn laid_out(blocks: Vec<Block>, template: SlideTemplate, continuation: bool) -> Self {
        Self {
            blocks,
            template: Some(template),
            continuation,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn template(&self) -> Option<SlideTemplate> {
        self.template
    }

    /// Whether this slide carries blocks that overflowed the previous one.
    pub fn is_continuation(&self) -> bool {
        self.continuation
    }
}

/// Slide dimensions in points, fixed for a whole deck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}

impl SlideSize {
    /// 16:9 at 10 x 5.625 inches.
    pub const WIDESCREEN: SlideSize = SlideSize {
        width: 720.0,
        height: 405.0,
    };

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl Default for SlideSize {
    fn default() -> Self {
        Self::WIDESCREEN
    }
}

/// Deck-wide metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckMeta {
    pub language: Language,
    pub theme: Theme,
    pub tone: Tone,
    /// Supplied by the caller; never read from the clock inside the engine.
    pub created: Option<DateTime<Utc>>,
}

impl DeckMeta {
    pub fn new(theme: Theme, tone: Tone, language: Language) -> Self {
        Self {
            language,
            theme,
            tone,
            created: None,
        }
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

/// A whole presentation. Passes derive new decks rather than mutating one.
#[derive(Debug, Clone)]
pub struct Deck {
    slides: Vec<Slide>,
    meta: DeckMeta,
    styles: StyleTable,
    size: SlideSize,
}

impl Deck {
    /// Create a deck. Fails if `slides` is empty.
    pub fn new(meta: DeckMeta, slides: Vec<Slide>) -> Result<Self, InputError> {
        if slides.is_empty() {
            return Err(InputError::EmptyDeck);
        }
        Ok(Self {
            slides,
            meta,
            styles: StyleTable::new(),
            size: SlideSize::default(),
        })
    }

    pub fn with_size(mut self, size: SlideSize) -> Self {
        self.size = size;
        self
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn meta(&self) -> &DeckMeta {
        &self.meta
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn size(&self) -> SlideSize {
        self.size
    }

    /// Rule bound to `block`, if it is bound to one in this deck.
    pub fn style_of(&self, block: &Block) -> Option<&StyleRule> {
        block.style().and_then(|id| self.styles.get(id))
    }

    /// Derive a deck whose blocks are all bound to `rule`.
    pub fn with_style(&self, rule: StyleRule) -> Deck {
        let mut styles = self.styles.clone();
        let id = styles.insert(rule);
        let slides = self
            .slides
            .iter()
            .map(|slide| Slide {
                blocks: slide.blocks.iter().map(|b| b.bound_to(id)).collect(),
                template: slide.template,
                continuation: slide.continuation,
            })
            .collect();
        Deck {
            slides,
            meta: self.meta.clone(),
            styles,
            size: self.size,
        }
    }

    /// Derive a deck sharing this deck's metadata and styles with new slides.
    pub(crate) fn derive(&self, slides: Vec<Slide>) -> Deck {
        Deck {
            slides,
            meta: self.meta.clone(),
            styles: self.styles.clone(),
            size: self.size,
        }
    }

    /// Text of the first heading, used for titles and file names.
    pub fn title(&self) -> Option<&str> {
        self.slides
            .iter()
            .flat_map(|s| s.blocks.iter())
            .find_map(|b| match b.content() {
                BlockContent::Heading { text, .. } if !text.trim().is_empty() => {
                    Some(text.as_str())
                }
                _ => None,
            })
    }

    /// Whether every block carries a placement.
    pub fn is_laid_out(&self) -> bool {
        self.slides
            .iter()
            .flat_map(|s| s.blocks.iter())
            .all(|b| b.placement().is_some())
    }

    /// Sorted payloads of all non-empty blocks.
    ///
    /// Fragments of a block split by layout are rejoined first, so the
    /// result is the same before and after layout.
    pub fn payloads(&self) -> Vec<String> {
        let mut contents: Vec<BlockContent> = Vec::new();
        for block in self.slides.iter().flat_map(|s| s.blocks.iter()) {
            let joined = match (block.joint(), contents.last_mut()) {
                (Some(joint), Some(previous)) => previous.append(block.content(), joint),
                _ => false,
            };
            if !joined {
                contents.push(block.content().clone());
            }
        }

        let mut payloads: Vec<String> = contents
            .iter()
            .filter(|c| !c.is_empty())
            .map(BlockContent::payload)
            .collect();
        payloads.sort();
        payloads
    }

    pub fn block_count(&self) -> usize {
        self.slides.iter().map(|s| s.blocks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleResolver;

    fn meta() -> DeckMeta {
        DeckMeta::new(Theme::Professional, Tone::Formal, Language::En)
    }

    #[test]
    fn test_empty_deck_rejected() {
        assert_eq!(Deck::new(meta(), vec![]).unwrap_err(), InputError::EmptyDeck);
    }

    #[test]
    fn test_with_style_binds_every_block() {
        let deck = Deck::new(
            meta(),
            vec![
                Slide::new(vec![Block::heading("Intro"), Block::body("Hello")]),
                Slide::new(vec![Block::body("More")]),
            ],
        )
        .unwrap();
        let rule = StyleResolver::new().resolve_with(Theme::Academic, Tone::Casual, Language::En);
        let styled = deck.with_style(rule.clone());

        // The source deck is untouched.
        assert!(deck.slides()[0].blocks()[0].style().is_none());

        for block in styled.slides().iter().flat_map(|s| s.blocks()) {
            assert_eq!(styled.style_of(block), Some(&rule));
        }
    }

    #[test]
    fn test_style_replacement_propagates() {
        let resolver = StyleResolver::new();
        let mut table = StyleTable::new();
        let id = table.insert(resolver.resolve_with(Theme::Creative, Tone::Formal, Language::En));
        let old = table.replace(id, resolver.resolve_with(Theme::Medical, Tone::Formal, Language::En));
        assert_eq!(old.map(|r| r.theme), Some(Theme::Creative));
        assert_eq!(table.get(id).map(|r| r.theme), Some(Theme::Medical));
    }

    #[test]
    fn test_payloads_skip_empty_blocks() {
        let deck = Deck::new(
            meta(),
            vec![Slide::new(vec![
                Block::body("   "),
                Block::bullets(vec![BulletItem::new("a", 0), BulletItem::new("b", 1)]),
                Block::table(vec![vec!["x".into(), "y".into()]]),
            ])],
        )
        .unwrap();
        assert_eq!(deck.payloads(), vec!["a\nb".to_string(), "x\ty".to_string()]);
    }

    #[test]
    fn test_payloads_rejoin_fragments() {
        let list = Block::bullets(vec![BulletItem::new("alpha beta", 0), BulletItem::new("gamma", 1)]);
        let head = list.fragment(
            BlockContent::BulletList {
                items: vec![BulletItem::new("alpha", 0)],
            },
            None,
        );
        let tail = list.fragment(
            BlockContent::BulletList {
                items: vec![BulletItem::new("beta", 0), BulletItem::new("gamma", 1)],
            },
            Some(Joint::Within(' ')),
        );
        let whole = Deck::new(meta(), vec![Slide::new(vec![list.clone()])]).unwrap();
        let split = Deck::new(
            meta(),
            vec![Slide::new(vec![head]), Slide::new(vec![tail])],
        )
        .unwrap();
        assert_eq!(split.payloads(), whole.payloads());

        let rows = Block::table(vec![vec!["a".into()], vec!["b".into()]]);
        let top = rows.fragment(BlockContent::Table { rows: vec![vec!["a".into()]] }, None);
        let bottom = rows.fragment(
            BlockContent::Table { rows: vec![vec!["b".into()]] },
            Some(Joint::Between),
        );
        let split = Deck::new(meta(), vec![Slide::new(vec![top]), Slide::new(vec![bottom])]).unwrap();
        assert_eq!(split.payloads(), vec!["a\nb".to_string()]);
    }

    #[test]
    fn test_title_is_first_heading() {
        let deck = Deck::new(
            meta(),
            vec![
                Slide::new(vec![Block::body("no heading")]),
                Slide::new(vec![Block::heading("Results")]),
            ],
        )
        .unwrap();
        assert_eq!(deck.title(), Some("Results"));
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert!(outer.contains(&Rect::new(10.0, 10.0, 90.0, 40.0)));
        assert!(!outer.contains(&Rect::new(10.0, 10.0, 91.0, 40.0)));
    }

    #[test]
    fn test_block_content_serializes_tagged() {
        let json = serde_json::to_value(BlockContent::Heading {
            text: "Intro".into(),
            level: 1,
        })
        .unwrap();
        assert_eq!(json["kind"], "heading");
        assert_eq!(json["text"], "Intro");
    }
}
