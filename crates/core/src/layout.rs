//! Layout engine: places blocks on slides and resolves overflow.
//!
//! Each slide moves through `Pending -> Measuring -> Fitted | Overflowed`.
//! An overflowed slide is split; both halves go back to the front of the
//! queue as pending slides, so the output keeps the input order.
//!
//! Fit policy, in order:
//! 1. shrink fonts from 1.0 down to `min_font_scale`
//! 2. reduce inter-block spacing and try the font scales again
//! 3. split off the longest prefix of blocks that fits at the smallest
//!    settings and carry the rest to a continuation slide
//!
//! A block preceded only by headings is split itself rather than moved:
//! body text at a sentence or word boundary, bullet lists between items
//! (or inside the first item), tables between rows. The pieces carry a
//! [`Joint`] so their payloads rejoin exactly. Nothing is dropped. Images,
//! headings, single rows and runs without whitespace cannot be split; one
//! that does not fit an empty slide is [`LayoutError::Unplaceable`].

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::metrics::{wrap_text, FontMetrics, StandardMetrics};
use crate::style::{Align, FontFamily, StyleRule};
use crate::types::{
    Block, BlockContent, BlockKind, BulletItem, Deck, FontRole, ImageRef, Joint, Placement, Rect,
    Slide, SlideTemplate, Stroke, TextLine,
};
use std::collections::VecDeque;

const EPSILON: f64 = 1e-6;

/// Bullet indentation per nesting level, in ems.
const BULLET_INDENT_EM: f64 = 1.2;

/// Gap between a bullet glyph and its text, in ems.
const BULLET_GAP_EM: f64 = 0.4;

/// Extra space between bullet items, in ems.
const ITEM_GAP_EM: f64 = 0.2;

/// Table cell padding, in ems.
const CELL_PADDING_EM: f64 = 0.3;

/// A slide waiting to be measured.
#[derive(Debug, Clone)]
struct PendingSlide {
    /// Index of the slide in the input deck.
    source: usize,
    /// Blocks paired with their index in the source slide.
    blocks: Vec<(usize, Block)>,
    continuation: bool,
}

#[derive(Debug)]
enum SlideState {
    Pending(PendingSlide),
    Measuring(PendingSlide),
    Fitted(Slide),
    Overflowed {
        head: PendingSlide,
        tail: PendingSlide,
    },
}

/// Font scale and block spacing for one fit attempt.
#[derive(Debug, Clone, Copy)]
struct FitSettings {
    scale: f64,
    spacing: f64,
}

/// Computes block geometry for every slide of a deck.
#[derive(Debug, Clone)]
pub struct LayoutEngine<M = StandardMetrics> {
    config: LayoutConfig,
    metrics: M,
}

impl LayoutEngine {
    /// Create an engine measuring text with [`StandardMetrics`].
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            metrics: StandardMetrics,
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl<M: FontMetrics> LayoutEngine<M> {
    /// Swap the font metrics used for measurement.
    pub fn with_metrics<N: FontMetrics>(self, metrics: N) -> LayoutEngine<N> {
        LayoutEngine {
            config: self.config,
            metrics,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `deck` using `style` for slide geometry.
    ///
    /// Blocks not yet bound to a style are bound to `style` first. The
    /// input deck is left untouched; the result is a new deck whose blocks
    /// all carry a placement.
    pub fn layout(&self, deck: &Deck, style: &StyleRule) -> Result<Deck, LayoutError> {
        let all_bound = deck
            .slides()
            .iter()
            .flat_map(|s| s.blocks())
            .all(|b| deck.style_of(b).is_some());
        let deck = if all_bound {
            deck.clone()
        } else {
            deck.with_style(style.clone())
        };

        let size = deck.size();
        let t = &style.template;
        let area = Rect::new(
            t.margin_left,
            t.margin_top,
            (size.width - t.margin_left - t.margin_right).max(0.0),
            (size.height - t.margin_top - t.margin_bottom).max(0.0),
        );

        let mut queue: VecDeque<PendingSlide> = deck
            .slides()
            .iter()
            .enumerate()
            .map(|(source, slide)| PendingSlide {
                source,
                blocks: slide.blocks().iter().cloned().enumerate().collect(),
                continuation: slide.is_continuation(),
            })
            .collect();

        let mut slides = Vec::with_capacity(queue.len());
        while let Some(pending) = queue.pop_front() {
            let mut state = SlideState::Pending(pending);
            loop {
                state = match state {
                    SlideState::Pending(p) => SlideState::Measuring(p),
                    SlideState::Measuring(p) => self.fit(p, &deck, style, area)?,
                    SlideState::Fitted(slide) => {
                        slides.push(slide);
                        break;
                    }
                    SlideState::Overflowed { head, tail } => {
                        queue.push_front(tail);
                        queue.push_front(head);
                        break;
                    }
                };
            }
        }

        log::debug!(
            "Laid out {} slides into {} slides",
            deck.slides().len(),
            slides.len()
        );

        Ok(deck.derive(slides))
    }

    /// Font scales from 1.0 down to the minimum, inclusive.
    fn scales(&self) -> Vec<f64> {
        let min = self.config.min_font_scale;
        let step = self.config.font_scale_step;
        let steps = ((1.0 - min) / step + EPSILON).floor() as usize;
        let mut scales: Vec<f64> = (0..=steps).map(|k| 1.0 - k as f64 * step).collect();
        if scales.last().is_some_and(|&s| s > min + EPSILON) {
            scales.push(min);
        }
        scales
    }

    fn attempts(&self, style: &StyleRule) -> Vec<FitSettings> {
        let scales = self.scales();
        [1.0, self.config.reduced_spacing_ratio]
            .into_iter()
            .flat_map(|ratio| {
                scales.iter().map(move |&scale| FitSettings {
                    scale,
                    spacing: style.block_spacing * ratio,
                })
            })
            .collect()
    }

    fn tightest(&self, style: &StyleRule) -> FitSettings {
        FitSettings {
            scale: self.config.min_font_scale,
            spacing: style.block_spacing * self.config.reduced_spacing_ratio,
        }
    }

    fn fit(
        &self,
        pending: PendingSlide,
        deck: &Deck,
        style: &StyleRule,
        area: Rect,
    ) -> Result<SlideState, LayoutError> {
        let template = template_for(&pending.blocks);

        for settings in self.attempts(style) {
            if let Some(placements) =
                self.try_fit(&pending, &pending.blocks, deck, style, area, template, settings)?
            {
                log::debug!(
                    "Slide {} fitted {} blocks at scale {:.2}, spacing {:.1}",
                    pending.source,
                    pending.blocks.len(),
                    settings.scale,
                    settings.spacing
                );
                let blocks = pending
                    .blocks
                    .iter()
                    .zip(placements)
                    .map(|((_, block), placement)| block.placed(placement))
                    .collect();
                return Ok(SlideState::Fitted(Slide::laid_out(
                    blocks,
                    template,
                    pending.continuation,
                )));
            }
        }

        let tightest = self.tightest(style);
        let mut keep = 0;
        for k in (1..pending.blocks.len()).rev() {
            let head = &pending.blocks[..k];
            if self
                .try_fit(&pending, head, deck, style, area, template_for(head), tightest)?
                .is_some()
            {
                keep = k;
                break;
            }
        }

        let head_is_headings = pending.blocks[..keep]
            .iter()
            .all(|(_, b)| b.kind() == BlockKind::Heading);
        if head_is_headings {
            if let Some((part, rest)) = self.split_block(&pending, keep, deck, style, area, tightest)? {
                let (index, _) = pending.blocks[keep];
                log::debug!(
                    "Slide {} overflowed; block {} split across slides",
                    pending.source,
                    index
                );
                let mut blocks = pending.blocks;
                let mut tail = blocks.split_off(keep);
                tail[0] = (index, rest);
                blocks.push((index, part));
                return Ok(SlideState::Overflowed {
                    head: PendingSlide {
                        source: pending.source,
                        blocks,
                        continuation: pending.continuation,
                    },
                    tail: PendingSlide {
                        source: pending.source,
                        blocks: tail,
                        continuation: true,
                    },
                });
            }
        }

        if keep > 0 {
            log::debug!(
                "Slide {} overflowed; {} of {} blocks stay",
                pending.source,
                keep,
                pending.blocks.len()
            );
            let mut blocks = pending.blocks;
            let tail = blocks.split_off(keep);
            return Ok(SlideState::Overflowed {
                head: PendingSlide {
                    source: pending.source,
                    blocks,
                    continuation: pending.continuation,
                },
                tail: PendingSlide {
                    source: pending.source,
                    blocks: tail,
                    continuation: true,
                },
            });
        }

        // The first block neither fits on its own nor splits.
        let (index, block) = &pending.blocks[0];
        let rule = deck.style_of(block).unwrap_or(style);
        let needed = self
            .measure(block, rule, tightest.scale, area)
            .map(|p| p.frame.height)
            .unwrap_or(f64::INFINITY);
        Err(LayoutError::Unplaceable {
            slide: pending.source,
            block: *index,
            kind: block.kind(),
            reason: format!(
                "needs {:.1}pt of height at minimum font size and cannot be split, \
                 {:.1}pt available",
                needed, area.height
            ),
        })
    }

    /// Split block `at` so that its first part fits after the blocks
    /// before it. Returns the part and the remainder, or `None` if the
    /// block cannot be split or not even its smallest part fits.
    #[allow(clippy::too_many_arguments)]
    fn split_block(
        &self,
        pending: &PendingSlide,
        at: usize,
        deck: &Deck,
        style: &StyleRule,
        area: Rect,
        settings: FitSettings,
    ) -> Result<Option<(Block, Block)>, LayoutError> {
        let (index, block) = &pending.blocks[at];
        let fits = |content: BlockContent| -> Result<bool, LayoutError> {
            let mut blocks = pending.blocks[..at].to_vec();
            blocks.push((*index, block.fragment(content, block.joint())));
            let template = template_for(&blocks);
            Ok(self
                .try_fit(pending, &blocks, deck, style, area, template, settings)?
                .is_some())
        };
        let pieces = |head: BlockContent, rest: BlockContent, joint: Joint| {
            Some((
                block.fragment(head, block.joint()),
                block.fragment(rest, Some(joint)),
            ))
        };

        match block.content() {
            BlockContent::BodyText { text } => {
                let body = |text: &str| BlockContent::BodyText {
                    text: text.to_string(),
                };
                let Some(cut) = text_cut(text, |head| fits(body(head)))? else {
                    return Ok(None);
                };
                Ok(pieces(body(cut.head), body(cut.rest), Joint::Within(cut.separator)))
            }
            BlockContent::BulletList { items } => {
                let list = |items: Vec<BulletItem>| BlockContent::BulletList { items };
                let whole = largest(items.len().saturating_sub(1), |k| {
                    fits(list(items[..=k].to_vec()))
                })?;
                if let Some(k) = whole {
                    return Ok(pieces(
                        list(items[..=k].to_vec()),
                        list(items[k + 1..].to_vec()),
                        Joint::Between,
                    ));
                }

                let Some(first) = items.first() else {
                    return Ok(None);
                };
                let item = |text: &str| BulletItem::new(text, first.depth);
                let Some(cut) = text_cut(&first.text, |head| fits(list(vec![item(head)])))? else {
                    return Ok(None);
                };
                let mut rest = vec![item(cut.rest)];
                rest.extend(items[1..].iter().cloned());
                Ok(pieces(
                    list(vec![item(cut.head)]),
                    list(rest),
                    Joint::Within(cut.separator),
                ))
            }
            BlockContent::Table { rows } => {
                let table = |rows: &[Vec<String>]| BlockContent::Table {
                    rows: rows.to_vec(),
                };
                let whole = largest(rows.len().saturating_sub(1), |k| fits(table(&rows[..=k])))?;
                Ok(whole.and_then(|k| {
                    pieces(table(&rows[..=k]), table(&rows[k + 1..]), Joint::Between)
                }))
            }
            BlockContent::Heading { .. } | BlockContent::Image(_) => Ok(None),
        }
    }

    /// Measure and position `blocks` at `settings`, or `None` if they do
    /// not fit `area`.
    #[allow(clippy::too_many_arguments)]
    fn try_fit(
        &self,
        pending: &PendingSlide,
        blocks: &[(usize, Block)],
        deck: &Deck,
        style: &StyleRule,
        area: Rect,
        template: SlideTemplate,
        settings: FitSettings,
    ) -> Result<Option<Vec<Placement>>, LayoutError> {
        let mut measured = Vec::with_capacity(blocks.len());
        for (index, block) in blocks {
            let rule = deck.style_of(block).unwrap_or(style);
            let placement = self
                .measure(block, rule, settings.scale, area)
                .map_err(|reason| LayoutError::Unplaceable {
                    slide: pending.source,
                    block: *index,
                    kind: block.kind(),
                    reason,
                })?;
            measured.push(placement);
        }

        let total: f64 = measured.iter().map(|p| p.frame.height).sum::<f64>()
            + settings.spacing * measured.len().saturating_sub(1) as f64;
        if total > area.height + EPSILON {
            return Ok(None);
        }

        let mut y = match template {
            SlideTemplate::Title => area.y + (area.height - total) / 2.0,
            SlideTemplate::Content => area.y,
        };
        let placed = measured
            .into_iter()
            .map(|placement| {
                let height = placement.frame.height;
                let shifted = shift(placement, y);
                y += height + settings.spacing;
                shifted
            })
            .collect();
        Ok(Some(placed))
    }

    /// Natural geometry of one block at `scale`, with its top at y = 0.
    ///
    /// The error string explains why an image cannot be placed at all.
    fn measure(
        &self,
        block: &Block,
        rule: &StyleRule,
        scale: f64,
        area: Rect,
    ) -> Result<Placement, String> {
        match block.content() {
            BlockContent::Heading { text, level } => Ok(self.measure_text(
                text,
                TextStyle {
                    family: rule.heading_font,
                    bold: rule.heading_bold,
                    size: rule.heading_size(*level) * scale,
                    line_spacing: rule.line_spacing,
                    role: FontRole::Heading,
                    align: rule.template.heading_align,
                },
                area,
            )),
            BlockContent::BodyText { text } => Ok(self.measure_text(
                text,
                TextStyle {
                    family: rule.body_font,
                    bold: false,
                    size: rule.body_size() * scale,
                    line_spacing: rule.line_spacing,
                    role: FontRole::Body,
                    align: rule.template.body_align,
                },
                area,
            )),
            BlockContent::BulletList { items } => Ok(self.measure_bullets(items, rule, scale, area)),
            BlockContent::Table { rows } => {
                let header = block.joint().is_none();
                Ok(self.measure_table(rows, header, rule, scale, area))
            }
            BlockContent::Image(image) => self.measure_image(image, rule, area),
        }
    }

    fn measure_text(&self, text: &str, style: TextStyle, area: Rect) -> Placement {
        let line_height = style.size * style.line_spacing;
        let offset = self.baseline_offset(style.family, style.size, line_height);

        let lines: Vec<TextLine> = wrap_text(
            &self.metrics,
            style.family,
            style.bold,
            style.size,
            text,
            area.width,
        )
        .into_iter()
        .enumerate()
        .map(|(i, line)| TextLine {
            x: align_x(style.align, area, line.width),
            baseline: i as f64 * line_height + offset,
            width: line.width,
            text: line.text,
            size: style.size,
            role: style.role,
            bold: style.bold,
        })
        .collect();

        Placement {
            frame: Rect::new(area.x, 0.0, area.width, lines.len() as f64 * line_height),
            font_size: style.size,
            line_height,
            lines,
            strokes: Vec::new(),
            row_heights: Vec::new(),
        }
    }

    fn measure_bullets(
        &self,
        items: &[BulletItem],
        rule: &StyleRule,
        scale: f64,
        area: Rect,
    ) -> Placement {
        let size = rule.body_size() * scale;
        let line_height = size * rule.line_spacing;
        let offset = self.baseline_offset(rule.body_font, size, line_height);
        let glyph = rule.bullet_glyph.to_string();
        let glyph_width = self.metrics.text_width(rule.body_font, false, &glyph, size);

        let body_line = |text: String, x: f64, baseline: f64, width: f64| TextLine {
            text,
            x,
            baseline,
            width,
            size,
            role: FontRole::Body,
            bold: false,
        };

        let mut lines = Vec::new();
        let mut y = 0.0;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                y += size * ITEM_GAP_EM;
            }
            let indent = (f64::from(item.depth) * size * BULLET_INDENT_EM).min(area.width / 2.0);
            let text_x = area.x + indent + glyph_width + size * BULLET_GAP_EM;
            let available = (area.right() - text_x).max(size);

            lines.push(body_line(glyph.clone(), area.x + indent, y + offset, glyph_width));
            let wrapped = wrap_text(&self.metrics, rule.body_font, false, size, &item.text, available);
            let count = wrapped.len().max(1);
            for (j, line) in wrapped.into_iter().enumerate() {
                lines.push(body_line(
                    line.text,
                    text_x,
                    y + j as f64 * line_height + offset,
                    line.width,
                ));
            }
            y += count as f64 * line_height;
        }

        if rule.is_rtl() {
            for line in &mut lines {
                line.x = mirror_x(area, line.x, line.width);
            }
        }

        Placement {
            frame: Rect::new(area.x, 0.0, area.width, y),
            font_size: size,
            line_height,
            lines,
            strokes: Vec::new(),
            row_heights: Vec::new(),
        }
    }

    fn measure_table(
        &self,
        rows: &[Vec<String>],
        header: bool,
        rule: &StyleRule,
        scale: f64,
        area: Rect,
    ) -> Placement {
        let size = rule.table_size() * scale;
        let line_height = size * rule.line_spacing;
        let padding = size * CELL_PADDING_EM;
        let offset = self.baseline_offset(rule.body_font, size, line_height);
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let column_width = area.width / columns as f64;
        let cell_width = (column_width - 2.0 * padding).max(size);

        let mut lines = Vec::new();
        let mut row_heights = Vec::with_capacity(rows.len());
        let mut y = 0.0;
        for (r, row) in rows.iter().enumerate() {
            // Header row is bold. Continued tables have none.
            let bold = header && r == 0;
            let mut tallest = 1;
            for (c, cell) in row.iter().enumerate() {
                let x = area.x + c as f64 * column_width + padding;
                let wrapped = wrap_text(&self.metrics, rule.body_font, bold, size, cell, cell_width);
                tallest = tallest.max(wrapped.len());
                for (j, line) in wrapped.into_iter().enumerate() {
                    lines.push(TextLine {
                        text: line.text,
                        x,
                        baseline: y + padding + j as f64 * line_height + offset,
                        width: line.width,
                        size,
                        role: FontRole::Body,
                        bold,
                    });
                }
            }
            let height = tallest as f64 * line_height + 2.0 * padding;
            row_heights.push(height);
            y += height;
        }

        let mut strokes = Vec::new();
        if !rows.is_empty() {
            let mut boundary = 0.0;
            strokes.push(horizontal(area, boundary));
            for height in &row_heights {
                boundary += height;
                strokes.push(horizontal(area, boundary));
            }
            for c in 0..=columns {
                let x = area.x + c as f64 * column_width;
                strokes.push(Stroke {
                    x1: x,
                    y1: 0.0,
                    x2: x,
                    y2: y,
                });
            }
        }

        if rule.is_rtl() {
            for line in &mut lines {
                line.x = mirror_x(area, line.x, line.width);
            }
            for stroke in &mut strokes {
                stroke.x1 = mirror_x(area, stroke.x1, 0.0);
                stroke.x2 = mirror_x(area, stroke.x2, 0.0);
            }
        }

        Placement {
            frame: Rect::new(area.x, 0.0, area.width, y),
            font_size: size,
            line_height,
            lines,
            strokes,
            row_heights,
        }
    }

    /// Images keep their aspect ratio and are never enlarged.
    fn measure_image(
        &self,
        image: &ImageRef,
        rule: &StyleRule,
        area: Rect,
    ) -> Result<Placement, String> {
        let natural_width = f64::from(image.width_px) * 72.0 / self.config.image_dpi;
        let natural_height = f64::from(image.height_px) * 72.0 / self.config.image_dpi;
        if natural_width <= 0.0 || natural_height <= 0.0 {
            return Err(format!("image '{}' has no pixels", image.name));
        }

        let fit = (area.width / natural_width)
            .min(area.height / natural_height)
            .min(1.0);
        if fit + EPSILON < self.config.min_image_scale {
            return Err(format!(
                "image '{}' would need scaling to {:.3} of its natural size, minimum is {:.3}",
                image.name, fit, self.config.min_image_scale
            ));
        }

        let width = natural_width * fit;
        let height = natural_height * fit;
        Ok(Placement {
            frame: Rect::new(align_x(rule.template.body_align, area, width), 0.0, width, height),
            font_size: 0.0,
            line_height: 0.0,
            lines: Vec::new(),
            strokes: Vec::new(),
            row_heights: Vec::new(),
        })
    }

    /// Distance from the top of a line box to its baseline.
    fn baseline_offset(&self, family: FontFamily, size: f64, line_height: f64) -> f64 {
        (line_height - size) / 2.0 + self.metrics.ascent(family) * size
    }
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    family: FontFamily,
    bold: bool,
    size: f64,
    line_spacing: f64,
    role: FontRole,
    align: Align,
}

/// A cut through a run of text at one whitespace character.
struct TextCut<'a> {
    head: &'a str,
    separator: char,
    rest: &'a str,
}

/// Sentence-final punctuation, including the Devanagari danda.
fn ends_sentence(head: &str) -> bool {
    head.ends_with(['.', '!', '?', '\u{0964}'])
}

/// Longest cut of `text` at whitespace whose head satisfies `fits`,
/// moved back to a sentence end when one lies in the second half.
fn text_cut<'a, E>(
    text: &'a str,
    mut fits: impl FnMut(&str) -> Result<bool, E>,
) -> Result<Option<TextCut<'a>>, E> {
    let cuts: Vec<(usize, char)> = text
        .char_indices()
        .filter(|&(i, c)| c.is_whitespace() && i > 0 && i + c.len_utf8() < text.len())
        .collect();
    let Some(k) = largest(cuts.len(), |k| fits(&text[..cuts[k].0]))? else {
        return Ok(None);
    };

    let longest = cuts[k].0;
    let (at, separator) = cuts[..=k]
        .iter()
        .rev()
        .take_while(|&&(i, _)| 2 * i >= longest)
        .find(|&&(i, _)| ends_sentence(&text[..i]))
        .copied()
        .unwrap_or(cuts[k]);
    Ok(Some(TextCut {
        head: &text[..at],
        separator,
        rest: &text[at + separator.len_utf8()..],
    }))
}

/// Largest `k < n` for which `pred` holds, given that `pred` holds for
/// every index below one where it holds.
fn largest<E>(n: usize, mut pred: impl FnMut(usize) -> Result<bool, E>) -> Result<Option<usize>, E> {
    let (mut lo, mut hi) = (0, n);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid)? {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo.checked_sub(1))
}

/// A lone heading gets the title template.
fn template_for(blocks: &[(usize, Block)]) -> SlideTemplate {
    match blocks {
        [(_, block)] if block.kind() == BlockKind::Heading => SlideTemplate::Title,
        _ => SlideTemplate::Content,
    }
}

fn align_x(align: Align, area: Rect, width: f64) -> f64 {
    match align {
        Align::Left => area.x,
        Align::Center => area.x + (area.width - width) / 2.0,
        Align::Right => area.right() - width,
    }
}

/// Reflect a span across the vertical center line of `area`.
fn mirror_x(area: Rect, x: f64, width: f64) -> f64 {
    area.x + area.right() - x - width
}

fn horizontal(area: Rect, y: f64) -> Stroke {
    Stroke {
        x1: area.x,
        y1: y,
        x2: area.right(),
        y2: y,
    }
}

/// Move a measured placement down to `top`.
fn shift(mut placement: Placement, top: f64) -> Placement {
    placement.frame.y += top;
    for line in &mut placement.lines {
        line.baseline += top;
    }
    for stroke in &mut placement.strokes {
        stroke.y1 += top;
        stroke.y2 += top;
    }
    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Language, StyleResolver, TextDirection, Theme, Tone};
    use crate::types::{DeckMeta, SlideSize};

    fn rule() -> StyleRule {
        StyleResolver::new().resolve_with(Theme::Professional, Tone::Formal, Language::En)
    }

    fn deck(slides: Vec<Slide>) -> Deck {
        Deck::new(
            DeckMeta::new(Theme::Professional, Tone::Formal, Language::En),
            slides,
        )
        .unwrap()
    }

    fn filler(chars: usize) -> String {
        let text = "lorem ipsum dolor sit amet ".repeat(chars / 27 + 1);
        text[..chars].trim().to_string()
    }

    fn png(width: u32, height: u32) -> ImageRef {
        let mut bytes = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        ImageRef::from_bytes("test.png", bytes).unwrap()
    }

    fn assert_inside(deck: &Deck) {
        let bounds = SlideSize::WIDESCREEN.bounds();
        for slide in deck.slides() {
            for block in slide.blocks() {
                let placement = block.placement().expect("placed");
                assert!(bounds.contains(&placement.frame), "{:?}", placement.frame);
            }
        }
    }

    #[test]
    fn test_layout_places_every_block() {
        let input = deck(vec![Slide::new(vec![
            Block::heading("Overview"),
            Block::body("A short paragraph."),
            Block::bullets(vec![BulletItem::new("one", 0), BulletItem::new("two", 1)]),
        ])]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();

        assert!(out.is_laid_out());
        assert!(!input.is_laid_out());
        assert_eq!(out.slides().len(), 1);
        assert_eq!(out.slides()[0].template(), Some(SlideTemplate::Content));
        assert_inside(&out);

        // Blocks stack top to bottom in order.
        let tops: Vec<f64> = out.slides()[0]
            .blocks()
            .iter()
            .map(|b| b.placement().unwrap().frame.y)
            .collect();
        assert!(tops.windows(2).all(|w| w[0] < w[1]));

        let heading = out.slides()[0].blocks()[0].placement().unwrap();
        assert!((heading.font_size - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let input = deck(vec![
            Slide::new(vec![Block::heading("Title"), Block::body(filler(400))]),
            Slide::new(vec![Block::table(vec![
                vec!["a".into(), "b".into()],
                vec!["c".into(), "d".into()],
            ])]),
        ]);
        let engine = LayoutEngine::default();
        let a = engine.layout(&input, &rule()).unwrap();
        let b = engine.layout(&input, &rule()).unwrap();
        assert_eq!(a.slides(), b.slides());
    }

    #[test]
    fn test_shrinks_before_splitting() {
        let input = deck(vec![Slide::new(vec![
            Block::body(filler(560)),
            Block::body(filler(560)),
        ])]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();
        assert_eq!(out.slides().len(), 1);
        let size = out.slides()[0].blocks()[0].placement().unwrap().font_size;
        assert!(size < 20.0 && size >= 14.0 - EPSILON, "size {}", size);
        assert_inside(&out);
    }

    #[test]
    fn test_overflow_splits_without_loss() {
        let blocks: Vec<Block> = (0..8).map(|i| Block::body(format!("{} {}", i, filler(300)))).collect();
        let input = deck(vec![Slide::new(blocks)]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();

        assert!(out.slides().len() >= 2);
        assert_eq!(out.payloads(), input.payloads());
        assert!(!out.slides()[0].is_continuation());
        assert!(out.slides()[1..].iter().all(|s| s.is_continuation()));
        assert_inside(&out);

        // Original order survives across the split.
        let order: Vec<String> = out
            .slides()
            .iter()
            .flat_map(|s| s.blocks())
            .map(|b| b.content().payload())
            .collect();
        let expected: Vec<String> = input.slides()[0]
            .blocks()
            .iter()
            .map(|b| b.content().payload())
            .collect();
        assert_eq!(order, expected);
    }

    /// Block payloads in slide order, with split fragments rejoined.
    fn rejoined(deck: &Deck) -> Vec<String> {
        let mut contents: Vec<BlockContent> = Vec::new();
        for block in deck.slides().iter().flat_map(|s| s.blocks()) {
            match (block.joint(), contents.last_mut()) {
                (Some(joint), Some(last)) => assert!(last.append(block.content(), joint)),
                _ => contents.push(block.content().clone()),
            }
        }
        contents.iter().map(BlockContent::payload).collect()
    }

    #[test]
    fn test_long_blocks_continue_on_next_slide() {
        let long_item = format!("{}. Final words here", filler(5000));
        let input = deck(vec![
            Slide::new(vec![Block::heading("Notes"), Block::body(filler(5000))]),
            Slide::new(vec![
                Block::heading("Plan"),
                Block::bullets(vec![
                    BulletItem::new(long_item.clone(), 0),
                    BulletItem::new("short", 1),
                ]),
            ]),
        ]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();

        assert!(out.slides().len() > 4, "{} slides", out.slides().len());
        assert_eq!(out.payloads(), input.payloads());
        assert_eq!(
            rejoined(&out),
            vec!["Notes".to_string(), filler(5000), "Plan".to_string(), format!("{}\nshort", long_item)]
        );
        assert_inside(&out);

        // The body is split on the first slide, next to its heading.
        let first = out.slides()[0].blocks();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].kind(), BlockKind::BodyText);
        assert!(out.slides()[1].is_continuation());
        assert_eq!(out.slides()[1].blocks()[0].joint(), Some(Joint::Within(' ')));

        // Every fragment of the bullet item keeps its depth.
        let depths: Vec<u8> = out
            .slides()
            .iter()
            .flat_map(|s| s.blocks())
            .filter_map(|b| match b.content() {
                BlockContent::BulletList { items } => Some(items.iter().map(|i| i.depth)),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(depths.last(), Some(&1));
        assert!(depths[..depths.len() - 1].iter().all(|&d| d == 0));
    }

    #[test]
    fn test_text_split_prefers_sentence_end() {
        let sentences = "Short sentence here. ".repeat(200);
        let input = deck(vec![Slide::new(vec![Block::body(sentences.trim())])]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();
        assert!(out.slides().len() >= 2);
        match out.slides()[0].blocks()[0].content() {
            BlockContent::BodyText { text } => assert!(text.ends_with('.'), "{:?}", text),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(out.payloads(), input.payloads());
    }

    #[test]
    fn test_table_splits_by_row() {
        let mut rows = vec![vec!["Item".to_string(), "Notes".to_string()]];
        for i in 0..8 {
            rows.push(vec![format!("row {}", i), filler(700)]);
        }
        let input = deck(vec![Slide::new(vec![Block::table(rows.clone())])]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();

        assert!(out.slides().len() >= 2);
        assert_eq!(out.payloads(), input.payloads());
        assert_inside(&out);

        let mut seen = Vec::new();
        for (i, slide) in out.slides().iter().enumerate() {
            let block = &slide.blocks()[0];
            let placement = block.placement().unwrap();
            // Only the first fragment has a bold header row.
            assert_eq!(placement.lines.iter().any(|l| l.bold), i == 0);
            if let BlockContent::Table { rows } = block.content() {
                seen.extend(rows.iter().cloned());
            }
        }
        assert_eq!(seen, rows);
    }

    #[test]
    fn test_unbreakable_block_is_unplaceable() {
        let input = deck(vec![
            Slide::new(vec![Block::heading("Fine")]),
            Slide::new(vec![Block::heading("Ok"), Block::body("x".repeat(20000))]),
        ]);
        let err = LayoutEngine::default().layout(&input, &rule()).unwrap_err();
        match err {
            LayoutError::Unplaceable {
                slide, block, kind, ..
            } => {
                assert_eq!(slide, 1);
                assert_eq!(block, 1);
                assert_eq!(kind, BlockKind::BodyText);
            }
        }
    }

    #[test]
    fn test_layout_uses_deck_size() {
        let size = SlideSize {
            width: 540.0,
            height: 720.0,
        };
        let input = deck(vec![Slide::new(vec![
            Block::heading("Portrait"),
            Block::body(filler(900)),
        ])])
        .with_size(size);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();

        assert_eq!(out.size(), size);
        let bounds = size.bounds();
        for block in out.slides()[0].blocks() {
            let frame = block.placement().unwrap().frame;
            assert!(bounds.contains(&frame), "{:?}", frame);
        }
        // Portrait is taller than widescreen, so more fits on one slide.
        let body = out.slides()[0].blocks()[1].placement().unwrap();
        assert!(body.frame.bottom() > SlideSize::WIDESCREEN.height);
    }

    #[test]
    fn test_image_scaled_and_limited() {
        let input = deck(vec![Slide::new(vec![Block::image(png(64, 32))])]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();
        let frame = out.slides()[0].blocks()[0].placement().unwrap().frame;
        assert_eq!((frame.width, frame.height), (48.0, 24.0));

        let input = deck(vec![Slide::new(vec![Block::image(png(20000, 4))])]);
        let err = LayoutEngine::default().layout(&input, &rule()).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Unplaceable {
                kind: BlockKind::Image,
                ..
            }
        ));
    }

    #[test]
    fn test_lone_heading_is_centered_title() {
        let input = deck(vec![Slide::new(vec![Block::heading("Welcome")])]);
        let rule = rule();
        let out = LayoutEngine::default().layout(&input, &rule).unwrap();
        let slide = &out.slides()[0];
        assert_eq!(slide.template(), Some(SlideTemplate::Title));

        let frame = slide.blocks()[0].placement().unwrap().frame;
        let t = rule.template;
        let top_gap = frame.y - t.margin_top;
        let bottom_gap = (405.0 - t.margin_bottom) - frame.bottom();
        assert!((top_gap - bottom_gap).abs() < 1e-6);
    }

    #[test]
    fn test_table_grid() {
        let input = deck(vec![Slide::new(vec![Block::table(vec![
            vec!["Name".into(), "Score".into(), "Rank".into()],
            vec!["Ada".into(), "9".into(), "1".into()],
        ])])]);
        let out = LayoutEngine::default().layout(&input, &rule()).unwrap();
        let placement = out.slides()[0].blocks()[0].placement().unwrap();
        assert_eq!(placement.row_heights.len(), 2);
        // Three horizontal rules and four vertical ones.
        assert_eq!(placement.strokes.len(), 7);
        assert_eq!(placement.lines.len(), 6);
        assert!(placement.lines[..3].iter().all(|l| l.bold));
    }

    #[test]
    fn test_rtl_mirrors_bullets() {
        let mut rule = rule();
        rule.direction = TextDirection::Rtl;
        rule.template = rule.template.mirrored();
        let input = deck(vec![Slide::new(vec![Block::bullets(vec![BulletItem::new(
            "item", 0,
        )])])]);
        let out = LayoutEngine::default().layout(&input, &rule).unwrap();
        let lines = &out.slides()[0].blocks()[0].placement().unwrap().lines;
        let (glyph, text) = (&lines[0], &lines[1]);
        assert!(glyph.x > text.x);
        assert!((glyph.x + glyph.width - (720.0 - rule.template.margin_right)).abs() < 1e-6);
    }

    #[test]
    fn test_custom_metrics_change_wrapping() {
        struct Wide;
        impl FontMetrics for Wide {
            fn char_width(&self, _: FontFamily, _: bool, _: char) -> f64 {
                1.0
            }
            fn ascent(&self, _: FontFamily) -> f64 {
                0.8
            }
        }

        let input = deck(vec![Slide::new(vec![Block::body(filler(120))])]);
        let standard = LayoutEngine::default().layout(&input, &rule()).unwrap();
        let wide = LayoutEngine::default()
            .with_metrics(Wide)
            .layout(&input, &rule())
            .unwrap();
        let count = |d: &Deck| d.slides()[0].blocks()[0].placement().unwrap().lines.len();
        assert!(count(&wide) > count(&standard));
    }
}
