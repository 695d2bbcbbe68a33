//! Font metrics and line wrapping used by the layout engine.
//!
//! Measurement must be deterministic, so widths come from fixed tables
//! rather than from whatever fonts the host happens to have installed.

use crate::style::FontFamily;

/// Source of glyph advance widths.
///
/// Implementations must be pure: the same query always returns the same
/// width.
pub trait FontMetrics: Send + Sync {
    /// Advance width of `ch` in em units (1.0 = one font size).
    fn char_width(&self, family: FontFamily, bold: bool, ch: char) -> f64;

    /// Distance from the top of the line box to the baseline, in em units.
    fn ascent(&self, family: FontFamily) -> f64;

    /// Width of `text` at `size` points.
    fn text_width(&self, family: FontFamily, bold: bool, text: &str, size: f64) -> f64 {
        text.chars()
            .map(|c| self.char_width(family, bold, c))
            .sum::<f64>()
            * size
    }
}

/// Advance widths of the PDF standard-14 fonts for printable ASCII
/// (U+0020..=U+007E), in thousandths of an em.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

/// Metrics of the standard-14 families, with class-based fallbacks outside
/// ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMetrics;

impl StandardMetrics {
    fn table(family: FontFamily, bold: bool) -> Option<&'static [u16; 95]> {
        match (family, bold) {
            (FontFamily::Sans, false) => Some(&HELVETICA),
            (FontFamily::Sans, true) => Some(&HELVETICA_BOLD),
            (FontFamily::Serif, false) => Some(&TIMES_ROMAN),
            (FontFamily::Serif, true) => Some(&TIMES_BOLD),
            (FontFamily::Mono, _) => None,
        }
    }
}

impl FontMetrics for StandardMetrics {
    fn char_width(&self, family: FontFamily, bold: bool, ch: char) -> f64 {
        let Some(table) = Self::table(family, bold) else {
            // Courier is fixed pitch.
            return 0.6;
        };

        let code = ch as u32;
        let thousandths = match code {
            0x20..=0x7E => table[(code - 0x20) as usize],
            // Devanagari
            0x0900..=0x097F => 600,
            // CJK and full-width forms
            0x2E80..=0x9FFF | 0xF900..=0xFAFF | 0xFF00..=0xFF60 => 1000,
            0x2022 => 350,
            0x2013 => 556,
            0x2014 => 1000,
            _ if ch.is_whitespace() => table[0],
            // Latin-1 letters and everything else: an average lowercase glyph.
            _ => table[(b'n' - 0x20) as usize],
        };
        f64::from(thousandths) / 1000.0
    }

    fn ascent(&self, family: FontFamily) -> f64 {
        match family {
            FontFamily::Sans => 0.718,
            FontFamily::Serif => 0.683,
            FontFamily::Mono => 0.629,
        }
    }
}

/// A wrapped line and its measured width in points.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    pub width: f64,
}

/// Greedy word wrap of `text` into lines no wider than `max_width`.
///
/// Explicit newlines are hard breaks. A word wider than the line is broken
/// between characters. Whitespace runs collapse to a single space.
pub fn wrap_text<M: FontMetrics + ?Sized>(
    metrics: &M,
    family: FontFamily,
    bold: bool,
    size: f64,
    text: &str,
    max_width: f64,
) -> Vec<WrappedLine> {
    let space = metrics.char_width(family, bold, ' ') * size;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = metrics.text_width(family, bold, word, size);

            if current.is_empty() {
                if word_width <= max_width {
                    current.push_str(word);
                    current_width = word_width;
                    continue;
                }
            } else if current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
                continue;
            } else {
                lines.push(WrappedLine {
                    text: std::mem::take(&mut current),
                    width: current_width,
                });
                current_width = 0.0;
                if word_width <= max_width {
                    current.push_str(word);
                    current_width = word_width;
                    continue;
                }
            }

            // The word alone is too wide: break it between characters.
            for ch in word.chars() {
                let w = metrics.char_width(family, bold, ch) * size;
                if !current.is_empty() && current_width + w > max_width {
                    lines.push(WrappedLine {
                        text: std::mem::take(&mut current),
                        width: current_width,
                    });
                    current_width = 0.0;
                }
                current.push(ch);
                current_width += w;
            }
        }

        if !current.is_empty() {
            lines.push(WrappedLine {
                text: current,
                width: current_width,
            });
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_widths() {
        let m = StandardMetrics;
        assert_eq!(m.char_width(FontFamily::Sans, false, 'i'), 0.222);
        assert_eq!(m.char_width(FontFamily::Sans, false, 'W'), 0.944);
        assert_eq!(m.char_width(FontFamily::Sans, true, 'i'), 0.278);
        assert_eq!(m.char_width(FontFamily::Mono, true, 'i'), 0.6);
        // "Hello" in Helvetica at 10pt: (722 + 556 + 222 + 222 + 556) / 100
        let w = m.text_width(FontFamily::Sans, false, "Hello", 10.0);
        assert!((w - 22.78).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let m = StandardMetrics;
        let lines = wrap_text(&m, FontFamily::Mono, false, 10.0, "aaa bbb ccc", 42.0);
        // Each char is 6pt; "aaa bbb" is 42pt wide.
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["aaa bbb", "ccc"]);
        assert!((lines[0].width - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_hard_breaks_and_long_words() {
        let m = StandardMetrics;
        let lines = wrap_text(&m, FontFamily::Mono, false, 10.0, "ab\nabcdefgh", 30.0);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "abcde", "fgh"]);
    }

    #[test]
    fn test_wrap_is_deterministic() {
        let m = StandardMetrics;
        let text = "The quick brown fox jumps over the lazy dog again and again";
        let a = wrap_text(&m, FontFamily::Serif, true, 18.0, text, 200.0);
        let b = wrap_text(&m, FontFamily::Serif, true, 18.0, text, 200.0);
        assert_eq!(a, b);
        assert!(a.iter().all(|l| l.width <= 200.0));
    }
}
