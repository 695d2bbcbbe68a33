//! Page content streams.
//!
//! Takes slide coordinates (origin top-left, y down) and flips them into
//! PDF user space (origin bottom-left, y up).

use pdf_writer::{Content, Name, Str};
use slide_core::style::Rgb;

pub(crate) struct PageContent {
    content: Content,
    page_height: f64,
}

impl PageContent {
    pub(crate) fn new(page_height: f64) -> Self {
        Self {
            content: Content::new(),
            page_height,
        }
    }

    fn flip(&self, y: f64) -> f32 {
        (self.page_height - y) as f32
    }

    pub(crate) fn fill_color(&mut self, color: Rgb) {
        let [r, g, b] = color.unit();
        self.content.set_fill_rgb(r as f32, g as f32, b as f32);
    }

    pub(crate) fn stroke_color(&mut self, color: Rgb) {
        let [r, g, b] = color.unit();
        self.content.set_stroke_rgb(r as f32, g as f32, b as f32);
    }

    /// Filled rectangle with top-left corner at (`x`, `y`).
    pub(crate) fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let bottom = self.flip(y + height);
        self.content
            .rect(x as f32, bottom, width as f32, height as f32)
            .fill_nonzero();
    }

    pub(crate) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64) {
        let (y1, y2) = (self.flip(y1), self.flip(y2));
        self.content
            .set_line_width(width as f32)
            .move_to(x1 as f32, y1)
            .line_to(x2 as f32, y2)
            .stroke();
    }

    /// One line of already-encoded text with its baseline at `baseline`.
    pub(crate) fn text(&mut self, font: &str, size: f64, x: f64, baseline: f64, encoded: &[u8]) {
        let y = self.flip(baseline);
        self.content
            .begin_text()
            .set_font(Name(font.as_bytes()), size as f32)
            .set_text_matrix([1.0, 0.0, 0.0, 1.0, x as f32, y])
            .show(Str(encoded))
            .end_text();
    }

    /// Paint image XObject `name` into the rectangle with top-left corner
    /// at (`x`, `y`).
    pub(crate) fn image(&mut self, name: &str, x: f64, y: f64, width: f64, height: f64) {
        let bottom = self.flip(y + height);
        self.content
            .save_state()
            .transform([width as f32, 0.0, 0.0, height as f32, x as f32, bottom])
            .x_object(Name(name.as_bytes()))
            .restore_state();
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.content.finish().as_slice().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content as Decoded;

    fn operands(decoded: &Decoded, operator: &str) -> Vec<f32> {
        decoded
            .operations
            .iter()
            .find(|op| op.operator == operator)
            .map(|op| op.operands.iter().filter_map(|o| o.as_float().ok()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_coordinates_are_flipped() {
        let mut content = PageContent::new(405.0);
        content.fill_color(Rgb(255, 0, 0));
        content.fill_rect(0.0, 0.0, 720.0, 5.0);
        content.text("F1", 12.0, 36.0, 50.5, b"Hi (there)");
        content.image("Im1", 10.0, 100.0, 48.0, 24.0);
        let decoded = Decoded::decode(&content.finish()).unwrap();

        let operators: Vec<&str> = decoded.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(
            operators,
            vec!["rg", "re", "f", "BT", "Tf", "Tm", "Tj", "ET", "q", "cm", "Do", "Q"]
        );
        assert_eq!(operands(&decoded, "rg"), vec![1.0, 0.0, 0.0]);
        assert_eq!(operands(&decoded, "re"), vec![0.0, 400.0, 720.0, 5.0]);
        assert_eq!(operands(&decoded, "Tm"), vec![1.0, 0.0, 0.0, 1.0, 36.0, 354.5]);
        assert_eq!(operands(&decoded, "cm"), vec![48.0, 0.0, 0.0, 24.0, 10.0, 281.0]);

        let shown = &decoded.operations[6].operands[0];
        assert!(matches!(shown, lopdf::Object::String(bytes, _) if bytes == b"Hi (there)"));
    }
}
