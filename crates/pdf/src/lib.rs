//! PDF backend.
//!
//! [`PdfEncoder`] turns a laid-out deck into a PDF 1.7 file with one page
//! per slide. Pages are drawn from the layout's absolute geometry; the
//! codec never re-wraps text. The document is assembled as an
//! [`ObjectGraph`] and numbered from the catalog down, so shared fonts
//! and images are written once. Objects are serialized with `pdf-writer`.
//!
//! Latin text uses the standard-14 fonts. Other scripts need a
//! [`UnicodeFont`], embedded as a Type0 font with a `ToUnicode` map.

mod content;
mod encoding;
mod font;
pub mod graph;
mod node;
mod writer;

pub use font::UnicodeFont;
pub use graph::{Linked, NodeId, Numbering, ObjectGraph};
pub use writer::PdfEncoder;
