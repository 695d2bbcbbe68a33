//! PPTX (Office Open XML) backend.
//!
//! [`PptxEncoder`] writes laid-out decks as PowerPoint packages: ZIP
//! archives of XML parts. [`PptxReader`] reads the structure of such a
//! package back, which is how the writer is tested.

mod media;
mod package;
pub mod reader;
mod slide;
mod writer;
mod xml;

pub use reader::{PptxReader, PptxSummary, ShapeSummary, SlideSummary};
pub use writer::PptxEncoder;
