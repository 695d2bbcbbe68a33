//! Core deck model, analysis, styling and layout for slide export.
//!
//! Codecs live in their own crates and plug in through
//! [`pipeline::DeckEncoder`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod pipeline;
pub mod style;
pub mod types;

pub use analysis::{AnalysisHints, AnalysisResult, Analyzer, ProposedSlide};
pub use config::{AnalysisConfig, EngineConfig, LayoutConfig, PdfConfig};
pub use error::{
    AnalysisError, CodecError, ConfigError, Error, ErrorClass, InputError, LayoutError, Result,
    StyleError,
};
pub use layout::LayoutEngine;
pub use metrics::{FontMetrics, StandardMetrics};
pub use pipeline::{DeckEncoder, ExportArtifact, ExportFormat, ExportRequest, Pipeline};
pub use style::{Language, StyleResolver, StyleRule, TextDirection, Theme, Tone};
pub use types::{
    Block, BlockContent, BlockKind, BulletItem, Deck, DeckMeta, ImageFormat, ImageRef, Joint,
    Placement, Rect, Slide, SlideSize, SlideTemplate, StyleId,
};
