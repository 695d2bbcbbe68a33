//! PPTX package writer.

use crate::media::MediaStore;
use crate::package;
use crate::slide::write_slide;
use crate::xml::Result;
use slide_core::style::StyleResolver;
use slide_core::{CodecError, Deck, DeckEncoder, ExportFormat, SlideTemplate};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Encodes laid-out decks as PowerPoint packages.
///
/// Output is byte-for-byte reproducible: parts are written in a fixed
/// order with fixed archive timestamps, and the only date in the package
/// is the deck's own `created` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxEncoder;

impl PptxEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Build the package in memory.
    pub fn write(&self, deck: &Deck) -> Result<Vec<u8>> {
        let meta = deck.meta();
        let fallback = StyleResolver::new().resolve_with(meta.theme, meta.tone, meta.language);
        // The master and theme take the deck's own rule when it has one.
        let rule = deck
            .slides()
            .iter()
            .flat_map(|s| s.blocks())
            .find_map(|b| deck.style_of(b))
            .unwrap_or(&fallback);

        // Render slides first so that a bad block fails before any archive
        // work is done.
        let mut media = MediaStore::new();
        let mut slides = Vec::with_capacity(deck.slides().len());
        for (i, slide) in deck.slides().iter().enumerate() {
            slides.push(write_slide(deck, i, slide, rule, &mut media)?);
        }
        let count = slides.len();

        let mut archive = Package::new();
        archive.add("[Content_Types].xml", &package::content_types(count, &media.formats())?)?;
        archive.add("_rels/.rels", &package::root_rels()?)?;
        archive.add("docProps/core.xml", &package::core_props(deck)?)?;
        archive.add("docProps/app.xml", &package::app_props(count)?)?;
        archive.add(package::PRESENTATION_PART, &package::presentation(count, deck.size())?)?;
        archive.add(
            "ppt/_rels/presentation.xml.rels",
            &package::presentation_rels(count)?,
        )?;
        archive.add(
            "ppt/slideMasters/slideMaster1.xml",
            &package::slide_master(rule, deck.size())?,
        )?;
        archive.add(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &package::master_rels()?,
        )?;
        for template in [SlideTemplate::Title, SlideTemplate::Content] {
            let n = package::layout_number(template);
            archive.add(
                &format!("ppt/slideLayouts/slideLayout{}.xml", n),
                &package::slide_layout(template)?,
            )?;
            archive.add(
                &format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
                &package::layout_rels()?,
            )?;
        }
        archive.add("ppt/theme/theme1.xml", &package::theme(rule)?)?;
        for (i, part) in slides.iter().enumerate() {
            archive.add(&format!("ppt/slides/slide{}.xml", i + 1), &part.xml)?;
            archive.add(&format!("ppt/slides/_rels/slide{}.xml.rels", i + 1), &part.rels)?;
        }
        for entry in media.entries() {
            archive.add_stored(&entry.part, &entry.data)?;
        }

        let bytes = archive.finish()?;
        log::debug!(
            "Wrote PPTX: {} slides, {} media parts, {} bytes",
            count,
            media.entries().len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

impl DeckEncoder for PptxEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pptx
    }

    fn encode(&self, deck: &Deck) -> std::result::Result<Vec<u8>, CodecError> {
        self.write(deck)
    }
}

/// ZIP archive with deterministic entry metadata.
struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl Package {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn options(method: CompressionMethod) -> FileOptions {
        FileOptions::default()
            .compression_method(method)
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644)
    }

    fn add(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.put(name, data, CompressionMethod::Deflated)
    }

    /// Media is already compressed.
    fn add_stored(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.put(name, data, CompressionMethod::Stored)
    }

    fn put(&mut self, name: &str, data: &[u8], method: CompressionMethod) -> Result<()> {
        self.zip
            .start_file(name, Self::options(method))
            .map_err(|e| CodecError::Archive(format!("Failed to start '{}': {}", name, e)))?;
        self.zip.write_all(data)?;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| CodecError::Archive(format!("Failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}
