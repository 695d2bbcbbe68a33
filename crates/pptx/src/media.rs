//! Embedded media parts, shared across slides.

use slide_core::{ImageFormat, ImageRef};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct MediaEntry {
    pub data: Arc<Vec<u8>>,
    pub format: ImageFormat,
    /// Part name inside the package, e.g. `ppt/media/image1.png`.
    pub part: String,
}

/// Images keyed by content. The same bytes used twice become one part.
#[derive(Debug, Default)]
pub(crate) struct MediaStore {
    entries: Vec<MediaEntry>,
}

impl MediaStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `image` and return its part name.
    pub(crate) fn add(&mut self, image: &ImageRef) -> &str {
        let index = match self
            .entries
            .iter()
            .position(|e| Arc::ptr_eq(&e.data, &image.data) || *e.data == *image.data)
        {
            Some(index) => index,
            None => {
                let part = format!(
                    "ppt/media/image{}.{}",
                    self.entries.len() + 1,
                    image.format.extension()
                );
                self.entries.push(MediaEntry {
                    data: Arc::clone(&image.data),
                    format: image.format,
                    part,
                });
                self.entries.len() - 1
            }
        };
        &self.entries[index].part
    }

    pub(crate) fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    /// Distinct formats in first-use order.
    pub(crate) fn formats(&self) -> Vec<ImageFormat> {
        let mut formats = Vec::new();
        for entry in &self.entries {
            if !formats.contains(&entry.format) {
                formats.push(entry.format);
            }
        }
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, data: Vec<u8>) -> ImageRef {
        ImageRef {
            name: name.into(),
            format: ImageFormat::Png,
            width_px: 1,
            height_px: 1,
            data: Arc::new(data),
        }
    }

    #[test]
    fn test_same_bytes_share_a_part() {
        let mut store = MediaStore::new();
        assert_eq!(store.add(&image("a", vec![1, 2, 3])), "ppt/media/image1.png");
        assert_eq!(store.add(&image("b", vec![4, 5])), "ppt/media/image2.png");
        assert_eq!(store.add(&image("c", vec![1, 2, 3])), "ppt/media/image1.png");
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.formats(), vec![ImageFormat::Png]);
    }
}
