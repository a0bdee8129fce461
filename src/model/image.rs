//! Decoded raster images awaiting recognition.

use image::DynamicImage;

/// One raster image embedded in a page, decoded to pixels.
///
/// Lives only between the image extractor and the OCR engine; never
/// serialized.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Page number (1-indexed)
    pub page: u32,

    /// Position among the page's image XObjects (1-indexed)
    pub index: u32,

    /// Decoded pixels
    pub image: DynamicImage,
}

impl ExtractedImage {
    /// Create a new extracted image.
    pub fn new(page: u32, index: u32, image: DynamicImage) -> Self {
        Self { page, index, image }
    }

    /// Pixel dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Sort key: page first, then in-page index.
    pub fn position(&self) -> (u32, u32) {
        (self.page, self.index)
    }
}
