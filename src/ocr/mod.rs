//! Optical character recognition.
//!
//! The pipeline only sees the [`OcrEngine`] trait. [`TesseractEngine`] is the
//! bundled implementation; tests and embedders can supply their own.

mod tesseract;

use image::DynamicImage;

use crate::error::Result;

pub use tesseract::TesseractEngine;

/// Turns one raster image into text.
///
/// Implementations must be deterministic for identical pixels if callers
/// rely on repeatable results. Finding no text is not an error: return an
/// empty string. Return [`Error::OcrUnavailable`](crate::Error::OcrUnavailable)
/// when recognition cannot run at all.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize the text in `image`.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }
}

impl<E: OcrEngine + ?Sized> OcrEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }
}

impl<E: OcrEngine + ?Sized> OcrEngine for std::sync::Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }
}
