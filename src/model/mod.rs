//! Data model shared by the extractors, the pipeline and the store.
//!
//! Everything that ends up in the serialized result lives here, along with
//! the transient [`ExtractedImage`] that only exists between decoding and OCR.

mod document;
mod image;
mod result;
mod table;

pub use document::DocumentInfo;
pub use image::ExtractedImage;
pub use result::{ExtractionResult, OcrResult, PageContent};
pub use table::{Cell, Table};

pub(crate) use table::cell;
