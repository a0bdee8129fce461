//! PDF parsing module.
//!
//! [`PdfDocument`] wraps the lopdf object graph; [`SpanExtractor`] and
//! [`TableDetector`] recover positioned text and tables from page content.

mod document;
mod layout;
mod table_detector;

pub use document::PdfDocument;
pub use layout::{SpanExtractor, TextSpan};
pub use table_detector::{TableDetector, TableDetectorConfig};

pub(crate) use document::stream_bytes;
