//! Content extractors: page text and tables, and embedded images.
//!
//! Both extractors are lazy. They walk the document one page at a time so a
//! caller that only needs the first few results never touches the rest.

mod decode;
mod images;
mod text;

pub use decode::decode_image;
pub use images::{ImageExtractor, ImageStream};
pub use text::{PageStream, TextExtractor};
