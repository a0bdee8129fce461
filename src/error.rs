//! Error types for pdfharvest.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for pdfharvest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while extracting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading input or writing results.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF header names a version we do not understand.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The document cannot be opened or parsed.
    #[error("PDF parsing error: {0}")]
    DocumentParse(String),

    /// The document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A single embedded image could not be decoded.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// The OCR engine cannot run at all.
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    /// A per-image or per-request deadline expired.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Result serialization failed.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// A stored result does not exist.
    #[error("Result not found: {0}")]
    NotFound(String),

    /// A result name cannot be used as a file name.
    #[error("Invalid result name: {0}")]
    InvalidName(String),
}

/// Coarse classification of an [`Error`], reported to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DocumentParse,
    ImageDecode,
    OcrUnavailable,
    Timeout,
    Io,
    Serialize,
    NotFound,
    InvalidName,
}

impl ErrorKind {
    /// Stable snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DocumentParse => "document_parse",
            ErrorKind::ImageDecode => "image_decode",
            ErrorKind::OcrUnavailable => "ocr_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Io => "io",
            ErrorKind::Serialize => "serialize",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidName => "invalid_name",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownFormat
            | Error::UnsupportedVersion(_)
            | Error::DocumentParse(_)
            | Error::Encrypted => ErrorKind::DocumentParse,
            Error::ImageDecode(_) => ErrorKind::ImageDecode,
            Error::OcrUnavailable(_) => ErrorKind::OcrUnavailable,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Io(_) => ErrorKind::Io,
            Error::Serialize(_) => ErrorKind::Serialize,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidName(_) => ErrorKind::InvalidName,
        }
    }

    /// Whether this error aborts a whole extraction request.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::ImageDecode)
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::DocumentParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}
