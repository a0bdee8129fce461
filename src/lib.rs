//! # pdfharvest
//!
//! Text, table and OCR extraction from PDF documents into one bounded result.
//!
//! For each document the library extracts the prose text and tables of every
//! page, decodes the embedded raster images and runs them through an OCR
//! engine. The result keeps the first 20 page texts (joined with spaces),
//! the first 20 tables and the first 20 OCR results.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfharvest::{extract_file, render, TesseractEngine};
//!
//! fn main() -> pdfharvest::Result<()> {
//!     let result = extract_file("invoice.pdf", TesseractEngine::new())?;
//!
//!     println!("{}", result.overall_text);
//!     println!("{}", render::to_json(&result, render::JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! A run yields either a complete [`ExtractionResult`] or one [`Error`]:
//!
//! - an unreadable document aborts the run ([`ErrorKind::DocumentParse`]);
//! - an image that cannot be decoded is skipped and logged;
//! - an OCR engine that cannot run aborts the run
//!   ([`ErrorKind::OcrUnavailable`]).

pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod store;

#[cfg(test)]
mod testing;

pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, ErrorKind, Result};
pub use extract::{ImageExtractor, TextExtractor};
pub use model::{Cell, DocumentInfo, ExtractedImage, ExtractionResult, OcrResult, PageContent, Table};
pub use ocr::{OcrEngine, TesseractEngine};
pub use parser::PdfDocument;
pub use pipeline::{ErrorMode, Pipeline, PipelineOptions, RunReport, RunStats, Stage};
pub use render::JsonFormat;
pub use store::ResultStore;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extract a PDF file with default options.
///
/// # Example
///
/// ```no_run
/// use pdfharvest::{extract_file, TesseractEngine};
///
/// let result = extract_file("scan.pdf", TesseractEngine::new()).unwrap();
/// for ocr in &result.images {
///     println!("page {} image {}: {}", ocr.page, ocr.image_index, ocr.text);
/// }
/// ```
pub fn extract_file<P: AsRef<Path>, E: OcrEngine>(path: P, engine: E) -> Result<ExtractionResult> {
    let doc = PdfDocument::open(path)?;
    Pipeline::new(engine).run(&doc)
}

/// Extract a PDF held in memory with default options.
pub fn extract_bytes<E: OcrEngine>(data: &[u8], engine: E) -> Result<ExtractionResult> {
    let doc = PdfDocument::from_bytes(data)?;
    Pipeline::new(engine).run(&doc)
}

/// Extract a PDF from a reader with default options.
pub fn extract_reader<R: Read, E: OcrEngine>(reader: R, engine: E) -> Result<ExtractionResult> {
    let doc = PdfDocument::from_reader(reader)?;
    Pipeline::new(engine).run(&doc)
}

/// Builder for extracting documents.
///
/// # Example
///
/// ```no_run
/// use pdfharvest::{Harvester, ResultStore};
/// use std::time::Duration;
///
/// let store = ResultStore::new("outputs");
/// let path = Harvester::new()
///     .with_ocr_timeout(Duration::from_secs(30))
///     .parallel()
///     .extract_to_store("upload/report.pdf", &store)?;
/// println!("saved {}", path.display());
/// # Ok::<(), pdfharvest::Error>(())
/// ```
pub struct Harvester<E = TesseractEngine> {
    engine: E,
    options: PipelineOptions,
    format: JsonFormat,
}

impl Harvester<TesseractEngine> {
    /// Create a harvester using the `tesseract` program.
    pub fn new() -> Self {
        Self {
            engine: TesseractEngine::new(),
            options: PipelineOptions::default(),
            format: JsonFormat::Pretty,
        }
    }

    /// Run a specific `tesseract` executable.
    pub fn with_tesseract(mut self, binary: impl Into<PathBuf>) -> Self {
        self.engine = self.engine.with_binary(binary);
        self
    }

    /// Kill recognition of a single image after `timeout`.
    pub fn with_ocr_timeout(mut self, timeout: Duration) -> Self {
        self.engine = self.engine.with_timeout(timeout);
        self
    }
}

impl<E: OcrEngine> Harvester<E> {
    /// Swap in another OCR engine.
    pub fn with_engine<F: OcrEngine>(self, engine: F) -> Harvester<F> {
        Harvester {
            engine,
            options: self.options,
            format: self.format,
        }
    }

    /// Replace the pipeline options.
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Fail on the first unreadable page.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Run OCR on the rayon pool.
    pub fn parallel(mut self) -> Self {
        self.options = self.options.with_parallel(true);
        self
    }

    /// Abort a run that takes longer than `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.options = self.options.with_deadline(deadline);
        self
    }

    /// JSON format used by [`extract_to_store`](Self::extract_to_store).
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Extract a PDF file.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<ExtractionResult> {
        let doc = PdfDocument::open(path)?;
        self.run(&doc)
    }

    /// Extract a PDF held in memory.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<ExtractionResult> {
        let doc = PdfDocument::from_bytes(data)?;
        self.run(&doc)
    }

    /// Extract a PDF file and store the result under the file's name.
    pub fn extract_to_store<P: AsRef<Path>>(&self, path: P, store: &ResultStore) -> Result<PathBuf> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidName(path.display().to_string()))?;
        let result = self.extract(path)?;
        store.save(name, &result, self.format)
    }

    fn run(&self, doc: &PdfDocument) -> Result<ExtractionResult> {
        Pipeline::new(&self.engine)
            .with_options(self.options.clone())
            .run(doc)
    }
}

impl Default for Harvester<TesseractEngine> {
    fn default() -> Self {
        Self::new()
    }
}
