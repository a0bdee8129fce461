//! Per-page text and table extraction.

use std::collections::btree_map;

use lopdf::ObjectId;

use crate::error::Result;
use crate::model::PageContent;
use crate::parser::{PdfDocument, SpanExtractor, TableDetector};
use crate::pipeline::ErrorMode;

/// Extracts text and tables page by page.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    detector: TableDetector,
    error_mode: ErrorMode,
}

impl TextExtractor {
    /// Create an extractor with the default detector and lenient errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom table detector.
    pub fn with_detector(mut self, detector: TableDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Lazily walk the document's pages in order.
    ///
    /// Calling this again restarts from the first page.
    pub fn pages<'a>(&'a self, doc: &'a PdfDocument) -> PageStream<'a> {
        PageStream {
            extractor: self,
            doc,
            spans: SpanExtractor::new(doc),
            pages: doc.pages().into_iter(),
        }
    }

    fn extract_page(
        &self,
        doc: &PdfDocument,
        spans: &SpanExtractor<'_>,
        page: u32,
        page_id: ObjectId,
    ) -> Result<PageContent> {
        let text = self.recover(page, "text", doc.page_text(page), String::new)?;
        let tables = self.recover(
            page,
            "tables",
            spans.page_spans(page, page_id).map(|s| self.detector.detect(&s)),
            Vec::new,
        )?;

        Ok(PageContent { page, text, tables })
    }

    /// Apply the error mode to one part of a page.
    fn recover<T>(
        &self,
        page: u32,
        what: &str,
        result: Result<T>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if self.error_mode == ErrorMode::Strict => Err(e),
            Err(e) => {
                log::warn!("Failed to extract {} from page {}: {}", what, page, e);
                Ok(fallback())
            }
        }
    }
}

/// Iterator over the pages of one document, yielding [`PageContent`].
pub struct PageStream<'a> {
    extractor: &'a TextExtractor,
    doc: &'a PdfDocument,
    spans: SpanExtractor<'a>,
    pages: btree_map::IntoIter<u32, ObjectId>,
}

impl Iterator for PageStream<'_> {
    type Item = Result<PageContent>;

    fn next(&mut self) -> Option<Self::Item> {
        let (page, page_id) = self.pages.next()?;
        Some(
            self.extractor
                .extract_page(self.doc, &self.spans, page, page_id),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pages.size_hint()
    }
}
