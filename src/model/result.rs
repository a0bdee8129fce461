//! The aggregate extraction result and its parts.

use serde::{Deserialize, Serialize};

use super::Table;

/// Separator placed between page text segments in `overall_text`.
pub const SEGMENT_SEPARATOR: &str = " ";

/// Text recognized in one embedded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Page number (1-indexed)
    pub page: u32,

    /// Position of the image on its page (1-indexed)
    pub image_index: u32,

    /// Recognized text, possibly empty
    pub text: String,
}

impl OcrResult {
    /// Create a new OCR result.
    pub fn new(page: u32, image_index: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            image_index,
            text: text.into(),
        }
    }
}

/// What the text/table extractor yields for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page: u32,

    /// Extracted prose text, empty for scanned pages
    pub text: String,

    /// Tables detected on the page, in appearance order
    pub tables: Vec<Table>,
}

/// The bounded result of extracting one document.
///
/// Only ever built complete; a failed run produces an error instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Leading page texts joined with single spaces
    pub overall_text: String,

    /// Leading tables across all pages, flattened
    pub tables: Vec<Table>,

    /// Leading OCR results in (page, image index) order
    pub images: Vec<OcrResult>,
}

impl ExtractionResult {
    /// Assemble a result from already-capped parts.
    ///
    /// Every segment keeps its slot, so an empty page still contributes an
    /// empty string between separators.
    pub fn assemble(segments: &[String], tables: Vec<Table>, images: Vec<OcrResult>) -> Self {
        Self {
            overall_text: segments.join(SEGMENT_SEPARATOR),
            tables,
            images,
        }
    }

    /// Whether nothing at all was extracted.
    pub fn is_blank(&self) -> bool {
        self.overall_text.trim().is_empty() && self.tables.is_empty() && self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_keeps_empty_segments() {
        let segments = vec!["one".to_string(), String::new(), "three".to_string()];
        let result = ExtractionResult::assemble(&segments, vec![], vec![]);
        assert_eq!(result.overall_text, "one  three");
    }

    #[test]
    fn test_blank_result() {
        let result = ExtractionResult::assemble(&[String::new()], vec![], vec![]);
        assert!(result.is_blank());

        let result = ExtractionResult::assemble(&[], vec![], vec![OcrResult::new(1, 1, "")]);
        assert!(!result.is_blank());
    }

    #[test]
    fn test_json_field_names() {
        let result = ExtractionResult::assemble(
            &["hello".to_string()],
            vec![],
            vec![OcrResult::new(2, 1, "INVOICE")],
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["overall_text"], "hello");
        assert!(value["tables"].as_array().unwrap().is_empty());
        assert_eq!(value["images"][0]["page"], 2);
        assert_eq!(value["images"][0]["image_index"], 1);
        assert_eq!(value["images"][0]["text"], "INVOICE");
    }
}
