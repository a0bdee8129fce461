//! Pipeline options and configuration.

use std::time::Duration;

/// Default cap applied to each list of the result.
pub const DEFAULT_LIMIT: usize = 20;

/// Options for one extraction run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum number of page text segments joined into `overall_text`
    pub text_limit: usize,

    /// Maximum number of tables kept
    pub table_limit: usize,

    /// Maximum number of OCR results kept
    pub image_limit: usize,

    /// How page-level extraction failures are handled
    pub error_mode: ErrorMode,

    /// Whether to run OCR on the rayon pool
    pub parallel: bool,

    /// Wall-clock budget for the whole run
    pub deadline: Option<Duration>,
}

impl PipelineOptions {
    /// Create new pipeline options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all three caps at once.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.text_limit = limit;
        self.table_limit = limit;
        self.image_limit = limit;
        self
    }

    /// Set the text segment cap.
    pub fn with_text_limit(mut self, limit: usize) -> Self {
        self.text_limit = limit;
        self
    }

    /// Set the table cap.
    pub fn with_table_limit(mut self, limit: usize) -> Self {
        self.table_limit = limit;
        self
    }

    /// Set the OCR result cap.
    pub fn with_image_limit(mut self, limit: usize) -> Self {
        self.image_limit = limit;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on the first unreadable page.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable or disable parallel OCR.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Abort the run with a timeout error once `deadline` has elapsed.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            text_limit: DEFAULT_LIMIT,
            table_limit: DEFAULT_LIMIT,
            image_limit: DEFAULT_LIMIT,
            error_mode: ErrorMode::Lenient,
            parallel: false,
            deadline: None,
        }
    }
}

/// Error handling mode for page-level failures.
///
/// Failing to open the document is always fatal regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    Strict,
    /// Log the failure and treat the page as empty
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.text_limit, 20);
        assert_eq!(options.table_limit, 20);
        assert_eq!(options.image_limit, 20);
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(!options.parallel);
        assert!(options.deadline.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let options = PipelineOptions::new()
            .with_limit(5)
            .with_table_limit(2)
            .strict()
            .with_parallel(true)
            .with_deadline(Duration::from_secs(30));

        assert_eq!(options.text_limit, 5);
        assert_eq!(options.table_limit, 2);
        assert_eq!(options.image_limit, 5);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.parallel);
        assert_eq!(options.deadline, Some(Duration::from_secs(30)));
    }
}
