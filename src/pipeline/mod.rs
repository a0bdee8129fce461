//! The extraction pipeline.
//!
//! [`Pipeline`] drives the text/table extractor, the image extractor and an
//! [`OcrEngine`] over one opened document and assembles the bounded
//! [`ExtractionResult`]. A run either returns a complete result or an error;
//! nothing partial escapes.

mod collector;
mod options;

use std::fmt;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::extract::{ImageExtractor, TextExtractor};
use crate::model::{ExtractedImage, ExtractionResult, OcrResult, Table};
use crate::ocr::OcrEngine;
use crate::parser::{PdfDocument, TableDetector};

pub use collector::TakeFirst;
pub use options::{ErrorMode, PipelineOptions, DEFAULT_LIMIT};

/// Progress of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Run started, nothing extracted yet
    Start,
    /// Page texts and tables collected
    TextExtracted,
    /// Images selected and decoded
    ImagesExtracted,
    /// Selected images recognized
    OcrApplied,
    /// Result built
    Assembled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::TextExtracted => "text extracted",
            Stage::ImagesExtracted => "images extracted",
            Stage::OcrApplied => "OCR applied",
            Stage::Assembled => "assembled",
        };
        f.write_str(name)
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Pages whose text and tables were extracted
    pub pages_visited: usize,
    /// Tables detected on visited pages, before capping
    pub tables_found: usize,
    /// Images decoded successfully
    pub images_decoded: usize,
    /// Images skipped because they failed to decode
    pub images_skipped: usize,
    /// Images passed through OCR
    pub images_recognized: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// A successful run: the result plus what it took to build it.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: ExtractionResult,
    pub stats: RunStats,
}

/// Drives extraction and OCR for one document at a time.
pub struct Pipeline<E> {
    engine: E,
    options: PipelineOptions,
    text: TextExtractor,
    images: ImageExtractor,
}

impl<E: OcrEngine> Pipeline<E> {
    /// Create a pipeline with default options.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            options: PipelineOptions::default(),
            text: TextExtractor::new(),
            images: ImageExtractor::new(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.text = self.text.with_error_mode(options.error_mode);
        self.options = options;
        self
    }

    /// Use a custom table detector.
    pub fn with_table_detector(mut self, detector: TableDetector) -> Self {
        self.text = self.text.with_detector(detector);
        self
    }

    /// The options in effect.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// The OCR engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Extract one document.
    pub fn run(&self, doc: &PdfDocument) -> Result<ExtractionResult> {
        self.run_with_report(doc).map(|report| report.result)
    }

    /// Extract one document and report counters.
    pub fn run_with_report(&self, doc: &PdfDocument) -> Result<RunReport> {
        self.run_observed(doc, |_| {})
    }

    /// Extract one document, calling `observer` when the run starts and as
    /// each stage completes.
    pub fn run_observed(
        &self,
        doc: &PdfDocument,
        mut observer: impl FnMut(Stage),
    ) -> Result<RunReport> {
        let clock = Clock::start(self.options.deadline);
        let mut stage = Stage::Start;
        let mut advance = |next: Stage| {
            stage = next;
            log::debug!("Pipeline stage: {}", next);
            observer(next);
        };
        advance(Stage::Start);

        let outcome = self.execute(doc, &clock, &mut advance);
        outcome.map_err(|e| {
            log::error!("Extraction failed after stage '{}': {}", stage, e);
            e
        })
    }

    fn execute(
        &self,
        doc: &PdfDocument,
        clock: &Clock,
        advance: &mut impl FnMut(Stage),
    ) -> Result<RunReport> {
        let mut stats = RunStats::default();

        let (segments, tables) = self.collect_pages(doc, clock, &mut stats)?;
        advance(Stage::TextExtracted);

        let selected = self.collect_images(doc, clock, &mut stats)?;
        advance(Stage::ImagesExtracted);

        let recognized = self.recognize_all(&selected, clock)?;
        stats.images_recognized = recognized.len();
        advance(Stage::OcrApplied);

        let result = ExtractionResult::assemble(&segments, tables, recognized);
        stats.elapsed = clock.elapsed();
        advance(Stage::Assembled);

        log::info!(
            "Extracted {} page(s), {} table(s), {} OCR result(s) in {:.2?} ({} image(s) skipped)",
            stats.pages_visited,
            result.tables.len(),
            result.images.len(),
            stats.elapsed,
            stats.images_skipped
        );

        Ok(RunReport { result, stats })
    }

    /// Page texts and tables, stopping once both collectors are full.
    ///
    /// Strict runs read every page so a late unreadable page still fails.
    fn collect_pages(
        &self,
        doc: &PdfDocument,
        clock: &Clock,
        stats: &mut RunStats,
    ) -> Result<(Vec<String>, Vec<Table>)> {
        let mut segments = TakeFirst::new(self.options.text_limit);
        let mut tables = TakeFirst::new(self.options.table_limit);
        let mut pages = self.text.pages(doc);
        let read_all = self.options.error_mode == ErrorMode::Strict;

        while read_all || !(segments.is_full() && tables.is_full()) {
            clock.check("text extraction")?;
            let Some(page) = pages.next() else {
                break;
            };
            let page = page?;
            stats.pages_visited += 1;
            stats.tables_found += page.tables.len();
            segments.push(page.text);
            tables.extend(page.tables);
        }

        Ok((segments.into_inner(), tables.into_inner()))
    }

    /// The leading decodable images; later images are never decoded.
    fn collect_images(
        &self,
        doc: &PdfDocument,
        clock: &Clock,
        stats: &mut RunStats,
    ) -> Result<Vec<ExtractedImage>> {
        let mut selected = TakeFirst::new(self.options.image_limit);
        let mut stream = self.images.images(doc);

        while !selected.is_full() {
            clock.check("image extraction")?;
            match stream.next() {
                Some(image) => {
                    selected.push(image);
                }
                None => break,
            }
        }

        stats.images_decoded = stream.decoded();
        stats.images_skipped = stream.skipped();
        Ok(selected.into_inner())
    }

    fn recognize_all(&self, images: &[ExtractedImage], clock: &Clock) -> Result<Vec<OcrResult>> {
        let outcomes: Vec<Result<OcrResult>> = if self.options.parallel && images.len() > 1 {
            images
                .par_iter()
                .map(|image| self.recognize(image, clock))
                .collect()
        } else {
            // Sequential runs stop at the first failure.
            let mut outcomes = Vec::with_capacity(images.len());
            for image in images {
                let outcome = self.recognize(image, clock);
                let failed = outcome.is_err();
                outcomes.push(outcome);
                if failed {
                    break;
                }
            }
            outcomes
        };

        // First failure in image order wins, parallel or not.
        outcomes.into_iter().collect()
    }

    fn recognize(&self, image: &ExtractedImage, clock: &Clock) -> Result<OcrResult> {
        clock.check("OCR")?;
        let text = self.engine.recognize(&image.image)?;
        log::debug!(
            "{}: page {} image {} -> {} chars",
            self.engine.name(),
            image.page,
            image.index,
            text.chars().count()
        );
        Ok(OcrResult::new(image.page, image.index, text))
    }
}

/// Run-wide deadline.
struct Clock {
    started: Instant,
    deadline: Option<Duration>,
}

impl Clock {
    fn start(deadline: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            deadline,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn check(&self, during: &str) -> Result<()> {
        match self.deadline {
            Some(limit) if self.elapsed() >= limit => Err(Error::Timeout(format!(
                "deadline of {:.1}s exceeded during {}",
                limit.as_secs_f64(),
                during
            ))),
            _ => Ok(()),
        }
    }
}

/// Open and extract a file on tokio's blocking pool.
#[cfg(feature = "async")]
pub async fn extract_file_blocking_task<E>(
    path: impl Into<std::path::PathBuf>,
    engine: E,
    options: PipelineOptions,
) -> Result<ExtractionResult>
where
    E: OcrEngine + 'static,
{
    let path = path.into();
    tokio::task::spawn_blocking(move || {
        let doc = PdfDocument::open(&path)?;
        Pipeline::new(engine).with_options(options).run(&doc)
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))?
}
