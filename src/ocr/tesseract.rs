//! OCR through the `tesseract` command-line program.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

use super::OcrEngine;

const DEFAULT_BINARY: &str = "tesseract";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `tesseract <image.png> <outbase>` once per image.
///
/// Each call works in its own temporary directory, removed when the call
/// returns.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl TesseractEngine {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Kill recognition of a single image after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The executable this engine runs.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Check that the executable runs, returning its version line.
    pub fn probe(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| self.unavailable(e))?;

        if !output.status.success() {
            return Err(Error::OcrUnavailable(format!(
                "{} --version exited with {}",
                self.binary.display(),
                output.status
            )));
        }

        // Older releases print the version on stderr.
        let version = [&output.stdout, &output.stderr]
            .iter()
            .filter_map(|bytes| String::from_utf8_lossy(bytes).lines().next().map(str::to_string))
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default();
        log::debug!("OCR engine available: {}", version);
        Ok(version)
    }

    fn unavailable(&self, err: std::io::Error) -> Error {
        Error::OcrUnavailable(format!("cannot run {}: {}", self.binary.display(), err))
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(limit) = self.timeout else {
            return child.wait().map_err(|e| self.unavailable(e));
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|e| self.unavailable(e))? {
                return Ok(status);
            }
            let elapsed = started.elapsed();
            if elapsed >= limit {
                // The process may have exited in between; either way it is gone after wait.
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout(format!(
                    "OCR of one image exceeded {:.1}s",
                    limit.as_secs_f64()
                )));
            }
            thread::sleep(POLL_INTERVAL.min(limit - elapsed));
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            timeout: None,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        DEFAULT_BINARY
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("image.png");
        let outbase = workdir.path().join("out");
        let errlog = workdir.path().join("stderr.log");

        image
            .save_with_format(&input, ImageFormat::Png)
            .map_err(|e| Error::OcrUnavailable(format!("cannot stage image for OCR: {}", e)))?;

        let mut child = Command::new(&self.binary)
            .arg(&input)
            .arg(&outbase)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(File::create(&errlog)?)
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        let status = self.wait(&mut child)?;
        if !status.success() {
            let stderr = fs::read(&errlog).unwrap_or_default();
            return Err(Error::OcrUnavailable(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        let text = fs::read(outbase.with_extension("txt")).map_err(|e| {
            Error::OcrUnavailable(format!("{} produced no output: {}", self.binary.display(), e))
        })?;
        Ok(String::from_utf8_lossy(&text).into_owned())
    }
}
