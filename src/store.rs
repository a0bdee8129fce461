//! On-disk store of extraction results.
//!
//! One JSON file per processed document, named after the uploaded file:
//! `report.pdf` is stored as `<dir>/report.pdf.json`. Callers own the store
//! handle; nothing here reads global state.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::model::ExtractionResult;
use crate::render::{self, JsonFormat};

const EXTENSION: &str = "json";

/// A directory of stored results.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    /// Use `dir` for results. It is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory results are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the result for `source_name` is (or would be) stored.
    pub fn path_for(&self, source_name: &str) -> Result<PathBuf> {
        validate_name(source_name)?;
        Ok(self.dir.join(format!("{}.{}", source_name, EXTENSION)))
    }

    /// Store a result, replacing any previous one of the same name.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// readers never see a partial result.
    pub fn save(
        &self,
        source_name: &str,
        result: &ExtractionResult,
        format: JsonFormat,
    ) -> Result<PathBuf> {
        let path = self.path_for(source_name)?;
        let json = render::to_json(result, format)?;

        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

        log::debug!("Stored result for {} at {}", source_name, path.display());
        Ok(path)
    }

    /// Raw JSON of a stored result.
    pub fn load(&self, source_name: &str) -> Result<String> {
        let path = self.path_for(source_name)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(source_name.to_string()),
            _ => Error::Io(e),
        })
    }

    /// A stored result, parsed.
    pub fn load_result(&self, source_name: &str) -> Result<ExtractionResult> {
        render::from_json(&self.load(source_name)?)
    }

    /// Whether a result for `source_name` exists.
    pub fn contains(&self, source_name: &str) -> bool {
        self.path_for(source_name).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// Names become file names inside the store directory and must not escape it.
fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains(&['/', '\\', '\0'][..]);
    if invalid {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}
