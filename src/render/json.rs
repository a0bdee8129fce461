//! JSON rendering for extraction results.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Error, Result};
use crate::model::ExtractionResult;

const PRETTY_INDENT: &[u8] = b"    ";

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Four-space indented JSON
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert an extraction result to JSON.
pub fn to_json(result: &ExtractionResult, format: JsonFormat) -> Result<String> {
    let bytes = match format {
        JsonFormat::Pretty => {
            let mut out = Vec::new();
            let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(PRETTY_INDENT));
            result.serialize(&mut ser).map(|_| out)
        }
        JsonFormat::Compact => serde_json::to_vec(result),
    };

    let bytes = bytes.map_err(|e| Error::Serialize(format!("JSON serialization error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Serialize(e.to_string()))
}

/// Parse a result previously written by [`to_json`].
pub fn from_json(json: &str) -> Result<ExtractionResult> {
    Ok(serde_json::from_str(json)?)
}
