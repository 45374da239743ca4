//! Snapshot interchange: the portable export blob.
//!
//! An export is the JSON document `{cycleRecord, historyLog, exportedAt,
//! version}`, DEFLATE-compressed and base64-encoded into a single line of
//! text. The compressed stream is zlib-wrapped; decoding also accepts a raw
//! DEFLATE stream, and ignores surrounding whitespace.
//!
//! Decoding validates that both `cycleRecord` and `historyLog` are present
//! before anything else looks at the contents, so a malformed blob is
//! rejected as a whole.

use crate::archive::HistoryLog;
use crate::domain::CycleRecord;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Version string written into new exports.
pub const EXPORT_FORMAT_VERSION: &str = "1";

const REQUIRED_KEYS: [&str; 2] = ["cycleRecord", "historyLog"];

/// The decoded content of an export blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// The live cycle record at export time
    pub cycle_record: CycleRecord,

    /// The history log, in insertion order
    pub history_log: HistoryLog,

    /// When the export was produced
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,

    /// Format version of the producer
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    EXPORT_FORMAT_VERSION.to_string()
}

impl ExportDocument {
    /// Bundle the current state for export.
    pub fn new(cycle_record: CycleRecord, history_log: HistoryLog, exported_at: DateTime<Utc>) -> Self {
        Self {
            cycle_record,
            history_log,
            exported_at: Some(exported_at),
            version: default_version(),
        }
    }
}

/// How an imported document is reconciled with local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStrategy {
    /// Union histories by id, imported entries winning; keep the live record
    Merge,
    /// Discard local state in favor of the imported record and history
    Replace,
}

impl fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStrategy::Merge => write!(f, "merge"),
            ImportStrategy::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for ImportStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(ImportStrategy::Merge),
            "replace" => Ok(ImportStrategy::Replace),
            _ => Err(format!("Invalid import strategy: '{s}'. Must be 'merge' or 'replace'")),
        }
    }
}

/// Serialize, compress and base64-encode a document.
///
/// # Errors
///
/// Returns an error if serialization or compression fails.
pub fn encode(document: &ExportDocument) -> Result<String> {
    let json = serde_json::to_vec(document)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Reverse [`encode`], validating the required top-level keys.
///
/// # Errors
///
/// Returns `Error::MalformedImport` if the text is not base64, does not
/// decompress, is not JSON, or lacks `cycleRecord` or `historyLog`.
pub fn decode(text: &str) -> Result<ExportDocument> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let compressed = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::MalformedImport(format!("not valid base64: {e}")))?;
    let json = inflate(&compressed)?;

    let value: serde_json::Value = serde_json::from_slice(&json)
        .map_err(|e| Error::MalformedImport(format!("not valid JSON: {e}")))?;
    let Some(object) = value.as_object() else {
        return Err(Error::MalformedImport(
            "expected a JSON object at the top level".to_string(),
        ));
    };
    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(Error::MalformedImport(format!("missing required key '{key}'")));
        }
    }

    serde_json::from_value(value).map_err(|e| Error::MalformedImport(e.to_string()))
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if ZlibDecoder::new(compressed).read_to_end(&mut out).is_ok() {
        return Ok(out);
    }

    out.clear();
    DeflateDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|e| Error::MalformedImport(format!("not a DEFLATE stream: {e}")))?;
    Ok(out)
}

/// Suggested file name for an export taken at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("rollover-export-{}.txt", now.format("%Y-%m-%d"))
}
