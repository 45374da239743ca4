//! JSONL reading operations.
//!
//! [`JsonlReader`] yields lines with their 1-based line numbers;
//! [`read_jsonl_resilient`] builds on it to load a whole file, skipping lines
//! that cannot be decoded instead of aborting the load.

use crate::{Result, Warning};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// Tracks line numbers so warnings can point at the offending line.
///
/// # Examples
///
/// ```no_run
/// use rollover_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("history.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some((line_number, line)) = reader.next_line().await? {
///     println!("{line_number}: {line}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// 1-based number of the last line read, 0 before the first read.
    line_number: usize,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
        }
    }

    /// Returns the number of the last line read (0 before any reads).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next line, stripped of its line terminator.
    ///
    /// Returns `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails or the line is not
    /// valid UTF-8.
    pub async fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        let mut buf = String::new();
        let read = self.reader.read_line(&mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let trimmed_len = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed_len);
        Ok(Some((self.line_number, buf)))
    }

    /// Reads every remaining line and decodes it as `T`.
    ///
    /// Blank lines are ignored. Lines with invalid JSON produce
    /// [`Warning::MalformedJson`]; lines with valid JSON of the wrong shape
    /// produce [`Warning::WrongShape`].
    ///
    /// # Errors
    ///
    /// Only I/O failures are errors; decoding problems become warnings.
    pub async fn read_all_resilient<T>(&mut self) -> Result<(Vec<T>, Vec<Warning>)>
    where
        T: DeserializeOwned,
    {
        let mut values = Vec::new();
        let mut warnings = Vec::new();

        while let Some((line_number, line)) = self.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let raw: serde_json::Value = match serde_json::from_str(&line) {
                Ok(raw) => raw,
                Err(e) => {
                    warnings.push(Warning::MalformedJson {
                        line_number,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            match serde_json::from_value(raw) {
                Ok(value) => values.push(value),
                Err(e) => warnings.push(Warning::WrongShape {
                    line_number,
                    error: e.to_string(),
                }),
            }
        }

        Ok((values, warnings))
    }
}

/// Loads a JSONL file, skipping undecodable lines.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).await?;
    let mut reader = JsonlReader::new(file);
    let (values, warnings) = reader.read_all_resilient().await?;

    if !warnings.is_empty() {
        tracing::debug!(
            path = %path.display(),
            count = warnings.len(),
            "Skipped lines while reading JSONL"
        );
    }

    Ok((values, warnings))
}
