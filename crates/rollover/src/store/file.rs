//! File-backed record stores.
//!
//! The cycle record is a single pretty-printed JSON document; the history
//! log is JSONL with one entry per line, newest inserted first. Both are
//! replaced with an atomic temp-file-and-rename write.
//!
//! `history.jsonl` is an on-disk format only. Everywhere else the history
//! log is a JSON array of entries: export blobs carry `historyLog` as an
//! array, and [`HistoryLog`] serializes as one.
//!
//! History loading is resilient: a corrupt or hand-mangled line is skipped
//! with a warning instead of making the whole log unreadable.

use super::RecordStore;
use crate::archive::HistoryLog;
use crate::domain::HistoryEntry;
use crate::error::Result;
use async_trait::async_trait;
use rollover_jsonl::{read_json_document, read_jsonl_resilient, write_json_atomic, write_jsonl_atomic};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Store for one JSON document.
#[derive(Debug)]
pub struct JsonDocumentStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocumentStore<T> {
    /// A store backed by the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<T> RecordStore<T> for JsonDocumentStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> Result<Option<T>> {
        Ok(read_json_document(&self.path).await?)
    }

    async fn save(&self, value: &T) -> Result<()> {
        write_json_atomic(&self.path, value).await?;
        tracing::debug!(path = %self.path.display(), "Wrote document");
        Ok(())
    }
}

/// Store for the history log as JSON Lines.
#[derive(Debug)]
pub struct JsonlHistoryStore {
    path: PathBuf,
}

impl JsonlHistoryStore {
    /// A store backed by the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore<HistoryLog> for JsonlHistoryStore {
    async fn load(&self) -> Result<Option<HistoryLog>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let (entries, warnings) = read_jsonl_resilient::<HistoryEntry, _>(&self.path).await?;
        for warning in &warnings {
            tracing::warn!(
                path = %self.path.display(),
                line = warning.line_number(),
                kind = warning.kind(),
                error = %warning,
                "Skipped history line"
            );
        }

        Ok(Some(HistoryLog::from_entries(entries)))
    }

    async fn save(&self, value: &HistoryLog) -> Result<()> {
        write_jsonl_atomic(&self.path, value.entries()).await?;
        tracing::debug!(path = %self.path.display(), entries = value.len(), "Wrote history log");
        Ok(())
    }
}
