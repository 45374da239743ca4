//! Storage abstraction for the cycle record and the history log.
//!
//! Both persisted values are single documents that are loaded whole and
//! replaced whole, so one small trait covers them:
//!
//! - **In-memory**: ephemeral, with write-failure injection for tests
//! - **Files**: the cycle record as a JSON document, the history as JSONL
//!
//! The two stores are independent. A caller that writes both awaits one
//! write after the other; there is no transaction spanning them.
//!
//! # Example
//!
//! ```
//! use rollover::domain::CycleRecord;
//! use rollover::store::{create_stores, StoreBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> rollover::error::Result<()> {
//!     let stores = create_stores(StoreBackend::InMemory);
//!     stores.cycle.save(&CycleRecord::fresh(Some("14 KW 23".into()))).await?;
//!     assert!(stores.cycle.load().await?.is_some());
//!     Ok(())
//! }
//! ```

use crate::archive::HistoryLog;
use crate::domain::CycleRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub mod file;
pub mod in_memory;

pub use file::{JsonDocumentStore, JsonlHistoryStore};
pub use in_memory::InMemoryRecordStore;

/// A store holding one value of type `T`.
///
/// Implementations must be `Send + Sync` so a ledger can be shared across
/// tasks.
#[async_trait]
pub trait RecordStore<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Read the stored value. `None` means nothing has been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read or decoded.
    async fn load(&self) -> Result<Option<T>>;

    /// Replace the stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The previously stored value is
    /// left intact.
    async fn save(&self, value: &T) -> Result<()>;
}

/// The pair of stores a ledger persists into.
pub struct LedgerStores {
    /// Holds the single live cycle record
    pub cycle: Box<dyn RecordStore<CycleRecord>>,
    /// Holds the capped history log
    pub history: Box<dyn RecordStore<HistoryLog>>,
}

impl std::fmt::Debug for LedgerStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStores").finish_non_exhaustive()
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Ephemeral stores that live as long as the process
    InMemory,
    /// File-backed stores
    Files {
        /// JSON document holding the cycle record
        cycle_path: PathBuf,
        /// JSONL file holding one history entry per line
        history_path: PathBuf,
    },
}

/// Create the cycle and history stores for a backend.
pub fn create_stores(backend: StoreBackend) -> LedgerStores {
    match backend {
        StoreBackend::InMemory => LedgerStores {
            cycle: Box::new(InMemoryRecordStore::<CycleRecord>::new()),
            history: Box::new(InMemoryRecordStore::<HistoryLog>::new()),
        },
        StoreBackend::Files {
            cycle_path,
            history_path,
        } => LedgerStores {
            cycle: Box::new(JsonDocumentStore::<CycleRecord>::new(cycle_path)),
            history: Box::new(JsonlHistoryStore::new(history_path)),
        },
    }
}
