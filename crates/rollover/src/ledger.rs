//! The cycle ledger: the live cycle record, the history log, and the stores
//! behind them.
//!
//! Every mutation runs through one path: the change is applied to a working
//! copy, swapped in on success, then written out (history first, record
//! second). A failed closure leaves state untouched. A failed write leaves
//! memory ahead of disk; the unsaved part is retried on the next successful
//! transaction.
//!
//! The ledger also hosts the operations that need no collaborator: the two
//! copy views, manual edits, reset, history maintenance, export and import.

use crate::archive::{HistoryLog, MergeReport};
use crate::clock::Clock;
use crate::config::RolloverConfig;
use crate::domain::{CycleId, CycleRecord, HistoryEntry, MetricsEdit, Step};
use crate::error::{Error, Result};
use crate::interchange::{self, ExportDocument, ImportStrategy};
use crate::orchestrator::gating;
use crate::orchestrator::report::{CycleSummary, TicketGroups};
use crate::store::LedgerStores;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The in-memory pair a transaction works on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LedgerState {
    pub(crate) record: CycleRecord,
    pub(crate) history: HistoryLog,
}

#[derive(Debug)]
struct Shared {
    state: LedgerState,
    record_unsaved: bool,
    history_unsaved: bool,
}

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Strategy that was applied
    pub strategy: ImportStrategy,
    /// History entries after the import
    pub history_len: usize,
    /// Merge details; absent for a replace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeReport>,
}

/// Owner of the persisted cycle state.
pub struct CycleLedger {
    stores: LedgerStores,
    shared: Mutex<Shared>,
    config: RolloverConfig,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CycleLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleLedger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CycleLedger {
    /// Load the record and history from the stores.
    ///
    /// A missing record starts as a fresh, unnamed cycle; a missing history
    /// starts empty. Nothing is written until the first mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if either store cannot be read.
    pub async fn open(
        stores: LedgerStores,
        config: RolloverConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let record = stores
            .cycle
            .load()
            .await?
            .unwrap_or_else(|| CycleRecord::fresh(None));
        let history = stores.history.load().await?.unwrap_or_default();

        debug!(
            cycle_id = ?record.id,
            history_len = history.len(),
            "Opened cycle ledger"
        );

        Ok(Self {
            stores,
            shared: Mutex::new(Shared {
                state: LedgerState { record, history },
                record_unsaved: false,
                history_unsaved: false,
            }),
            config,
            clock,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &RolloverConfig {
        &self.config
    }

    /// The time source.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// A copy of the live cycle record.
    pub async fn current(&self) -> CycleRecord {
        self.shared.lock().await.state.record.clone()
    }

    /// A copy of the history log in insertion order.
    pub async fn history(&self) -> HistoryLog {
        self.shared.lock().await.state.history.clone()
    }

    /// History entries newest first by `timestamp`, falling back to
    /// `completedAt`.
    pub async fn history_by_recency(&self) -> Vec<HistoryEntry> {
        let shared = self.shared.lock().await;
        shared
            .state
            .history
            .by_recency()
            .into_iter()
            .cloned()
            .collect()
    }

    /// The newest-inserted history entry with the id.
    pub async fn history_entry(&self, id: &CycleId) -> Option<HistoryEntry> {
        self.shared.lock().await.state.history.find(id).cloned()
    }

    /// Step 3: the metric summary of the cycle being closed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Precondition` unless the cycle is prepared and the
    /// next milestone does not exist yet.
    pub async fn copy_summary(&self) -> Result<CycleSummary> {
        let shared = self.shared.lock().await;
        gating::ensure(Step::CopySummary, &shared.state.record)?;
        Ok(CycleSummary::from_record(&shared.state.record))
    }

    /// Step 4: closed tickets split into regular and needs-merge groups.
    ///
    /// # Errors
    ///
    /// Returns `Error::Precondition` under the same condition as
    /// [`copy_summary`](Self::copy_summary).
    pub async fn copy_closed_names(&self) -> Result<TicketGroups> {
        let shared = self.shared.lock().await;
        gating::ensure(Step::CopyClosedNames, &shared.state.record)?;
        Ok(TicketGroups::from_record(&shared.state.record))
    }

    /// Overwrite the five metric fields and repair the implied flags.
    ///
    /// If the cycle has already been archived, every history entry with its
    /// id receives the same values.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEdit` for negative or non-finite hours, or a
    /// persistence error if the write fails.
    pub async fn edit_cycle_data(&self, edit: MetricsEdit) -> Result<CycleRecord> {
        edit.validate().map_err(Error::InvalidEdit)?;

        self.transact(|state| {
            state.record.apply_edit(&edit);
            let archived = state
                .record
                .id
                .as_ref()
                .map_or(0, |id| state.history.update_metrics(id, &edit));
            info!(
                cycle_id = ?state.record.id,
                archived_copies = archived,
                "Edited cycle metrics"
            );
            Ok(state.record.clone())
        })
        .await
    }

    /// Abort the cycle in progress.
    ///
    /// Removes any archived copy of the cycle from history, then replaces the
    /// record with a fresh one that keeps only the milestone name.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the write fails.
    pub async fn reset_cycle(&self) -> Result<CycleRecord> {
        self.transact(|state| {
            let removed = state
                .record
                .id
                .as_ref()
                .map_or(0, |id| state.history.remove(id).len());
            let milestone = state.record.milestone_name.take();
            info!(
                cycle_id = ?state.record.id,
                removed_from_history = removed,
                "Reset cycle"
            );
            state.record = CycleRecord::fresh(milestone);
            Ok(state.record.clone())
        })
        .await
    }

    /// Remove every history entry with the id. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::HistoryEntryNotFound` if no entry has the id.
    pub async fn delete_history_entry(&self, id: &CycleId) -> Result<usize> {
        self.transact(|state| {
            let removed = state.history.remove(id);
            if removed.is_empty() {
                return Err(Error::HistoryEntryNotFound(id.clone()));
            }
            info!(cycle_id = %id, removed = removed.len(), "Deleted history entry");
            Ok(removed.len())
        })
        .await
    }

    /// The current state as an export document.
    pub async fn export_document(&self) -> ExportDocument {
        let shared = self.shared.lock().await;
        ExportDocument::new(
            shared.state.record.clone(),
            shared.state.history.clone(),
            self.clock.now(),
        )
    }

    /// The current state as an encoded export blob.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub async fn export(&self) -> Result<String> {
        let document = self.export_document().await;
        let blob = interchange::encode(&document)?;
        info!(
            history_len = document.history_log.len(),
            bytes = blob.len(),
            "Exported cycle state"
        );
        Ok(blob)
    }

    /// Decode an export blob and reconcile it with local state.
    ///
    /// Merge unions the history by id (imported entries win) and leaves the
    /// live record alone. Replace overwrites both.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedImport` before touching any state if the blob
    /// cannot be decoded, or a persistence error if the write fails.
    pub async fn import(&self, text: &str, strategy: ImportStrategy) -> Result<ImportReport> {
        let document = interchange::decode(text)?;
        debug!(
            version = %document.version,
            exported_at = ?document.exported_at,
            entries = document.history_log.len(),
            "Decoded import"
        );

        let policy = self.config.merge_cap;
        let cap = self.config.history_cap;
        self.transact(move |state| {
            let merge = match strategy {
                ImportStrategy::Replace => {
                    state.record = document.cycle_record;
                    state.history = document.history_log;
                    None
                }
                ImportStrategy::Merge => Some(state.history.merge(
                    document.history_log.into_entries(),
                    policy,
                    cap,
                )),
            };
            let report = ImportReport {
                strategy,
                history_len: state.history.len(),
                merge,
            };
            info!(
                strategy = %strategy,
                history_len = report.history_len,
                "Imported cycle state"
            );
            Ok(report)
        })
        .await
    }

    /// Apply `change` to a working copy of the state, swap it in, and persist
    /// whatever is unsaved.
    pub(crate) async fn transact<R, F>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut LedgerState) -> Result<R>,
    {
        let mut shared = self.shared.lock().await;
        let mut working = shared.state.clone();
        let value = change(&mut working)?;

        if working.history != shared.state.history {
            shared.history_unsaved = true;
        }
        if working.record != shared.state.record {
            shared.record_unsaved = true;
        }
        shared.state = working;

        self.flush(&mut shared).await?;
        Ok(value)
    }

    async fn flush(&self, shared: &mut Shared) -> Result<()> {
        if shared.history_unsaved {
            self.stores
                .history
                .save(&shared.state.history)
                .await
                .map_err(|e| persistence_failure("history", e))?;
            shared.history_unsaved = false;
        }
        if shared.record_unsaved {
            self.stores
                .cycle
                .save(&shared.state.record)
                .await
                .map_err(|e| persistence_failure("cycle record", e))?;
            shared.record_unsaved = false;
        }
        Ok(())
    }
}

fn persistence_failure(what: &str, error: Error) -> Error {
    warn!(store = what, error = %error, "Write failed; in-memory state is ahead of disk");
    match error {
        Error::Persistence(message) => Error::Persistence(format!("{what}: {message}")),
        other => Error::Persistence(format!("{what}: {other}")),
    }
}
