//! The capped history of archived cycles.
//!
//! Entries are kept in insertion order, newest first. Normal archival
//! prepends and then truncates to the cap, so eviction removes the oldest
//! *inserted* entry. Display ordering by recency is a separate view
//! ([`HistoryLog::by_recency`]); the two orderings are never conflated.
//!
//! Archiving does not deduplicate: archiving the same cycle twice leaves
//! two copies until a merge import or a reset collapses them.

use crate::config::MergeCapPolicy;
use crate::domain::{CycleId, CycleRecord, HistoryEntry, MetricsEdit, UserDistributions};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Ordered sequence of history entries, newest inserted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

/// Outcome of merging an imported history into the local one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Local entries overwritten by an imported entry with the same id
    pub updated: usize,
    /// Imported entries appended because their id was new (or absent)
    pub appended: usize,
    /// Entries dropped: local duplicates of an updated id, plus any cap eviction
    pub evicted: usize,
}

impl HistoryLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries that are already in insertion order.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    /// Entries in insertion order, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Consume the log, returning its entries.
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot a record into the log at the newest position, then truncate
    /// to `cap`. Returns the evicted entries, oldest last.
    pub fn archive(
        &mut self,
        record: &CycleRecord,
        user_distributions: Option<UserDistributions>,
        cap: usize,
    ) -> Vec<HistoryEntry> {
        self.entries
            .insert(0, HistoryEntry::new(record.clone(), user_distributions));
        self.apply_cap(cap)
    }

    /// Truncate to at most `cap` entries, dropping from the old end.
    pub fn apply_cap(&mut self, cap: usize) -> Vec<HistoryEntry> {
        if self.entries.len() > cap {
            self.entries.split_off(cap)
        } else {
            Vec::new()
        }
    }

    /// Whether any entry carries the id.
    pub fn contains(&self, id: &CycleId) -> bool {
        self.find(id).is_some()
    }

    /// The newest-inserted entry with the id.
    pub fn find(&self, id: &CycleId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id() == Some(id))
    }

    /// Every entry with the id, in insertion order.
    pub fn find_all<'a>(&'a self, id: &'a CycleId) -> impl Iterator<Item = &'a HistoryEntry> + 'a {
        self.entries.iter().filter(move |e| e.id() == Some(id))
    }

    /// Write edited metrics into every entry with the id. Flags on history
    /// entries are left alone. Returns how many entries changed.
    pub fn update_metrics(&mut self, id: &CycleId, edit: &MetricsEdit) -> usize {
        let mut count = 0;
        for entry in self.entries.iter_mut().filter(|e| e.id() == Some(id)) {
            edit.write_to(&mut entry.record);
            count += 1;
        }
        count
    }

    /// Remove every entry with the id, returning them.
    pub fn remove(&mut self, id: &CycleId) -> Vec<HistoryEntry> {
        let (removed, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.id() == Some(id));
        self.entries = kept;
        removed
    }

    /// Ids present in the log, without repeats.
    pub fn ids(&self) -> HashSet<&CycleId> {
        self.entries.iter().filter_map(HistoryEntry::id).collect()
    }

    /// Merge imported entries into this log.
    ///
    /// For an imported entry whose id already exists locally, the first local
    /// match is overwritten in place and any further local copies are dropped.
    /// Imported entries without an id, or with an unknown id, are appended.
    /// The result is stably sorted by recency (newest first, undated last).
    /// Under [`MergeCapPolicy::Apply`] the log is then truncated to `cap`.
    pub fn merge(
        &mut self,
        imported: Vec<HistoryEntry>,
        policy: MergeCapPolicy,
        cap: usize,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        for entry in imported {
            let Some(id) = entry.id().cloned() else {
                self.entries.push(entry);
                report.appended += 1;
                continue;
            };

            match self.entries.iter().position(|e| e.id() == Some(&id)) {
                Some(first) => {
                    self.entries[first] = entry;
                    report.updated += 1;

                    let before = self.entries.len();
                    let mut index = 0;
                    self.entries.retain(|e| {
                        let keep = index <= first || e.id() != Some(&id);
                        index += 1;
                        keep
                    });
                    report.evicted += before - self.entries.len();
                }
                None => {
                    self.entries.push(entry);
                    report.appended += 1;
                }
            }
        }

        self.sort_by_recency();

        if policy == MergeCapPolicy::Apply {
            report.evicted += self.apply_cap(cap).len();
        }

        report
    }

    /// Stable sort, newest first. Entries with no timestamp go last.
    pub fn sort_by_recency(&mut self) {
        self.entries
            .sort_by_key(|e| (e.recency().is_none(), Reverse(e.recency())));
    }

    /// Entries in display order (newest first), leaving storage order alone.
    pub fn by_recency(&self) -> Vec<&HistoryEntry> {
        let mut view: Vec<&HistoryEntry> = self.entries.iter().collect();
        view.sort_by_key(|e| (e.recency().is_none(), Reverse(e.recency())));
        view
    }
}
