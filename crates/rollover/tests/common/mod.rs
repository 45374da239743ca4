//! Common test utilities shared across integration tests.
//!
//! Fakes for the three collaborators plus a harness that wires them to an
//! orchestrator over in-memory stores and a fixed clock.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rollover::archive::HistoryLog;
use rollover::clock::FixedClock;
use rollover::collaborators::{
    BulkActionCollaborator, BulkActionReport, ClosedMilestone, CreatedMilestone,
    MilestoneCollaborator, SnapshotProvider,
};
use rollover::config::RolloverConfig;
use rollover::domain::{BoardIssue, BoardSnapshot, ClosedTicket, CycleRecord, UserPerformance};
use rollover::error::CollaboratorError;
use rollover::ledger::CycleLedger;
use rollover::orchestrator::CycleOrchestrator;
use rollover::store::{InMemoryRecordStore, LedgerStores};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 2026-06-01 09:00 UTC, the instant every harness clock starts at.
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

/// A board snapshot for a sprint named `milestone`.
pub fn sprint_snapshot(milestone: &str, total_hours: f64) -> BoardSnapshot {
    BoardSnapshot {
        total_tickets: 6,
        total_hours,
        closed_hours: 18.0,
        closed_tickets_list: vec![
            ClosedTicket {
                id: 101,
                title: "Export history as CSV".to_string(),
                has_needs_merge_label: false,
            },
            ClosedTicket {
                id: 102,
                title: "Fix board filter".to_string(),
                has_needs_merge_label: true,
            },
            ClosedTicket {
                id: 103,
                title: "Rename columns".to_string(),
                has_needs_merge_label: false,
            },
        ],
        user_performance: BTreeMap::from([
            (
                "alice".to_string(),
                UserPerformance {
                    total_tickets: 4,
                    closed_tickets: 2,
                    total_hours: 24.0,
                    closed_hours: 12.0,
                },
            ),
            (
                "bob".to_string(),
                UserPerformance {
                    total_tickets: 2,
                    closed_tickets: 1,
                    total_hours: total_hours - 24.0,
                    closed_hours: 6.0,
                },
            ),
        ]),
        current_milestone_name: Some(milestone.to_string()),
        user_distributions: Some(BTreeMap::from([(
            "alice".to_string(),
            BTreeMap::from([("Doing".to_string(), 12.0), ("Done".to_string(), 12.0)]),
        )])),
    }
}

/// Issues spread over done-like and open boards.
pub fn board_issues() -> Vec<BoardIssue> {
    [
        (101, "Export history as CSV", "Done"),
        (104, "Migrate settings page", "In Progress"),
        (105, "Flaky login test", "Review"),
        (102, "Fix board filter", "Closed (this sprint)"),
        (106, "Write release notes", "Backlog"),
    ]
    .into_iter()
    .map(|(id, title, board)| BoardIssue {
        id,
        title: title.to_string(),
        board: board.to_string(),
    })
    .collect()
}

/// Snapshot provider returning whatever was last scripted.
#[derive(Debug, Default)]
pub struct ScriptedBoard {
    snapshot: Mutex<BoardSnapshot>,
    issues: Mutex<Vec<BoardIssue>>,
}

impl ScriptedBoard {
    pub fn new(snapshot: BoardSnapshot, issues: Vec<BoardIssue>) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            issues: Mutex::new(issues),
        }
    }

    pub fn set_snapshot(&self, snapshot: BoardSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn set_total_hours(&self, hours: f64) {
        self.snapshot.lock().unwrap().total_hours = hours;
    }

    pub fn set_milestone(&self, milestone: Option<&str>) {
        self.snapshot.lock().unwrap().current_milestone_name = milestone.map(str::to_string);
    }

    pub fn set_issues(&self, issues: Vec<BoardIssue>) {
        *self.issues.lock().unwrap() = issues;
    }
}

#[async_trait]
impl SnapshotProvider for ScriptedBoard {
    async fn capture(&self) -> BoardSnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    async fn board_issues(&self) -> Vec<BoardIssue> {
        self.issues.lock().unwrap().clone()
    }
}

/// Milestone service fake that records calls and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingMilestones {
    pub created: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    pub closed: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingMilestones {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn created_titles(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _, _)| title.clone())
            .collect()
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(CollaboratorError::new("503 Service Unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MilestoneCollaborator for RecordingMilestones {
    async fn create(
        &self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CreatedMilestone, CollaboratorError> {
        self.check()?;
        let mut created = self.created.lock().unwrap();
        created.push((title.to_string(), start, end));
        Ok(CreatedMilestone {
            external_id: format!("ms-{}", created.len()),
            display_name: title.to_string(),
            web_url: format!("https://gitlab.example/milestones/{}", created.len()),
        })
    }

    async fn close(&self, title: &str) -> Result<ClosedMilestone, CollaboratorError> {
        self.check()?;
        self.closed.lock().unwrap().push(title.to_string());
        Ok(ClosedMilestone {
            title: title.to_string(),
            web_url: "https://gitlab.example/milestones/closed".to_string(),
            closed_at: start_instant(),
        })
    }
}

/// Bulk-action fake that records each batch, optionally after a delay.
#[derive(Debug, Default)]
pub struct RecordingBulkActions {
    pub batches: Mutex<Vec<(Vec<u64>, String)>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingBulkActions {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl BulkActionCollaborator for RecordingBulkActions {
    async fn select_and_queue(
        &self,
        issues: &[BoardIssue],
        command: &str,
    ) -> Result<BulkActionReport, CollaboratorError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("bulk edit rejected"));
        }
        self.batches.lock().unwrap().push((
            issues.iter().map(|issue| issue.id).collect(),
            command.to_string(),
        ));
        Ok(BulkActionReport {
            queued: issues.len(),
        })
    }
}

/// An orchestrator over in-memory stores with handles to every fake.
pub struct Harness {
    pub orchestrator: CycleOrchestrator,
    pub board: Arc<ScriptedBoard>,
    pub milestones: Arc<RecordingMilestones>,
    pub bulk: Arc<RecordingBulkActions>,
    pub cycle_store: InMemoryRecordStore<CycleRecord>,
    pub history_store: InMemoryRecordStore<HistoryLog>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    /// Serialized contents of both stores, for byte-for-byte comparisons.
    pub async fn persisted(&self) -> (String, String) {
        (
            serde_json::to_string(&self.cycle_store.snapshot().await).unwrap(),
            serde_json::to_string(&self.history_store.snapshot().await).unwrap(),
        )
    }

    /// Run steps 1, 2, 5, 6 and 7 against the current board.
    pub async fn run_full_cycle(&self) {
        let o = &self.orchestrator;
        o.end_cycle().await.unwrap();
        o.prepare_next().await.unwrap();
        o.create_milestone().await.unwrap();
        o.set_survivors().await.unwrap();
        let wrap = o.close_old_milestone().await.unwrap();
        self.board.set_milestone(wrap.next.milestone_name.as_deref());
    }
}

/// Harness for a board running sprint "14 KW 23".
pub async fn harness() -> Harness {
    harness_with(RolloverConfig::default(), None).await
}

/// Harness with a custom config and an optional pre-existing record.
pub async fn harness_with(config: RolloverConfig, record: Option<CycleRecord>) -> Harness {
    let cycle_store = match record {
        Some(record) => InMemoryRecordStore::with_value(record),
        None => InMemoryRecordStore::new(),
    };
    let history_store = InMemoryRecordStore::new();
    let clock = Arc::new(FixedClock::at(start_instant()));

    let stores = LedgerStores {
        cycle: Box::new(cycle_store.clone()),
        history: Box::new(history_store.clone()),
    };
    let ledger = CycleLedger::open(stores, config, clock.clone())
        .await
        .unwrap();

    let board = Arc::new(ScriptedBoard::new(
        sprint_snapshot("14 KW 23", 40.0),
        board_issues(),
    ));
    let milestones = Arc::new(RecordingMilestones::default());
    let bulk = Arc::new(RecordingBulkActions::default());

    let orchestrator = CycleOrchestrator::new(
        Arc::new(ledger),
        board.clone(),
        milestones.clone(),
        bulk.clone(),
    );

    Harness {
        orchestrator,
        board,
        milestones,
        bulk,
        cycle_store,
        history_store,
        clock,
    }
}
