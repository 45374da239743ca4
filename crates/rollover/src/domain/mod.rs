//! Domain types for the sprint rollover workflow.
//!
//! The persisted shapes ([`CycleRecord`], [`HistoryEntry`]) serialize with
//! camelCase keys so exported blobs stay readable by every version.

mod board;
mod milestone;

pub use board::{is_done_like, DoneBoardMatcher, DEFAULT_DONE_KEYWORDS};
pub use milestone::{MilestoneName, MilestoneWindow, WEEKS_PER_YEAR};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of one cycle, assigned when the cycle is ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(pub String);

impl CycleId {
    /// Create a new cycle ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CycleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CycleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-contributor ticket and hour totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPerformance {
    /// Tickets assigned to the contributor
    #[serde(default)]
    pub total_tickets: u32,

    /// Of those, tickets closed
    #[serde(default)]
    pub closed_tickets: u32,

    /// Estimated hours across all assigned tickets
    #[serde(default)]
    pub total_hours: f64,

    /// Estimated hours across closed tickets
    #[serde(default)]
    pub closed_hours: f64,
}

/// A ticket closed during the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTicket {
    /// Issue number on the board
    pub id: u64,

    /// Issue title
    pub title: String,

    /// Whether the issue still carries a needs-merge label
    #[serde(default)]
    pub has_needs_merge_label: bool,
}

/// The milestone created for the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
    /// Identifier assigned by the milestone service
    pub id: String,

    /// Milestone title as displayed on the board
    pub display_name: String,

    /// First day of the sprint
    pub start_date: NaiveDate,

    /// Last day of the sprint window
    pub end_date: NaiveDate,

    /// Web URL of the milestone
    pub external_ref: String,
}

/// What the milestone service reported after closing the old milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OldMilestoneInfo {
    /// Title of the closed milestone
    pub title: String,

    /// Web URL of the closed milestone
    pub web_url: String,

    /// When the milestone was closed
    pub closed_at: DateTime<Utc>,
}

/// Per-contributor, per-board hour breakdown, carried into history unchanged.
pub type UserDistributions = BTreeMap<String, BTreeMap<String, f64>>;

/// Completion flags of a cycle.
///
/// The flags form a chain: each one implies all flags before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CycleFlag {
    /// Step 1 has run
    Ended,
    /// Step 2 has run and the cycle was archived
    PreparedForNext,
    /// Step 5 has created the next milestone
    NewMilestoneCreated,
    /// Step 6 has migrated the surviving issues
    SurvivorsSet,
    /// Step 7 has closed the old milestone
    OldMilestoneClosed,
}

impl CycleFlag {
    /// All flags, in implication order.
    pub const CHAIN: [CycleFlag; 5] = [
        CycleFlag::Ended,
        CycleFlag::PreparedForNext,
        CycleFlag::NewMilestoneCreated,
        CycleFlag::SurvivorsSet,
        CycleFlag::OldMilestoneClosed,
    ];

    /// The flag this one implies, if any.
    pub fn predecessor(self) -> Option<CycleFlag> {
        match self {
            CycleFlag::Ended => None,
            CycleFlag::PreparedForNext => Some(CycleFlag::Ended),
            CycleFlag::NewMilestoneCreated => Some(CycleFlag::PreparedForNext),
            CycleFlag::SurvivorsSet => Some(CycleFlag::NewMilestoneCreated),
            CycleFlag::OldMilestoneClosed => Some(CycleFlag::SurvivorsSet),
        }
    }
}

/// The one live, in-progress cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    /// Assigned when the cycle is ended; absent before that
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CycleId>,

    /// The sprint milestone this cycle is closing out
    #[serde(default)]
    pub milestone_name: Option<String>,

    /// Step 1 done
    #[serde(default)]
    pub ended: bool,

    /// Step 2 done
    #[serde(default)]
    pub prepared_for_next: bool,

    /// Step 5 done
    #[serde(default)]
    pub new_milestone_created: bool,

    /// Step 6 done
    #[serde(default)]
    pub survivors_set: bool,

    /// Step 7 done
    #[serde(default)]
    pub old_milestone_closed: bool,

    /// Tickets on the board at cycle end
    #[serde(default)]
    pub total_tickets: u32,

    /// Tickets closed during the cycle
    #[serde(default)]
    pub closed_tickets: u32,

    /// Estimated hours on the board at cycle end
    #[serde(default)]
    pub total_hours: f64,

    /// Estimated hours closed during the cycle
    #[serde(default)]
    pub closed_hours: f64,

    /// Hours that left the board between ending and preparing
    #[serde(default)]
    pub extra_hours_closed: f64,

    /// Per-contributor totals
    #[serde(default)]
    pub user_performance: BTreeMap<String, UserPerformance>,

    /// Tickets closed during the cycle, in board order
    #[serde(default)]
    pub closed_tickets_list: Vec<ClosedTicket>,

    /// The milestone created by step 5
    #[serde(default)]
    pub new_milestone: Option<NewMilestone>,

    /// Title of the milestone step 7 closes
    #[serde(default)]
    pub milestone_to_close: Option<String>,

    /// Result of closing the old milestone
    #[serde(default)]
    pub old_milestone_info: Option<OldMilestoneInfo>,

    /// When the cycle was ended
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// When the cycle was archived
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl CycleRecord {
    /// A fresh record with all flags false, seeded only with a milestone name.
    pub fn fresh(milestone_name: Option<String>) -> Self {
        Self {
            milestone_name,
            ..Self::default()
        }
    }

    /// Whether the given flag is set.
    pub fn is_set(&self, flag: CycleFlag) -> bool {
        match flag {
            CycleFlag::Ended => self.ended,
            CycleFlag::PreparedForNext => self.prepared_for_next,
            CycleFlag::NewMilestoneCreated => self.new_milestone_created,
            CycleFlag::SurvivorsSet => self.survivors_set,
            CycleFlag::OldMilestoneClosed => self.old_milestone_closed,
        }
    }

    /// Set a flag together with every flag it implies.
    ///
    /// Flags are only ever raised here, never lowered.
    pub fn raise(&mut self, flag: CycleFlag) {
        let mut current = Some(flag);
        while let Some(flag) = current {
            match flag {
                CycleFlag::Ended => self.ended = true,
                CycleFlag::PreparedForNext => self.prepared_for_next = true,
                CycleFlag::NewMilestoneCreated => self.new_milestone_created = true,
                CycleFlag::SurvivorsSet => self.survivors_set = true,
                CycleFlag::OldMilestoneClosed => self.old_milestone_closed = true,
            }
            current = flag.predecessor();
        }
    }

    /// Whether every set flag has its predecessor set.
    pub fn flags_consistent(&self) -> bool {
        CycleFlag::CHAIN.iter().all(|&flag| {
            !self.is_set(flag) || flag.predecessor().is_none_or(|prev| self.is_set(prev))
        })
    }

    /// Populate metrics from a board snapshot (step 1).
    pub fn apply_snapshot(&mut self, snapshot: &BoardSnapshot) {
        self.total_tickets = snapshot.total_tickets;
        self.closed_tickets = u32::try_from(snapshot.closed_tickets_list.len()).unwrap_or(u32::MAX);
        self.total_hours = snapshot.total_hours;
        self.closed_hours = snapshot.closed_hours;
        self.extra_hours_closed = 0.0;
        self.user_performance = snapshot.user_performance.clone();
        self.closed_tickets_list = snapshot.closed_tickets_list.clone();
    }

    /// Overwrite the five metric fields and repair the flags they imply.
    ///
    /// `total_tickets > 0` raises `ended`; `extra_hours_closed > 0` raises
    /// `survivors_set` (and, through the chain, its predecessors). Flags are
    /// never lowered.
    ///
    /// Raising `survivors_set` this way also raises `new_milestone_created`
    /// without a `new_milestone`. Step 7 cannot close such a cycle; it
    /// reports [`MissingData::NoNewMilestone`](crate::error::MissingData)
    /// until the cycle is reset.
    pub fn apply_edit(&mut self, edit: &MetricsEdit) {
        edit.write_to(self);
        if self.total_tickets > 0 {
            self.raise(CycleFlag::Ended);
        }
        if self.extra_hours_closed > 0.0 {
            self.raise(CycleFlag::SurvivorsSet);
        }
    }
}

/// An immutable snapshot of a cycle record at archive time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// The archived record
    #[serde(flatten)]
    pub record: CycleRecord,

    /// Hour breakdown captured alongside the archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_distributions: Option<UserDistributions>,
}

impl HistoryEntry {
    /// Freeze a record into a history entry.
    pub fn new(record: CycleRecord, user_distributions: Option<UserDistributions>) -> Self {
        Self {
            record,
            user_distributions,
        }
    }

    /// The archived cycle's id, if it had one.
    pub fn id(&self) -> Option<&CycleId> {
        self.record.id.as_ref()
    }

    /// Sort key for display: `timestamp`, falling back to `completedAt`.
    pub fn recency(&self) -> Option<DateTime<Utc>> {
        self.record.timestamp.or(self.record.completed_at)
    }
}

/// The five user-editable metric fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsEdit {
    /// Tickets on the board
    pub total_tickets: u32,
    /// Tickets closed
    pub closed_tickets: u32,
    /// Hours on the board
    pub total_hours: f64,
    /// Hours closed
    pub closed_hours: f64,
    /// Hours that left the board after ending
    pub extra_hours_closed: f64,
}

impl MetricsEdit {
    /// Check that the hour fields are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending field.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in [
            ("totalHours", self.total_hours),
            ("closedHours", self.closed_hours),
            ("extraHoursClosed", self.extra_hours_closed),
        ] {
            if !value.is_finite() {
                return Err(format!("{name} must be a finite number"));
            }
            if value < 0.0 {
                return Err(format!("{name} cannot be negative (got {value})"));
            }
        }
        Ok(())
    }

    /// Copy the edited values into a record without touching flags.
    pub fn write_to(&self, record: &mut CycleRecord) {
        record.total_tickets = self.total_tickets;
        record.closed_tickets = self.closed_tickets;
        record.total_hours = self.total_hours;
        record.closed_hours = self.closed_hours;
        record.extra_hours_closed = self.extra_hours_closed;
    }
}

/// Point-in-time read of board metrics.
///
/// Providers degrade to zeros and empty collections when the board is not
/// fully loaded, so `Default` is a valid snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    /// Tickets on the board
    #[serde(default)]
    pub total_tickets: u32,

    /// Estimated hours on the board
    #[serde(default)]
    pub total_hours: f64,

    /// Estimated hours on done-like boards
    #[serde(default)]
    pub closed_hours: f64,

    /// Tickets on done-like boards
    #[serde(default)]
    pub closed_tickets_list: Vec<ClosedTicket>,

    /// Per-contributor totals
    #[serde(default)]
    pub user_performance: BTreeMap<String, UserPerformance>,

    /// The milestone the board is filtered to, if any
    #[serde(default)]
    pub current_milestone_name: Option<String>,

    /// Per-contributor, per-board hours
    #[serde(default)]
    pub user_distributions: Option<UserDistributions>,
}

impl BoardSnapshot {
    /// The detected milestone, ignoring blank names.
    pub fn detected_milestone(&self) -> Option<&str> {
        self.current_milestone_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// An issue on the board, with the name of the board list it sits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardIssue {
    /// Issue number
    pub id: u64,

    /// Issue title
    pub title: String,

    /// Name of the board list holding the issue
    pub board: String,
}

/// The user-invocable steps of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// 1: capture the final metrics of the sprint
    EndCycle,
    /// 2: measure hours that left the board and archive the cycle
    PrepareNext,
    /// 3: export the metric summary
    CopySummary,
    /// 4: export the closed ticket names
    CopyClosedNames,
    /// 5: create the next sprint milestone
    CreateMilestone,
    /// 6: move unfinished issues to the new milestone
    SetSurvivors,
    /// 7: close the old milestone and start the next cycle
    CloseOldMilestone,
}

impl Step {
    /// All steps in workflow order.
    pub const ALL: [Step; 7] = [
        Step::EndCycle,
        Step::PrepareNext,
        Step::CopySummary,
        Step::CopyClosedNames,
        Step::CreateMilestone,
        Step::SetSurvivors,
        Step::CloseOldMilestone,
    ];

    /// 1-based position in the workflow.
    pub fn number(self) -> u8 {
        match self {
            Step::EndCycle => 1,
            Step::PrepareNext => 2,
            Step::CopySummary => 3,
            Step::CopyClosedNames => 4,
            Step::CreateMilestone => 5,
            Step::SetSurvivors => 6,
            Step::CloseOldMilestone => 7,
        }
    }

    /// Short human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Step::EndCycle => "end cycle",
            Step::PrepareNext => "prepare next",
            Step::CopySummary => "copy summary",
            Step::CopyClosedNames => "copy closed names",
            Step::CreateMilestone => "create milestone",
            Step::SetSurvivors => "set survivors",
            Step::CloseOldMilestone => "close old milestone",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}
