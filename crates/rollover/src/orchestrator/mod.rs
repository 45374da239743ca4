//! The sprint rollover state machine.
//!
//! Seven steps move a cycle from "sprint running" to "next sprint started":
//!
//! 1. **End cycle**: capture the final board metrics and assign the cycle id
//! 2. **Prepare next**: measure hours that left the board, archive the cycle
//! 3. **Copy summary** / 4. **Copy closed names**: repeatable read-only views
//! 5. **Create milestone**: create the next sprint milestone
//! 6. **Set survivors**: move unfinished issues to the new milestone
//! 7. **Close old milestone**: close the finished milestone and start over
//!
//! Each step runs in the same order:
//!
//! - claim the step's in-flight slot (a second trigger gets
//!   [`Error::StepInFlight`])
//! - check the flag precondition (rejected steps touch nothing)
//! - check the data the step needs and call the collaborator
//! - commit through the ledger, re-checking the precondition
//!
//! A collaborator failure returns before the commit, so the gating flag
//! stays unset and the step can simply be retried.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rollover::collaborators::{BulkActionCollaborator, MilestoneCollaborator, SnapshotProvider};
//! # use rollover::ledger::CycleLedger;
//! use rollover::orchestrator::CycleOrchestrator;
//!
//! # async fn example(
//! #     ledger: Arc<CycleLedger>,
//! #     board: Arc<dyn SnapshotProvider>,
//! #     milestones: Arc<dyn MilestoneCollaborator>,
//! #     bulk: Arc<dyn BulkActionCollaborator>,
//! # ) -> rollover::error::Result<()> {
//! let orchestrator = CycleOrchestrator::new(ledger, board, milestones, bulk);
//! orchestrator.end_cycle().await?;
//! orchestrator.prepare_next().await?;
//! println!("{}", orchestrator.copy_summary().await?.render());
//! orchestrator.create_milestone().await?;
//! orchestrator.set_survivors().await?;
//! let wrap = orchestrator.close_old_milestone().await?;
//! println!("next cycle: {:?}", wrap.next.milestone_name);
//! # Ok(())
//! # }
//! ```

pub mod gating;
mod in_flight;
pub mod report;

pub use in_flight::{InFlightGuard, InFlightSteps};
pub use report::{ContributorLine, CycleSummary, StepState, StepStatus, TicketGroups};

use crate::collaborators::{BulkActionCollaborator, MilestoneCollaborator, SnapshotProvider};
use crate::domain::{
    BoardIssue, CycleFlag, CycleRecord, MilestoneName, MilestoneWindow, NewMilestone,
    OldMilestoneInfo, Step,
};
use crate::error::{CollaboratorError, Error, MissingData, Result};
use crate::id_generation::CycleIdGenerator;
use crate::ledger::CycleLedger;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix of generated cycle ids.
pub const CYCLE_ID_PREFIX: &str = "cycle";

/// Result of step 6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivorMigration {
    /// Issues that were not on a done-like board
    pub survivors: Vec<BoardIssue>,
    /// The quick-action text applied to them
    pub command: String,
}

/// Result of step 7: the finished cycle and the one that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleWrap {
    /// The cycle as it stood when the old milestone was closed
    pub completed: CycleRecord,
    /// The fresh record for the next sprint
    pub next: CycleRecord,
}

/// Drives a cycle through its steps against a ledger and collaborators.
pub struct CycleOrchestrator {
    ledger: Arc<CycleLedger>,
    snapshots: Arc<dyn SnapshotProvider>,
    milestones: Arc<dyn MilestoneCollaborator>,
    bulk_actions: Arc<dyn BulkActionCollaborator>,
    in_flight: InFlightSteps,
}

impl fmt::Debug for CycleOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleOrchestrator")
            .field("ledger", &self.ledger)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl CycleOrchestrator {
    /// Wire an orchestrator to its ledger and collaborators.
    pub fn new(
        ledger: Arc<CycleLedger>,
        snapshots: Arc<dyn SnapshotProvider>,
        milestones: Arc<dyn MilestoneCollaborator>,
        bulk_actions: Arc<dyn BulkActionCollaborator>,
    ) -> Self {
        Self {
            ledger,
            snapshots,
            milestones,
            bulk_actions,
            in_flight: InFlightSteps::new(),
        }
    }

    /// The ledger the orchestrator commits into.
    pub fn ledger(&self) -> &CycleLedger {
        &self.ledger
    }

    /// Status of every step, in workflow order.
    pub async fn step_states(&self) -> Vec<StepState> {
        let record = self.ledger.current().await;
        Step::ALL
            .iter()
            .map(|&step| StepState {
                step,
                status: gating::status(step, &record, self.in_flight.contains(step)),
            })
            .collect()
    }

    /// Step 1: capture the final metrics of the sprint.
    ///
    /// # Errors
    ///
    /// - `Error::StepInFlight` if the step is already running
    /// - `Error::Precondition` if the cycle has already been ended
    /// - `MissingData::NoMilestoneDetected` if the board has no milestone
    pub async fn end_cycle(&self) -> Result<CycleRecord> {
        const STEP: Step = Step::EndCycle;
        let _guard = self.claim(STEP)?;
        self.precheck(STEP).await?;

        let snapshot = self.snapshots.capture().await;
        let milestone = snapshot
            .detected_milestone()
            .map(str::to_string)
            .ok_or(MissingData::NoMilestoneDetected)?;
        let now = self.ledger.clock().now();

        self.ledger
            .transact(|state| {
                gating::ensure(STEP, &state.record)?;

                let mut ids = CycleIdGenerator::new(CYCLE_ID_PREFIX);
                for id in state.history.ids() {
                    ids.register_id(id);
                }
                let id = ids.generate(&milestone, now)?;

                let record = &mut state.record;
                record.apply_snapshot(&snapshot);
                record.id = Some(id);
                record.milestone_name = Some(milestone.clone());
                record.milestone_to_close = Some(milestone.clone());
                record.timestamp = Some(now);
                record.raise(CycleFlag::Ended);

                info!(
                    step = %STEP,
                    cycle_id = ?record.id,
                    milestone = %milestone,
                    total_tickets = record.total_tickets,
                    closed_tickets = record.closed_tickets,
                    "Cycle ended"
                );
                Ok(record.clone())
            })
            .await
    }

    /// Step 2: record the hours that left the board since step 1 and archive
    /// the cycle.
    ///
    /// # Errors
    ///
    /// - `Error::StepInFlight` if the step is already running
    /// - `Error::Precondition` unless the cycle is ended and not yet prepared
    pub async fn prepare_next(&self) -> Result<CycleRecord> {
        const STEP: Step = Step::PrepareNext;
        let _guard = self.claim(STEP)?;
        self.precheck(STEP).await?;

        let snapshot = self.snapshots.capture().await;
        let now = self.ledger.clock().now();
        let cap = self.ledger.config().history_cap;

        self.ledger
            .transact(|state| {
                gating::ensure(STEP, &state.record)?;

                let record = &mut state.record;
                record.extra_hours_closed = (record.total_hours - snapshot.total_hours).max(0.0);
                record.completed_at = Some(now);
                record.raise(CycleFlag::PreparedForNext);

                let evicted =
                    state
                        .history
                        .archive(record, snapshot.user_distributions.clone(), cap);
                for entry in &evicted {
                    debug!(cycle_id = ?entry.id(), "Evicted history entry");
                }

                info!(
                    step = %STEP,
                    cycle_id = ?record.id,
                    extra_hours_closed = record.extra_hours_closed,
                    history_len = state.history.len(),
                    "Cycle archived"
                );
                Ok(record.clone())
            })
            .await
    }

    /// Step 3: the metric summary. Repeatable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Precondition` unless the cycle is prepared and the next
    /// milestone does not exist yet.
    pub async fn copy_summary(&self) -> Result<CycleSummary> {
        self.ledger.copy_summary().await
    }

    /// Step 4: the closed ticket names, grouped. Repeatable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Precondition` under the same condition as step 3.
    pub async fn copy_closed_names(&self) -> Result<TicketGroups> {
        self.ledger.copy_closed_names().await
    }

    /// Step 5: create the milestone for the next sprint.
    ///
    /// The name is derived from the current one: `"14 KW 23"` becomes
    /// `"15 KW 24"`. The window starts today.
    ///
    /// # Errors
    ///
    /// - `Error::StepInFlight` if the step is already running
    /// - `Error::Precondition` unless the cycle is prepared and no milestone
    ///   has been created
    /// - `MissingData` if there is no milestone name or it does not parse
    /// - `Error::Collaborator` if the milestone service fails
    pub async fn create_milestone(&self) -> Result<CycleRecord> {
        const STEP: Step = Step::CreateMilestone;
        let _guard = self.claim(STEP)?;
        let record = self.precheck(STEP).await?;

        let current = record
            .milestone_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(MissingData::NoMilestoneDetected)?;
        let title = MilestoneName::parse(current)?.next()?.to_string();
        let window = MilestoneWindow::starting(
            self.ledger.clock().today(),
            self.ledger.config().sprint_length_days,
        );

        debug!(step = %STEP, title = %title, start = %window.start, end = %window.end, "Creating milestone");
        let created = self
            .milestones
            .create(&title, window.start, window.end)
            .await
            .map_err(|source| collaborator_failed(STEP, source))?;

        self.ledger
            .transact(|state| {
                gating::ensure(STEP, &state.record)?;

                let display_name = if created.display_name.trim().is_empty() {
                    title.clone()
                } else {
                    created.display_name.clone()
                };
                state.record.new_milestone = Some(NewMilestone {
                    id: created.external_id.clone(),
                    display_name,
                    start_date: window.start,
                    end_date: window.end,
                    external_ref: created.web_url.clone(),
                });
                state.record.raise(CycleFlag::NewMilestoneCreated);

                info!(step = %STEP, milestone = %title, "Milestone created");
                Ok(state.record.clone())
            })
            .await
    }

    /// Step 6: move every issue not on a done-like board to the new
    /// milestone and label it as a survivor.
    ///
    /// The flag is set once the bulk action has completed. With no
    /// survivors the collaborator is not called.
    ///
    /// # Errors
    ///
    /// - `Error::StepInFlight` if the step is already running
    /// - `Error::Precondition` unless the milestone exists and survivors have
    ///   not been moved
    /// - `MissingData::NoNewMilestone` if the record lacks the new milestone
    /// - `Error::Collaborator` if the bulk action fails
    pub async fn set_survivors(&self) -> Result<SurvivorMigration> {
        const STEP: Step = Step::SetSurvivors;
        let _guard = self.claim(STEP)?;
        let record = self.precheck(STEP).await?;

        let target = record.new_milestone.ok_or(MissingData::NoNewMilestone)?;
        let config = self.ledger.config();
        let matcher = config.done_board_matcher();
        let survivors: Vec<BoardIssue> = self
            .snapshots
            .board_issues()
            .await
            .into_iter()
            .filter(|issue| !matcher.is_done(&issue.board))
            .collect();
        let command = survivor_command(&target.display_name, &config.survivor_label);

        if survivors.is_empty() {
            info!(step = %STEP, "No survivors to move");
        } else {
            let report = self
                .bulk_actions
                .select_and_queue(&survivors, &command)
                .await
                .map_err(|source| collaborator_failed(STEP, source))?;
            debug!(step = %STEP, queued = report.queued, "Bulk action completed");
        }

        let moved = survivors.len();
        self.ledger
            .transact(|state| {
                gating::ensure(STEP, &state.record)?;
                state.record.raise(CycleFlag::SurvivorsSet);
                info!(step = %STEP, survivors = moved, milestone = %target.display_name, "Survivors moved");
                Ok(())
            })
            .await?;

        Ok(SurvivorMigration { survivors, command })
    }

    /// Step 7: close the finished milestone and start the next cycle.
    ///
    /// The live record is replaced by a fresh one named after the new
    /// milestone, with every flag false. The history entry archived in step
    /// 2 is left as it was.
    ///
    /// # Errors
    ///
    /// - `Error::StepInFlight` if the step is already running
    /// - `Error::Precondition` unless survivors have been moved
    /// - `MissingData` if the milestone to close or the new milestone is
    ///   unknown
    /// - `Error::Collaborator` if the milestone service fails
    pub async fn close_old_milestone(&self) -> Result<CycleWrap> {
        const STEP: Step = Step::CloseOldMilestone;
        let _guard = self.claim(STEP)?;
        let record = self.precheck(STEP).await?;

        let to_close = record
            .milestone_to_close
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(MissingData::NoMilestoneToClose)?
            .to_string();
        if record.new_milestone.is_none() {
            return Err(MissingData::NoNewMilestone.into());
        }

        let closed = self
            .milestones
            .close(&to_close)
            .await
            .map_err(|source| collaborator_failed(STEP, source))?;

        self.ledger
            .transact(|state| {
                gating::ensure(STEP, &state.record)?;
                let next_name = state
                    .record
                    .new_milestone
                    .as_ref()
                    .map(|m| m.display_name.clone())
                    .ok_or(MissingData::NoNewMilestone)?;

                state.record.old_milestone_info = Some(OldMilestoneInfo {
                    title: closed.title.clone(),
                    web_url: closed.web_url.clone(),
                    closed_at: closed.closed_at,
                });
                state.record.raise(CycleFlag::OldMilestoneClosed);

                let completed =
                    std::mem::replace(&mut state.record, CycleRecord::fresh(Some(next_name)));
                info!(
                    step = %STEP,
                    closed = %to_close,
                    next = ?state.record.milestone_name,
                    "Cycle wrapped"
                );
                Ok(CycleWrap {
                    completed,
                    next: state.record.clone(),
                })
            })
            .await
    }

    fn claim(&self, step: Step) -> Result<InFlightGuard> {
        self.in_flight.try_claim(step).ok_or_else(|| {
            debug!(step = %step, "Rejected re-entrant trigger");
            Error::StepInFlight(step)
        })
    }

    async fn precheck(&self, step: Step) -> Result<CycleRecord> {
        let record = self.ledger.current().await;
        if let Err(e) = gating::ensure(step, &record) {
            debug!(step = %step, error = %e, "Precondition not met");
            return Err(e);
        }
        Ok(record)
    }
}

/// Quick-action text that moves an issue into `milestone` and labels it.
pub fn survivor_command(milestone: &str, label: &str) -> String {
    format!("/milestone %\"{milestone}\"\n/label ~\"{label}\"")
}

fn collaborator_failed(step: Step, source: CollaboratorError) -> Error {
    warn!(step = %step, error = %source, "Collaborator call failed");
    Error::Collaborator { step, source }
}
