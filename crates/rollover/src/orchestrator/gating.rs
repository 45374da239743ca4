//! Flag preconditions for each step.
//!
//! | Step | Runs when |
//! |---|---|
//! | 1 end cycle | `!ended` |
//! | 2 prepare next | `ended && !preparedForNext` |
//! | 3, 4 copy summary / names | `preparedForNext && !newMilestoneCreated` |
//! | 5 create milestone | `preparedForNext && !newMilestoneCreated` |
//! | 6 set survivors | `newMilestoneCreated && !survivorsSet` |
//! | 7 close old milestone | `survivorsSet && !oldMilestoneClosed` |
//!
//! Data requirements (a detected milestone, a parsable name, a created
//! milestone) are checked by the steps themselves and reported as
//! [`MissingData`](crate::error::MissingData).

use super::report::StepStatus;
use crate::domain::{CycleFlag, CycleRecord, Step};
use crate::error::{Error, Result};

/// Reject the step unless its flag precondition holds.
///
/// # Errors
///
/// Returns `Error::Precondition` naming the failed condition.
pub fn ensure(step: Step, record: &CycleRecord) -> Result<()> {
    match blocker(step, record) {
        Some(reason) => Err(Error::Precondition { step, reason }),
        None => Ok(()),
    }
}

/// Whether the flag precondition of `step` holds.
pub fn is_runnable(step: Step, record: &CycleRecord) -> bool {
    blocker(step, record).is_none()
}

/// Display status of a step for the given record.
///
/// Step 7 shows as locked while the record lacks the milestone it would
/// close or the one it would start, even if its flags allow it to run.
pub fn status(step: Step, record: &CycleRecord, in_flight: bool) -> StepStatus {
    if in_flight {
        StepStatus::InFlight
    } else if completion_flag(step).is_some_and(|flag| record.is_set(flag)) {
        StepStatus::Done
    } else if is_runnable(step, record) && has_required_data(step, record) {
        StepStatus::Available
    } else {
        StepStatus::Locked
    }
}

/// The flag a step raises on success. Copy steps raise nothing.
pub fn completion_flag(step: Step) -> Option<CycleFlag> {
    match step {
        Step::EndCycle => Some(CycleFlag::Ended),
        Step::PrepareNext => Some(CycleFlag::PreparedForNext),
        Step::CopySummary | Step::CopyClosedNames => None,
        Step::CreateMilestone => Some(CycleFlag::NewMilestoneCreated),
        Step::SetSurvivors => Some(CycleFlag::SurvivorsSet),
        Step::CloseOldMilestone => Some(CycleFlag::OldMilestoneClosed),
    }
}

fn has_required_data(step: Step, r: &CycleRecord) -> bool {
    match step {
        Step::CloseOldMilestone => r.new_milestone.is_some() && r.milestone_to_close.is_some(),
        _ => true,
    }
}

fn blocker(step: Step, r: &CycleRecord) -> Option<&'static str> {
    match step {
        Step::EndCycle if r.ended => Some("the cycle has already been ended"),
        Step::PrepareNext if !r.ended => Some("the cycle has not been ended yet"),
        Step::PrepareNext if r.prepared_for_next => {
            Some("the cycle has already been prepared for the next sprint")
        }
        Step::CopySummary | Step::CopyClosedNames | Step::CreateMilestone
            if !r.prepared_for_next =>
        {
            Some("the cycle has not been prepared for the next sprint")
        }
        Step::CopySummary | Step::CopyClosedNames | Step::CreateMilestone
            if r.new_milestone_created =>
        {
            Some("the next milestone has already been created")
        }
        Step::SetSurvivors if !r.new_milestone_created => {
            Some("the next milestone has not been created")
        }
        Step::SetSurvivors if r.survivors_set => Some("survivors have already been moved"),
        Step::CloseOldMilestone if !r.survivors_set => Some("survivors have not been moved yet"),
        Step::CloseOldMilestone if r.old_milestone_closed => {
            Some("the old milestone has already been closed")
        }
        _ => None,
    }
}
