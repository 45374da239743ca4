//! Error types for rollover operations.
//!
//! Every failure path returns control to the caller with the cycle record
//! unchanged or only partially advanced; nothing here is fatal to the host.

use crate::domain::{CycleId, Step};
use crate::id_generation::IdGenerationError;
use std::io;
use thiserror::Error;

/// The error type for rollover operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No `.rollover/` directory was found.
    #[error("Not a rollover repository (or any of the parent directories). Run 'rollover init' first.")]
    NotInitialized,

    /// A store write failed. In-memory state may be ahead of persisted state
    /// until the next successful write.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// The step was invoked while its flag precondition is false.
    #[error("Cannot run {step}: {reason}")]
    Precondition {
        /// The rejected step.
        step: Step,
        /// Which flag condition failed.
        reason: &'static str,
    },

    /// The step is already executing.
    #[error("{0} is already in progress")]
    StepInFlight(Step),

    /// Data the step depends on is absent or unusable.
    #[error(transparent)]
    MissingData(#[from] MissingData),

    /// A network collaborator failed. The gating flag was left unset.
    #[error("{step} failed: {source}")]
    Collaborator {
        /// The step whose collaborator call failed.
        step: Step,
        /// The collaborator's failure.
        #[source]
        source: CollaboratorError,
    },

    /// An import blob could not be decoded or lacks required keys.
    #[error("Malformed import: {0}")]
    MalformedImport(String),

    /// A manual metrics edit carried unusable values.
    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    /// No history entry has the given id.
    #[error("History entry not found: {0}")]
    HistoryEntryNotFound(CycleId),

    /// No unused cycle id could be generated.
    #[error(transparent)]
    IdGeneration(#[from] IdGenerationError),
}

/// Missing-data failures: surfaced to the user, no state mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingData {
    /// The board has no current milestone.
    #[error("No milestone detected on the board")]
    NoMilestoneDetected,

    /// The milestone name does not follow `<number> <token> <number>`.
    #[error("Milestone name '{0}' does not match the '<number> <token> <number>' pattern")]
    UnrecognizedMilestoneName(String),

    /// No next milestone has been created for this cycle.
    #[error("No new milestone has been created for this cycle")]
    NoNewMilestone,

    /// The cycle does not know which milestone to close.
    #[error("No milestone recorded to close")]
    NoMilestoneToClose,
}

/// Failure reported by a milestone or bulk-action collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    /// Human-readable failure description.
    pub message: String,
}

impl CollaboratorError {
    /// Create a collaborator error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<rollover_jsonl::Error> for Error {
    fn from(e: rollover_jsonl::Error) -> Self {
        match e {
            rollover_jsonl::Error::Io(io_err) => Error::Io(io_err),
            rollover_jsonl::Error::Json(json_err) => Error::Json(json_err),
        }
    }
}

/// A specialized Result type for rollover operations.
pub type Result<T> = std::result::Result<T, Error>;
