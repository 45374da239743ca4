//! Contracts for the external systems a cycle talks to.
//!
//! The orchestrator never scrapes a board or calls a milestone API itself.
//! It asks a [`SnapshotProvider`] for numbers and delegates side effects to
//! a [`MilestoneCollaborator`] and a [`BulkActionCollaborator`]. Every call
//! is awaited directly: a step finishes only once its collaborator call has
//! resolved.

use crate::domain::{BoardIssue, BoardSnapshot};
use crate::error::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Reads the current board state.
///
/// Implementations degrade to zeros and empty collections when the board is
/// not fully loaded; they never fail.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Point-in-time metrics for the board.
    async fn capture(&self) -> BoardSnapshot;

    /// Every issue on the board together with the list it sits on.
    async fn board_issues(&self) -> Vec<BoardIssue>;
}

/// What the milestone service returned for a created milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMilestone {
    /// Identifier assigned by the service
    pub external_id: String,
    /// Title as the service stored it
    pub display_name: String,
    /// Web URL of the milestone
    pub web_url: String,
}

/// What the milestone service returned for a closed milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedMilestone {
    /// Title of the closed milestone
    pub title: String,
    /// Web URL of the milestone
    pub web_url: String,
    /// When the service recorded the close
    pub closed_at: DateTime<Utc>,
}

/// Creates and closes sprint milestones.
#[async_trait]
pub trait MilestoneCollaborator: Send + Sync {
    /// Create a milestone spanning `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the service rejects the request or
    /// cannot be reached.
    async fn create(
        &self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CreatedMilestone, CollaboratorError>;

    /// Close the milestone with the given title.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the milestone cannot be found or the
    /// service cannot be reached.
    async fn close(&self, title: &str) -> Result<ClosedMilestone, CollaboratorError>;
}

/// Outcome of a bulk action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionReport {
    /// Issues the command was applied to
    pub queued: usize,
}

/// Applies a quick-action command to many issues at once.
#[async_trait]
pub trait BulkActionCollaborator: Send + Sync {
    /// Select `issues` and apply `command` to them. Resolves once the whole
    /// batch has been processed.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the batch could not be applied.
    async fn select_and_queue(
        &self,
        issues: &[BoardIssue],
        command: &str,
    ) -> Result<BulkActionReport, CollaboratorError>;
}
