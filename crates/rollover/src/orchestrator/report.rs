//! Read-only views produced by the workflow: step status, the metric
//! summary (step 3) and the closed ticket groups (step 4).

use crate::domain::{ClosedTicket, CycleRecord, Step};
use serde::Serialize;
use std::fmt::Write as _;

/// Whether a step can be triggered right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// The step's flag is already set
    Done,
    /// The precondition holds
    Available,
    /// The precondition does not hold
    Locked,
    /// The step is executing
    InFlight,
}

/// One row of [`step_states`](super::CycleOrchestrator::step_states).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepState {
    /// The step
    pub step: Step,
    /// Its current status
    pub status: StepStatus,
}

/// Per-contributor line of a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorLine {
    /// Contributor name
    pub name: String,
    /// Tickets closed
    pub closed_tickets: u32,
    /// Tickets assigned
    pub total_tickets: u32,
    /// Hours closed
    pub closed_hours: f64,
    /// Hours assigned
    pub total_hours: f64,
}

/// Metric summary of the cycle being closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    /// The sprint milestone
    pub milestone: Option<String>,
    /// Tickets closed
    pub closed_tickets: u32,
    /// Tickets on the board
    pub total_tickets: u32,
    /// Hours closed
    pub closed_hours: f64,
    /// Hours on the board
    pub total_hours: f64,
    /// Hours that left the board after the cycle ended
    pub extra_hours_closed: f64,
    /// Contributors, sorted by name
    pub contributors: Vec<ContributorLine>,
}

impl CycleSummary {
    /// Summarize a record.
    pub fn from_record(record: &CycleRecord) -> Self {
        // BTreeMap iteration is already sorted by name
        let contributors = record
            .user_performance
            .iter()
            .map(|(name, perf)| ContributorLine {
                name: name.clone(),
                closed_tickets: perf.closed_tickets,
                total_tickets: perf.total_tickets,
                closed_hours: perf.closed_hours,
                total_hours: perf.total_hours,
            })
            .collect();

        Self {
            milestone: record.milestone_name.clone(),
            closed_tickets: record.closed_tickets,
            total_tickets: record.total_tickets,
            closed_hours: record.closed_hours,
            total_hours: record.total_hours,
            extra_hours_closed: record.extra_hours_closed,
            contributors,
        }
    }

    /// Plain-text rendering suitable for pasting into a chat or a wiki.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Sprint {}",
            self.milestone.as_deref().unwrap_or("(unnamed)")
        );
        let _ = writeln!(
            out,
            "Tickets closed: {}/{}",
            self.closed_tickets, self.total_tickets
        );
        let _ = writeln!(
            out,
            "Hours closed: {}/{}",
            hours(self.closed_hours),
            hours(self.total_hours)
        );
        let _ = writeln!(out, "Extra hours closed: {}", hours(self.extra_hours_closed));

        if !self.contributors.is_empty() {
            out.push('\n');
            for line in &self.contributors {
                let _ = writeln!(
                    out,
                    "{}: {}/{} tickets, {}/{} hours",
                    line.name,
                    line.closed_tickets,
                    line.total_tickets,
                    hours(line.closed_hours),
                    hours(line.total_hours)
                );
            }
        }
        out
    }
}

/// Closed tickets split by whether they still need a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketGroups {
    /// Tickets without a needs-merge label, in board order
    pub regular: Vec<ClosedTicket>,
    /// Tickets with a needs-merge label, in board order
    pub needs_merge: Vec<ClosedTicket>,
}

impl TicketGroups {
    /// Partition the record's closed tickets.
    pub fn from_record(record: &CycleRecord) -> Self {
        let (needs_merge, regular) = record
            .closed_tickets_list
            .iter()
            .cloned()
            .partition(|t| t.has_needs_merge_label);
        Self {
            regular,
            needs_merge,
        }
    }

    /// `#id title` per line under two headings. Empty groups are omitted.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (heading, tickets) in [("Closed", &self.regular), ("Needs merge", &self.needs_merge)] {
            if tickets.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            let _ = writeln!(out, "{heading}:");
            for ticket in tickets {
                let _ = writeln!(out, "#{} {}", ticket.id, ticket.title);
            }
        }
        out
    }
}

fn hours(value: f64) -> String {
    let text = format!("{value:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}
