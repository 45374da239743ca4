//! Output formatting for CLI commands.
//!
//! Every printer has a text form and a JSON form. Text printers write to any
//! `io::Write` so they can be tested against a buffer.

pub mod color;

use crate::domain::{CycleRecord, HistoryEntry};
use crate::orchestrator::StepState;
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};

use color::{bold, colorize_step_status, dimmed, flag_marker};

/// Configuration for output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `ROLLOVER_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        // https://no-color.org/
        let use_colors = env::var_os("NO_COLOR").is_none()
            && env::var("ROLLOVER_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self { use_colors }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

#[derive(Serialize)]
struct StatusJson<'a> {
    record: &'a CycleRecord,
    steps: &'a [StepState],
}

/// Print the live record together with the status of every step.
pub fn print_status(record: &CycleRecord, steps: &[StepState], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&StatusJson { record, steps }),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_status_text(&mut handle, record, steps, &OutputConfig::from_env())
        }
    }
}

/// Print a single record (after an edit or a reset).
pub fn print_record(record: &CycleRecord, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(record),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_record_text(&mut handle, record, &OutputConfig::from_env())
        }
    }
}

/// Print history entries, one line each.
pub fn print_history(entries: &[HistoryEntry], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&entries),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_history_text(&mut handle, entries, &OutputConfig::from_env())
        }
    }
}

/// Print one history entry in full.
pub fn print_history_entry(entry: &HistoryEntry, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(entry),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let config = OutputConfig::from_env();
            write_record_text(&mut handle, &entry.record, &config)?;
            if let Some(distributions) = &entry.user_distributions {
                writeln!(handle)?;
                writeln!(handle, "{}", bold("Hours by board", &config))?;
                for (user, boards) in distributions {
                    let parts: Vec<String> = boards
                        .iter()
                        .map(|(board, hours)| format!("{board} {hours}"))
                        .collect();
                    writeln!(handle, "  {user}: {}", parts.join(", "))?;
                }
            }
            Ok(())
        }
    }
}

fn write_status_text<W: Write>(
    w: &mut W,
    record: &CycleRecord,
    steps: &[StepState],
    config: &OutputConfig,
) -> io::Result<()> {
    write_record_text(w, record, config)?;
    writeln!(w)?;
    writeln!(w, "{}", bold("Steps", config))?;
    for state in steps {
        writeln!(
            w,
            "  {}. {:<20} {}",
            state.step.number(),
            state.step.label(),
            colorize_step_status(state.status, config)
        )?;
    }
    Ok(())
}

fn write_record_text<W: Write>(
    w: &mut W,
    record: &CycleRecord,
    config: &OutputConfig,
) -> io::Result<()> {
    let id = record.id.as_ref().map_or("-", |id| id.as_str());
    let milestone = record.milestone_name.as_deref().unwrap_or("(none)");

    writeln!(w, "{} {}", bold("Cycle", config), info(id, config))?;
    field(w, "Milestone", &info(milestone, config), config)?;
    if let Some(new) = &record.new_milestone {
        field(
            w,
            "Next",
            &format!(
                "{} ({} .. {})",
                info(&new.display_name, config),
                new.start_date,
                new.end_date
            ),
            config,
        )?;
    }
    field(
        w,
        "Tickets",
        &format!("{}/{} closed", record.closed_tickets, record.total_tickets),
        config,
    )?;
    field(
        w,
        "Hours",
        &format!(
            "{}/{} closed, {} extra",
            record.closed_hours, record.total_hours, record.extra_hours_closed
        ),
        config,
    )?;
    field(
        w,
        "Flags",
        &format!(
            "ended {} | prepared {} | milestone {} | survivors {} | closed {}",
            flag_marker(record.ended, config),
            flag_marker(record.prepared_for_next, config),
            flag_marker(record.new_milestone_created, config),
            flag_marker(record.survivors_set, config),
            flag_marker(record.old_milestone_closed, config),
        ),
        config,
    )?;
    if let Some(timestamp) = record.timestamp {
        field(w, "Ended at", &timestamp.to_rfc3339(), config)?;
    }
    if let Some(completed_at) = record.completed_at {
        field(w, "Archived at", &completed_at.to_rfc3339(), config)?;
    }
    Ok(())
}

fn write_history_text<W: Write>(
    w: &mut W,
    entries: &[HistoryEntry],
    config: &OutputConfig,
) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(w, "No archived cycles.");
    }

    for entry in entries {
        let record = &entry.record;
        let when = entry
            .recency()
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string());
        writeln!(
            w,
            "{} {} {} {}/{} tickets, {}/{} hours",
            info(entry.id().map_or("-", |id| id.as_str()), config),
            dimmed(&when, config),
            record.milestone_name.as_deref().unwrap_or("(none)"),
            record.closed_tickets,
            record.total_tickets,
            record.closed_hours,
            record.total_hours,
        )?;
    }
    Ok(())
}

fn field<W: Write>(w: &mut W, label: &str, value: &str, config: &OutputConfig) -> io::Result<()> {
    writeln!(w, "  {} {value}", dimmed(&format!("{label:<12}"), config))
}
