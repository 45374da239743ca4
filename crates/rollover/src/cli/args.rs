//! CLI argument structs for all commands.

use crate::domain::MetricsEdit;
use crate::interchange::ImportStrategy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Name of the sprint milestone currently running (e.g. "14 KW 23")
    #[arg(short, long)]
    pub milestone: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `history` command
#[derive(Parser, Debug, Clone)]
pub struct HistoryArgs {
    /// Maximum number of entries to display, newest first
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Cycle id of the history entry
    pub cycle_id: String,
}

/// Arguments for the `edit` command
///
/// Every field is required: the edit overwrites all five metrics at once.
#[derive(Parser, Debug, Clone)]
pub struct EditArgs {
    /// Tickets on the board
    #[arg(long)]
    pub total_tickets: u32,

    /// Tickets closed
    #[arg(long)]
    pub closed_tickets: u32,

    /// Estimated hours on the board
    #[arg(long)]
    pub total_hours: f64,

    /// Estimated hours closed
    #[arg(long)]
    pub closed_hours: f64,

    /// Hours that left the board after the cycle ended
    #[arg(long, default_value = "0")]
    pub extra_hours_closed: f64,
}

impl From<&EditArgs> for MetricsEdit {
    fn from(args: &EditArgs) -> Self {
        Self {
            total_tickets: args.total_tickets,
            closed_tickets: args.closed_tickets,
            total_hours: args.total_hours,
            closed_hours: args.closed_hours,
            extra_hours_closed: args.extra_hours_closed,
        }
    }
}

/// Arguments for the `forget` command
#[derive(Parser, Debug, Clone)]
pub struct ForgetArgs {
    /// Cycle id whose history entries are removed
    pub cycle_id: String,
}

/// Arguments for the `export` command
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Write the blob to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Import strategy as a CLI value
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    /// Union history by id; keep the live cycle
    Merge,
    /// Overwrite the live cycle and the history
    Replace,
}

impl From<StrategyArg> for ImportStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Merge => ImportStrategy::Merge,
            StrategyArg::Replace => ImportStrategy::Replace,
        }
    }
}

/// Arguments for the `import` command
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// File containing an export blob
    pub file: PathBuf,

    /// How to reconcile the imported state with local state
    #[arg(short, long, value_enum)]
    pub strategy: StrategyArg,
}
