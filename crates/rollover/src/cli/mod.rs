//! CLI argument parsing and command dispatch.
//!
//! The CLI works on the local `.rollover/` records only. Steps that talk to
//! the board or the milestone service are driven through the library API;
//! here you can inspect, repair and move the records.
//!
//! # Commands
//!
//! - `init`: Initialize a new rollover repository
//! - `status`: Show the live cycle and which steps can run
//! - `history`: List archived cycles, newest first
//! - `show`: Show one archived cycle
//! - `summary` / `closed-names`: Print the step 3 and step 4 views
//! - `edit`: Overwrite the cycle metrics
//! - `reset`: Abort the cycle in progress
//! - `forget`: Remove an archived cycle
//! - `export` / `import`: Move the records between machines
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! rollover init --milestone "14 KW 23"
//! rollover status
//! rollover export --output backup.txt
//! rollover import backup.txt --strategy merge
//! ```

mod args;
mod execute;

use crate::app::App;
use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    EditArgs, ExportArgs, ForgetArgs, HistoryArgs, ImportArgs, InitArgs, ShowArgs, StrategyArg,
};

/// Rollover - sprint lifecycle bookkeeping for a kanban board
///
/// Keeps the live cycle record in `.rollover/cycle.json` and the archive of
/// finished cycles in `.rollover/history.jsonl`.
#[derive(Parser, Debug)]
#[command(name = "rollover")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new rollover repository
    ///
    /// Creates the `.rollover/` directory with a default configuration, a
    /// fresh cycle record and an empty history.
    Init(InitArgs),

    /// Show the live cycle record and the status of every step
    Status,

    /// List archived cycles, newest first
    History(HistoryArgs),

    /// Show an archived cycle in full
    Show(ShowArgs),

    /// Print the metric summary of the cycle being closed
    Summary,

    /// Print the closed ticket names, split by needs-merge
    ClosedNames,

    /// Overwrite the five metric fields of the live cycle
    ///
    /// Flags implied by the new values are raised; flags are never lowered.
    /// An archived copy of the cycle receives the same values.
    Edit(EditArgs),

    /// Abort the cycle in progress
    ///
    /// Removes any archived copy of the cycle and starts over with the same
    /// milestone name.
    Reset,

    /// Remove every archived entry with the given cycle id
    Forget(ForgetArgs),

    /// Write the cycle and history as a compressed, base64-encoded blob
    Export(ExportArgs),

    /// Read an export blob and merge it into, or replace, local state
    Import(ImportArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for unknown commands or invalid values.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error from locating the repository or running the command.
    pub async fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(Commands::Status) => execute::execute_status(&open_app().await?, output_mode).await,
            Some(Commands::History(args)) => {
                execute::execute_history(&open_app().await?, args, output_mode).await
            }
            Some(Commands::Show(args)) => {
                execute::execute_show(&open_app().await?, args, output_mode).await
            }
            Some(Commands::Summary) => {
                execute::execute_summary(&open_app().await?, output_mode).await
            }
            Some(Commands::ClosedNames) => {
                execute::execute_closed_names(&open_app().await?, output_mode).await
            }
            Some(Commands::Edit(args)) => {
                execute::execute_edit(&open_app().await?, args, output_mode).await
            }
            Some(Commands::Reset) => execute::execute_reset(&open_app().await?, output_mode).await,
            Some(Commands::Forget(args)) => {
                execute::execute_forget(&open_app().await?, args, output_mode).await
            }
            Some(Commands::Export(args)) => {
                execute::execute_export(&open_app().await?, args, output_mode).await
            }
            Some(Commands::Import(args)) => {
                execute::execute_import(&open_app().await?, args, output_mode).await
            }
            None => {
                println!("Rollover sprint lifecycle tool");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

async fn open_app() -> Result<App> {
    Ok(App::from_directory(&std::env::current_dir()?).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_no_command() {
        let cli = Cli::try_parse_from(["rollover"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn parse_global_json_flag() {
        let cli = Cli::try_parse_from(["rollover", "status", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::Status)));
    }

    #[test]
    fn parse_init_with_milestone() {
        let cli = Cli::try_parse_from(["rollover", "init", "-m", "14 KW 23", "-q"]).unwrap();
        match cli.command {
            Some(Commands::Init(args)) => {
                assert_eq!(args.milestone.as_deref(), Some("14 KW 23"));
                assert!(args.quiet);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn parse_history_limit() {
        let cli = Cli::try_parse_from(["rollover", "history", "--limit", "3"]).unwrap();
        match cli.command {
            Some(Commands::History(args)) => assert_eq!(args.limit, Some(3)),
            _ => panic!("Expected History command"),
        }
    }

    #[test]
    fn parse_edit_requires_metrics() {
        assert!(Cli::try_parse_from(["rollover", "edit", "--total-tickets", "5"]).is_err());

        let cli = Cli::try_parse_from([
            "rollover",
            "edit",
            "--total-tickets",
            "5",
            "--closed-tickets",
            "3",
            "--total-hours",
            "20",
            "--closed-hours",
            "12.5",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Edit(args)) => {
                assert_eq!(args.total_tickets, 5);
                assert!((args.closed_hours - 12.5).abs() < f64::EPSILON);
                assert!(args.extra_hours_closed.abs() < f64::EPSILON);
            }
            _ => panic!("Expected Edit command"),
        }
    }

    #[rstest]
    #[case::merge("merge", StrategyArg::Merge)]
    #[case::replace("replace", StrategyArg::Replace)]
    fn parse_import_strategy(#[case] value: &str, #[case] expected: StrategyArg) {
        let cli =
            Cli::try_parse_from(["rollover", "import", "blob.txt", "--strategy", value]).unwrap();
        match cli.command {
            Some(Commands::Import(args)) => {
                assert_eq!(args.strategy, expected);
                assert_eq!(args.file.to_str(), Some("blob.txt"));
            }
            _ => panic!("Expected Import command"),
        }
    }

    #[test]
    fn parse_import_requires_strategy() {
        assert!(Cli::try_parse_from(["rollover", "import", "blob.txt"]).is_err());
    }

    #[test]
    fn parse_closed_names_is_kebab_case() {
        let cli = Cli::try_parse_from(["rollover", "closed-names"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::ClosedNames)));
    }
}
