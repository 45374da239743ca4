//! Command execution logic.

use anyhow::{Context, Result};

use super::args::{EditArgs, ExportArgs, ForgetArgs, HistoryArgs, ImportArgs, InitArgs, ShowArgs};
use crate::app::App;
use crate::domain::{CycleId, MetricsEdit, Step};
use crate::interchange::ImportStrategy;
use crate::orchestrator::{gating, StepState};
use crate::output::{self, OutputConfig, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.milestone.as_deref()).await?;

    if !args.quiet {
        println!("Initialized rollover in {}", result.rollover_dir.display());
        println!("  Config:  {}", result.config_file.display());
        println!("  Cycle:   {}", result.cycle_file.display());
        println!("  History: {}", result.history_file.display());
        if let Some(milestone) = &result.milestone {
            println!("  Milestone: {milestone}");
        }
    }

    Ok(())
}

/// Execute the status command
pub async fn execute_status(app: &App, output_mode: OutputMode) -> Result<()> {
    let record = app.ledger().current().await;
    // Nothing runs in this process, so no step is in flight.
    let steps: Vec<StepState> = Step::ALL
        .iter()
        .map(|&step| StepState {
            step,
            status: gating::status(step, &record, false),
        })
        .collect();
    output::print_status(&record, &steps, output_mode)?;
    Ok(())
}

/// Execute the history command
pub async fn execute_history(app: &App, args: &HistoryArgs, output_mode: OutputMode) -> Result<()> {
    let mut entries = app.ledger().history_by_recency().await;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    output::print_history(&entries, output_mode)?;
    Ok(())
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let id = CycleId::new(args.cycle_id.trim());
    let entry = app
        .ledger()
        .history_entry(&id)
        .await
        .ok_or_else(|| crate::error::Error::HistoryEntryNotFound(id.clone()))?;
    output::print_history_entry(&entry, output_mode)?;
    Ok(())
}

/// Execute the summary command (step 3)
pub async fn execute_summary(app: &App, output_mode: OutputMode) -> Result<()> {
    let summary = app.ledger().copy_summary().await?;
    match output_mode {
        OutputMode::Json => output::print_json(&summary)?,
        OutputMode::Text => print!("{}", summary.render()),
    }
    Ok(())
}

/// Execute the closed-names command (step 4)
pub async fn execute_closed_names(app: &App, output_mode: OutputMode) -> Result<()> {
    let groups = app.ledger().copy_closed_names().await?;
    match output_mode {
        OutputMode::Json => output::print_json(&groups)?,
        OutputMode::Text => print!("{}", groups.render()),
    }
    Ok(())
}

/// Execute the edit command
pub async fn execute_edit(app: &App, args: &EditArgs, output_mode: OutputMode) -> Result<()> {
    let record = app.ledger().edit_cycle_data(MetricsEdit::from(args)).await?;
    if output_mode == OutputMode::Text {
        println!("{}", output::success("Cycle metrics updated", &OutputConfig::from_env()));
    }
    output::print_record(&record, output_mode)?;
    Ok(())
}

/// Execute the reset command
pub async fn execute_reset(app: &App, output_mode: OutputMode) -> Result<()> {
    let record = app.ledger().reset_cycle().await?;
    if output_mode == OutputMode::Text {
        println!("{}", output::warning("Cycle reset", &OutputConfig::from_env()));
    }
    output::print_record(&record, output_mode)?;
    Ok(())
}

/// Execute the forget command
pub async fn execute_forget(app: &App, args: &ForgetArgs, output_mode: OutputMode) -> Result<()> {
    let id = CycleId::new(args.cycle_id.trim());
    let removed = app.ledger().delete_history_entry(&id).await?;
    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "cycleId": id,
            "removed": removed,
        }))?,
        OutputMode::Text => {
            let noun = if removed == 1 { "entry" } else { "entries" };
            println!("Removed {removed} history {noun} for {id}");
        }
    }
    Ok(())
}

/// Execute the export command
pub async fn execute_export(app: &App, args: &ExportArgs, output_mode: OutputMode) -> Result<()> {
    let blob = app.ledger().export().await?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, format!("{blob}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({
                    "path": path.display().to_string(),
                    "bytes": blob.len(),
                }))?,
                OutputMode::Text => println!("Exported to {}", path.display()),
            }
        }
        None => match output_mode {
            OutputMode::Json => output::print_json(&serde_json::json!({ "blob": blob }))?,
            OutputMode::Text => println!("{blob}"),
        },
    }
    Ok(())
}

/// Execute the import command
pub async fn execute_import(app: &App, args: &ImportArgs, output_mode: OutputMode) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let strategy = ImportStrategy::from(args.strategy);
    let report = app.ledger().import(&text, strategy).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!(
                "{} ({strategy}), {} history entries",
                output::success("Import complete", &config),
                report.history_len
            );
            if let Some(merge) = report.merge {
                println!(
                    "  updated {}, appended {}, dropped {}",
                    merge.updated, merge.appended, merge.evicted
                );
            }
        }
    }
    Ok(())
}
