//! Rollover CLI binary.

use anyhow::Result;
use rollover::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the rollover CLI.
///
/// Commands run one after another against local files, so the
/// current-thread runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Example: RUST_LOG=rollover=debug,rollover_jsonl=trace rollover status
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rollover=info,rollover_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting rollover CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Rollover CLI completed successfully");
    Ok(())
}
