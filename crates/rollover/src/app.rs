//! Application context for CLI command execution.
//!
//! Locates the `.rollover/` directory, loads its configuration and opens a
//! [`CycleLedger`] over the file-backed stores.
//!
//! # Example
//!
//! ```no_run
//! use rollover::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     println!("{:?}", app.ledger().current().await.milestone_name);
//!     Ok(())
//! }
//! ```

use crate::clock::{Clock, SystemClock};
use crate::commands::init::{
    find_rollover_root, CONFIG_FILE_NAME, CYCLE_FILE_NAME, HISTORY_FILE_NAME, ROLLOVER_DIR_NAME,
};
use crate::config::RolloverConfig;
use crate::error::{Error, Result};
use crate::ledger::CycleLedger;
use crate::store::{create_stores, StoreBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context for CLI operations.
pub struct App {
    ledger: CycleLedger,
    rollover_dir: PathBuf,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("rollover_dir", &self.rollover_dir)
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree for `.rollover/`.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found, the configuration is
    /// invalid, or the stored records cannot be read.
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        Self::from_directory_with_clock(working_dir, Arc::new(SystemClock)).await
    }

    /// Like [`from_directory`](Self::from_directory) with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`from_directory`](Self::from_directory).
    pub async fn from_directory_with_clock(
        working_dir: &Path,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let root_dir = find_rollover_root(working_dir).ok_or(Error::NotInitialized)?;
        let rollover_dir = root_dir.join(ROLLOVER_DIR_NAME);

        let config = RolloverConfig::load(&rollover_dir.join(CONFIG_FILE_NAME)).await?;
        let stores = create_stores(StoreBackend::Files {
            cycle_path: rollover_dir.join(CYCLE_FILE_NAME),
            history_path: rollover_dir.join(HISTORY_FILE_NAME),
        });
        let ledger = CycleLedger::open(stores, config, clock).await?;

        Ok(Self {
            ledger,
            rollover_dir,
        })
    }

    /// The ledger over this repository's records.
    pub fn ledger(&self) -> &CycleLedger {
        &self.ledger
    }

    /// Get the path to the rollover directory.
    pub fn rollover_dir(&self) -> &Path {
        &self.rollover_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::TempDir;

    #[tokio::test]
    async fn app_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("14 KW 23")).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert!(app.rollover_dir().ends_with(".rollover"));
        assert_eq!(
            app.ledger().current().await.milestone_name.as_deref(),
            Some("14 KW 23")
        );
        assert!(app.ledger().history().await.is_empty());
    }

    #[tokio::test]
    async fn app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None).await.unwrap();
        let sub_dir = temp_dir.path().join("src").join("lib");
        std::fs::create_dir_all(&sub_dir).unwrap();

        assert!(App::from_directory(&sub_dir).await.is_ok());
    }

    #[tokio::test]
    async fn app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Not a rollover repository"));
    }
}
