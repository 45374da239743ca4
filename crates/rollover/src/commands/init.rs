//! Implementation of the `init` command.
//!
//! Creates the `.rollover/` directory with a default configuration, a fresh
//! cycle record and an empty history log.

use crate::config::RolloverConfig;
use crate::domain::CycleRecord;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the rollover directory
pub const ROLLOVER_DIR_NAME: &str = ".rollover";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the cycle record file
pub const CYCLE_FILE_NAME: &str = "cycle.json";

/// Name of the history log file
pub const HISTORY_FILE_NAME: &str = "history.jsonl";

/// Name of the gitignore file within .rollover
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the rollover root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created rollover directory
    pub rollover_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created cycle record
    pub cycle_file: PathBuf,
    /// Path to the created history log
    pub history_file: PathBuf,
    /// Milestone the first cycle starts from, if given
    pub milestone: Option<String>,
}

/// Initialize a new rollover repository in the given directory.
///
/// # Arguments
///
/// * `base_dir` - The directory where `.rollover/` will be created
/// * `milestone` - Optional name of the sprint milestone currently running
///
/// # Errors
///
/// Returns an error if `.rollover/` already exists or a file operation
/// fails.
pub async fn init(base_dir: &Path, milestone: Option<&str>) -> Result<InitResult> {
    let milestone = milestone
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let rollover_dir = base_dir.join(ROLLOVER_DIR_NAME);
    if fs::try_exists(&rollover_dir).await? {
        return Err(Error::Config(format!(
            "Rollover is already initialized in this directory. Found existing '{ROLLOVER_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&rollover_dir).await?;

    let config_file = rollover_dir.join(CONFIG_FILE_NAME);
    RolloverConfig::default().save(&config_file).await?;

    let cycle_file = rollover_dir.join(CYCLE_FILE_NAME);
    rollover_jsonl::write_json_atomic(&cycle_file, &CycleRecord::fresh(milestone.clone()))
        .await?;

    let history_file = rollover_dir.join(HISTORY_FILE_NAME);
    fs::write(&history_file, "").await?;

    let gitignore_content = "\
# Rollover temp files left behind by an interrupted write
*.tmp
";
    fs::write(rollover_dir.join(GITIGNORE_FILE_NAME), gitignore_content).await?;

    tracing::info!(dir = %rollover_dir.display(), milestone = ?milestone, "Initialized rollover repository");

    Ok(InitResult {
        rollover_dir,
        config_file,
        cycle_file,
        history_file,
        milestone,
    })
}

/// Check if a directory has been initialized with rollover.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(ROLLOVER_DIR_NAME).is_dir()
}

/// Find the rollover root directory by searching up the directory tree.
///
/// Returns the directory containing `.rollover/`, or `None` if none is found
/// before the filesystem root or the depth limit.
pub fn find_rollover_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if is_initialized(&current) {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_directory_structure() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).await.unwrap();

        assert!(result.rollover_dir.is_dir());
        assert!(result.config_file.exists());
        assert!(result.cycle_file.exists());
        assert!(result.history_file.exists());
        assert!(result.rollover_dir.join(GITIGNORE_FILE_NAME).exists());
    }

    #[rstest]
    #[case::named(Some("14 KW 23"), Some("14 KW 23"))]
    #[case::trimmed(Some("  3 KW 9 "), Some("3 KW 9"))]
    #[case::blank(Some("   "), None)]
    #[case::absent(None, None)]
    #[tokio::test]
    async fn init_seeds_cycle_record(
        #[case] milestone: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), milestone).await.unwrap();

        let record: CycleRecord = rollover_jsonl::read_json_document(&result.cycle_file)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.milestone_name.as_deref(), expected);
        assert!(!record.ended);
    }

    #[tokio::test]
    async fn init_writes_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), None).await.unwrap();

        let config = RolloverConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config, RolloverConfig::default());
    }

    #[tokio::test]
    async fn init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();

        let err = init(temp_dir.path(), None).await.unwrap_err();
        assert!(err.to_string().to_lowercase().contains("already initialized"));
    }

    #[test]
    fn find_root_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(ROLLOVER_DIR_NAME)).unwrap();
        let sub_dir = temp_dir.path().join("sub").join("nested");
        std::fs::create_dir_all(&sub_dir).unwrap();

        assert_eq!(
            find_rollover_root(&sub_dir),
            Some(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn find_root_not_found() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_rollover_root(temp_dir.path()).is_none());
        assert!(!is_initialized(temp_dir.path()));
    }
}
