//! Configuration for a rollover repository.
//!
//! Loaded from `.rollover/config.yaml`. Every key is optional; missing keys
//! take the defaults below.
//!
//! ```yaml
//! history-cap: 10
//! merge-cap: unbounded
//! survivor-label: sprint-survivor
//! done-keywords: [done, closed, complete, finished]
//! sprint-length-days: 7
//! ```

use crate::domain::{DoneBoardMatcher, DEFAULT_DONE_KEYWORDS};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Default number of history entries kept on archival.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// Default label added to surviving issues.
pub const DEFAULT_SURVIVOR_LABEL: &str = "sprint-survivor";

/// Default sprint length in days.
pub const DEFAULT_SPRINT_LENGTH_DAYS: u32 = 7;

/// Whether a merge import re-applies the history cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeCapPolicy {
    /// Keep every merged entry
    #[default]
    Unbounded,
    /// Truncate to `history-cap` after the recency sort
    Apply,
}

/// Repository configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RolloverConfig {
    /// Entries kept by normal archival (oldest inserted evicted first)
    pub history_cap: usize,

    /// Cap handling for merge imports
    pub merge_cap: MergeCapPolicy,

    /// Label applied to surviving issues
    pub survivor_label: String,

    /// Board-name keywords that mark a list as done-like
    pub done_keywords: Vec<String>,

    /// Length of a new milestone window
    pub sprint_length_days: u32,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            merge_cap: MergeCapPolicy::default(),
            survivor_label: DEFAULT_SURVIVOR_LABEL.to_string(),
            done_keywords: DEFAULT_DONE_KEYWORDS.iter().map(ToString::to_string).collect(),
            sprint_length_days: DEFAULT_SPRINT_LENGTH_DAYS,
        }
    }
}

impl RolloverConfig {
    /// Load configuration from a YAML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails [`validate`](Self::validate).
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Reject values the workflow cannot operate with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.history_cap == 0 {
            return Err(Error::Config("history-cap must be at least 1".to_string()));
        }
        if self.sprint_length_days == 0 {
            return Err(Error::Config(
                "sprint-length-days must be at least 1".to_string(),
            ));
        }
        if self.survivor_label.trim().is_empty() {
            return Err(Error::Config("survivor-label cannot be empty".to_string()));
        }
        if self.done_board_matcher().keywords().is_empty() {
            return Err(Error::Config(
                "done-keywords must contain at least one keyword".to_string(),
            ));
        }
        Ok(())
    }

    /// The done-board classifier for this configuration.
    pub fn done_board_matcher(&self) -> DoneBoardMatcher {
        DoneBoardMatcher::new(&self.done_keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: RolloverConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, RolloverConfig::default());
        assert_eq!(config.history_cap, 10);
        assert_eq!(config.merge_cap, MergeCapPolicy::Unbounded);
    }

    #[test]
    fn partial_yaml_overrides_selected_keys() {
        let config: RolloverConfig =
            serde_yaml::from_str("history-cap: 4\nmerge-cap: apply\n").unwrap();
        assert_eq!(config.history_cap, 4);
        assert_eq!(config.merge_cap, MergeCapPolicy::Apply);
        assert_eq!(config.survivor_label, DEFAULT_SURVIVOR_LABEL);
    }

    #[rstest]
    #[case::zero_cap("history-cap: 0", "history-cap")]
    #[case::zero_length("sprint-length-days: 0", "sprint-length-days")]
    #[case::blank_label("survivor-label: '  '", "survivor-label")]
    #[case::no_keywords("done-keywords: []", "done-keywords")]
    fn invalid_values_are_rejected(#[case] yaml: &str, #[case] expected: &str) {
        let config: RolloverConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains(expected), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        let config = RolloverConfig {
            history_cap: 3,
            survivor_label: "carry-over".to_string(),
            ..RolloverConfig::default()
        };

        config.save(&path).await.unwrap();
        let loaded = RolloverConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }
}
