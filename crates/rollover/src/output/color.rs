//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Done:  green   (completed steps, set flags)
//!   - Warning/Busy:  yellow  (available steps, in-flight steps)
//!   - Error:         red     (failures)
//!   - Info/Reference: cyan   (cycle ids, milestone names)
//!   - Muted:         dimmed  (field labels, locked steps)
//!   - Emphasis:      bold    (section headers)

use crate::orchestrator::StepStatus;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Step status label, colored by status.
pub(crate) fn colorize_step_status(status: StepStatus, config: &OutputConfig) -> String {
    let text = match status {
        StepStatus::Done => "done",
        StepStatus::Available => "available",
        StepStatus::Locked => "locked",
        StepStatus::InFlight => "in flight",
    };
    match status {
        StepStatus::Done => success(text, config),
        StepStatus::Available | StepStatus::InFlight => warning(text, config),
        StepStatus::Locked => dimmed(text, config),
    }
}

/// `yes` for a set flag, `no` otherwise.
pub(crate) fn flag_marker(set: bool, config: &OutputConfig) -> String {
    if set {
        success("yes", config)
    } else {
        dimmed("no", config)
    }
}
