//! Sprint milestone naming and scheduling.
//!
//! Sprint milestones are named `<sprint> <token> <week>`, e.g. `14 KW 23`.
//! The next milestone increments both numbers; the week wraps after 52.

use chrono::{Days, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::error::MissingData;

/// Week numbers wrap from this value back to 1.
pub const WEEKS_PER_YEAR: u32 = 52;

/// A parsed `<number> <token> <number>` milestone name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneName {
    sprint: u32,
    sprint_width: usize,
    token: String,
    week: u32,
}

impl MilestoneName {
    /// Parse a milestone name.
    ///
    /// Surrounding whitespace is ignored and the parts may be separated by
    /// any amount of whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`MissingData::UnrecognizedMilestoneName`] if the name does
    /// not have exactly three parts with numeric first and last parts.
    pub fn parse(name: &str) -> Result<Self, MissingData> {
        let unrecognized = || MissingData::UnrecognizedMilestoneName(name.to_string());

        let parts: Vec<&str> = name.split_whitespace().collect();
        let [sprint, token, week] = parts[..] else {
            return Err(unrecognized());
        };

        let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if !is_number(sprint) || !is_number(week) {
            return Err(unrecognized());
        }

        Ok(Self {
            sprint: sprint.parse().map_err(|_| unrecognized())?,
            sprint_width: sprint.len(),
            token: token.to_string(),
            week: week.parse().map_err(|_| unrecognized())?,
        })
    }

    /// The milestone that follows this one.
    ///
    /// The sprint number increments (keeping any zero padding); the week
    /// increments modulo [`WEEKS_PER_YEAR`], so week 52 is followed by week 1.
    ///
    /// # Errors
    ///
    /// Returns [`MissingData::UnrecognizedMilestoneName`] if the sprint
    /// number would overflow.
    pub fn next(&self) -> Result<Self, MissingData> {
        let sprint = self
            .sprint
            .checked_add(1)
            .ok_or_else(|| MissingData::UnrecognizedMilestoneName(self.to_string()))?;

        Ok(Self {
            sprint,
            sprint_width: self.sprint_width,
            token: self.token.clone(),
            week: (self.week % WEEKS_PER_YEAR) + 1,
        })
    }

    /// The sprint number.
    pub fn sprint(&self) -> u32 {
        self.sprint
    }

    /// The week number.
    pub fn week(&self) -> u32 {
        self.week
    }
}

impl FromStr for MilestoneName {
    type Err = MissingData;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MilestoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:0width$} {} {:02}",
            self.sprint,
            self.token,
            self.week,
            width = self.sprint_width
        )
    }
}

/// The date range of a new sprint milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneWindow {
    /// First day of the sprint
    pub start: NaiveDate,
    /// Due date of the milestone
    pub end: NaiveDate,
}

impl MilestoneWindow {
    /// A window starting on `today` and ending `length_days` later.
    pub fn starting(today: NaiveDate, length_days: u32) -> Self {
        let end = today
            .checked_add_days(Days::new(u64::from(length_days)))
            .unwrap_or(NaiveDate::MAX);
        Self { start: today, end }
    }
}
