//! Lines a resilient read could not use.
//!
//! A history log that was hand-edited or cut short by a crash should still
//! load. Each unusable line becomes a [`Warning`] and the read carries on.
//!
//! ```
//! use rollover_jsonl::Warning;
//!
//! let warning = Warning::WrongShape {
//!     line_number: 3,
//!     error: "missing field `closedTickets`".to_string(),
//! };
//! assert_eq!(warning.line_number(), 3);
//! assert_eq!(warning.to_string(), "line 3: not a valid record: missing field `closedTickets`");
//! ```

use thiserror::Error;

/// A skipped line, with the 1-based line number it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// The line is not JSON at all.
    #[error("line {line_number}: malformed JSON: {error}")]
    MalformedJson {
        /// Where the line sits in the file
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// The line is JSON but does not decode into the record type.
    #[error("line {line_number}: not a valid record: {error}")]
    WrongShape {
        /// Where the line sits in the file
        line_number: usize,
        /// Decoder message
        error: String,
    },
}

impl Warning {
    /// The 1-based line number of the skipped line.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::WrongShape { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Short tag for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::WrongShape { .. } => "wrong_shape",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_line() {
        let warning = Warning::MalformedJson {
            line_number: 42,
            error: "EOF while parsing an object".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "line 42: malformed JSON: EOF while parsing an object"
        );
        assert_eq!(warning.kind(), "malformed_json");
    }
}
