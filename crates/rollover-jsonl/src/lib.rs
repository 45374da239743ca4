//! JSON and JSON Lines persistence primitives.
//!
//! Provides the two on-disk shapes the rollover ledger needs: a single JSON
//! document (the live cycle record) and a JSON Lines log (the archived
//! history). Writes are atomic via temp-file-then-rename; log reads are
//! resilient and report skipped lines as [`Warning`]s instead of failing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod document;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_json_atomic, write_jsonl_atomic};
pub use document::read_json_document;
pub use error::{Error, Result};
pub use reader::{read_jsonl_resilient, JsonlReader};
pub use warning::Warning;
pub use writer::JsonlWriter;
