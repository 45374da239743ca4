//! Repository-level commands that run without a ledger.

pub mod init;
