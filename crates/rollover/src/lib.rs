//! Rollover - sprint lifecycle orchestration for a kanban issue board.
//!
//! This crate turns a snapshot of board metrics into a resumable sequence of
//! gated steps (end cycle, prepare next, create milestone, migrate survivors,
//! close the old milestone), archives completed cycles into a capped history
//! log, and exports/imports that history with merge or replace
//! reconciliation.
//!
//! The network side effects and the board scraping live behind the traits in
//! [`collaborators`]; the persisted records live behind
//! [`store::RecordStore`].

#![forbid(unsafe_code)]

pub mod archive;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod error;
pub mod id_generation;
pub mod interchange;
pub mod ledger;
pub mod orchestrator;
pub mod store;

// CLI surface (needed by binary)
pub mod app;
pub mod cli;
pub mod commands;
pub(crate) mod output;
