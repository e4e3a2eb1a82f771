//! Repository layer
//!
//! Repositories own the durable state of a run under its output root:
//! the configuration snapshot and the checkpoint ledger. They provide small,
//! focused interfaces without any orchestration logic.

mod config_store;
mod ledger;

pub use config_store::RunConfigStore;
pub use ledger::{CheckpointLedger, ResumeState, read_last_confirmed};
