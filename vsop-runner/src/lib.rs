//! vsop runner
//!
//! Resumable execution of the VirSorter2 / CheckV viral detection pipeline.
//!
//! Architecture:
//! - Configuration: Tool locations from environment or defaults
//! - Repositories: Configuration snapshot and checkpoint ledger under the output root
//! - Services: Subprocess execution and the SIGINT/SIGTERM interrupt flag
//! - Stages: The declared pipeline steps, one external tool each
//! - Scheduler: Stage gates and the orchestrator driving them
//! - Workspace: Fresh, continued and resumed run preparation
//!
//! A run records every completed stage in an append-only ledger. Restarting
//! the same output root replays the ledger and passes confirmed stages.

pub mod config;
pub mod context;
pub mod execution;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod stages;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use config::ToolConfig;
pub use context::{PipelineRun, RunMode, StageContext};
pub use execution::{CommandSpec, GateOutcome, RunSummary};
pub use scheduler::{PipelineOrchestrator, StageGate};
pub use service::{Interrupt, ProcessService, StandardProcessService};
pub use stages::{Stage, pipeline_stamp, standard_pipeline};
pub use workspace::{LaunchMode, RunStatus, StageStatus, inspect, open_run, resolve_out_dir};
