//! Scheduler layer for the runner
//!
//! This layer drives a pipeline run: each stage is wrapped in a gate that
//! consults the checkpoint ledger, and the orchestrator invokes the gates
//! in declared order until the run finishes or a stage fails.

mod gate;
mod pipeline;

pub use gate::StageGate;
pub use pipeline::PipelineOrchestrator;
