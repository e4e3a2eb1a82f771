//! vsop Core
//!
//! Core types and abstractions for the vsop resumable pipeline runner.
//!
//! This crate contains:
//! - Domain types: run configuration, checkpoint records, pipeline layout
//! - Error taxonomy shared by the runner and the CLI

pub mod domain;
pub mod error;

pub use error::{PipelineError, Result, StageFailure};
