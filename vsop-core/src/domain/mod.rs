//! Core domain types
//!
//! This module contains the structures shared between the runner (which
//! executes and persists them) and the CLI (which builds and reports them).

pub mod checkpoint;
pub mod config;
pub mod pipeline;
