//! Execution context for pipeline runs
//!
//! `PipelineRun` owns everything that changes while a run progresses:
//! - The checkpoint ledger
//! - The execution cursor shared by every stage gate
//!
//! `StageContext` is the read-only view handed to stage actions: the run
//! configuration, tool locations and the process service.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use vsop_core::StageFailure;
use vsop_core::domain::config::RunConfig;

use crate::config::ToolConfig;
use crate::execution::{CommandOutput, CommandSpec};
use crate::repository::CheckpointLedger;
use crate::service::ProcessService;

/// How the current invocation relates to earlier attempts of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Configuration was just saved, ledger starts empty
    Fresh,
    /// Configuration and ledger were loaded from an earlier attempt
    Resumed,
}

/// State of one logical pipeline run
#[derive(Debug)]
pub struct PipelineRun {
    config: Arc<RunConfig>,
    ledger: CheckpointLedger,
    cursor: u32,
    mode: RunMode,
}

impl PipelineRun {
    /// Creates a run around an already prepared configuration and ledger
    pub fn new(config: RunConfig, ledger: CheckpointLedger, mode: RunMode) -> Self {
        Self {
            config: Arc::new(config),
            ledger,
            cursor: 0,
            mode,
        }
    }

    pub fn config(&self) -> &Arc<RunConfig> {
        &self.config
    }

    pub fn ledger(&self) -> &CheckpointLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut CheckpointLedger {
        &mut self.ledger
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Index the next gate will take
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Takes the current cursor value and moves past it
    pub fn advance_cursor(&mut self) -> u32 {
        let index = self.cursor;
        self.cursor += 1;
        index
    }
}

/// Read-only context passed to stage actions
#[derive(Clone)]
pub struct StageContext {
    pub config: Arc<RunConfig>,
    pub tools: Arc<ToolConfig>,
    pub process: Arc<dyn ProcessService>,
    pub mode: RunMode,
}

impl StageContext {
    pub fn new(
        config: Arc<RunConfig>,
        tools: Arc<ToolConfig>,
        process: Arc<dyn ProcessService>,
        mode: RunMode,
    ) -> Self {
        Self {
            config,
            tools,
            process,
            mode,
        }
    }

    /// Runs an external command through the process service
    pub async fn run(
        &self,
        spec: &CommandSpec,
        description: &str,
    ) -> Result<CommandOutput, StageFailure> {
        self.process.run(spec, description).await
    }

    /// Fails the stage unless `path` exists
    pub fn require_artifact(&self, path: &Path) -> Result<(), StageFailure> {
        if path.exists() {
            return Ok(());
        }

        tracing::error!("can not find required file: {}", path.display());
        Err(StageFailure::MissingArtifact {
            path: path.to_path_buf(),
        })
    }

    /// Removes a stage output directory left behind by an earlier run
    ///
    /// Only on fresh runs: a resumed run leaves partial output for the tool.
    pub fn clear_stale_output(&self, dir: &Path) -> Result<(), StageFailure> {
        if self.mode != RunMode::Fresh || !dir.exists() {
            return Ok(());
        }

        info!("Removing stale output {}", dir.display());
        std::fs::remove_dir_all(dir).map_err(|e| {
            StageFailure::io(format!("removing stale output {}", dir.display()), e)
        })?;
        debug!("Removed {}", dir.display());
        Ok(())
    }
}
