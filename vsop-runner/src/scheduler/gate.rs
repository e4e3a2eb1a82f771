//! Stage gate
//!
//! Wraps one stage so it executes at most once per logical run.

use std::time::Instant;
use tracing::{debug, info};
use vsop_core::{PipelineError, Result};

use crate::context::{PipelineRun, StageContext};
use crate::execution::GateOutcome;
use crate::stages::Stage;

pub struct StageGate {
    stage: Box<dyn Stage>,
}

impl StageGate {
    pub fn new(stage: Box<dyn Stage>) -> Self {
        Self { stage }
    }

    pub fn name(&self) -> &str {
        self.stage.name()
    }

    /// Takes the next index from the run's cursor, then either runs the
    /// stage and confirms it or passes an already confirmed checkpoint
    pub async fn invoke(&self, run: &mut PipelineRun, ctx: &StageContext) -> Result<GateOutcome> {
        let index = run.advance_cursor();

        if !run.ledger().should_execute(index) {
            info!("passing checkpoint {}", index);
            return Ok(GateOutcome::Skipped { index });
        }

        debug!("Executing stage {} ({})", index, self.name());
        let start = Instant::now();

        self.stage
            .execute(ctx)
            .await
            .map_err(|failure| PipelineError::from_stage(self.name(), failure))?;

        run.ledger_mut().confirm(index)?;

        Ok(GateOutcome::Executed {
            index,
            elapsed: start.elapsed(),
        })
    }
}
