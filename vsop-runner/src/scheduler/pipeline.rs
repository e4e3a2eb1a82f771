//! Pipeline orchestrator
//!
//! Drives the declared stages of one pipeline run in order. The first
//! failure or interrupt aborts the run: later stages are not invoked, the
//! ledger keeps whatever was confirmed so far and no terminal marker is
//! written.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use vsop_core::{PipelineError, Result};

use super::StageGate;
use crate::config::ToolConfig;
use crate::context::{PipelineRun, StageContext};
use crate::execution::{GateOutcome, RunSummary};
use crate::service::{Interrupt, ProcessService};
use crate::stages::Stage;

pub struct PipelineOrchestrator {
    run: PipelineRun,
    gates: Vec<StageGate>,
    tools: Arc<ToolConfig>,
    process: Arc<dyn ProcessService>,
    interrupt: Interrupt,
}

impl PipelineOrchestrator {
    pub fn new(
        run: PipelineRun,
        stages: Vec<Box<dyn Stage>>,
        tools: Arc<ToolConfig>,
        process: Arc<dyn ProcessService>,
    ) -> Self {
        Self {
            run,
            gates: stages.into_iter().map(StageGate::new).collect(),
            tools,
            process,
            interrupt: Interrupt::new(),
        }
    }

    /// Stops the run before the next stage once `interrupt` trips
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Invokes every gate in order, then finishes the run
    pub async fn run(mut self) -> Result<RunSummary> {
        let start = Instant::now();
        let ctx = StageContext::new(
            self.run.config().clone(),
            self.tools.clone(),
            self.process.clone(),
            self.run.mode(),
        );

        info!(
            "Start pipeline. Number of CPU threads: {}",
            ctx.config.num_threads
        );

        let mut summary = RunSummary::default();
        for gate in &self.gates {
            if self.interrupt.is_triggered() {
                let e = PipelineError::interrupted_before(gate.name());
                error!("Pipeline stopped: {}", e);
                return Err(e);
            }

            match gate.invoke(&mut self.run, &ctx).await {
                Ok(GateOutcome::Executed { index, elapsed }) => {
                    info!(
                        "Stage {} ({}) finished in {:.1?}",
                        index,
                        gate.name(),
                        elapsed
                    );
                    summary.executed.push(gate.name().to_string());
                }
                Ok(GateOutcome::Skipped { .. }) => {
                    summary.skipped.push(gate.name().to_string());
                }
                Err(e) => {
                    error!("Pipeline stopped: {}", e);
                    return Err(e);
                }
            }
        }

        self.finish()?;

        summary.elapsed = start.elapsed();
        info!("Pipeline finished in {:.1?}", summary.elapsed);
        Ok(summary)
    }

    fn finish(&self) -> Result<()> {
        let config = self.run.config();

        if !config.keep_tmp_files {
            match std::fs::remove_dir_all(&config.temp_dir) {
                Ok(()) => debug!("Removed temporary directory {}", config.temp_dir.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(PipelineError::io("removing temporary directory", e)),
            }
        }

        std::fs::File::create(config.terminal_marker())
            .map_err(|e| PipelineError::io("creating terminal marker", e))?;
        Ok(())
    }
}
