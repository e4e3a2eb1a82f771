//! Run preparation
//!
//! Turns user options into a ready `PipelineRun`: resolves the output root,
//! creates the working directories, and either starts a fresh ledger or
//! reloads the configuration snapshot and ledger of an earlier attempt.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use vsop_core::domain::config::{DEFAULT_OUT_DIR, RunConfig, RunOptions};
use vsop_core::domain::pipeline::PipelineStamp;
use vsop_core::{PipelineError, Result};

use crate::context::{PipelineRun, RunMode};
use crate::repository::{CheckpointLedger, RunConfigStore, read_last_confirmed};

/// How a run invocation treats an existing output root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Start over; the output root must not exist unless forced
    Fresh,
    /// Resume when a snapshot exists, otherwise start a fresh run
    Continue,
    /// Resume; a missing snapshot is an error
    Resume,
}

/// Absolute output root, defaulting to `./virsorter_checkv_out`
pub fn resolve_out_dir(out_dir: Option<&Path>) -> Result<PathBuf> {
    let out_dir = out_dir.unwrap_or(Path::new(DEFAULT_OUT_DIR));
    std::path::absolute(out_dir).map_err(|e| PipelineError::io("resolving output directory", e))
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn create_dir(path: &Path, what: &str) -> Result<()> {
    std::fs::create_dir_all(path)
        .map_err(|e| PipelineError::io(format!("creating {} {}", what, path.display()), e))
}

/// Prepares the run described by `options` and `mode`
///
/// `declared` is the stamp of the stage list about to be executed.
pub fn open_run(
    options: RunOptions,
    mode: LaunchMode,
    declared: &PipelineStamp,
) -> Result<PipelineRun> {
    let out_dir = resolve_out_dir(options.out_dir.as_deref())?;
    let store = RunConfigStore::for_output_root(&out_dir);

    match mode {
        LaunchMode::Fresh => open_fresh(options, out_dir, declared),
        LaunchMode::Resume => open_resumed(&store, &out_dir, declared),
        LaunchMode::Continue if store.exists() => open_resumed(&store, &out_dir, declared),
        LaunchMode::Continue => {
            warn!(
                "Cannot find {}, switching to normal mode",
                store.path().display()
            );
            open_fresh(options, out_dir, declared)
        }
    }
}

fn open_fresh(options: RunOptions, out_dir: PathBuf, declared: &PipelineStamp) -> Result<PipelineRun> {
    if !options.force_overwrite && out_dir.exists() {
        return Err(PipelineError::OutputExists(out_dir));
    }

    options.validate()?;

    let available = available_threads();
    if options.num_threads > available {
        warn!("Maximum number of available CPU threads is {}", available);
        warn!("Number of threads is reset to {}", available);
    }

    let temp_dir = match options.temp_base {
        Some(ref base) => base.join(format!("vsop_tmp_{}", Uuid::new_v4().simple())),
        None => out_dir.join("tmp"),
    };

    let config = options.resolve(out_dir, temp_dir, available, declared.clone())?;

    create_dir(&config.out_dir, "output directory")?;
    create_dir(&config.temp_dir, "temporary directory")?;

    let mut ledger = CheckpointLedger::bind(config.ledger_file());
    ledger.reset()?;
    remove_terminal_marker(&config)?;

    RunConfigStore::for_output_root(&config.out_dir).save(&config)?;

    info!("Run {} prepared in {}", config.run_id, config.out_dir.display());
    Ok(PipelineRun::new(config, ledger, RunMode::Fresh))
}

fn open_resumed(
    store: &RunConfigStore,
    out_dir: &Path,
    declared: &PipelineStamp,
) -> Result<PipelineRun> {
    info!("Continue mode activated. Ignoring all options except the output directory");

    let config = store.load_for_resume(out_dir)?;
    config.pipeline.check_resumable_by(declared)?;

    let mut ledger = CheckpointLedger::bind(config.ledger_file());
    let last_confirmed = ledger.load_for_resume()?;
    match last_confirmed {
        Some(index) => info!("Resuming run {} after checkpoint {}", config.run_id, index),
        None => info!("Resuming run {} from the first stage", config.run_id),
    }

    create_dir(&config.temp_dir, "temporary directory")?;

    Ok(PipelineRun::new(config, ledger, RunMode::Resumed))
}

fn remove_terminal_marker(config: &RunConfig) -> Result<()> {
    match std::fs::remove_file(config.terminal_marker()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io("removing stale terminal marker", e)),
    }
}

/// Progress of one stage in a status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStatus {
    pub index: u32,
    pub name: String,
    pub confirmed: bool,
}

/// Read-only snapshot of a run's progress
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub out_dir: PathBuf,
    pub run_id: Uuid,
    pub pipeline_version: u32,
    pub last_confirmed: Option<u32>,
    pub stages: Vec<StageStatus>,
    pub finished: bool,
}

impl RunStatus {
    pub fn pending(&self) -> impl Iterator<Item = &StageStatus> {
        self.stages.iter().filter(|s| !s.confirmed)
    }
}

/// Reports the progress of the run stored under `out_dir`
pub fn inspect(out_dir: &Path) -> Result<RunStatus> {
    let config = RunConfigStore::for_output_root(out_dir).load_for_resume(out_dir)?;
    let last_confirmed = read_last_confirmed(&config.ledger_file())?;

    let stages = config
        .pipeline
        .stage_metadata()
        .into_iter()
        .map(|stage| StageStatus {
            confirmed: last_confirmed.is_some_and(|last| stage.index <= last),
            index: stage.index,
            name: stage.name,
        })
        .collect();

    Ok(RunStatus {
        out_dir: out_dir.to_path_buf(),
        run_id: config.run_id,
        pipeline_version: config.pipeline.version,
        last_confirmed,
        stages,
        finished: config.terminal_marker().exists(),
    })
}
