//! Test doubles shared by the runner's unit tests

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use vsop_core::StageFailure;
use vsop_core::domain::config::{RunConfig, RunOptions};
use vsop_core::domain::pipeline::{PIPELINE_VERSION, PipelineStamp};

use crate::execution::{CommandOutput, CommandSpec};
use crate::service::ProcessService;

/// Resolved configuration rooted at `out_dir`, with inputs that exist
pub fn test_config(out_dir: &Path) -> RunConfig {
    let input = out_dir.join("contigs.fa");
    if !input.exists() {
        std::fs::create_dir_all(out_dir).unwrap();
        std::fs::write(&input, ">c1\nACGTACGT\n").unwrap();
    }

    RunOptions {
        input_contigs: Some(input),
        db_dir: Some(out_dir.to_path_buf()),
        num_threads: 4,
        ..Default::default()
    }
    .resolve(
        out_dir.to_path_buf(),
        out_dir.join("tmp"),
        4,
        PipelineStamp::new(
            PIPELINE_VERSION,
            [
                "first_pass_detection",
                "quality_screening",
                "result_combination",
                "final_triage",
            ],
        ),
    )
    .unwrap()
}

/// Process service that records commands instead of running them
///
/// Creates the configured files on every call, writes an empty file for
/// redirected stdout, and fails with exit code 2 when the program matches
/// `fail_program`.
#[derive(Default)]
pub struct FakeProcess {
    calls: Mutex<Vec<CommandSpec>>,
    creates: Vec<PathBuf>,
    fail_program: Option<PathBuf>,
}

impl FakeProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creating(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.creates.extend(paths);
        self
    }

    pub fn failing(mut self, program: impl Into<PathBuf>) -> Self {
        self.fail_program = Some(program.into());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessService for FakeProcess {
    async fn run(
        &self,
        spec: &CommandSpec,
        _description: &str,
    ) -> Result<CommandOutput, StageFailure> {
        self.calls.lock().unwrap().push(spec.clone());

        if self.fail_program.as_ref() == Some(&spec.program) {
            return Err(StageFailure::NonZeroExit {
                command: spec.display(),
                exit_code: 2,
            });
        }

        for path in &self.creates {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, b">fake\nACGT\n").unwrap();
        }

        if let Some(ref path) = spec.stdout_file {
            std::fs::write(path, b"").unwrap();
        }

        Ok(CommandOutput::default())
    }
}
