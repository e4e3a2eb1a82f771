//! Run configuration types
//!
//! `RunOptions` is what an operator supplies on the command line.
//! `RunConfig` is the validated, fully resolved snapshot that is persisted at
//! the start of a fresh run and reloaded verbatim on resume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::pipeline::PipelineStamp;
use crate::error::{PipelineError, Result};

/// File name of the configuration snapshot under the output root
pub const OPTIONS_FILE: &str = "options.json";
/// File name of the checkpoint ledger under the output root
pub const LEDGER_FILE: &str = "checkpoints.txt";
/// File name of the terminal marker under the output root
pub const TERMINAL_MARKER: &str = "done";
/// Output root used when none is supplied
pub const DEFAULT_OUT_DIR: &str = "virsorter_checkv_out";
/// Output prefix used when none is supplied
pub const DEFAULT_PREFIX: &str = "sample";

/// Options supplied for a run, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub input_contigs: Option<PathBuf>,
    pub db_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub out_prefix: Option<String>,
    pub temp_base: Option<PathBuf>,
    pub keep_tmp_files: bool,
    pub force_overwrite: bool,
    pub split_input: bool,
    pub num_parts: u32,
    pub min_length: u64,
    pub min_score: f64,
    pub viral_groups: Vec<String>,
    /// 0 selects every logical processor
    pub num_threads: usize,
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input_contigs: None,
            db_dir: None,
            out_dir: None,
            out_prefix: None,
            temp_base: None,
            keep_tmp_files: false,
            force_overwrite: false,
            split_input: true,
            num_parts: 10,
            min_length: 1500,
            min_score: 0.5,
            viral_groups: vec!["dsDNAphage".to_string(), "ssDNA".to_string()],
            num_threads: 0,
            verbose: false,
        }
    }
}

/// Fully resolved run configuration
///
/// Immutable for the lifetime of a run and all of its resumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub input_contigs: PathBuf,
    pub db_dir: PathBuf,
    pub out_dir: PathBuf,
    pub out_prefix: String,
    pub temp_dir: PathBuf,
    pub keep_tmp_files: bool,
    pub split_input: bool,
    pub num_parts: u32,
    pub min_length: u64,
    pub min_score: f64,
    pub viral_groups: Vec<String>,
    pub num_threads: usize,
    pub verbose: bool,
    pub pipeline: PipelineStamp,
}

impl RunOptions {
    /// Checks the option values that do not touch the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(PipelineError::InvalidConfig(
                "--min-length must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(PipelineError::InvalidConfig(
                "--min-score must be in range [0, 1]".to_string(),
            ));
        }

        if self.num_parts == 0 {
            return Err(PipelineError::InvalidConfig(
                "number of splits must be greater than 0".to_string(),
            ));
        }

        if self.viral_groups.iter().all(|g| g.trim().is_empty()) {
            return Err(PipelineError::InvalidConfig(
                "--include-groups must name at least one viral group".to_string(),
            ));
        }

        match &self.db_dir {
            None => {
                return Err(PipelineError::InvalidConfig(
                    "please specify --db-dir for checkv".to_string(),
                ));
            }
            Some(dir) if !dir.exists() => {
                return Err(PipelineError::InvalidConfig(format!(
                    "db dir does not exist: {}",
                    dir.display()
                )));
            }
            Some(_) => {}
        }

        match &self.input_contigs {
            None => Err(PipelineError::InvalidConfig(
                "please specify an input contig file with -i".to_string(),
            )),
            Some(file) if !file.exists() => Err(PipelineError::InvalidConfig(format!(
                "cannot find file {}",
                file.display()
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Number of worker threads after resolving 0 and clamping to the machine
    pub fn effective_threads(&self, available: usize) -> usize {
        let available = available.max(1);
        if self.num_threads == 0 {
            available
        } else {
            self.num_threads.min(available)
        }
    }

    /// Validates the options and resolves them into a run configuration
    ///
    /// `out_dir` is the absolute output root and `temp_dir` the working
    /// directory chosen for this run.
    pub fn resolve(
        self,
        out_dir: PathBuf,
        temp_dir: PathBuf,
        available_threads: usize,
        pipeline: PipelineStamp,
    ) -> Result<RunConfig> {
        self.validate()?;

        let num_threads = self.effective_threads(available_threads);
        let out_prefix = self
            .out_prefix
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        Ok(RunConfig {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            // validate() guarantees both are present
            input_contigs: self.input_contigs.unwrap_or_default(),
            db_dir: self.db_dir.unwrap_or_default(),
            out_dir,
            out_prefix,
            temp_dir,
            keep_tmp_files: self.keep_tmp_files,
            split_input: self.split_input,
            num_parts: self.num_parts,
            min_length: self.min_length,
            min_score: self.min_score,
            viral_groups: self
                .viral_groups
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            num_threads,
            verbose: self.verbose,
            pipeline,
        })
    }
}

impl RunConfig {
    /// Configuration snapshot path for an output root
    pub fn options_file_in(out_dir: &Path) -> PathBuf {
        out_dir.join(OPTIONS_FILE)
    }

    /// Ledger path for an output root
    pub fn ledger_file_in(out_dir: &Path) -> PathBuf {
        out_dir.join(LEDGER_FILE)
    }

    /// Terminal marker path for an output root
    pub fn terminal_marker_in(out_dir: &Path) -> PathBuf {
        out_dir.join(TERMINAL_MARKER)
    }

    pub fn options_file(&self) -> PathBuf {
        Self::options_file_in(&self.out_dir)
    }

    pub fn ledger_file(&self) -> PathBuf {
        Self::ledger_file_in(&self.out_dir)
    }

    pub fn terminal_marker(&self) -> PathBuf {
        Self::terminal_marker_in(&self.out_dir)
    }

    /// Run log: `<prefix>.log`, or `log` when the prefix is empty
    pub fn log_file(&self) -> PathBuf {
        if self.out_prefix.is_empty() {
            self.out_dir.join("log")
        } else {
            self.out_dir.join(format!("{}.log", self.out_prefix))
        }
    }

    /// Comma-separated viral groups as the detection tools expect them
    pub fn viral_groups_arg(&self) -> String {
        self.viral_groups.join(",")
    }

    pub fn detection_dir(&self) -> PathBuf {
        self.out_dir.join("vs2-pass1")
    }

    pub fn detection_contigs(&self) -> PathBuf {
        self.detection_dir().join("final-viral-combined.fa")
    }

    pub fn detection_scores(&self) -> PathBuf {
        self.detection_dir().join("final-viral-score.tsv")
    }

    pub fn screening_dir(&self) -> PathBuf {
        self.out_dir.join("checkv")
    }

    pub fn screening_proviruses(&self) -> PathBuf {
        self.screening_dir().join("proviruses.fna")
    }

    pub fn screening_viruses(&self) -> PathBuf {
        self.screening_dir().join("viruses.fna")
    }

    pub fn screening_combined(&self) -> PathBuf {
        self.screening_dir().join("combined.fna")
    }

    pub fn screening_contamination(&self) -> PathBuf {
        self.screening_dir().join("contamination.tsv")
    }
}
