//! Error types for vsop

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No configuration snapshot at the output root
    #[error("Run configuration not found: {}", .path.display())]
    ConfigMissing { path: PathBuf },

    /// Configuration snapshot exists but cannot be parsed
    #[error("Run configuration at {} is corrupt: {reason}", .path.display())]
    ConfigCorrupt { path: PathBuf, reason: String },

    /// Supplied options failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Fresh run would overwrite an existing output root
    #[error(
        "Output directory {} already exists, use another output directory or --force to overwrite",
        .0.display()
    )]
    OutputExists(PathBuf),

    /// Stored stage layout is incompatible with the declared pipeline
    #[error(
        "Pipeline layout mismatch: run was started with v{stored_version} [{stored}], this build declares v{declared_version} [{declared}]"
    )]
    PipelineVersionMismatch {
        stored_version: u32,
        stored: String,
        declared_version: u32,
        declared: String,
    },

    /// A stage action failed
    #[error("Stage '{stage}' failed: {source}")]
    StageExecutionFailed {
        stage: String,
        #[source]
        source: StageFailure,
    },

    /// The operator interrupted a running stage, or the run before a stage started
    #[error("Stage '{stage}' was interrupted ({command})")]
    InterruptedExternally { stage: String, command: String },

    /// Attempt to confirm a checkpoint that is not after the last one
    #[error("Checkpoint {index} confirmed out of order (last confirmed {last})")]
    LedgerOutOfOrder { index: u32, last: u32 },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single stage action did not complete
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("command `{command}` exited with status {exit_code}")]
    NonZeroExit { command: String, exit_code: i32 },

    #[error("command `{command}` was terminated by a signal")]
    Signaled { command: String },

    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("required artifact missing: {}", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("interrupted while running `{command}`")]
    Interrupted { command: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Attach the failing stage's name to a stage failure
    ///
    /// Interruptions are reported as `InterruptedExternally`, everything else
    /// as `StageExecutionFailed`.
    pub fn from_stage(stage: impl Into<String>, failure: StageFailure) -> Self {
        match failure {
            StageFailure::Interrupted { command } => Self::InterruptedExternally {
                stage: stage.into(),
                command,
            },
            source => Self::StageExecutionFailed {
                stage: stage.into(),
                source,
            },
        }
    }

    /// Interruption noticed before `stage` started
    pub fn interrupted_before(stage: impl Into<String>) -> Self {
        Self::InterruptedExternally {
            stage: stage.into(),
            command: "not started".to_string(),
        }
    }

    /// Name of the stage that failed, if the error came from a stage
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageExecutionFailed { stage, .. } | Self::InterruptedExternally { stage, .. } => {
                Some(stage.as_str())
            }
            _ => None,
        }
    }

    /// Check if a resume invocation could make progress after this error
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            Self::StageExecutionFailed { .. } | Self::InterruptedExternally { .. }
        )
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StageExecutionFailed {
                source: StageFailure::NonZeroExit { exit_code, .. },
                ..
            } if *exit_code > 0 && *exit_code < 256 => *exit_code,
            Self::InterruptedExternally { .. } => 130,
            _ => 1,
        }
    }
}

impl StageFailure {
    /// Create an IO failure with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Exit status of the external command, when it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
