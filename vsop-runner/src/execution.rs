//! Execution types for the vsop runner
//!
//! These types only exist at runtime while a stage runs.
//! They are not persisted.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An external command described as an argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Write the command's standard output to this file instead of capturing it
    pub stdout_file: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_file: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds a flag followed by its value
    pub fn opt(self, flag: &str, value: impl Into<OsString>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout_file = Some(path.to_path_buf());
        self
    }

    /// Renders the command for logs and error messages
    pub fn display(&self) -> String {
        let mut rendered = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        if let Some(ref path) = self.stdout_file {
            rendered.push_str(" > ");
            rendered.push_str(&path.to_string_lossy());
        }
        rendered
    }
}

/// Output of a command that exited successfully
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Captured standard output (empty when redirected to a file)
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// What the gate did with one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The stage ran and its checkpoint was confirmed
    Executed { index: u32, elapsed: Duration },
    /// The stage was confirmed by an earlier attempt and passed
    Skipped { index: u32 },
}

impl GateOutcome {
    pub fn index(&self) -> u32 {
        match self {
            GateOutcome::Executed { index, .. } | GateOutcome::Skipped { index } => *index,
        }
    }

    pub fn was_executed(&self) -> bool {
        matches!(self, GateOutcome::Executed { .. })
    }
}

/// Summary of a pipeline run that reached its terminal state
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
    pub elapsed: Duration,
}
