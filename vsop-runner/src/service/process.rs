//! Process service
//!
//! Runs the external program behind a stage:
//! - Spawning an argument-vector command (no shell)
//! - Capturing standard error for the run log
//! - Optionally redirecting standard output to a file
//! - Killing the child's process group and reporting an interruption when
//!   the interrupt flag trips

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vsop_core::StageFailure;

use super::Interrupt;
use crate::execution::{CommandOutput, CommandSpec};

/// How long output pipes are drained after the command has ended
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Service trait for running external commands
#[async_trait]
pub trait ProcessService: Send + Sync {
    /// Runs a command to completion
    ///
    /// # Arguments
    /// * `spec` - The command to run
    /// * `description` - Human readable purpose, logged before the command
    ///
    /// # Returns
    /// The captured output if the command exited with status 0
    async fn run(&self, spec: &CommandSpec, description: &str)
    -> Result<CommandOutput, StageFailure>;
}

/// Standard implementation of ProcessService backed by tokio processes
///
/// Each command runs in its own process group so an interrupt stops the
/// tool together with every worker it started.
pub struct StandardProcessService {
    interrupt: Interrupt,
}

impl StandardProcessService {
    /// Creates a process service that stops commands when `interrupt` trips
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }

    /// Waits for the child, or kills its process group when interrupted
    ///
    /// Returns `None` if the wait was interrupted.
    async fn wait_or_interrupt(
        &self,
        child: &mut Child,
        group: Option<u32>,
    ) -> std::io::Result<Option<ExitStatus>> {
        tokio::select! {
            status = child.wait() => status.map(Some),
            _ = self.interrupt.triggered() => {
                warn!("Interrupt received, stopping child process");
                terminate(child, group).await;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ProcessService for StandardProcessService {
    async fn run(
        &self,
        spec: &CommandSpec,
        description: &str,
    ) -> Result<CommandOutput, StageFailure> {
        let rendered = spec.display();
        info!("{}", description);
        info!("command {}", rendered);

        if self.interrupt.is_triggered() {
            return Err(StageFailure::Interrupted { command: rendered });
        }

        let started = Instant::now();

        let stdout = match spec.stdout_file {
            Some(ref path) => {
                let file = std::fs::File::create(path).map_err(|e| {
                    StageFailure::io(format!("creating output file {}", path.display()), e)
                })?;
                Stdio::from(file)
            }
            None => Stdio::piped(),
        };

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| StageFailure::Spawn {
            command: rendered.clone(),
            source,
        })?;
        let group = child.id();

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = self
            .wait_or_interrupt(&mut child, group)
            .await
            .map_err(|e| StageFailure::io(format!("waiting for `{}`", rendered), e))?;

        let stdout = collect(stdout_reader).await;
        let stderr = collect(stderr_reader).await;

        let Some(status) = status else {
            return Err(StageFailure::Interrupted { command: rendered });
        };

        if !stdout.trim().is_empty() {
            debug!("stdout: {}", stdout.trim());
        }

        if !status.success() {
            if !stderr.trim().is_empty() {
                error!("{}", stderr.trim());
            }

            return Err(match status.code() {
                Some(exit_code) => {
                    error!("Command: {}; Exit code {}", rendered, exit_code);
                    StageFailure::NonZeroExit {
                        command: rendered,
                        exit_code,
                    }
                }
                None => {
                    error!("Command: {}; terminated by signal", rendered);
                    StageFailure::Signaled { command: rendered }
                }
            });
        }

        if !stderr.trim().is_empty() {
            info!("{}", stderr.trim());
        }

        let elapsed = started.elapsed();
        info!(
            "CMD DONE. Time elapsed: {:.3} seconds",
            elapsed.as_secs_f64()
        );

        Ok(CommandOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// Drains a child pipe on its own task
fn spawn_reader<R>(mut pipe: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("Failed to read child output: {}", e);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Kills the child's process group, then reaps the child
async fn terminate(child: &mut Child, group: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = group {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
            warn!("Failed to kill process group {}: {}", pgid, e);
        }
    }
    #[cfg(not(unix))]
    let _ = group;

    if let Err(e) = child.kill().await {
        debug!("Child process already stopped: {}", e);
    }
}

/// Collects a reader's output, giving up once `DRAIN_TIMEOUT` has passed
///
/// A process that outlives the command can keep the pipe open.
async fn collect(reader: Option<JoinHandle<String>>) -> String {
    let Some(mut handle) = reader else {
        return String::new();
    };

    match tokio::time::timeout(DRAIN_TIMEOUT, &mut handle).await {
        Ok(output) => output.unwrap_or_default(),
        Err(_) => {
            warn!(
                "Command output still open {:?} after exit, not waiting for it",
                DRAIN_TIMEOUT
            );
            handle.abort();
            String::new()
        }
    }
}
