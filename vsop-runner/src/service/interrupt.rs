//! Interrupt flag
//!
//! A single listener turns SIGINT and SIGTERM into a flag shared by the
//! process service and the orchestrator. A running command is killed when
//! the flag trips; no further stage is started once it has tripped.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Shared, sticky interrupt flag
#[derive(Debug, Clone)]
pub struct Interrupt {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Interrupt {
    /// Creates a flag that only trips through `trigger`
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Creates a flag tripped by SIGINT (Ctrl-C) or SIGTERM
    ///
    /// Must be called inside a tokio runtime. The signal handlers are
    /// registered before this returns and stay installed for the life of
    /// the process.
    pub fn listen() -> std::io::Result<Self> {
        let interrupt = Self::new();
        let handle = interrupt.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(()) = sigint.recv() => warn!("Received SIGINT, stopping the pipeline"),
                        Some(()) = sigterm.recv() => warn!("Received SIGTERM, stopping the pipeline"),
                        else => break,
                    }
                    handle.trigger();
                }
            });
        }

        #[cfg(not(unix))]
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received Ctrl-C, stopping the pipeline");
                handle.trigger();
            }
        });

        Ok(interrupt)
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the flag has tripped
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|tripped| *tripped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}
