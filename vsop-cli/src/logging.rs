//! Logging setup
//!
//! Console output follows `RUST_LOG` (info by default, debug with
//! `--verbose`). Once a run's output root exists, a second layer is loaded
//! that appends every event without colours to the run log file inside it.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

type FileLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Handle to the run log layer, empty until a file is attached
#[derive(Clone)]
pub struct RunLog {
    handle: reload::Handle<Option<FileLayer>, Registry>,
}

impl RunLog {
    /// Starts appending log events to `path`
    pub fn attach(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .boxed();

        self.handle.reload(Some(layer)).map_err(io::Error::other)
    }
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "vsop=debug,vsop_runner=debug,vsop_core=debug"
    } else {
        "vsop=info,vsop_runner=info,vsop_core=info"
    }
}

fn run_log_targets() -> Targets {
    Targets::new()
        .with_target("vsop", Level::DEBUG)
        .with_target("vsop_runner", Level::DEBUG)
        .with_target("vsop_core", Level::DEBUG)
}

/// Builds the subscriber stack without installing it
fn build(console_filter: EnvFilter) -> (impl Subscriber + Send + Sync + 'static, RunLog) {
    let (file_layer, handle) = reload::Layer::new(None::<FileLayer>);

    let subscriber = tracing_subscriber::registry()
        .with(file_layer.with_filter(run_log_targets()))
        .with(tracing_subscriber::fmt::layer().with_filter(console_filter));

    (subscriber, RunLog { handle })
}

/// Initialises the global subscriber and returns the run log handle
pub fn init(verbose: bool) -> RunLog {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(verbose).into());

    let (subscriber, run_log) = build(console_filter);
    subscriber.init();
    run_log
}
