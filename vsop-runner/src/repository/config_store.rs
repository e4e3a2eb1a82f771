//! Run configuration store
//!
//! Persists the resolved `RunConfig` as JSON under the output root so a
//! resumed run reconstructs exactly the settings it was started with.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;
use vsop_core::domain::config::RunConfig;
use vsop_core::{PipelineError, Result};

/// File-backed store for the configuration snapshot of one run
#[derive(Debug, Clone)]
pub struct RunConfigStore {
    path: PathBuf,
}

impl RunConfigStore {
    /// Creates a store located at the fixed snapshot path of an output root
    pub fn for_output_root(out_dir: &Path) -> Self {
        Self {
            path: RunConfig::options_file_in(out_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks if a snapshot has been written
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes the snapshot atomically
    ///
    /// The JSON is written to a uniquely named sibling file, synced, then
    /// renamed over the target so a reader never observes a partial file.
    pub fn save(&self, config: &RunConfig) -> Result<()> {
        let data = serde_json::to_vec_pretty(config).map_err(|e| {
            PipelineError::io(
                "serializing run configuration",
                std::io::Error::new(ErrorKind::InvalidData, e),
            )
        })?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("options.json");
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.sync_all()
        };

        if let Err(e) = write_temp() {
            let _ = fs::remove_file(&temp_path);
            return Err(PipelineError::io("writing run configuration", e));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            PipelineError::io("renaming run configuration", e)
        })?;

        // Best effort: make the rename itself durable
        #[cfg(unix)]
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!("Run configuration saved to {}", self.path.display());
        Ok(())
    }

    /// Reads the snapshot back
    pub fn load(&self) -> Result<RunConfig> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::ConfigMissing {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(PipelineError::io("reading run configuration", e)),
        };

        serde_json::from_slice(&content).map_err(|e| PipelineError::ConfigCorrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Loads the snapshot for a resumed run located at `out_dir`
    ///
    /// Every stored field wins over freshly supplied options, except the
    /// output root, which is where the snapshot was found.
    pub fn load_for_resume(&self, out_dir: &Path) -> Result<RunConfig> {
        let mut config = self.load()?;
        config.out_dir = out_dir.to_path_buf();
        Ok(config)
    }
}
