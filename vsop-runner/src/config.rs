//! Tool configuration
//!
//! Locations of the external programs the pipeline stages invoke. Programs
//! that ship with the pipeline (the parallel VirSorter2 wrapper and the viral
//! screen script) default to siblings of the running executable, the rest are
//! resolved through `PATH`.

use std::path::{Path, PathBuf};

/// External tool locations
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// VirSorter2 entry point
    pub virsorter: PathBuf,

    /// Wrapper that splits the input and runs several VirSorter2 instances
    pub parallel_virsorter: PathBuf,

    /// CheckV entry point
    pub checkv: PathBuf,

    /// Script combining VirSorter2 scores and CheckV contamination into the final set
    pub viral_screen: PathBuf,

    /// Concatenation tool used to merge CheckV outputs
    pub concat: PathBuf,
}

impl ToolConfig {
    /// Creates a configuration with bundled scripts resolved under `script_dir`
    pub fn new(script_dir: &Path) -> Self {
        Self {
            virsorter: PathBuf::from("virsorter"),
            parallel_virsorter: script_dir.join("pvirsort"),
            checkv: PathBuf::from("checkv"),
            viral_screen: script_dir.join("viral_screen"),
            concat: PathBuf::from("cat"),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Optional environment variables:
    /// - VSOP_VIRSORTER (default: virsorter)
    /// - VSOP_PVIRSORT (default: <exe dir>/pvirsort)
    /// - VSOP_CHECKV (default: checkv)
    /// - VSOP_VIRAL_SCREEN (default: <exe dir>/viral_screen)
    /// - VSOP_CAT (default: cat)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let tool = |var: &str, default: PathBuf| -> PathBuf {
            std::env::var_os(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        let config = Self {
            virsorter: tool("VSOP_VIRSORTER", defaults.virsorter),
            parallel_virsorter: tool("VSOP_PVIRSORT", defaults.parallel_virsorter),
            checkv: tool("VSOP_CHECKV", defaults.checkv),
            viral_screen: tool("VSOP_VIRAL_SCREEN", defaults.viral_screen),
            concat: tool("VSOP_CAT", defaults.concat),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let tools = [
            ("virsorter", &self.virsorter),
            ("parallel_virsorter", &self.parallel_virsorter),
            ("checkv", &self.checkv),
            ("viral_screen", &self.viral_screen),
            ("concat", &self.concat),
        ];

        for (name, path) in tools {
            if path.as_os_str().is_empty() {
                anyhow::bail!("{} tool location cannot be empty", name);
            }
        }

        Ok(())
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        let script_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.canonicalize().ok())
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(&script_dir)
    }
}
