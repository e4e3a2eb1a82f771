//! Pipeline layout types

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Version of the stage layout declared by this build
///
/// Bump when a stage is renamed, removed or reordered. Appending a stage
/// does not require a bump.
pub const PIPELINE_VERSION: u32 = 1;

/// Stage layout recorded in the configuration snapshot of a run
///
/// Checkpoint indices are positions in `stages`, so a resumed run is only
/// valid if the layout it was started with is still a prefix of the layout
/// being executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStamp {
    pub version: u32,
    pub stages: Vec<String>,
}

/// Stage metadata (name and position in the declared order)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMetadata {
    pub index: u32,
    pub name: String,
}

impl PipelineStamp {
    /// Stamp for a list of declared stage names
    pub fn new<I, S>(version: u32, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version,
            stages: stages.into_iter().map(Into::into).collect(),
        }
    }

    /// Declared stages with their checkpoint indices
    pub fn stage_metadata(&self) -> Vec<StageMetadata> {
        self.stages
            .iter()
            .enumerate()
            .map(|(index, name)| StageMetadata {
                index: index as u32,
                name: name.clone(),
            })
            .collect()
    }

    /// Checks that a run started with `self` can be resumed by `declared`
    pub fn check_resumable_by(&self, declared: &PipelineStamp) -> Result<()> {
        let compatible =
            self.version == declared.version && declared.stages.starts_with(&self.stages);

        if compatible {
            return Ok(());
        }

        Err(PipelineError::PipelineVersionMismatch {
            stored_version: self.version,
            stored: self.stages.join(", "),
            declared_version: declared.version,
            declared: declared.stages.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(stages: &[&str]) -> PipelineStamp {
        PipelineStamp::new(PIPELINE_VERSION, stages.iter().copied())
    }

    #[test]
    fn test_identical_layout_is_resumable() {
        let stored = layout(&["detect", "screen"]);
        assert!(stored.check_resumable_by(&layout(&["detect", "screen"])).is_ok());
    }

    #[test]
    fn test_appended_stage_is_resumable() {
        let stored = layout(&["detect", "screen"]);
        assert!(
            stored
                .check_resumable_by(&layout(&["detect", "screen", "report"]))
                .is_ok()
        );
    }

    #[test]
    fn test_inserted_stage_is_rejected() {
        let stored = layout(&["detect", "screen"]);
        let err = stored
            .check_resumable_by(&layout(&["detect", "filter", "screen"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::PipelineVersionMismatch { .. }));
    }

    #[test]
    fn test_version_bump_is_rejected() {
        let stored = layout(&["detect"]);
        let declared = PipelineStamp::new(PIPELINE_VERSION + 1, ["detect"]);
        assert!(stored.check_resumable_by(&declared).is_err());
    }

    #[test]
    fn test_stage_metadata_indices() {
        let meta = layout(&["a", "b", "c"]).stage_metadata();
        assert_eq!(meta[2].index, 2);
        assert_eq!(meta[2].name, "c");
    }
}
