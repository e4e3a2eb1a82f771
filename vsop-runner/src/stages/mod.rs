//! Pipeline stages
//!
//! Each stage runs one external tool to completion. Stages are declared in a
//! fixed order; the position of a stage in `standard_pipeline` is its
//! checkpoint index, so new stages must be appended at the end.

mod combination;
mod detection;
mod screening;
mod triage;

use async_trait::async_trait;
use vsop_core::StageFailure;
use vsop_core::domain::pipeline::{PIPELINE_VERSION, PipelineStamp};

use crate::context::StageContext;

pub use combination::ResultCombination;
pub use detection::FirstPassDetection;
pub use screening::QualityScreening;
pub use triage::FinalTriage;

/// One atomic unit of pipeline work
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable name, recorded in the run's pipeline stamp
    fn name(&self) -> &str;

    /// Runs the stage to completion
    ///
    /// Must only return `Ok` once every side effect of the stage is in place:
    /// the gate confirms the checkpoint right after.
    async fn execute(&self, ctx: &StageContext) -> Result<(), StageFailure>;
}

/// The declared stage sequence
pub fn standard_pipeline() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(FirstPassDetection),
        Box::new(QualityScreening),
        Box::new(ResultCombination),
        Box::new(FinalTriage),
    ]
}

/// Stamp describing a stage sequence
pub fn pipeline_stamp(stages: &[Box<dyn Stage>]) -> PipelineStamp {
    PipelineStamp::new(PIPELINE_VERSION, stages.iter().map(|s| s.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_order() {
        let stamp = pipeline_stamp(&standard_pipeline());

        assert_eq!(stamp.version, PIPELINE_VERSION);
        assert_eq!(
            stamp.stages,
            vec![
                "first_pass_detection",
                "quality_screening",
                "result_combination",
                "final_triage"
            ]
        );
    }
}
