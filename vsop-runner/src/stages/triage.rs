//! Final viral triage

use async_trait::async_trait;
use vsop_core::StageFailure;

use super::Stage;
use crate::context::StageContext;
use crate::execution::CommandSpec;

/// Runs the viral screen script over VirSorter2 scores and CheckV contamination
pub struct FinalTriage;

#[async_trait]
impl Stage for FinalTriage {
    fn name(&self) -> &str {
        "final_triage"
    }

    async fn execute(&self, ctx: &StageContext) -> Result<(), StageFailure> {
        let config = &ctx.config;

        let spec = CommandSpec::new(&ctx.tools.viral_screen)
            .opt("-i", &config.input_contigs)
            .opt("-s", config.detection_scores())
            .opt("-c", config.screening_contamination())
            .opt("-o", &config.out_dir)
            .opt("-p", &config.out_prefix);

        ctx.run(&spec, "Viral screen based on virsorter and checkv results")
            .await?;
        Ok(())
    }
}
