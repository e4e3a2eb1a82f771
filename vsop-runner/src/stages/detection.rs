//! First-pass viral detection with VirSorter2

use async_trait::async_trait;
use vsop_core::StageFailure;
use vsop_core::domain::config::RunConfig;

use super::Stage;
use crate::config::ToolConfig;
use crate::context::StageContext;
use crate::execution::CommandSpec;

/// Runs VirSorter2 over the input contigs
///
/// By default the input is split and handed to the parallel wrapper;
/// `split_input = false` runs a single VirSorter2 instance.
pub struct FirstPassDetection;

impl FirstPassDetection {
    fn single_instance(config: &RunConfig, tools: &ToolConfig) -> CommandSpec {
        CommandSpec::new(&tools.virsorter)
            .arg("run")
            .arg("--keep-original-seq")
            .opt("-i", &config.input_contigs)
            .opt("-w", config.detection_dir())
            .opt("--min-length", config.min_length.to_string())
            .opt("--min-score", config.min_score.to_string())
            .opt("--include-groups", config.viral_groups_arg())
            .opt("--tmpdir", &config.temp_dir)
            .opt("-j", config.num_threads.to_string())
            .arg("all")
    }

    fn parallel(config: &RunConfig, tools: &ToolConfig) -> CommandSpec {
        CommandSpec::new(&tools.parallel_virsorter)
            .opt("-i", &config.input_contigs)
            .opt("-o", config.detection_dir())
            .opt("-l", config.min_length.to_string())
            .opt("-s", config.min_score.to_string())
            .opt("-g", config.viral_groups_arg())
            .opt("-n", config.num_parts.to_string())
            .opt("-t", config.num_threads.to_string())
            .arg("all")
    }
}

#[async_trait]
impl Stage for FirstPassDetection {
    fn name(&self) -> &str {
        "first_pass_detection"
    }

    async fn execute(&self, ctx: &StageContext) -> Result<(), StageFailure> {
        let config = &ctx.config;
        ctx.clear_stale_output(&config.detection_dir())?;

        if config.split_input {
            let spec = Self::parallel(config, &ctx.tools);
            ctx.run(&spec, "run virsorter2 in parallel").await?;
        } else {
            let spec = Self::single_instance(config, &ctx.tools);
            ctx.run(&spec, "first pass of virsorter2").await?;
        }

        Ok(())
    }
}
