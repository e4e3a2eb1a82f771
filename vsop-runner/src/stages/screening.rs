//! Quality screening of detected viral contigs with CheckV

use async_trait::async_trait;
use vsop_core::StageFailure;

use super::Stage;
use crate::context::StageContext;
use crate::execution::CommandSpec;

/// Runs `checkv end_to_end` on the first-pass contigs
pub struct QualityScreening;

#[async_trait]
impl Stage for QualityScreening {
    fn name(&self) -> &str {
        "quality_screening"
    }

    async fn execute(&self, ctx: &StageContext) -> Result<(), StageFailure> {
        let config = &ctx.config;
        ctx.clear_stale_output(&config.screening_dir())?;
        ctx.require_artifact(&config.detection_contigs())?;

        let spec = CommandSpec::new(&ctx.tools.checkv)
            .arg("end_to_end")
            .arg(config.detection_contigs())
            .arg(config.screening_dir())
            .opt("-t", config.num_threads.to_string())
            .opt("-d", &config.db_dir);

        ctx.run(&spec, "Run checkv").await?;

        ctx.require_artifact(&config.screening_proviruses())?;
        ctx.require_artifact(&config.screening_viruses())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;
    use crate::context::RunMode;
    use crate::testing::{FakeProcess, test_config};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(config: vsop_core::domain::config::RunConfig, process: Arc<FakeProcess>) -> StageContext {
        StageContext::new(
            Arc::new(config),
            Arc::new(ToolConfig::new(Path::new("/opt/vsop"))),
            process,
            RunMode::Resumed,
        )
    }

    #[tokio::test]
    async fn test_missing_detection_output_fails_before_checkv() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let process = Arc::new(FakeProcess::new());

        let err = QualityScreening
            .execute(&context(config.clone(), process.clone()))
            .await
            .unwrap_err();

        match err {
            StageFailure::MissingArtifact { path } => assert_eq!(path, config.detection_contigs()),
            other => panic!("unexpected failure: {:?}", other),
        }
        assert!(process.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_checkv_results_fail_the_stage() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.detection_dir()).unwrap();
        std::fs::write(config.detection_contigs(), ">v\nACGT\n").unwrap();

        // checkv "succeeds" but only writes proviruses.fna
        let process = Arc::new(FakeProcess::new().creating([config.screening_proviruses()]));

        let err = QualityScreening
            .execute(&context(config.clone(), process.clone()))
            .await
            .unwrap_err();

        match err {
            StageFailure::MissingArtifact { path } => assert_eq!(path, config.screening_viruses()),
            other => panic!("unexpected failure: {:?}", other),
        }
        assert_eq!(process.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_checkv_command() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.detection_dir()).unwrap();
        std::fs::write(config.detection_contigs(), ">v\nACGT\n").unwrap();

        let process = Arc::new(
            FakeProcess::new()
                .creating([config.screening_proviruses(), config.screening_viruses()]),
        );

        QualityScreening
            .execute(&context(config.clone(), process.clone()))
            .await
            .unwrap();

        let calls = process.calls();
        assert_eq!(calls[0].program, Path::new("checkv"));
        assert_eq!(
            calls[0].display(),
            format!(
                "checkv end_to_end {} {} -t 4 -d {}",
                config.detection_contigs().display(),
                config.screening_dir().display(),
                config.db_dir.display()
            )
        );
    }
}
