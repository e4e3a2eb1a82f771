//! Combination of CheckV provirus and virus contigs

use async_trait::async_trait;
use vsop_core::StageFailure;

use super::Stage;
use crate::context::StageContext;
use crate::execution::CommandSpec;

/// Concatenates `proviruses.fna` and `viruses.fna` into `combined.fna`
pub struct ResultCombination;

#[async_trait]
impl Stage for ResultCombination {
    fn name(&self) -> &str {
        "result_combination"
    }

    async fn execute(&self, ctx: &StageContext) -> Result<(), StageFailure> {
        let config = &ctx.config;
        let proviruses = config.screening_proviruses();
        let viruses = config.screening_viruses();
        let combined = config.screening_combined();

        ctx.require_artifact(&proviruses)?;
        ctx.require_artifact(&viruses)?;

        let spec = CommandSpec::new(&ctx.tools.concat)
            .arg(proviruses)
            .arg(viruses)
            .stdout_to(&combined);

        ctx.run(&spec, "Combine checkv results").await?;

        ctx.require_artifact(&combined)
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

    #[tokio::test]
    async fn test_combines_into_checkv_dir() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.screening_dir()).unwrap();
        std::fs::write(config.screening_proviruses(), ">p\nAC\n").unwrap();
        std::fs::write(config.screening_viruses(), ">v\nGT\n").unwrap();

        let process = Arc::new(FakeProcess::new());
        let ctx = StageContext::new(
            Arc::new(config.clone()),
            Arc::new(ToolConfig::new(Path::new("/opt/vsop"))),
            process.clone(),
            RunMode::Fresh,
        );

        ResultCombination.execute(&ctx).await.unwrap();

        let calls = process.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, Path::new("cat"));
        assert_eq!(calls[0].args.len(), 2);
        assert_eq!(calls[0].stdout_file, Some(config.screening_combined()));
        assert!(config.screening_combined().exists());
    }

    #[tokio::test]
    async fn test_requires_both_inputs() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.screening_dir()).unwrap();
        std::fs::write(config.screening_proviruses(), ">p\nAC\n").unwrap();

        let process = Arc::new(FakeProcess::new());
        let ctx = StageContext::new(
            Arc::new(config),
            Arc::new(ToolConfig::new(Path::new("/opt/vsop"))),
            process.clone(),
            RunMode::Fresh,
        );

        let err = ResultCombination.execute(&ctx).await.unwrap_err();
        assert!(matches!(err, StageFailure::MissingArtifact { .. }));
        assert!(process.calls().is_empty());
    }
}
