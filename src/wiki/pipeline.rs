use serde::Serialize;
use tracing::{info, instrument, warn};

use super::layout::OutputLayout;
use super::orchestrator::{Orchestrator, OrchestratorSettings, RunSummary};
use super::snippets::SnippetCollector;
use super::structure::{SkeletonBuilder, SkeletonReport};
use super::templates::LayerTemplates;
use crate::ai::SharedGenerator;
use crate::config::Config;
use crate::scanner::{ScanReport, StructureScanner};
use crate::types::{Result, WikiError};

/// What a pipeline run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub scan: ScanReport,
    pub skeleton: SkeletonReport,
    /// `None` when only the skeleton was built
    pub summary: Option<RunSummary>,
}

/// Scan, then Phase 1 (skeleton), then Phase 2 (generation)
pub struct DocumentationPipeline {
    config: Config,
    generator: Option<SharedGenerator>,
}

impl DocumentationPipeline {
    /// `generator = None` writes fallback content for every aggregate
    pub fn new(config: Config, generator: Option<SharedGenerator>) -> Self {
        Self { config, generator }
    }

    /// Scan only, after checking the repository exists
    pub async fn scan(&self) -> Result<ScanReport> {
        let repo = self.config.paths.repo.clone();
        if !repo.is_dir() {
            return Err(WikiError::RepositoryNotFound(repo));
        }

        let scanner = StructureScanner::new(&repo, self.config.scanner.clone());
        let report = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| WikiError::Io(std::io::Error::other(e.to_string())))?;

        for warning in &report.warnings {
            warn!(%warning, "Scan warning");
        }
        Ok(report)
    }

    #[instrument(skip(self), fields(repo = %self.config.paths.repo.display()))]
    pub async fn run(&self, skeleton_only: bool) -> Result<PipelineReport> {
        let scan = self.scan().await?;

        let layout = OutputLayout::new(self.config.paths.resolved_output());
        let builder = SkeletonBuilder::new(layout.clone());
        let contexts = scan.contexts.clone();
        let skeleton = tokio::task::spawn_blocking(move || builder.build(&contexts))
            .await
            .map_err(|e| WikiError::Io(std::io::Error::other(e.to_string())))??;

        if skeleton_only {
            info!("Skeleton only, skipping generation");
            return Ok(PipelineReport {
                scan,
                skeleton,
                summary: None,
            });
        }

        let templates = LayerTemplates::load(self.config.paths.templates.as_deref());
        let snippets = SnippetCollector::new(
            &self.config.paths.repo,
            &self.config.snippets,
            &self.config.scanner,
        );

        let summary = Orchestrator::new(
            layout,
            self.generator.clone(),
            OrchestratorSettings::from_config(&self.config.generation),
        )
        .with_templates(templates)
        .with_snippets(snippets)
        .run(&scan.contexts)
        .await;

        Ok(PipelineReport {
            scan,
            skeleton,
            summary: Some(summary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{LayerContentGenerator, LayerRequest};
    use crate::types::{GenerationError, Layer, LayerStatus, TaskState};
    use crate::wiki::fallback::FALLBACK_STATUS;
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FailOnEmployee;

    #[async_trait]
    impl LayerContentGenerator for FailOnEmployee {
        async fn generate(&self, request: &LayerRequest<'_>) -> std::result::Result<String, GenerationError> {
            if request.aggregate == "Employee" {
                return Err(GenerationError::Backend("refused".to_string()));
            }
            let sources = request.snippets.len();
            Ok(format!("# {} ({} sources)", request.layer, sources))
        }

        fn name(&self) -> &str {
            "fail-on-employee"
        }
    }

    fn repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("Application");
        fs::create_dir_all(app.join("HR/Definitions/Employee")).unwrap();
        fs::create_dir_all(app.join("Sales/Order/Commands")).unwrap();
        fs::write(app.join("Sales/Order/Commands/PlaceOrder.cs"), "class PlaceOrder {}").unwrap();
        temp
    }

    fn config(repo: &Path) -> Config {
        let mut config = Config::default();
        config.paths.repo = repo.to_path_buf();
        config
    }

    fn md_files(dir: &Path) -> usize {
        let mut count = 0;
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count += md_files(&path);
            } else if path.extension().is_some_and(|e| e == "md") {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let repo = repo();
        let pipeline = DocumentationPipeline::new(config(repo.path()), Some(Arc::new(FailOnEmployee)));

        let report = pipeline.run(false).await.unwrap();
        let summary = report.summary.unwrap();

        let docs = repo.path().join("Docs/BoundedContext");
        assert_eq!(fs::read_to_string(docs.join(".order")).unwrap(), "HR\nSales");
        assert_eq!(fs::read_to_string(docs.join("HR/.order")).unwrap(), "Employee");
        assert_eq!(fs::read_to_string(docs.join("Sales/.order")).unwrap(), "Order");
        assert_eq!(md_files(&docs), 12);

        assert_eq!(summary.outcome("HR", "Employee").unwrap().state, TaskState::FallenBack);
        let order = summary.outcome("Sales", "Order").unwrap();
        assert_eq!(order.count(LayerStatus::Generated), 6);

        let domain = fs::read_to_string(docs.join("Sales/Order/Domain.md")).unwrap();
        assert_eq!(domain, "# Domain (1 sources)");
        let employee = fs::read_to_string(docs.join("HR/Employee/Quality.md")).unwrap();
        assert!(employee.contains(FALLBACK_STATUS));
    }

    #[tokio::test]
    async fn test_skeleton_only_leaves_empty_files() {
        let repo = repo();
        let pipeline = DocumentationPipeline::new(config(repo.path()), Some(Arc::new(FailOnEmployee)));

        let report = pipeline.run(true).await.unwrap();
        assert!(report.summary.is_none());
        assert_eq!(report.skeleton.files_created, 12);

        let file = repo
            .path()
            .join("Docs/BoundedContext/Sales/Order")
            .join(Layer::WebUi.file_name());
        assert_eq!(fs::metadata(file).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_missing_repository_is_fatal() {
        let pipeline = DocumentationPipeline::new(config(Path::new("/no/such/repo")), None);
        let err = pipeline.run(false).await.unwrap_err();
        assert!(matches!(err, WikiError::RepositoryNotFound(_)));
    }
}
