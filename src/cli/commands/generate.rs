//! Generate Command
//!
//! Scan, build the documentation skeleton, then fill every aggregate's
//! layer files through the LLM backend (or fallback content when offline).
//!
//! Usage:
//!   dddwiki generate [--repo PATH] [--output PATH] [--concurrency N]
//!                    [--skeleton-only] [--offline] [--dry-run] [--report FILE]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

use crate::ai::{LlmLayerGenerator, LlmProvider, SharedGenerator, create_provider};
use crate::cli::Output;
use crate::config::Config;
use crate::types::Result;
use crate::wiki::{DocumentationPipeline, OutputLayout, PipelineReport, RunSummary};

/// Command-line overrides, applied on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub repo: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub layer_timeout_secs: Option<u64>,
    pub max_aggregates: Option<usize>,
    pub model: Option<String>,
    pub skeleton_only: bool,
    pub offline: bool,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
}

impl GenerateOptions {
    pub fn apply(&self, config: &mut Config) {
        if let Some(repo) = &self.repo {
            config.paths.repo = repo.clone();
        }
        if let Some(output) = &self.output {
            config.paths.output = output.clone();
        }
        if let Some(templates) = &self.templates {
            config.paths.templates = Some(templates.clone());
        }
        if let Some(n) = self.concurrency {
            config.generation.max_concurrency = n;
        }
        if let Some(secs) = self.layer_timeout_secs {
            config.generation.layer_timeout_secs = secs;
        }
        if let Some(n) = self.max_aggregates {
            config.generation.max_aggregates = Some(n);
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
    }

    fn uses_backend(&self) -> bool {
        !self.offline && !self.skeleton_only
    }
}

pub fn run(mut config: Config, options: GenerateOptions, out: &Output) -> Result<()> {
    options.apply(&mut config);
    config.validate()?;

    if options.dry_run {
        print_plan(&config, &options, out);
        if options.uses_backend() {
            match create_provider(&config.llm) {
                Ok(provider) => {
                    let rt = Runtime::new()?;
                    rt.block_on(check_backend(provider.as_ref(), out));
                }
                Err(e) => out.warning(&format!("Backend not configured: {e}")),
            }
        }
        return Ok(());
    }

    let generator: Option<SharedGenerator> = if options.uses_backend() {
        let generator = LlmLayerGenerator::from_config(&config)?;
        info!(model = generator.model(), "Generation backend ready");
        Some(Arc::new(generator) as SharedGenerator)
    } else {
        None
    };

    let pipeline = DocumentationPipeline::new(config.clone(), generator);
    let rt = Runtime::new()?;
    let report = rt.block_on(pipeline.run(options.skeleton_only))?;

    print_report(&config, &report, out);

    if let Some(path) = &options.report {
        write_report(path, &report)?;
        out.info(&format!("Report written to {}", path.display()));
    }

    Ok(())
}

fn print_plan(config: &Config, options: &GenerateOptions, out: &Output) {
    let layout = OutputLayout::new(config.paths.resolved_output());
    let mode = if options.skeleton_only {
        "skeleton only".to_string()
    } else if options.offline {
        "offline (fallback content)".to_string()
    } else {
        format!("{} / {}", config.llm.provider, config.llm.model)
    };

    out.header("Generation plan (dry run)");
    out.field("Repository", config.paths.repo.display());
    out.field("Domain root", &config.scanner.domain_root);
    out.field("Output", layout.contexts_dir().display());
    out.field("Mode", mode);
    out.field("Concurrency", config.generation.max_concurrency);
    out.field(
        "Layer timeout",
        format!("{}s", config.generation.layer_timeout_secs),
    );
    if let Some(worst_case) = config.transport_worst_case() {
        out.field("Retry worst case", format!("{:.0}s", worst_case.as_secs_f64()));
    }
    if let Some(cap) = config.generation.max_aggregates {
        out.field("Aggregate cap", cap);
    }
    if let Some(templates) = &config.paths.templates {
        out.field("Templates", templates.display());
    }
}

/// Preflight reachability check; returns whether the backend answered
async fn check_backend(provider: &dyn LlmProvider, out: &Output) -> bool {
    let label = format!("{} / {}", provider.name(), provider.model());
    match provider.health_check().await {
        Ok(true) => {
            out.success(&format!("Backend reachable ({label})"));
            true
        }
        Ok(false) => {
            out.warning(&format!("Backend did not answer ({label})"));
            false
        }
        Err(e) => {
            out.warning(&format!("Backend check failed ({label}): {e}"));
            false
        }
    }
}

fn print_report(config: &Config, report: &PipelineReport, out: &Output) {
    let layout = OutputLayout::new(config.paths.resolved_output());

    for warning in &report.scan.warnings {
        out.warning(&warning.to_string());
    }

    out.section("Skeleton");
    out.field("Contexts", report.scan.contexts.len());
    out.field("Aggregates", report.scan.aggregate_count());
    out.field("Files created", report.skeleton.files_created);
    out.field("Files kept", report.skeleton.files_kept);

    match &report.summary {
        Some(summary) => print_summary(summary, out),
        None => out.info("Generation skipped (skeleton only)"),
    }

    out.success(&format!("Documentation in {}", layout.contexts_dir().display()));
}

fn print_summary(summary: &RunSummary, out: &Output) {
    let elapsed = summary.finished_at - summary.started_at;

    out.section("Generation");
    out.field("Run", summary.run_id);
    out.field("Completed", summary.completed);
    out.field("Fallen back", summary.fallen_back);
    out.field("Skipped", summary.skipped);
    out.field(
        "Layers",
        format!(
            "{} generated, {} fallback, {} error",
            summary.generated_layers, summary.fallback_layers, summary.error_layers
        ),
    );
    out.field("Elapsed", format!("{:.1}s", elapsed.num_milliseconds() as f64 / 1000.0));

    for failure in &summary.failures {
        out.warning(&format!(
            "{}/{} {}: {} ({})",
            failure.context, failure.aggregate, failure.layer, failure.message, failure.kind
        ));
    }
}

fn write_report(path: &Path, report: &PipelineReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{CompletionRequest, LlmResponse};
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct StaticHealth(Result<bool>);

    #[async_trait]
    impl LlmProvider for StaticHealth {
        async fn complete(&self, _request: &CompletionRequest) -> Result<LlmResponse> {
            Ok(LlmResponse::content_only("unused"))
        }

        fn name(&self) -> &str {
            "static"
        }

        fn model(&self) -> &str {
            "none"
        }

        async fn health_check(&self) -> Result<bool> {
            match &self.0 {
                Ok(up) => Ok(*up),
                Err(e) => Err(crate::types::WikiError::LlmApi(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_backend_check_reports_reachability() {
        let out = Output::quiet(true);
        assert!(check_backend(&StaticHealth(Ok(true)), &out).await);
        assert!(!check_backend(&StaticHealth(Ok(false)), &out).await);
        let down = StaticHealth(Err(crate::types::WikiError::LlmApi("refused".to_string())));
        assert!(!check_backend(&down, &out).await);
    }

    #[test]
    fn test_dry_run_with_unusable_backend_only_warns() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.llm.provider = "unsupported".to_string();
        let options = GenerateOptions {
            repo: Some(temp.path().to_path_buf()),
            dry_run: true,
            ..GenerateOptions::default()
        };

        run(config, options, &Output::quiet(true)).unwrap();
        assert!(!temp.path().join("Docs").exists());
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = Config::default();
        let options = GenerateOptions {
            repo: Some(PathBuf::from("/work/repo")),
            concurrency: Some(8),
            max_aggregates: Some(2),
            model: Some("local-model".to_string()),
            ..GenerateOptions::default()
        };

        options.apply(&mut config);

        assert_eq!(config.paths.repo, PathBuf::from("/work/repo"));
        assert_eq!(config.generation.max_concurrency, 8);
        assert_eq!(config.generation.max_aggregates, Some(2));
        assert_eq!(config.llm.model, "local-model");
        // untouched
        assert_eq!(config.paths.output, Config::default().paths.output);
    }

    #[test]
    fn test_zero_concurrency_override_is_rejected() {
        let options = GenerateOptions {
            concurrency: Some(0),
            dry_run: true,
            ..GenerateOptions::default()
        };
        let err = run(Config::default(), options, &Output::quiet(true)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_offline_run_writes_report() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Application/HR/Definitions/Employee")).unwrap();
        let report = temp.path().join("out/report.json");

        let options = GenerateOptions {
            repo: Some(temp.path().to_path_buf()),
            offline: true,
            report: Some(report.clone()),
            ..GenerateOptions::default()
        };
        run(Config::default(), options, &Output::quiet(true)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json["summary"]["fallen_back"], 1);
        assert!(temp.path().join("Docs/BoundedContext/HR/Employee/Domain.md").is_file());
    }

    #[test]
    fn test_backend_skipped_when_offline_or_skeleton() {
        let offline = GenerateOptions { offline: true, ..GenerateOptions::default() };
        let skeleton = GenerateOptions { skeleton_only: true, ..GenerateOptions::default() };
        assert!(!offline.uses_backend());
        assert!(!skeleton.uses_backend());
        assert!(GenerateOptions::default().uses_backend());
    }
}
