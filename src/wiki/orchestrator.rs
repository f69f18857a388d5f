//! Phase 2: bounded-concurrency layer generation.
//!
//! One task per aggregate, admitted through a semaphore. Inside a task the
//! six layers are generated strictly in canonical order, each under an outer
//! deadline. Content is buffered and only written once all six succeeded;
//! the first failure switches the whole aggregate to fallback content so
//! every aggregate ends with a self-consistent six-file bundle.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::fallback::fallback_bundle;
use super::layout::OutputLayout;
use super::snippets::SnippetCollector;
use super::templates::LayerTemplates;
use super::writer::write_atomic;
use crate::ai::{LayerRequest, SharedGenerator, with_timeout};
use crate::config::GenerationConfig;
use crate::types::{
    BoundedContext, GenerationError, Layer, LayerDocument, LayerStatus, SourceSnippet, TaskState,
};

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_concurrency: usize,
    /// Outer deadline for a single layer call
    pub layer_timeout: Duration,
    /// Aggregates beyond this count are skipped
    pub max_aggregates: Option<usize>,
}

impl OrchestratorSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            layer_timeout: Duration::from_secs(config.layer_timeout_secs),
            max_aggregates: config.max_aggregates,
        }
    }
}

// =============================================================================
// Run Summary
// =============================================================================

/// Why an aggregate fell back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub context: String,
    pub aggregate: String,
    pub layer: Layer,
    /// `timeout` or `backend`
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerResult {
    pub layer: Layer,
    pub status: LayerStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateOutcome {
    pub context: String,
    pub aggregate: String,
    pub state: TaskState,
    /// Excluded by the aggregate cap or offline mode
    pub skipped: bool,
    pub layers: Vec<LayerResult>,
    pub failure: Option<FailureRecord>,
}

impl AggregateOutcome {
    pub fn count(&self, status: LayerStatus) -> usize {
        self.layers.iter().filter(|l| l.status == status).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub contexts: usize,
    pub aggregates: usize,
    pub completed: usize,
    pub fallen_back: usize,
    pub skipped: usize,
    pub generated_layers: usize,
    pub fallback_layers: usize,
    pub error_layers: usize,
    pub failures: Vec<FailureRecord>,
    /// Sorted by context, then aggregate
    pub outcomes: Vec<AggregateOutcome>,
}

impl RunSummary {
    fn new(contexts: usize, started_at: DateTime<Utc>, mut outcomes: Vec<AggregateOutcome>) -> Self {
        outcomes.sort_by(|a, b| (&a.context, &a.aggregate).cmp(&(&b.context, &b.aggregate)));

        let state_count = |state: TaskState| outcomes.iter().filter(|o| o.state == state).count();
        let layer_count =
            |status: LayerStatus| outcomes.iter().map(|o| o.count(status)).sum::<usize>();

        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            contexts,
            aggregates: outcomes.len(),
            completed: state_count(TaskState::Completed),
            fallen_back: state_count(TaskState::FallenBack),
            skipped: outcomes.iter().filter(|o| o.skipped).count(),
            generated_layers: layer_count(LayerStatus::Generated),
            fallback_layers: layer_count(LayerStatus::Fallback),
            error_layers: layer_count(LayerStatus::Error),
            failures: outcomes.iter().filter_map(|o| o.failure.clone()).collect(),
            outcomes,
        }
    }

    pub fn outcome(&self, context: &str, aggregate: &str) -> Option<&AggregateOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.context == context && o.aggregate == aggregate)
    }

    /// Every aggregate fully generated and persisted
    pub fn is_clean(&self) -> bool {
        self.fallen_back == 0 && self.error_layers == 0
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Debug, Clone)]
struct AggregateJob {
    context: String,
    context_root: PathBuf,
    aggregate: String,
    skip: bool,
}

pub struct Orchestrator {
    worker: AggregateWorker,
    settings: OrchestratorSettings,
}

/// Shared, cloneable state each aggregate task works with
#[derive(Clone)]
struct AggregateWorker {
    layout: OutputLayout,
    generator: Option<SharedGenerator>,
    templates: Arc<LayerTemplates>,
    snippets: Option<Arc<SnippetCollector>>,
    layer_timeout: Duration,
}

impl Orchestrator {
    /// `generator = None` runs offline: every aggregate receives fallback content
    pub fn new(
        layout: OutputLayout,
        generator: Option<SharedGenerator>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            worker: AggregateWorker {
                layout,
                generator,
                templates: Arc::new(LayerTemplates::empty()),
                snippets: None,
                layer_timeout: settings.layer_timeout,
            },
            settings,
        }
    }

    pub fn with_templates(mut self, templates: LayerTemplates) -> Self {
        self.worker.templates = Arc::new(templates);
        self
    }

    pub fn with_snippets(mut self, collector: SnippetCollector) -> Self {
        self.worker.snippets = Some(Arc::new(collector));
        self
    }

    #[instrument(skip_all, fields(contexts = contexts.len(), concurrency = self.settings.max_concurrency))]
    pub async fn run(&self, contexts: &[BoundedContext]) -> RunSummary {
        let started_at = Utc::now();
        let jobs = self.plan(contexts);
        info!(
            aggregates = jobs.len(),
            skipped = jobs.iter().filter(|j| j.skip).count(),
            "Starting generation"
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency));
        let mut tasks = FuturesUnordered::new();

        for job in jobs {
            let worker = self.worker.clone();
            let semaphore = Arc::clone(&semaphore);
            let spawned_job = job.clone();

            let handle = tokio::spawn(async move {
                // Held until the task ends, whatever the exit path
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let failure = GenerationError::Backend("scheduler closed".to_string());
                    return worker.fall_back(&spawned_job, Some((Layer::ALL[0], failure))).await;
                };
                worker.process(spawned_job).await
            });

            tasks.push(async move { (job, handle.await) });
        }

        let mut outcomes = Vec::new();
        while let Some((job, joined)) = tasks.next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(context = %job.context, aggregate = %job.aggregate, error = %e, "Aggregate task aborted");
                    let failure = GenerationError::Backend(format!("task aborted: {}", e));
                    outcomes.push(
                        self.worker
                            .fall_back(&job, Some((Layer::ALL[0], failure)))
                            .await,
                    );
                }
            }
        }

        let summary = RunSummary::new(contexts.len(), started_at, outcomes);
        info!(
            completed = summary.completed,
            fallen_back = summary.fallen_back,
            skipped = summary.skipped,
            error_layers = summary.error_layers,
            "Generation finished"
        );
        summary
    }

    /// Jobs in context-then-aggregate order, with the cap and offline mode applied
    fn plan(&self, contexts: &[BoundedContext]) -> Vec<AggregateJob> {
        let offline = self.worker.generator.is_none();
        let cap = self.settings.max_aggregates.unwrap_or(usize::MAX);

        contexts
            .iter()
            .flat_map(|context| {
                context.aggregates.iter().map(move |aggregate| (context, aggregate))
            })
            .enumerate()
            .map(|(i, (context, aggregate))| AggregateJob {
                context: context.name.clone(),
                context_root: context.root_path.clone(),
                aggregate: aggregate.clone(),
                skip: offline || i >= cap,
            })
            .collect()
    }
}

impl AggregateWorker {
    #[instrument(skip_all, fields(context = %job.context, aggregate = %job.aggregate))]
    async fn process(&self, job: AggregateJob) -> AggregateOutcome {
        let generator = match (&self.generator, job.skip) {
            (Some(generator), false) => Arc::clone(generator),
            _ => {
                debug!("Aggregate skipped, writing fallback");
                return self.fall_back(&job, None).await;
            }
        };

        debug!(state = %TaskState::Running, "Aggregate task admitted");
        let snippets = self.collect_snippets(&job).await;

        let mut documents = Vec::with_capacity(Layer::COUNT);
        for layer in Layer::ALL {
            let request = LayerRequest {
                context: &job.context,
                aggregate: &job.aggregate,
                layer,
                snippets: &snippets,
                template: self.templates.get(layer),
            };

            match with_timeout(self.layer_timeout, generator.generate(&request), "layer generation").await {
                Ok(content) => {
                    debug!(layer = %layer, chars = content.len(), "Layer generated");
                    documents.push(LayerDocument::new(
                        &job.context,
                        &job.aggregate,
                        layer,
                        content,
                        LayerStatus::Generated,
                    ));
                }
                Err(e) => {
                    warn!(
                        layer = %layer,
                        kind = e.kind(),
                        error = %e,
                        "Layer generation failed, using fallback for the whole aggregate"
                    );
                    return self.fall_back(&job, Some((layer, e))).await;
                }
            }
        }

        let layers = self.persist(&job, documents).await;
        AggregateOutcome {
            context: job.context,
            aggregate: job.aggregate,
            state: TaskState::Completed,
            skipped: false,
            layers,
            failure: None,
        }
    }

    /// Write the fallback bundle; `failure` is `None` for skipped aggregates
    async fn fall_back(
        &self,
        job: &AggregateJob,
        failure: Option<(Layer, GenerationError)>,
    ) -> AggregateOutcome {
        let documents = fallback_bundle(&job.context, &job.aggregate)
            .into_iter()
            .map(|(layer, content)| {
                LayerDocument::new(&job.context, &job.aggregate, layer, content, LayerStatus::Fallback)
            })
            .collect();
        let layers = self.persist(job, documents).await;

        AggregateOutcome {
            context: job.context.clone(),
            aggregate: job.aggregate.clone(),
            state: TaskState::FallenBack,
            skipped: failure.is_none(),
            layers,
            failure: failure.map(|(layer, e)| FailureRecord {
                context: job.context.clone(),
                aggregate: job.aggregate.clone(),
                layer,
                kind: e.kind().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Write each document; a failed write downgrades it to `Error`
    async fn persist(&self, job: &AggregateJob, documents: Vec<LayerDocument>) -> Vec<LayerResult> {
        let dir = self.layout.aggregate_dir(&job.context, &job.aggregate);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(path = %dir.display(), error = %e, "Cannot create aggregate directory");
        }

        let mut results = Vec::with_capacity(documents.len());
        for mut document in documents {
            let path = self
                .layout
                .layer_file(&document.bounded_context, &document.aggregate, document.layer);
            if let Err(e) = write_atomic(&path, &document.content).await {
                warn!(layer = %document.layer, path = %path.display(), error = %e, "Failed to write layer");
                document.status = LayerStatus::Error;
            }
            results.push(LayerResult {
                layer: document.layer,
                status: document.status,
            });
        }
        results
    }

    async fn collect_snippets(&self, job: &AggregateJob) -> Vec<SourceSnippet> {
        let Some(collector) = self.snippets.clone() else {
            return Vec::new();
        };
        let root = job.context_root.clone();
        let aggregate = job.aggregate.clone();

        match tokio::task::spawn_blocking(move || collector.collect(&root, &aggregate)).await {
            Ok(snippets) => {
                debug!(files = snippets.len(), "Collected source snippets");
                snippets
            }
            Err(e) => {
                warn!(error = %e, "Snippet collection failed");
                Vec::new()
            }
        }
    }
}
