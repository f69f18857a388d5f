//! Documentation Output
//!
//! Two-phase pipeline over the scanned domain structure:
//!
//! ```text
//! Scan → Phase 1: skeleton (dirs, .order manifests, empty layer files)
//!      → Phase 2: per-aggregate generation under a concurrency limit
//!                 (generator, else fallback bundle) → atomic writes
//! ```

pub mod fallback;
pub mod layout;
pub mod orchestrator;
pub mod pipeline;
pub mod snippets;
pub mod structure;
pub mod templates;
pub mod writer;

pub use fallback::{FALLBACK_STATUS, fallback_bundle, fallback_content};
pub use layout::{OutputLayout, layer_manifest, render_manifest};
pub use orchestrator::{
    AggregateOutcome, FailureRecord, LayerResult, Orchestrator, OrchestratorSettings, RunSummary,
};
pub use pipeline::{DocumentationPipeline, PipelineReport};
pub use snippets::SnippetCollector;
pub use structure::{SkeletonBuilder, SkeletonReport};
pub use templates::LayerTemplates;
pub use writer::write_atomic;
