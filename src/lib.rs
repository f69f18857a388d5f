//! dddwiki - Layered Documentation for Domain-Driven Repositories
//!
//! Discovers bounded contexts and aggregates from a repository's folder
//! layout, then writes six layer documents per aggregate in two phases:
//! a deterministic skeleton, followed by bounded-concurrency generation
//! through an LLM backend with per-aggregate fallback content.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use dddwiki::{ConfigLoader, DocumentationPipeline, LlmLayerGenerator};
//!
//! let config = ConfigLoader::load(None)?;
//! let generator = LlmLayerGenerator::from_config(&config)?;
//! let pipeline = DocumentationPipeline::new(config, Some(Arc::new(generator)));
//! let report = pipeline.run(false).await?;
//! ```
//!
//! ## Modules
//!
//! - [`scanner`]: bounded context and aggregate discovery
//! - [`wiki`]: skeleton builder, orchestrator and fallback content
//! - [`ai`]: provider, retrying transport and layer prompts
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod scanner;
pub mod types;
pub mod wiki;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::{
    BoundedContext, ErrorCategory, GenerationError, Layer, LayerStatus, Result, TaskState,
    WikiError,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use scanner::{ScanReport, ScanWarning, StructureScanner};
pub use wiki::{
    DocumentationPipeline, Orchestrator, OrchestratorSettings, PipelineReport, RunSummary,
    SkeletonBuilder,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    LayerContentGenerator, LayerRequest, LlmLayerGenerator, LlmProvider, RetryPolicy,
    RetryingTransport, SharedGenerator, with_timeout,
};
