//! Layer content generation.
//!
//! `LayerContentGenerator` is the seam between the orchestrator and any
//! backend. The orchestrator only sees `Ok(markdown)` or a
//! `GenerationError`; retries, classification and prompt building stay
//! behind the trait.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::profiles::LayerProfile;
use super::prompt::PromptBuilder;
use super::provider::{CompletionRequest, create_provider};
use super::transport::{RetryPolicy, RetryingTransport};
use crate::config::Config;
use crate::types::{GenerationError, Layer, Result, SourceSnippet};

/// Everything the generator needs to write one layer document
#[derive(Debug, Clone, Copy)]
pub struct LayerRequest<'a> {
    pub context: &'a str,
    pub aggregate: &'a str,
    pub layer: Layer,
    pub snippets: &'a [SourceSnippet],
    /// Reference document for this layer, may be empty
    pub template: &'a str,
}

#[async_trait]
pub trait LayerContentGenerator: Send + Sync {
    /// Produce Markdown for one layer of one aggregate
    async fn generate(&self, request: &LayerRequest<'_>) -> std::result::Result<String, GenerationError>;

    /// Name for logs and run reports
    fn name(&self) -> &str;
}

pub type SharedGenerator = Arc<dyn LayerContentGenerator>;

/// Generator backed by an LLM through the retrying transport
pub struct LlmLayerGenerator {
    transport: RetryingTransport,
    repo_root: PathBuf,
}

impl LlmLayerGenerator {
    pub fn new(transport: RetryingTransport, repo_root: &Path) -> Self {
        let repo_root = repo_root
            .canonicalize()
            .unwrap_or_else(|_| repo_root.to_path_buf());
        Self {
            transport,
            repo_root,
        }
    }

    /// Provider, retry policy and repository root from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = create_provider(&config.llm)?;
        let transport = RetryingTransport::new(provider, RetryPolicy::from_config(&config.retry));
        Ok(Self::new(transport, &config.paths.repo))
    }

    pub fn model(&self) -> &str {
        self.transport.model()
    }

    pub fn build_prompt(request: &LayerRequest<'_>) -> CompletionRequest {
        let profile = LayerProfile::for_layer(request.layer);

        let mut builder = PromptBuilder::new()
            .role(
                "software architect",
                &format!("documenting the {} layer of DDD aggregates", request.layer),
            )
            .context_item("Bounded Context", request.context)
            .context_item("Aggregate", request.aggregate)
            .context_item("Layer", request.layer.name())
            .objectives(&[
                format!("Describe the {} of {}", profile.focus.join(", "), request.aggregate),
                "Reference concrete types and files from the provided sources".to_string(),
                "Keep it concise and skimmable".to_string(),
            ])
            .focus(
                request.aggregate,
                &[
                    "Do NOT document other aggregates",
                    "Do NOT speculate about code you cannot see",
                ],
            );

        if !request.template.trim().is_empty() {
            builder = builder.section("Reference Template", request.template.trim());
        }

        if request.snippets.is_empty() {
            builder = builder.section("Source Files", "No related source files were found.");
        } else {
            builder = builder.text("# Source Files");
            for snippet in request.snippets {
                builder = builder.code(Some(&snippet.path), language_of(&snippet.path), &snippet.content);
            }
        }

        CompletionRequest::new(profile.system_prompt(), builder.build())
    }

    /// Trim the response and replace absolute repository paths with `.`
    fn clean_output(&self, raw: &str) -> String {
        let root = self.repo_root.to_string_lossy();
        let cleaned = if root.len() > 1 {
            raw.replace(root.as_ref(), ".")
        } else {
            raw.to_string()
        };
        cleaned.trim().to_string()
    }
}

#[async_trait]
impl LayerContentGenerator for LlmLayerGenerator {
    #[instrument(skip(self, request), fields(context = %request.context, aggregate = %request.aggregate, layer = %request.layer))]
    async fn generate(&self, request: &LayerRequest<'_>) -> std::result::Result<String, GenerationError> {
        let completion = Self::build_prompt(request);
        let response = self.transport.execute(&completion).await?;

        let content = self.clean_output(&response.content);
        if content.is_empty() {
            return Err(GenerationError::Backend("empty response".to_string()));
        }

        debug!(
            chars = content.len(),
            tokens = response.usage.total(),
            "Layer generated"
        );
        Ok(content)
    }

    fn name(&self) -> &str {
        self.transport.provider_name()
    }
}

fn language_of(path: &str) -> &str {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("cs") => "csharp",
        Some(ext) => ext,
        None => "",
    }
}
