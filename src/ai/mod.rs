//! AI Integration Layer
//!
//! Provider abstraction, retrying transport, prompt construction and the
//! LLM-backed layer content generator.

pub mod generator;
pub mod profiles;
pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod transport;

pub use generator::{LayerContentGenerator, LayerRequest, LlmLayerGenerator, SharedGenerator};
pub use profiles::LayerProfile;
pub use prompt::{PromptBuilder, PromptSection};
pub use provider::{
    CompletionRequest, LlmProvider, LlmResponse, OpenAiProvider, ResponseMetadata,
    ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
pub use timeout::with_timeout;
pub use transport::{RetryPolicy, RetryingTransport};
