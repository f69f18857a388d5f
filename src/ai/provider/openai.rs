//! OpenAI-compatible Chat Completions provider.
//!
//! Works against api.openai.com as well as local gateways exposing the same
//! `/chat/completions` route. Failed responses are classified by HTTP
//! status so the transport knows whether a retry can help.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{
    CompletionRequest, LlmProvider, LlmResponse, ResponseMetadata, ResponseTiming, TokenUsage,
};
use crate::config::LlmConfig;
use crate::constants::network::{CONNECTION_TIMEOUT_SECS, DEFAULT_API_BASE};
use crate::types::{ErrorClassifier, Result, WikiError};

const PROVIDER: &str = "openai";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// Never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                WikiError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY or llm.api_key".to_string(),
                )
            })?;

        let api_base = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| WikiError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.api_base, route)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        debug!(model = %self.model, "Sending chat completion");
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| {
                WikiError::Llm(ErrorClassifier::classify(&format!("request failed: {e}"), PROVIDER))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(WikiError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("HTTP {status}: {detail}"),
                PROVIDER,
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| WikiError::LlmApi(format!("malformed chat completion: {e}")))?;

        let usage = body
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        let Some(content) = body.choices.into_iter().find_map(|c| c.message.content) else {
            return Err(WikiError::LlmApi("chat completion had no content".to_string()));
        };

        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(started.elapsed()),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    /// `GET /models`; any transport failure counts as unavailable
    async fn health_check(&self) -> Result<bool> {
        let reachable = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map(|resp| resp.status().is_success());

        match reachable {
            Ok(ok) => {
                debug!(available = ok, "Backend health check");
                Ok(ok)
            }
            Err(e) => {
                warn!(error = %e, "Backend health check failed");
                Ok(false)
            }
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(&LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(provider().api_base, "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_carries_both_messages() {
        let provider = provider();
        let completion = CompletionRequest::new("sys", "usr");
        let json = serde_json::to_value(provider.build_request(&completion)).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_str(
            r##"{"choices":[{"message":{"content":"# Doc"}}],"usage":{"prompt_tokens":3,"completion_tokens":4}}"##,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("# Doc"));
        assert_eq!(body.usage.unwrap().completion_tokens, 4);
    }
}
