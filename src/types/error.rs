//! Unified Error Type System
//!
//! Centralized error types for the scanner, the documentation pipeline and
//! the generation backend.
//!
//! ## Error Categories
//!
//! - **Transient**: Temporary backend issues (retry)
//! - **RateLimit**: API rate limiting (wait and retry)
//! - **TokenLimit**: Prompt too large (give up, fall back)
//! - **Auth**: Authentication failures (fail fast)
//! - **Network**: Connectivity issues (retry with backoff)
//! - **Unavailable**: Backend unavailable (retry with backoff)
//!
//! ## Propagation
//!
//! - `WikiError` is the crate-wide error. Only configuration-level variants
//!   abort a run.
//! - `GenerationError` is what the layer content generator returns. The
//!   orchestrator turns it into fallback content.
//! - Scan problems are reported as `ScanWarning` values, never raised.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories used to decide whether a backend call is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Prompt/token limit exceeded - retrying cannot help
    TokenLimit,
    /// Authentication failed - fail fast
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Backend unavailable (5xx, overloaded) - retry with backoff
    Unavailable,
    /// Invalid request - don't retry
    BadRequest,
    /// Malformed backend response - may succeed on retry
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if a call failing with this category may be attempted again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Auth | Self::BadRequest | Self::TokenLimit)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Classified backend error
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Message fragments checked in order; the first matching row wins
const MESSAGE_RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::RateLimit,
        &["rate limit", "429", "too many requests", "quota exceeded"],
    ),
    (
        ErrorCategory::TokenLimit,
        &[
            "context length",
            "maximum context",
            "token limit",
            "tokens exceed",
            "too large",
        ],
    ),
    (
        ErrorCategory::Auth,
        &["401", "403", "api key", "unauthorized", "permission denied"],
    ),
    (
        ErrorCategory::Network,
        &["network", "connection", "dns", "timed out", "timeout", "unreachable", "error sending request"],
    ),
    (
        ErrorCategory::Unavailable,
        &["500", "502", "503", "service unavailable", "server error", "overloaded"],
    ),
    (ErrorCategory::BadRequest, &["400", "bad request", "malformed"]),
    (ErrorCategory::ParseError, &["parse", "json", "decode"]),
    (ErrorCategory::Transient, &["temporar", "try again"]),
];

/// Maps raw backend failures onto an `ErrorCategory`
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a free-form failure message
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();
        let category = MESSAGE_RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
            .map_or(ErrorCategory::Unknown, |(category, _)| *category);
        LlmError::with_provider(category, message, provider)
    }

    /// Classify by HTTP status, which is more reliable than message text
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            413 => ErrorCategory::TokenLimit,
            408 => ErrorCategory::Network,
            400 | 404 | 422 => ErrorCategory::BadRequest,
            500..=599 => ErrorCategory::Unavailable,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider)
    }

    /// Classify a `WikiError` by variant, falling back to its text
    pub fn classify_wiki_error(err: &WikiError, provider: &str) -> LlmError {
        let category = match err {
            WikiError::Llm(inner) => return inner.clone(),
            WikiError::LlmApi(msg) => return Self::classify(msg, provider),
            WikiError::Timeout { .. } | WikiError::Io(_) => ErrorCategory::Network,
            WikiError::Json(_) => ErrorCategory::ParseError,
            WikiError::Config(_) => ErrorCategory::BadRequest,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, err.to_string(), provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum WikiError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    /// Classified backend error
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Unclassified backend API error
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Retrying transport gave up; carries the last underlying error
    #[error("Transport exhausted after {attempts} attempt(s), waited {waited:?}: {source}")]
    TransportExhausted {
        attempts: u32,
        waited: Duration,
        #[source]
        source: Box<WikiError>,
    },

    // -------------------------------------------------------------------------
    // Fatal Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Repository root not found: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error("Output root not writable: {}: {reason}", path.display())]
    OutputNotWritable { path: PathBuf, reason: String },
}

impl From<LlmError> for WikiError {
    fn from(err: LlmError) -> Self {
        WikiError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, WikiError>;

impl WikiError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Check if this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::RepositoryNotFound(_) | Self::OutputNotWritable { .. }
        )
    }
}

// =============================================================================
// Generation Error
// =============================================================================

/// Failure of a single layer generation call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation backend error: {0}")]
    Backend(String),
}

impl GenerationError {
    /// Short label used in logs and run reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Backend(_) => "backend",
        }
    }
}

impl From<WikiError> for GenerationError {
    fn from(err: WikiError) -> Self {
        match err {
            WikiError::Timeout { duration, .. } => GenerationError::Timeout(duration),
            other => GenerationError::Backend(other.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::TokenLimit.to_string(), "TOKEN_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Unavailable.is_retryable());
        assert!(ErrorCategory::Unknown.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
        assert!(!ErrorCategory::TokenLimit.is_retryable());
    }

    #[test]
    fn test_classify_messages() {
        let rate = ErrorClassifier::classify("Rate limit exceeded, please retry", "openai");
        assert_eq!(rate.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify("Invalid API key provided", "openai");
        assert_eq!(auth.category, ErrorCategory::Auth);
        assert!(!auth.is_retryable());

        let net = ErrorClassifier::classify("Connection timed out after 30s", "openai");
        assert_eq!(net.category, ErrorCategory::Network);

        let unknown = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(unknown.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server_error = ErrorClassifier::classify_http_status(503, "Server error", "test");
        assert_eq!(server_error.category, ErrorCategory::Unavailable);
        assert!(server_error.is_retryable());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_generation_error_from_wiki_error() {
        let timeout: GenerationError =
            WikiError::timeout("layer call", Duration::from_secs(5)).into();
        assert_eq!(timeout, GenerationError::Timeout(Duration::from_secs(5)));
        assert_eq!(timeout.kind(), "timeout");

        let exhausted = WikiError::TransportExhausted {
            attempts: 3,
            waited: Duration::from_secs(3),
            source: Box::new(WikiError::LlmApi("503 overloaded".to_string())),
        };
        let backend: GenerationError = exhausted.into();
        assert!(matches!(backend, GenerationError::Backend(ref msg) if msg.contains("503")));
        assert_eq!(backend.kind(), "backend");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(WikiError::Config("bad".to_string()).is_fatal());
        assert!(WikiError::RepositoryNotFound(PathBuf::from("/nope")).is_fatal());
        assert!(!WikiError::LlmApi("x".to_string()).is_fatal());
        assert!(!WikiError::timeout("x", Duration::from_secs(1)).is_fatal());
    }
}
