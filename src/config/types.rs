//! Configuration Types
//!
//! All configuration structures with sensible defaults. Every section is
//! `#[serde(default)]` so partial files and env overrides merge cleanly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{generation, network, output, retry, scanner, snippets};
use crate::types::{Result, WikiError};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Repository, output and template locations
    pub paths: PathsConfig,

    /// Structure scanner heuristics
    pub scanner: ScannerConfig,

    /// Source snippet limits
    pub snippets: SnippetConfig,

    /// Phase 2 orchestration
    pub generation: GenerationConfig,

    /// Retrying transport
    pub retry: RetryConfig,

    /// Generation backend
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            paths: PathsConfig::default(),
            scanner: ScannerConfig::default(),
            snippets: SnippetConfig::default(),
            generation: GenerationConfig::default(),
            retry: RetryConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `WikiError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.generation.max_concurrency == 0 {
            return Err(WikiError::Config(
                "generation.max_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.generation.layer_timeout_secs == 0 {
            return Err(WikiError::Config(
                "generation.layer_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(WikiError::Config(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }

        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 0.0 {
            return Err(WikiError::Config(format!(
                "retry.multiplier must be a non-negative number, got {}",
                self.retry.multiplier
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(WikiError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(WikiError::Config(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if let Some(base_url) = &self.llm.base_url {
            url::Url::parse(base_url).map_err(|e| {
                WikiError::Config(format!("llm.base_url is not a valid URL ({}): {}", base_url, e))
            })?;
        }

        if self.scanner.domain_root.trim().is_empty() {
            return Err(WikiError::Config(
                "scanner.domain_root must not be empty".to_string(),
            ));
        }

        // The outer deadline must never cut a legitimate retry short
        let worst_case = self.transport_worst_case().ok_or_else(|| {
            WikiError::Config(format!(
                "llm.timeout_secs ({}) x retry.max_attempts ({}) is out of range",
                self.llm.timeout_secs, self.retry.max_attempts
            ))
        })?;
        if self.layer_timeout() < worst_case {
            return Err(WikiError::Config(format!(
                "generation.layer_timeout_secs ({}s) is shorter than the transport worst case ({}s); \
                 raise it or lower retry/llm timeouts",
                self.generation.layer_timeout_secs,
                worst_case.as_secs_f64().ceil()
            )));
        }

        Ok(())
    }

    /// Outer deadline for one layer call
    pub fn layer_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.layer_timeout_secs)
    }

    /// Longest time the retrying transport can spend on one logical call,
    /// `None` when it does not fit in a `Duration`
    pub fn transport_worst_case(&self) -> Option<Duration> {
        Duration::from_secs(self.llm.timeout_secs)
            .checked_mul(self.retry.max_attempts)?
            .checked_add(self.retry.worst_case_wait())
    }
}

// =============================================================================
// Paths Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Repository root to scan
    pub repo: PathBuf,

    /// Output root; relative paths are resolved against `repo`
    pub output: PathBuf,

    /// Directory holding optional `<Layer>.md` reference templates
    pub templates: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("."),
            output: PathBuf::from(output::DEFAULT_DIR),
            templates: None,
        }
    }
}

impl PathsConfig {
    /// Output root with relative paths anchored at the repository
    pub fn resolved_output(&self) -> PathBuf {
        resolve_against(&self.repo, &self.output)
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// =============================================================================
// Scanner Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Folder under the repository whose children are bounded contexts
    pub domain_root: String,

    /// Folder names never treated as bounded contexts
    pub context_deny_list: Vec<String>,

    /// Folder names never treated as aggregates
    pub action_folders: Vec<String>,

    /// Child folder names that mark their parent as an aggregate
    pub marker_folders: Vec<String>,

    /// Verb prefixes of action folders
    pub verb_prefixes: Vec<String>,

    /// Lowercased technical names dropped during cleanup
    pub noise_names: Vec<String>,

    /// Folder whose children are aggregates
    pub definitions_folder: String,

    /// Extensions of files probed for namespace declarations
    pub source_extensions: Vec<String>,

    /// Bytes read from each file when probing namespaces
    pub namespace_probe_bytes: usize,

    /// Maximum traversal depth below a bounded context
    pub max_depth: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            domain_root: scanner::DOMAIN_ROOT.to_string(),
            context_deny_list: strings(scanner::CONTEXT_DENY_LIST),
            action_folders: strings(scanner::ACTION_FOLDERS),
            marker_folders: strings(scanner::MARKER_FOLDERS),
            verb_prefixes: strings(scanner::VERB_PREFIXES),
            noise_names: strings(scanner::NOISE_NAMES),
            definitions_folder: scanner::DEFINITIONS_FOLDER.to_string(),
            source_extensions: strings(scanner::SOURCE_EXTENSIONS),
            namespace_probe_bytes: scanner::NAMESPACE_PROBE_BYTES,
            max_depth: scanner::MAX_DEPTH,
        }
    }
}

// =============================================================================
// Snippet Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Maximum files per aggregate
    pub max_files: usize,

    /// Maximum characters per file
    pub max_chars: usize,

    /// Repository folders searched besides the bounded context
    pub extra_roots: Vec<String>,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            max_files: snippets::MAX_FILES,
            max_chars: snippets::MAX_CHARS,
            extra_roots: strings(snippets::EXTRA_ROOTS),
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Concurrent aggregate tasks
    pub max_concurrency: usize,

    /// Outer deadline per layer call (seconds)
    pub layer_timeout_secs: u64,

    /// Only the first N aggregates are sent to the backend
    pub max_aggregates: Option<usize>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: generation::MAX_CONCURRENCY,
            layer_timeout_secs: generation::LAYER_TIMEOUT_SECS,
            max_aggregates: None,
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per logical call, including the first
    pub max_attempts: u32,

    /// Base wait in seconds for exponential backoff
    pub multiplier: f64,

    /// Cap on a single wait (seconds)
    pub max_wait_per_attempt_secs: u64,

    /// Cap on cumulative wait for one logical call (seconds)
    pub max_total_wait_secs: u64,

    /// Add random jitter to each wait
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            multiplier: retry::MULTIPLIER,
            max_wait_per_attempt_secs: retry::MAX_WAIT_PER_ATTEMPT_SECS,
            max_total_wait_secs: retry::MAX_TOTAL_WAIT_SECS,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Upper bound of the summed backoff waits, including jitter
    pub fn worst_case_wait(&self) -> Duration {
        let cap = Duration::from_secs(self.max_wait_per_attempt_secs);
        let ceiling = Duration::from_secs(self.max_total_wait_secs);
        let mut total = Duration::ZERO;
        for attempt in 1..self.max_attempts {
            if total >= ceiling {
                break;
            }
            let exp = 2f64.powi(attempt.saturating_sub(1).min(62) as i32);
            let wait = Duration::try_from_secs_f64(self.multiplier * exp)
                .unwrap_or(cap)
                .min(cap);
            let jitter = if self.jitter {
                wait / retry::JITTER_DIVISOR as u32
            } else {
                Duration::ZERO
            };
            total = total.saturating_add(wait.saturating_add(jitter).min(cap));
        }
        total.min(ceiling)
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (OpenAI-compatible chat completions)
    pub provider: String,

    /// Model name
    pub model: String,

    /// API base URL for self-hosted or proxy endpoints
    pub base_url: Option<String>,

    /// API key; never serialized, falls back to `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: network::DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            max_tokens: network::DEFAULT_MAX_TOKENS,
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
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.scanner.domain_root, "Application");
        assert_eq!(config.generation.max_concurrency, 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.generation.max_concurrency = 0;
        assert!(matches!(config.validate(), Err(WikiError::Config(_))));
    }

    #[test]
    fn test_layer_timeout_must_cover_transport() {
        let mut config = Config::default();
        config.generation.layer_timeout_secs = 90;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("worst case"));

        config.llm.timeout_secs = 10;
        config.retry.max_attempts = 2;
        config.retry.jitter = false;
        // 2 x 10s + 1s backoff
        assert_eq!(config.transport_worst_case(), Some(Duration::from_secs(21)));
        config.validate().unwrap();
    }

    #[test]
    fn test_huge_request_timeout_rejected_without_panic() {
        let mut config = Config::default();
        config.llm.timeout_secs = u64::MAX;
        assert_eq!(config.transport_worst_case(), None);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, WikiError::Config(ref msg) if msg.contains("out of range")));

        config.llm.timeout_secs = 180;
        config.retry.max_wait_per_attempt_secs = u64::MAX;
        config.retry.max_total_wait_secs = u64::MAX;
        config.retry.multiplier = 1e300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worst_case_wait_respects_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            multiplier: 1.0,
            max_wait_per_attempt_secs: 3,
            max_total_wait_secs: 300,
            jitter: false,
        };
        // waits: 1, 2, 3 (capped), 3 (capped)
        assert_eq!(retry.worst_case_wait(), Duration::from_secs(9));

        let tight = RetryConfig {
            max_total_wait_secs: 4,
            ..retry
        };
        assert_eq!(tight.worst_case_wait(), Duration::from_secs(4));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = Config::default();
        config.llm.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolved_output() {
        let paths = PathsConfig {
            repo: PathBuf::from("/repo"),
            output: PathBuf::from("Docs"),
            templates: None,
        };
        assert_eq!(paths.resolved_output(), PathBuf::from("/repo/Docs"));

        let absolute = PathsConfig {
            output: PathBuf::from("/tmp/wiki"),
            ..paths
        };
        assert_eq!(absolute.resolved_output(), PathBuf::from("/tmp/wiki"));
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let llm = LlmConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", llm);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
