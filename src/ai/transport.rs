//! Retrying transport around an `LlmProvider`.
//!
//! Each logical call is retried on retryable failures with exponential
//! backoff: attempt `n` waits `multiplier * 2^(n-1)`, capped per attempt,
//! optionally jittered by up to a quarter of the wait. The transport gives
//! up when attempts run out or when the next wait would push cumulative
//! waiting past the total ceiling. Auth, bad-request and token-limit
//! failures surface immediately.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::provider::{CompletionRequest, LlmResponse, SharedProvider};
use crate::config::RetryConfig;
use crate::constants::retry::JITTER_DIVISOR;
use crate::types::{ErrorClassifier, Result, WikiError};

/// Backoff parameters for one logical call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts including the first
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub base_wait: Duration,
    pub max_wait_per_attempt: Duration,
    pub max_total_wait: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_wait: Duration::try_from_secs_f64(config.multiplier).unwrap_or(Duration::ZERO),
            max_wait_per_attempt: Duration::from_secs(config.max_wait_per_attempt_secs),
            max_total_wait: Duration::from_secs(config.max_total_wait_secs),
            jitter: config.jitter,
        }
    }

    /// Deterministic wait after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt.saturating_sub(1).min(31));
        self.base_wait
            .checked_mul(exp)
            .unwrap_or(self.max_wait_per_attempt)
            .min(self.max_wait_per_attempt)
    }

    /// Backoff plus jitter, still bounded by the per-attempt cap
    pub fn wait_for(&self, attempt: u32) -> Duration {
        let wait = self.backoff(attempt);
        if !self.jitter {
            return wait;
        }
        (wait + random_jitter(wait)).min(self.max_wait_per_attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Provider wrapper that applies a `RetryPolicy` to every call
pub struct RetryingTransport {
    provider: SharedProvider,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(provider: SharedProvider, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Run one logical call.
    ///
    /// Returns the first success, the first non-retryable failure as-is,
    /// or `TransportExhausted` wrapping the last failure.
    #[instrument(skip(self, request), fields(provider = %self.provider.name()))]
    pub async fn execute(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        let mut waited = Duration::ZERO;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let err = match self.provider.complete(request).await {
                Ok(response) => {
                    if attempt > 1 {
                        info!(attempt, waited_ms = waited.as_millis() as u64, "Call succeeded after retry");
                    }
                    debug!(
                        tokens = response.usage.total(),
                        duration_ms = response.timing.total_ms,
                        "Completion received"
                    );
                    return Ok(response);
                }
                Err(err) => err,
            };

            let classified = ErrorClassifier::classify_wiki_error(&err, self.provider.name());
            if !classified.is_retryable() {
                warn!(
                    attempt,
                    category = %classified.category,
                    error = %classified.message,
                    "Non-retryable failure"
                );
                return Err(err);
            }

            if attempt >= self.policy.max_attempts {
                warn!(attempt, "Retry attempts exhausted");
                return Err(exhausted(attempt, waited, err));
            }

            let wait = self.policy.wait_for(attempt);
            if waited + wait > self.policy.max_total_wait {
                warn!(
                    attempt,
                    waited_ms = waited.as_millis() as u64,
                    "Retry wait budget exhausted"
                );
                return Err(exhausted(attempt, waited, err));
            }

            warn!(
                attempt,
                wait_ms = wait.as_millis() as u64,
                category = %classified.category,
                error = %classified.message,
                "Backend call failed, retrying"
            );
            sleep(wait).await;
            waited += wait;
        }
    }
}

fn exhausted(attempts: u32, waited: Duration, last: WikiError) -> WikiError {
    WikiError::TransportExhausted {
        attempts,
        waited,
        source: Box::new(last),
    }
}

fn random_jitter(base: Duration) -> Duration {
    let max_jitter_ms = base.as_millis() as u64 / JITTER_DIVISOR;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_jitter_ms))
}
