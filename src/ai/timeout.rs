//! Deadline helpers for async backend calls.
//!
//! The orchestrator wraps every layer call in [`with_timeout`]; the inner
//! transport keeps its own per-request timeout, so the outer deadline must
//! cover the transport's full retry budget.
//!
//! ```ignore
//! let text = with_timeout(deadline, generator.generate(&request), "layer generation").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::WikiError;

/// Run `future` under a wall-clock deadline.
///
/// On expiry the future is dropped (cancelling any in-flight request) and a
/// `WikiError::Timeout` is converted into the caller's error type.
pub async fn with_timeout<T, E, F>(timeout: Duration, future: F, operation: &str) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<WikiError>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(WikiError::timeout(operation, timeout).into()),
    }
}
