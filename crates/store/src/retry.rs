//! Fixed-interval retry for document-store operations.
//!
//! Store calls are retried up to [`RETRY_ATTEMPTS`] times at
//! [`RETRY_DELAY`] intervals; each failed attempt is warn-logged with
//! the project name so operators can tell the databases apart. The
//! expected failure cause is transport-level, which is why even
//! non-idempotent operations go through this path.

use std::future::Future;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};

/// Retries after the initial attempt.
pub const RETRY_ATTEMPTS: u32 = 2;

/// Pause between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Run `op` until it succeeds or the retry budget is exhausted.
pub async fn with_retry<T, F, Fut>(project: &str, operation: &'static str, mut op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut last_error: Option<StoreError> = None;

    for attempt in 0..=RETRY_ATTEMPTS {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY).await;
        }
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    project,
                    operation,
                    attempt = attempt + 1,
                    error = %e,
                    "Store operation failed"
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| StoreError::Unavailable("retry budget exhausted".to_string())))
}
