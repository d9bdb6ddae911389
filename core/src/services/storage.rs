//! Deadline for persistence calls

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::StoreError;

/// Runs a store call, failing with [`StoreError::Timeout`] once `limit`
/// elapses. The inner future is dropped on timeout.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation = operation, timeout_ms = limit.as_millis() as u64, "Storage call timed out");
            Err(StoreError::Timeout)
        }
    }
}
