use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::ServiceError;

/// Run `work` with an upper bound on its duration.
///
/// On expiry the future is dropped together with any transaction it holds,
/// which rolls that transaction back; the caller sees a retryable
/// `StorageUnavailable`.
pub async fn bounded<T, F>(limit: Duration, work: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(limit_ms = limit.as_millis() as u64, "unit of work timed out");
            Err(ServiceError::StorageUnavailable(format!("unit of work exceeded {limit:?}")))
        }
    }
}

/// Run CPU-heavy work (password hashing) off the async workers.
pub async fn blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Unexpected(format!("blocking task failed: {e}")))?
}
