//! Overall deadline for the async retry executor.
//!
//! Attempts that completed before the deadline keep their side effects; the
//! in-flight attempt is dropped at its next await point.

use std::future::Future;
use std::time::Duration;

use crate::resilience::retries::RetryError;

/// Race `fut` (usually [`super::execute_with_retry_async`]) against `deadline`.
pub async fn with_deadline<T, E, Fut>(deadline: Duration, fut: Fut) -> Result<T, RetryError<E>>
where
    Fut: Future<Output = Result<T, RetryError<E>>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(deadline_ms = deadline.as_millis() as u64, "Retry deadline exceeded");
            Err(RetryError::DeadlineExceeded(deadline))
        }
    }
}
