//! Deadline helper for turn invocations.

use std::future::Future;
use std::time::Duration;

use crate::error::{ConductorError, Result};

/// Run `future` to completion, or fail with [`ConductorError::Timeout`]
/// once `duration` elapses.
pub async fn with_deadline<T>(
    duration: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ConductorError::Timeout(duration.as_millis() as u64)),
    }
}
