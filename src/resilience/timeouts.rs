//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap outbound calls with a deadline
//! - Report timeouts as a distinct error

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Run `fut`, giving up after `limit`.
pub async fn with_timeout<F, T>(limit: Duration, fut: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| TimedOut(limit))
}
