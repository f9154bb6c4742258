//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Report the deadline that was missed
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from transport errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped future did not finish in time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` with a deadline of `limit`.
pub async fn with_deadline<F>(limit: Duration, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}
