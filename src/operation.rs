//! Guard for in-flight network calls.
//!
//! Each user-initiated operation is handed a `CancellationToken` owned by
//! the screen that started it. Navigating away cancels the token; the
//! guarded call then yields `Interrupted::Cancelled` and callers must not
//! touch their state.

use std::future::Future;
use std::time::Duration;

pub use tokio_util::sync::CancellationToken;

/// Why a guarded call produced no usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The owning screen went away.
    Cancelled,
    /// No response within the configured timeout.
    TimedOut(Duration),
}

/// Run `fut` unless `cancel` fires or `timeout` elapses first.
///
/// A result that arrives after cancellation is discarded, so the caller
/// may mutate state whenever this returns `Ok`.
pub async fn guard<F>(
    cancel: &CancellationToken,
    timeout: Duration,
    fut: F,
) -> Result<F::Output, Interrupted>
where
    F: Future,
{
    if cancel.is_cancelled() {
        return Err(Interrupted::Cancelled);
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        r = tokio::time::timeout(timeout, fut) => r.map_err(|_| Interrupted::TimedOut(timeout)),
    };

    if cancel.is_cancelled() {
        tracing::debug!("Discarding result of cancelled operation");
        return Err(Interrupted::Cancelled);
    }
    result
}
