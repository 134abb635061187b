//! Interruptible timed wait shared by every suspension point of the effect.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Upper bound for any deadline, roughly thirty years out.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Sleep until `deadline` unless `token` is cancelled first.
///
/// Cancellation wins ties, so an already-cancelled token never sleeps.
pub async fn wait_until(deadline: Instant, token: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        biased;
        () = token.cancelled() => WaitOutcome::Cancelled,
        () = sleep_until(deadline) => WaitOutcome::Elapsed,
    }
}

/// `from + span`, capped at a far-future instant instead of overflowing.
#[must_use]
pub fn deadline_after(from: Instant, span: Duration) -> Instant {
    from + span.min(FAR_FUTURE)
}
