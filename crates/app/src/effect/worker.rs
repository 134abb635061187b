//! Light worker — the per-light oscillation loop.

use std::sync::Arc;
use std::time::Duration;

use randomizer_domain::color::EffectColor;
use randomizer_domain::id::DeviceId;
use randomizer_domain::light::{Brightness, DesiredState, DeviceSnapshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::settings::EffectTiming;
use super::wait::{WaitOutcome, deadline_after, wait_until};
use crate::ports::DeviceGateway;

/// Values shared read-only by every worker of one session.
pub struct WorkerContext<G> {
    pub gateway: Arc<G>,
    /// Canonical start instant, set once before any worker is spawned.
    pub start: Instant,
    pub duration: Duration,
    pub brightness: Brightness,
    pub timing: EffectTiming,
    pub cancel: CancellationToken,
}

impl<G> Clone for WorkerContext<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            start: self.start,
            duration: self.duration,
            brightness: self.brightness,
            timing: self.timing,
            cancel: self.cancel.clone(),
        }
    }
}

/// What one worker did before it exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub device_id: DeviceId,
    /// Writes attempted, successful or not.
    pub flips: u64,
    pub failed_writes: u64,
    /// The worker exited because the session was stopped.
    pub cancelled: bool,
}

/// Drives one light between the two effect colors until the duration ends or
/// the session is cancelled. Never restores the light itself.
pub struct LightWorker<G> {
    snapshot: DeviceSnapshot,
    offset: Duration,
    ctx: WorkerContext<G>,
}

impl<G: DeviceGateway> LightWorker<G> {
    /// Create a worker with a phase offset drawn from the jitter window.
    pub fn new(snapshot: DeviceSnapshot, ctx: WorkerContext<G>) -> Self {
        let offset = ctx.timing.jitter.sample(&mut rand::thread_rng());
        Self::with_offset(snapshot, offset, ctx)
    }

    #[must_use]
    pub fn with_offset(snapshot: DeviceSnapshot, offset: Duration, ctx: WorkerContext<G>) -> Self {
        Self {
            snapshot,
            offset,
            ctx,
        }
    }

    #[tracing::instrument(skip_all, fields(device_id = %self.snapshot.id, offset = ?self.offset))]
    pub async fn run(self) -> WorkerReport {
        let Self {
            snapshot,
            offset,
            ctx,
        } = self;
        let device_id = snapshot.id;
        let end = deadline_after(ctx.start, ctx.duration);
        let mut report = WorkerReport {
            device_id,
            flips: 0,
            failed_writes: 0,
            cancelled: false,
        };

        let mut scheduled = ctx.start + offset;
        if wait_until(scheduled.min(end), &ctx.cancel).await == WaitOutcome::Cancelled {
            report.cancelled = true;
            return report;
        }

        let mut color = EffectColor::FIRST;
        while Instant::now() < end {
            if ctx.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            report.flips += 1;
            let write = DesiredState::effect(color, ctx.brightness, ctx.timing.flip_transition);
            // A failed flip is counted and skipped; the loop keeps its schedule.
            match ctx.gateway.set_state(device_id, write).await {
                Ok(()) => tracing::debug!(?color, "flipped"),
                Err(err) => {
                    report.failed_writes += 1;
                    tracing::warn!(%err, %device_id, ?color, "flip failed");
                }
            }

            if Instant::now() >= end {
                break;
            }

            color = color.toggled();
            scheduled += ctx.timing.flip_interval;
            if wait_until(scheduled.min(end), &ctx.cancel).await == WaitOutcome::Cancelled {
                report.cancelled = true;
                break;
            }
        }

        tracing::debug!(
            flips = report.flips,
            failed = report.failed_writes,
            cancelled = report.cancelled,
            "worker finished"
        );
        report
    }
}
