//! Effect session — the state of one run from snapshot to restoration.

use std::time::Duration;

use randomizer_domain::effect::{InvalidTransition, SessionPhase};
use randomizer_domain::group::Group;
use randomizer_domain::light::Brightness;
use randomizer_domain::snapshot::SessionSnapshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One run of the effect on one group.
///
/// Built only once a snapshot with at least one reachable light exists, so
/// every light a worker touches has a restore target.
#[derive(Debug)]
pub struct EffectSession {
    group: Group,
    duration: Duration,
    brightness: Brightness,
    snapshot: SessionSnapshot,
    phase: SessionPhase,
    started_at: Option<Instant>,
    cancel: CancellationToken,
}

impl EffectSession {
    #[must_use]
    pub fn new(
        group: Group,
        duration: Duration,
        brightness: Brightness,
        snapshot: SessionSnapshot,
    ) -> Self {
        Self {
            group,
            duration,
            brightness,
            snapshot,
            phase: SessionPhase::Idle,
            started_at: None,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    #[must_use]
    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Canonical start instant, once set.
    #[must_use]
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Move to `next` if the transition table allows it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] and leaves the phase unchanged otherwise.
    pub fn advance(&mut self, next: SessionPhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(from = %self.phase, to = %next, "session phase changed");
        self.phase = next;
        Ok(())
    }

    /// Fix the canonical start instant. Later calls return the first value.
    pub fn mark_started(&mut self, now: Instant) -> Instant {
        *self.started_at.get_or_insert(now)
    }

    /// Handle shared with every worker of this session.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every worker. Idempotent; a stopped session never resumes.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
