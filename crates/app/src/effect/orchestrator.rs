//! Effect orchestrator — runs one session from kickoff to restoration.

use std::sync::Arc;
use std::time::Duration;

use randomizer_domain::color::EffectColor;
use randomizer_domain::effect::{EffectReport, EffectStatus, SessionPhase, describe_outcome};
use randomizer_domain::light::DesiredState;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

use super::restore::RestoreCoordinator;
use super::session::EffectSession;
use super::settings::EffectTiming;
use super::wait::deadline_after;
use super::worker::{LightWorker, WorkerContext, WorkerReport};
use crate::ports::DeviceGateway;

/// How the running phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEnd {
    /// Every worker returned on its own.
    Finished,
    /// The external interrupt fired.
    Interrupted,
    /// A worker panicked.
    Faulted,
    /// Workers were still alive after `duration + primary_grace`.
    Overdue,
}

#[derive(Default)]
struct Tally {
    reports: Vec<WorkerReport>,
    panicked: usize,
    detached: usize,
}

impl Tally {
    fn record(&mut self, joined: Result<WorkerReport, tokio::task::JoinError>) {
        match joined {
            Ok(report) => self.reports.push(report),
            Err(err) => {
                tracing::error!(%err, "light worker panicked");
                self.panicked += 1;
            }
        }
    }

    fn flips(&self) -> u64 {
        self.reports.iter().map(|r| r.flips).sum()
    }

    fn failed_writes(&self) -> u64 {
        self.reports.iter().map(|r| r.failed_writes).sum()
    }
}

/// Coordinates the workers of one session and always ends in restoration.
pub struct EffectOrchestrator<G> {
    gateway: Arc<G>,
    timing: EffectTiming,
}

impl<G: DeviceGateway + 'static> EffectOrchestrator<G> {
    pub fn new(gateway: Arc<G>, timing: EffectTiming) -> Self {
        Self { gateway, timing }
    }

    /// Run `session` to a terminal phase.
    ///
    /// Cancelling `interrupt` stops the workers early; the lights are
    /// restored either way and the report says which path was taken.
    #[tracing::instrument(skip_all, fields(group = %session.group().name))]
    pub async fn run(
        &self,
        mut session: EffectSession,
        interrupt: CancellationToken,
    ) -> EffectReport {
        let started_wall = randomizer_domain::time::now();
        enter(&mut session, SessionPhase::Starting);
        self.kickoff(&session).await;

        let (end, mut tally) = if interrupt.is_cancelled() {
            tracing::info!("interrupted before workers started");
            (RunEnd::Interrupted, Tally::default())
        } else {
            enter(&mut session, SessionPhase::Running);
            let mut workers = self.spawn_workers(&mut session);
            let mut tally = Tally::default();
            let end = self
                .await_workers(&session, &mut workers, &mut tally, &interrupt)
                .await;

            enter(&mut session, SessionPhase::Stopping);
            session.stop();
            self.drain(&mut workers, &mut tally).await;
            (end, tally)
        };

        if session.phase() == SessionPhase::Starting {
            enter(&mut session, SessionPhase::Stopping);
            session.stop();
        }

        enter(&mut session, SessionPhase::Restoring);
        let restore = RestoreCoordinator::new(Arc::clone(&self.gateway), self.timing.restore_transition)
            .restore(session.snapshot(), session.group().grouped_light)
            .await;

        let status = match end {
            RunEnd::Interrupted => EffectStatus::Interrupted,
            RunEnd::Faulted => EffectStatus::Failed,
            // A worker may still panic or hang while being drained.
            RunEnd::Finished | RunEnd::Overdue if tally.panicked > 0 || tally.detached > 0 => {
                EffectStatus::Failed
            }
            RunEnd::Finished | RunEnd::Overdue => EffectStatus::Completed,
        };
        enter(&mut session, status.phase());
        tally.reports.sort_by_key(|r| r.device_id);

        let group = session.group();
        let (message, error) = describe_outcome(status, &group.name);
        let snapshot = session.snapshot();
        tracing::info!(
            ?status,
            lights = snapshot.controlled(),
            unreachable = snapshot.unreachable().len(),
            flips = tally.flips(),
            failed_writes = tally.failed_writes(),
            "effect session finished"
        );

        EffectReport {
            success: status.is_success(),
            status,
            group_id: Some(group.id),
            group_name: Some(group.name.clone()),
            group_kind: Some(group.kind),
            duration_secs: session.duration().as_secs_f64(),
            brightness: session.brightness().value(),
            lights_controlled: snapshot.controlled(),
            unreachable_lights: snapshot.unreachable().len(),
            total_lights: snapshot.total(),
            flips: tally.flips(),
            failed_writes: tally.failed_writes(),
            restore: Some(restore),
            message: Some(message),
            error,
            available_groups: None,
            started_at: Some(started_wall),
            finished_at: randomizer_domain::time::now(),
        }
    }

    /// Paint the whole group in the first effect color with one grouped
    /// write. Skipped without a handle or for a zero duration.
    async fn kickoff(&self, session: &EffectSession) {
        let Some(handle) = session.group().grouped_light else {
            return;
        };
        if session.duration().is_zero() {
            return;
        }
        let write = DesiredState::effect(EffectColor::FIRST, session.brightness(), Duration::ZERO);
        match self.gateway.set_group_state(handle, write).await {
            Ok(()) => tracing::debug!(%handle, "kickoff applied"),
            Err(err) => tracing::warn!(%err, %handle, "kickoff failed, workers will catch up"),
        }
    }

    fn spawn_workers(&self, session: &mut EffectSession) -> JoinSet<WorkerReport> {
        let start = session.mark_started(Instant::now());
        let ctx = WorkerContext {
            gateway: Arc::clone(&self.gateway),
            start,
            duration: session.duration(),
            brightness: session.brightness(),
            timing: self.timing,
            cancel: session.cancellation_token(),
        };

        let mut workers = JoinSet::new();
        for snapshot in session.snapshot().devices() {
            workers.spawn(LightWorker::new(*snapshot, ctx.clone()).run());
        }
        tracing::info!(
            workers = workers.len(),
            duration = ?session.duration(),
            "effect running"
        );
        workers
    }

    /// Collect workers until all are done, the interrupt fires, one panics,
    /// or `duration + primary_grace` has passed since the canonical start.
    async fn await_workers(
        &self,
        session: &EffectSession,
        workers: &mut JoinSet<WorkerReport>,
        tally: &mut Tally,
        interrupt: &CancellationToken,
    ) -> RunEnd {
        let start = session.started_at().unwrap_or_else(Instant::now);
        let span = session.duration().saturating_add(self.timing.primary_grace);
        let deadline = deadline_after(start, span);

        loop {
            tokio::select! {
                biased;
                () = interrupt.cancelled() => {
                    tracing::warn!(running = workers.len(), "interrupted, stopping all lights");
                    return RunEnd::Interrupted;
                }
                joined = timeout_at(deadline, workers.join_next()) => match joined {
                    Ok(Some(joined)) => {
                        let panicked = joined.is_err();
                        tally.record(joined);
                        if panicked {
                            return RunEnd::Faulted;
                        }
                    }
                    Ok(None) => return RunEnd::Finished,
                    Err(_) => {
                        tracing::warn!(
                            running = workers.len(),
                            grace = ?self.timing.primary_grace,
                            "workers still running after primary grace"
                        );
                        return RunEnd::Overdue;
                    }
                },
            }
        }
    }

    /// Give cancelled workers `secondary_grace` to exit, then detach the rest.
    async fn drain(&self, workers: &mut JoinSet<WorkerReport>, tally: &mut Tally) {
        let deadline = deadline_after(Instant::now(), self.timing.secondary_grace);
        loop {
            match timeout_at(deadline, workers.join_next()).await {
                Ok(Some(joined)) => tally.record(joined),
                Ok(None) => return,
                Err(_) => {
                    tally.detached = workers.len();
                    tracing::error!(
                        stuck = tally.detached,
                        grace = ?self.timing.secondary_grace,
                        "workers did not stop, detaching them"
                    );
                    workers.detach_all();
                    return;
                }
            }
        }
    }
}

fn enter(session: &mut EffectSession, next: SessionPhase) {
    if let Err(err) = session.advance(next) {
        tracing::error!(%err, "session lifecycle violated");
    }
}
