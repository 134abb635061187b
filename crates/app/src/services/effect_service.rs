//! Effect service — the randomizer use-case from identifier to report.

use std::sync::Arc;
use std::time::Duration;

use randomizer_domain::effect::EffectReport;
use randomizer_domain::error::{EffectError, GatewayError};
use randomizer_domain::group::{Group, GroupSummary};
use randomizer_domain::light::Brightness;
use tokio_util::sync::CancellationToken;

use super::group_resolver::{GroupResolver, ResolveHints};
use super::snapshotter::StateSnapshotter;
use crate::effect::{EffectOrchestrator, EffectSession, EffectTiming};
use crate::ports::{DeviceGateway, GroupCatalog};

/// One invocation of the effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    /// Group id or display name.
    pub identifier: String,
    pub duration: Duration,
    pub brightness: Brightness,
    pub hints: ResolveHints,
}

/// Chains group resolution, snapshotting and orchestration.
pub struct EffectService<C, G> {
    resolver: GroupResolver<C>,
    snapshotter: StateSnapshotter<G>,
    orchestrator: EffectOrchestrator<G>,
}

impl<C, G> EffectService<C, G>
where
    C: GroupCatalog,
    G: DeviceGateway + 'static,
{
    pub fn new(catalog: Arc<C>, gateway: Arc<G>, timing: EffectTiming) -> Self {
        Self {
            resolver: GroupResolver::new(catalog),
            snapshotter: StateSnapshotter::new(Arc::clone(&gateway)),
            orchestrator: EffectOrchestrator::new(gateway, timing),
        }
    }

    /// Summaries of every room, then every zone.
    ///
    /// # Errors
    ///
    /// Returns the catalog error unchanged.
    pub async fn list_groups(&self) -> Result<Vec<GroupSummary>, GatewayError> {
        let groups = self.resolver.list().await?;
        Ok(groups.iter().map(Group::summary).collect())
    }

    /// Resolve the group and capture its state. No light is touched.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::Resolution`] when the group cannot be found and
    /// [`EffectError::Snapshot`] when it has nothing to control.
    #[tracing::instrument(skip(self), fields(identifier = %request.identifier))]
    pub async fn prepare(&self, request: &EffectRequest) -> Result<EffectSession, EffectError> {
        let group = self
            .resolver
            .resolve(&request.identifier, &request.hints)
            .await?;
        let snapshot = self.snapshotter.snapshot(&group).await?;
        Ok(EffectSession::new(
            group,
            request.duration,
            request.brightness,
            snapshot,
        ))
    }

    /// Prepare and run a full session. Always produces a report.
    #[tracing::instrument(skip(self, interrupt), fields(identifier = %request.identifier))]
    pub async fn run(&self, request: &EffectRequest, interrupt: CancellationToken) -> EffectReport {
        match self.prepare(request).await {
            Ok(session) => self.orchestrator.run(session, interrupt).await,
            Err(err) => {
                tracing::error!(%err, "effect did not start");
                EffectReport::not_started(
                    &err,
                    request.duration.as_secs_f64(),
                    request.brightness.value(),
                )
            }
        }
    }
}
