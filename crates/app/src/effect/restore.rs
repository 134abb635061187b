//! Restore coordinator — puts every light back the way it was captured.
//!
//! Restoration is tiered: one grouped write when every snapshot is
//! equivalent and the group has a handle, otherwise (or when that write
//! fails) one write per light. A verification sweep then re-reads each light
//! and forces one more write on any light still showing an effect color.

use std::sync::Arc;
use std::time::Duration;

use randomizer_domain::color::EffectColor;
use randomizer_domain::effect::{RestoreMethod, RestoreReport};
use randomizer_domain::id::{DeviceId, GroupedLightId};
use randomizer_domain::light::DeviceSnapshot;
use randomizer_domain::snapshot::SessionSnapshot;
use tokio::task::JoinSet;

use crate::ports::DeviceGateway;

/// Batch-vs-individual restore decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestorePlan {
    /// Every snapshot is equivalent; restore them all through `handle`
    /// using `template` as the common state.
    Batched {
        handle: GroupedLightId,
        template: DeviceSnapshot,
    },
    PerDevice,
}

impl RestorePlan {
    /// Batch only when a handle exists and every pair of snapshots is
    /// equivalent within restore tolerance.
    ///
    /// Pairs are compared directly since tolerance-equality is not transitive.
    #[must_use]
    pub fn decide(snapshots: &[DeviceSnapshot], handle: Option<GroupedLightId>) -> Self {
        let (Some(handle), Some(first)) = (handle, snapshots.first()) else {
            return Self::PerDevice;
        };
        let uniform = snapshots
            .iter()
            .enumerate()
            .all(|(i, a)| snapshots[i + 1..].iter().all(|b| a.equivalent(b)));
        if uniform {
            Self::Batched {
                handle,
                template: *first,
            }
        } else {
            Self::PerDevice
        }
    }
}

pub struct RestoreCoordinator<G> {
    gateway: Arc<G>,
    transition: Duration,
}

impl<G: DeviceGateway + 'static> RestoreCoordinator<G> {
    pub fn new(gateway: Arc<G>, transition: Duration) -> Self {
        Self {
            gateway,
            transition,
        }
    }

    /// Restore every light in `snapshot`, then verify.
    ///
    /// Never fails: every problem is logged and recorded in the report.
    #[tracing::instrument(skip_all, fields(lights = snapshot.controlled()))]
    pub async fn restore(
        &self,
        snapshot: &SessionSnapshot,
        handle: Option<GroupedLightId>,
    ) -> RestoreReport {
        let devices = snapshot.devices();
        let mut report = match RestorePlan::decide(devices, handle) {
            RestorePlan::Batched { handle, template } => {
                let target = template.restore_target(self.transition);
                match self.gateway.set_group_state(handle, target).await {
                    Ok(()) => {
                        tracing::info!(%handle, "restored group with one grouped write");
                        RestoreReport::new(RestoreMethod::Batched)
                    }
                    Err(err) => {
                        tracing::warn!(%err, %handle, "grouped restore failed, restoring each light");
                        let mut report = RestoreReport::new(RestoreMethod::BatchedWithFallback);
                        report.failed = self.restore_each(devices).await;
                        report
                    }
                }
            }
            RestorePlan::PerDevice => {
                let mut report = RestoreReport::new(RestoreMethod::PerDevice);
                report.failed = self.restore_each(devices).await;
                report
            }
        };

        self.verify(devices, &mut report).await;
        report.normalize();

        if report.is_clean() {
            tracing::info!(
                method = ?report.method,
                forced = report.forced.len(),
                unverified = report.unverified.len(),
                "restore finished"
            );
        } else {
            tracing::error!(
                method = ?report.method,
                residual = report.residual.len(),
                "some lights could not be restored"
            );
        }
        report
    }

    /// One concurrent write per light. Returns the lights whose write failed.
    async fn restore_each(&self, devices: &[DeviceSnapshot]) -> Vec<DeviceId> {
        let mut tasks = JoinSet::new();
        for device in devices {
            let gateway = Arc::clone(&self.gateway);
            let id = device.id;
            let target = device.restore_target(self.transition);
            tasks.spawn(async move { (id, gateway.set_state(id, target).await) });
        }

        let mut failed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((device_id, Err(err))) => {
                    tracing::warn!(%err, %device_id, "restore write failed");
                    failed.push(device_id);
                }
                Err(err) => tracing::error!(%err, "restore task panicked"),
            }
        }
        failed
    }

    /// Re-read each light and force a second restore on any light still
    /// showing an effect color it did not have before.
    async fn verify(&self, devices: &[DeviceSnapshot], report: &mut RestoreReport) {
        for device in devices {
            let device_id = device.id;
            let current = match self.gateway.fetch_one(device_id).await {
                Ok(current) => current,
                Err(err) => {
                    tracing::warn!(%err, %device_id, "could not verify restored light");
                    report.unverified.push(device_id);
                    continue;
                }
            };

            let Some(color) = EffectColor::detect(current.color) else {
                continue;
            };
            if device.matches_state(&current) {
                continue;
            }

            tracing::warn!(%device_id, ?color, "light still at effect color, forcing restore");
            report.forced.push(device_id);
            if let Err(err) = self
                .gateway
                .set_state(device_id, device.restore_target(self.transition))
                .await
            {
                tracing::error!(%err, %device_id, "forced restore failed");
                report.residual.push(device_id);
            }
        }
    }
}
