//! State snapshotter — captures the pre-effect state of a group.

use std::collections::HashMap;
use std::sync::Arc;

use randomizer_domain::error::{GatewayError, SnapshotError};
use randomizer_domain::group::Group;
use randomizer_domain::id::DeviceId;
use randomizer_domain::light::{DeviceSnapshot, DeviceState};
use randomizer_domain::snapshot::SessionSnapshot;

use crate::ports::DeviceGateway;

pub struct StateSnapshotter<G> {
    gateway: Arc<G>,
}

impl<G: DeviceGateway> StateSnapshotter<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Capture every reachable member of `group`, in member order.
    ///
    /// Members missing from the bridge or without a controller binding are
    /// counted as unreachable and left out.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::EmptyGroup`] for a group without members,
    /// [`SnapshotError::Fetch`] when no read succeeded at all and
    /// [`SnapshotError::NoReachableDevices`] when nothing is left to control.
    #[tracing::instrument(skip_all, fields(group = %group.name))]
    pub async fn snapshot(&self, group: &Group) -> Result<SessionSnapshot, SnapshotError> {
        if group.members().is_empty() {
            return Err(SnapshotError::EmptyGroup {
                group: group.name.clone(),
            });
        }

        let states = self
            .fetch_members(group)
            .await
            .map_err(|source| SnapshotError::Fetch {
                group: group.name.clone(),
                source,
            })?;
        let mut devices = Vec::with_capacity(group.members().len());
        let mut unreachable = Vec::new();
        for &device_id in group.members() {
            match states.get(&device_id) {
                Some(state) if state.reachable => devices.push(DeviceSnapshot::capture(state)),
                Some(_) => {
                    tracing::warn!(%device_id, "light has no controller binding, skipping");
                    unreachable.push(device_id);
                }
                None => {
                    tracing::warn!(%device_id, "light missing from bridge state, skipping");
                    unreachable.push(device_id);
                }
            }
        }

        if devices.is_empty() {
            return Err(SnapshotError::NoReachableDevices {
                group: group.name.clone(),
                total: group.members().len(),
                unreachable: unreachable.len(),
            });
        }

        tracing::info!(
            reachable = devices.len(),
            unreachable = unreachable.len(),
            "captured pre-effect state"
        );
        Ok(SessionSnapshot::new(devices, unreachable))
    }

    /// One batched fetch, falling back to one fetch per member when it fails.
    ///
    /// Fails only when every single-light read failed too.
    async fn fetch_members(
        &self,
        group: &Group,
    ) -> Result<HashMap<DeviceId, DeviceState>, GatewayError> {
        match self.gateway.fetch_all().await {
            Ok(states) => return Ok(states.into_iter().map(|s| (s.id, s)).collect()),
            Err(err) => tracing::warn!(%err, "batched state fetch failed, fetching each light"),
        }

        let mut states = HashMap::with_capacity(group.members().len());
        let mut last_error = None;
        for &device_id in group.members() {
            match self.gateway.fetch_one(device_id).await {
                Ok(state) => {
                    states.insert(device_id, state);
                }
                Err(err) => {
                    tracing::warn!(%err, %device_id, "could not read light state");
                    last_error = Some(err);
                }
            }
        }
        match last_error {
            Some(err) if states.is_empty() => Err(err),
            _ => Ok(states),
        }
    }
}

#[cfg(test)]
mod tests {
    use randomizer_domain::color::Color;
    use randomizer_domain::group::GroupKind;

    use super::*;
    use crate::testing::{FakeBridge, light};

    fn lights(count: usize) -> Vec<DeviceState> {
        (0..count)
            .map(|i| light(true, 10.0 * (i as f64 + 1.0), Color::DEFAULT))
            .collect()
    }

    #[tokio::test]
    async fn should_capture_all_reachable_lights_in_member_order() {
        let bridge = Arc::new(FakeBridge::new());
        let states = lights(3);
        let group = bridge.add_group("Office", GroupKind::Room, states.clone(), false);

        let snapshot = StateSnapshotter::new(Arc::clone(&bridge))
            .snapshot(&group)
            .await
            .unwrap();

        let ids: Vec<DeviceId> = snapshot.devices().iter().map(|d| d.id).collect();
        assert_eq!(ids, group.members());
        assert_eq!(snapshot.devices()[1].brightness, states[1].brightness);
        assert_eq!(bridge.calls().fetch_all, 1);
        assert_eq!(bridge.calls().fetch_one, 0);
    }

    #[tokio::test]
    async fn should_exclude_unbound_and_missing_lights() {
        let bridge = Arc::new(FakeBridge::new());
        let states = lights(4);
        let group = bridge.add_group("Office", GroupKind::Room, states.clone(), false);
        bridge.set_unreachable(states[0].id);
        bridge.remove_light(states[3].id);

        let snapshot = StateSnapshotter::new(Arc::clone(&bridge))
            .snapshot(&group)
            .await
            .unwrap();

        assert_eq!(snapshot.controlled(), 2);
        assert_eq!(snapshot.unreachable(), &[states[0].id, states[3].id]);
        assert_eq!(snapshot.total(), 4);
    }

    #[tokio::test]
    async fn should_fail_for_group_without_members() {
        let bridge = Arc::new(FakeBridge::new());
        let group = bridge.add_group("Empty", GroupKind::Zone, Vec::new(), false);

        let err = StateSnapshotter::new(Arc::clone(&bridge))
            .snapshot(&group)
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::EmptyGroup { ref group } if group == "Empty"));
        assert_eq!(bridge.calls().fetch_all, 0);
    }

    #[tokio::test]
    async fn should_fail_when_nothing_is_reachable() {
        let bridge = Arc::new(FakeBridge::new());
        let states = lights(2);
        let group = bridge.add_group("Office", GroupKind::Room, states.clone(), false);
        for state in &states {
            bridge.set_unreachable(state.id);
        }

        let err = StateSnapshotter::new(bridge)
            .snapshot(&group)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SnapshotError::NoReachableDevices {
                total: 2,
                unreachable: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn should_fall_back_to_single_fetches_when_batch_fails() {
        let bridge = Arc::new(FakeBridge::new());
        let states = lights(3);
        let group = bridge.add_group("Office", GroupKind::Room, states.clone(), false);
        bridge.fail_fetch_all();
        bridge.fail_fetch_for(states[2].id);

        let snapshot = StateSnapshotter::new(Arc::clone(&bridge))
            .snapshot(&group)
            .await
            .unwrap();

        assert_eq!(bridge.calls().fetch_one, 3);
        assert_eq!(snapshot.controlled(), 2);
        assert_eq!(snapshot.unreachable(), &[states[2].id]);
    }

    #[tokio::test]
    async fn should_fail_when_no_read_succeeds() {
        let bridge = Arc::new(FakeBridge::new());
        let states = lights(2);
        let group = bridge.add_group("Office", GroupKind::Room, states.clone(), false);
        bridge.fail_fetch_all();
        for state in &states {
            bridge.fail_fetch_for(state.id);
        }

        let err = StateSnapshotter::new(Arc::clone(&bridge))
            .snapshot(&group)
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::Fetch { .. }));
        assert!(bridge.writes().is_empty());
    }
}
