//! # randomizer-adapter-virtual
//!
//! A bridge that lives in memory. It implements both ports so the whole
//! effect can run without hardware: `randomizer --simulate` uses
//! [`VirtualBridge::demo`], and end-to-end tests build their own homes with
//! [`VirtualBridge::builder`].
//!
//! Writes are recorded in order and faults can be injected per light:
//! unreachable lights, rejected writes, failing grouped writes, and restore
//! writes that are acknowledged but never applied.
//!
//! ## Dependency rule
//!
//! Depends on `randomizer-app` (port traits) and `randomizer-domain` only.

mod light;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use randomizer_app::ports::{DeviceGateway, GroupCatalog};
use randomizer_domain::color::Color;
use randomizer_domain::error::{GatewayError, ValidationError};
use randomizer_domain::group::{Group, GroupKind};
use randomizer_domain::id::{DeviceId, GroupId, GroupedLightId};
use randomizer_domain::light::{Brightness, DesiredState, DeviceState};

use light::VirtualLight;

/// Where a recorded write was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Light(DeviceId),
    Group(GroupedLightId),
}

/// One write as the bridge received it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteRecord {
    pub target: WriteTarget,
    pub state: DesiredState,
}

/// Number of calls received per port operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch_all: usize,
    pub fetch_one: usize,
    pub set_state: usize,
    pub set_group_state: usize,
    pub list_groups: usize,
    pub fetch_group: usize,
}

#[derive(Default)]
struct Home {
    lights: Vec<VirtualLight>,
    groups: Vec<Group>,
    writes: Vec<WriteRecord>,
    calls: CallCounts,
    fail_group_writes: bool,
}

impl Home {
    fn light_mut(&mut self, id: DeviceId) -> Option<&mut VirtualLight> {
        self.lights.iter_mut().find(|l| l.state().id == id)
    }
}

/// In-memory bridge holding rooms, zones and their lights.
pub struct VirtualBridge {
    home: Mutex<Home>,
    latency: Duration,
}

/// Build a light in the state a bridge would report for it.
#[must_use]
pub fn light(name: &str, on: bool, brightness: f64, color: Color) -> DeviceState {
    DeviceState {
        id: DeviceId::new(),
        name: Some(name.to_string()),
        on,
        brightness: Brightness::new(brightness),
        color,
        reachable: true,
    }
}

impl VirtualBridge {
    #[must_use]
    pub fn builder() -> VirtualBridgeBuilder {
        VirtualBridgeBuilder::default()
    }

    /// A small home used by `--simulate`.
    ///
    /// * `Living Room` room: three lights in different states, so restore
    ///   goes light by light.
    /// * `Kitchen` room: two identical lights, restored with one grouped write.
    /// * `Upstairs` zone: a bedroom lamp and an unbound hallway light.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a group fails to build.
    pub fn demo() -> Result<Self, ValidationError> {
        let bedroom = light("Bedroom lamp", false, 35.0, Color::xy(0.4573, 0.41));
        let hallway = light("Hallway", true, 60.0, Color::Temperature { mirek: 366 });
        let bridge = Self::builder()
            .latency(Duration::from_millis(15))
            .room(
                "Living Room",
                [
                    light("Sofa", true, 80.0, Color::Temperature { mirek: 366 }),
                    light("Floor lamp", false, 40.0, Color::xy(0.4573, 0.41)),
                    light("Ceiling", true, 100.0, Color::Temperature { mirek: 250 }),
                ],
            )
            .room(
                "Kitchen",
                [
                    light("Counter", true, 70.0, Color::Temperature { mirek: 300 }),
                    light("Island", true, 70.0, Color::Temperature { mirek: 300 }),
                ],
            )
            .lights([bedroom.clone(), hallway.clone()])
            .zone("Upstairs", [bedroom.id, hallway.id])
            .build()?;
        bridge.mark_unreachable(hallway.id);
        Ok(bridge)
    }

    fn lock(&self) -> MutexGuard<'_, Home> {
        self.home.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every group, rooms first, without counting a call.
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        self.lock().groups.clone()
    }

    /// Current state of one light.
    #[must_use]
    pub fn state(&self, id: DeviceId) -> Option<DeviceState> {
        self.lock()
            .lights
            .iter()
            .find(|l| l.state().id == id)
            .map(|l| l.state().clone())
    }

    /// Every write received so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Drop the light's controller binding. It keeps reporting state but
    /// ignores writes.
    pub fn mark_unreachable(&self, id: DeviceId) {
        if let Some(light) = self.lock().light_mut(id) {
            light.mark_unreachable();
        }
    }

    /// Reject every write addressed to this light.
    pub fn fail_writes_for(&self, id: DeviceId) {
        if let Some(light) = self.lock().light_mut(id) {
            light.fail_writes();
        }
    }

    /// Reject every grouped write.
    pub fn fail_group_writes(&self) {
        self.lock().fail_group_writes = true;
    }

    /// Acknowledge the next `count` non-effect writes to this light without
    /// applying them.
    pub fn swallow_restores(&self, id: DeviceId, count: usize) {
        if let Some(light) = self.lock().light_mut(id) {
            light.swallow_restores(count);
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl DeviceGateway for VirtualBridge {
    async fn fetch_all(&self) -> Result<Vec<DeviceState>, GatewayError> {
        self.simulate_latency().await;
        let mut home = self.lock();
        home.calls.fetch_all += 1;
        Ok(home.lights.iter().map(|l| l.state().clone()).collect())
    }

    async fn fetch_one(&self, id: DeviceId) -> Result<DeviceState, GatewayError> {
        self.simulate_latency().await;
        let mut home = self.lock();
        home.calls.fetch_one += 1;
        home.lights
            .iter()
            .find(|l| l.state().id == id)
            .map(|l| l.state().clone())
            .ok_or_else(|| GatewayError::NotFound {
                kind: "light",
                id: id.to_string(),
            })
    }

    async fn set_state(&self, id: DeviceId, state: DesiredState) -> Result<(), GatewayError> {
        self.simulate_latency().await;
        let mut home = self.lock();
        home.calls.set_state += 1;
        home.writes.push(WriteRecord {
            target: WriteTarget::Light(id),
            state,
        });
        tracing::debug!(%id, ?state, "virtual light write");
        match home.light_mut(id) {
            Some(light) => light.apply(&state),
            None => Err(GatewayError::NotFound {
                kind: "light",
                id: id.to_string(),
            }),
        }
    }

    async fn set_group_state(
        &self,
        handle: GroupedLightId,
        state: DesiredState,
    ) -> Result<(), GatewayError> {
        self.simulate_latency().await;
        let mut home = self.lock();
        home.calls.set_group_state += 1;
        home.writes.push(WriteRecord {
            target: WriteTarget::Group(handle),
            state,
        });
        tracing::debug!(%handle, ?state, "virtual grouped write");
        if home.fail_group_writes {
            return Err(GatewayError::Status { status: 500 });
        }
        let members = home
            .groups
            .iter()
            .find(|g| g.grouped_light == Some(handle))
            .map(|g| g.members().to_vec())
            .ok_or_else(|| GatewayError::NotFound {
                kind: "grouped_light",
                id: handle.to_string(),
            })?;
        // A grouped write reaches every member; individual faults do not
        // fail the whole request.
        for id in members {
            if let Some(light) = home.light_mut(id) {
                let _ = light.apply(&state);
            }
        }
        Ok(())
    }
}

impl GroupCatalog for VirtualBridge {
    async fn list_groups(&self) -> Result<Vec<Group>, GatewayError> {
        self.simulate_latency().await;
        let mut home = self.lock();
        home.calls.list_groups += 1;
        Ok(home.groups.clone())
    }

    async fn fetch_group(&self, id: GroupId, kind: GroupKind) -> Result<Option<Group>, GatewayError> {
        self.simulate_latency().await;
        let mut home = self.lock();
        home.calls.fetch_group += 1;
        Ok(home
            .groups
            .iter()
            .find(|g| g.id == id && g.kind == kind)
            .cloned())
    }
}

/// Builder for a [`VirtualBridge`].
#[derive(Default)]
pub struct VirtualBridgeBuilder {
    lights: Vec<DeviceState>,
    groups: Vec<(String, GroupKind, Vec<DeviceId>)>,
    latency: Duration,
}

impl VirtualBridgeBuilder {
    /// Delay applied to every call.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Register lights that belong to no room.
    #[must_use]
    pub fn lights(mut self, lights: impl IntoIterator<Item = DeviceState>) -> Self {
        self.lights.extend(lights);
        self
    }

    /// Add a room owning `lights`, with a grouped-control handle.
    #[must_use]
    pub fn room(mut self, name: &str, lights: impl IntoIterator<Item = DeviceState>) -> Self {
        let start = self.lights.len();
        self.lights.extend(lights);
        let members = self.lights[start..].iter().map(|l| l.id).collect();
        self.groups.push((name.to_string(), GroupKind::Room, members));
        self
    }

    /// Add a zone over already registered lights. Zones get no
    /// grouped-control handle.
    #[must_use]
    pub fn zone(mut self, name: &str, members: impl IntoIterator<Item = DeviceId>) -> Self {
        self.groups
            .push((name.to_string(), GroupKind::Zone, members.into_iter().collect()));
        self
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for a group with a blank name.
    pub fn build(self) -> Result<VirtualBridge, ValidationError> {
        let mut rooms = Vec::new();
        let mut zones = Vec::new();
        for (name, kind, members) in self.groups {
            let builder = Group::builder().name(name).kind(kind).members(members);
            match kind {
                GroupKind::Room => rooms.push(builder.grouped_light(GroupedLightId::new()).build()?),
                GroupKind::Zone => zones.push(builder.build()?),
            }
        }
        rooms.extend(zones);

        Ok(VirtualBridge {
            home: Mutex::new(Home {
                lights: self.lights.into_iter().map(VirtualLight::new).collect(),
                groups: rooms,
                ..Home::default()
            }),
            latency: self.latency,
        })
    }
}

#[cfg(test)]
mod tests {
    use randomizer_domain::color::EffectColor;

    use super::*;

    fn effect() -> DesiredState {
        DesiredState::effect(EffectColor::Yellow, Brightness::FULL, Duration::ZERO)
    }

    #[test]
    fn should_build_demo_home() {
        let bridge = VirtualBridge::demo().unwrap();
        let groups = bridge.groups();

        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Living Room", "Kitchen", "Upstairs"]);
        assert!(groups[0].has_grouped_light());
        assert!(!groups[2].has_grouped_light());
        let hallway = groups[2].members()[1];
        assert!(!bridge.state(hallway).unwrap().reachable);
    }

    #[test]
    fn should_list_rooms_before_zones_regardless_of_insertion() {
        let a = light("A", true, 50.0, Color::DEFAULT);
        let bridge = VirtualBridge::builder()
            .lights([a.clone()])
            .zone("Zone", [a.id])
            .room("Room", [light("B", true, 50.0, Color::DEFAULT)])
            .build()
            .unwrap();

        let kinds: Vec<GroupKind> = bridge.groups().iter().map(|g| g.kind).collect();
        assert_eq!(kinds, vec![GroupKind::Room, GroupKind::Zone]);
    }

    #[test]
    fn should_reject_blank_group_name() {
        let result = VirtualBridge::builder().room("  ", []).build();
        assert!(matches!(result, Err(ValidationError::EmptyName)));
    }

    #[tokio::test]
    async fn should_fan_group_write_out_to_members() {
        let bridge = VirtualBridge::demo().unwrap();
        let kitchen = bridge.groups()[1].clone();

        bridge
            .set_group_state(kitchen.grouped_light.unwrap(), effect())
            .await
            .unwrap();

        for id in kitchen.members() {
            assert_eq!(bridge.state(*id).unwrap().color, EffectColor::Yellow.color());
        }
        assert_eq!(bridge.calls().set_group_state, 1);
        assert_eq!(bridge.writes().len(), 1);
    }

    #[tokio::test]
    async fn should_fail_group_writes_when_injected() {
        let bridge = VirtualBridge::demo().unwrap();
        let kitchen = bridge.groups()[1].clone();
        bridge.fail_group_writes();

        let err = bridge
            .set_group_state(kitchen.grouped_light.unwrap(), effect())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn should_record_rejected_light_write() {
        let bridge = VirtualBridge::demo().unwrap();
        let sofa = bridge.groups()[0].members()[0];
        bridge.fail_writes_for(sofa);

        assert!(bridge.set_state(sofa, effect()).await.is_err());
        assert_eq!(
            bridge.writes()[0].target,
            WriteTarget::Light(sofa)
        );
    }

    #[tokio::test]
    async fn should_report_unknown_light_as_not_found() {
        let bridge = VirtualBridge::demo().unwrap();
        let err = bridge.fetch_one(DeviceId::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { kind: "light", .. }));
    }

    #[tokio::test]
    async fn should_fetch_group_only_with_matching_kind() {
        let bridge = VirtualBridge::demo().unwrap();
        let upstairs = bridge.groups()[2].clone();

        assert!(bridge.fetch_group(upstairs.id, GroupKind::Room).await.unwrap().is_none());
        assert_eq!(
            bridge.fetch_group(upstairs.id, GroupKind::Zone).await.unwrap(),
            Some(upstairs)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_apply_latency_to_calls() {
        let bridge = VirtualBridge::builder()
            .latency(Duration::from_millis(50))
            .build()
            .unwrap();
        let started = tokio::time::Instant::now();

        bridge.fetch_all().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(50));
    }
}
