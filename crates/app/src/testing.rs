//! Recording in-memory bridge used by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use randomizer_domain::color::{Color, EffectColor};
use randomizer_domain::error::GatewayError;
use randomizer_domain::group::{Group, GroupKind};
use randomizer_domain::id::{DeviceId, GroupId, GroupedLightId};
use randomizer_domain::light::{Brightness, DesiredState, DeviceState};
use tokio::time::Instant;

use crate::ports::{DeviceGateway, GroupCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Device(DeviceId),
    Group(GroupedLightId),
}

#[derive(Debug, Clone, Copy)]
pub struct Write {
    pub target: Target,
    pub state: DesiredState,
    pub at: Instant,
}

impl Write {
    pub fn is_effect(&self) -> bool {
        self.state
            .color
            .and_then(EffectColor::detect)
            .is_some()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub fetch_all: usize,
    pub fetch_one: usize,
    pub set_state: usize,
    pub set_group_state: usize,
    pub list_groups: usize,
    pub fetch_group: usize,
}

#[derive(Default)]
struct Inner {
    groups: Vec<Group>,
    lights: Vec<DeviceState>,
    calls: Calls,
    writes: Vec<Write>,
    failing: HashSet<DeviceId>,
    failing_fetch: HashSet<DeviceId>,
    swallow_restores: HashMap<DeviceId, usize>,
    fail_group_writes: bool,
    fail_fetch_all: bool,
    fail_fetch_group: bool,
}

#[derive(Default)]
pub struct FakeBridge {
    inner: Mutex<Inner>,
    write_delay: Duration,
}

pub fn light(on: bool, brightness: f64, color: Color) -> DeviceState {
    DeviceState {
        id: DeviceId::new(),
        name: None,
        on,
        brightness: Brightness::new(brightness),
        color,
        reachable: true,
    }
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write takes this long before it is applied.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `lights` and a group owning them. Returns the group.
    pub fn add_group(
        &self,
        name: &str,
        kind: GroupKind,
        lights: Vec<DeviceState>,
        with_handle: bool,
    ) -> Group {
        let mut builder = Group::builder()
            .name(name)
            .kind(kind)
            .members(lights.iter().map(|light| light.id));
        if with_handle {
            builder = builder.grouped_light(GroupedLightId::new());
        }
        let group = builder.build().unwrap();
        let mut inner = self.lock();
        inner.lights.extend(lights);
        inner.groups.push(group.clone());
        group
    }

    /// Registered groups in insertion order, without counting a call.
    pub fn groups(&self) -> Vec<Group> {
        self.lock().groups.clone()
    }

    pub fn set_unreachable(&self, id: DeviceId) {
        if let Some(light) = self.lock().lights.iter_mut().find(|l| l.id == id) {
            light.reachable = false;
        }
    }

    pub fn remove_light(&self, id: DeviceId) {
        self.lock().lights.retain(|l| l.id != id);
    }

    pub fn fail_writes_for(&self, id: DeviceId) {
        self.lock().failing.insert(id);
    }

    pub fn fail_fetch_for(&self, id: DeviceId) {
        self.lock().failing_fetch.insert(id);
    }

    pub fn fail_group_writes(&self) {
        self.lock().fail_group_writes = true;
    }

    pub fn fail_fetch_all(&self) {
        self.lock().fail_fetch_all = true;
    }

    pub fn fail_fetch_group(&self) {
        self.lock().fail_fetch_group = true;
    }

    /// Ignore the next `count` non-effect writes to `id`.
    pub fn swallow_restores(&self, id: DeviceId, count: usize) {
        self.lock().swallow_restores.insert(id, count);
    }

    pub fn calls(&self) -> Calls {
        self.lock().calls
    }

    pub fn writes(&self) -> Vec<Write> {
        self.lock().writes.clone()
    }

    pub fn writes_to(&self, id: DeviceId) -> Vec<Write> {
        self.writes()
            .into_iter()
            .filter(|w| w.target == Target::Device(id))
            .collect()
    }

    pub fn state(&self, id: DeviceId) -> DeviceState {
        self.lock()
            .lights
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .unwrap()
    }

    fn apply(inner: &mut Inner, id: DeviceId, state: &DesiredState) {
        let is_effect = state.color.and_then(EffectColor::detect).is_some();
        if !is_effect {
            if let Some(remaining) = inner.swallow_restores.get_mut(&id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return;
                }
            }
        }
        if let Some(light) = inner.lights.iter_mut().find(|l| l.id == id) {
            state.apply_to(light);
        }
    }
}

impl DeviceGateway for FakeBridge {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<DeviceState>, GatewayError>> + Send {
        let mut inner = self.lock();
        inner.calls.fetch_all += 1;
        let result = if inner.fail_fetch_all {
            Err(GatewayError::Status { status: 503 })
        } else {
            Ok(inner.lights.clone())
        };
        async { result }
    }

    fn fetch_one(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<DeviceState, GatewayError>> + Send {
        let mut inner = self.lock();
        inner.calls.fetch_one += 1;
        let result = if inner.failing_fetch.contains(&id) {
            Err(GatewayError::Status { status: 503 })
        } else {
            inner
                .lights
                .iter()
                .find(|l| l.id == id)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound {
                    kind: "light",
                    id: id.to_string(),
                })
        };
        async { result }
    }

    async fn set_state(&self, id: DeviceId, state: DesiredState) -> Result<(), GatewayError> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        let mut inner = self.lock();
        inner.calls.set_state += 1;
        inner.writes.push(Write {
            target: Target::Device(id),
            state,
            at: Instant::now(),
        });
        if inner.failing.contains(&id) {
            return Err(GatewayError::Rejected(format!("light {id} is failing")));
        }
        Self::apply(&mut inner, id, &state);
        Ok(())
    }

    async fn set_group_state(
        &self,
        handle: GroupedLightId,
        state: DesiredState,
    ) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        inner.calls.set_group_state += 1;
        inner.writes.push(Write {
            target: Target::Group(handle),
            state,
            at: Instant::now(),
        });
        if inner.fail_group_writes {
            return Err(GatewayError::Status { status: 500 });
        }
        let members: Vec<DeviceId> = inner
            .groups
            .iter()
            .find(|g| g.grouped_light == Some(handle))
            .map(|g| g.members().to_vec())
            .unwrap_or_default();
        for id in members {
            Self::apply(&mut inner, id, &state);
        }
        Ok(())
    }
}

impl GroupCatalog for FakeBridge {
    fn list_groups(&self) -> impl Future<Output = Result<Vec<Group>, GatewayError>> + Send {
        let mut inner = self.lock();
        inner.calls.list_groups += 1;
        let rooms = inner.groups.iter().filter(|g| g.kind == GroupKind::Room);
        let zones = inner.groups.iter().filter(|g| g.kind == GroupKind::Zone);
        let result = Ok(rooms.chain(zones).cloned().collect());
        async { result }
    }

    fn fetch_group(
        &self,
        id: GroupId,
        kind: GroupKind,
    ) -> impl Future<Output = Result<Option<Group>, GatewayError>> + Send {
        let mut inner = self.lock();
        inner.calls.fetch_group += 1;
        let result = if inner.fail_fetch_group {
            Err(GatewayError::Status { status: 503 })
        } else {
            Ok(inner
                .groups
                .iter()
                .find(|g| g.id == id && g.kind == kind)
                .cloned())
        };
        async { result }
    }
}
