//! Session snapshot — the pre-effect state of a whole group.

use crate::id::DeviceId;
use crate::light::DeviceSnapshot;

/// Reachable lights in group member order, plus the members that were left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    devices: Vec<DeviceSnapshot>,
    unreachable: Vec<DeviceId>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new(devices: Vec<DeviceSnapshot>, unreachable: Vec<DeviceId>) -> Self {
        Self {
            devices,
            unreachable,
        }
    }

    #[must_use]
    pub fn devices(&self) -> &[DeviceSnapshot] {
        &self.devices
    }

    #[must_use]
    pub fn unreachable(&self) -> &[DeviceId] {
        &self.unreachable
    }

    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&DeviceSnapshot> {
        self.devices.iter().find(|snapshot| snapshot.id == id)
    }

    #[must_use]
    pub fn controlled(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.devices.len() + self.unreachable.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
