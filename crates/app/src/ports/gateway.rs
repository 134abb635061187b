//! Device gateway port — read and write light state on a bridge.

use std::future::Future;

use randomizer_domain::error::GatewayError;
use randomizer_domain::id::{DeviceId, GroupedLightId};
use randomizer_domain::light::{DesiredState, DeviceState};

/// Outbound transport to the lights.
///
/// Implementations live in adapter crates (e.g. `adapters/hue`). Every call
/// is independent; callers that are already mutating lights treat a returned
/// error as non-fatal and carry on.
pub trait DeviceGateway: Send + Sync {
    /// Fetch the state of every light the bridge knows about, in one call.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<DeviceState>, GatewayError>> + Send;

    /// Fetch the state of a single light.
    fn fetch_one(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<DeviceState, GatewayError>> + Send;

    /// Apply a partial write to a single light.
    fn set_state(
        &self,
        id: DeviceId,
        state: DesiredState,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Apply a partial write to every member behind a grouped-control handle.
    fn set_group_state(
        &self,
        handle: GroupedLightId,
        state: DesiredState,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
