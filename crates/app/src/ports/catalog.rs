//! Group catalog port — enumerate and look up rooms and zones.

use std::future::Future;

use randomizer_domain::error::GatewayError;
use randomizer_domain::group::{Group, GroupKind};
use randomizer_domain::id::GroupId;

/// Read-only view of the groups configured on a bridge.
pub trait GroupCatalog: Send + Sync {
    /// Every room followed by every zone, each in bridge order.
    fn list_groups(&self) -> impl Future<Output = Result<Vec<Group>, GatewayError>> + Send;

    /// Look up one group of a known kind. `Ok(None)` when no such group exists.
    fn fetch_group(
        &self,
        id: GroupId,
        kind: GroupKind,
    ) -> impl Future<Output = Result<Option<Group>, GatewayError>> + Send;
}
