//! Group resolver — turns a user-supplied identifier into a [`Group`].

use std::sync::Arc;

use randomizer_domain::error::{GatewayError, ResolutionError};
use randomizer_domain::group::{Group, GroupKind};
use randomizer_domain::id::{GroupId, GroupedLightId};

use crate::ports::GroupCatalog;

/// Optional caller knowledge that short-circuits lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveHints {
    /// Kind of the group when the identifier is an id.
    pub kind: Option<GroupKind>,
    /// Grouped-control handle to use instead of the one the bridge reports.
    pub grouped_light: Option<GroupedLightId>,
}

/// Order in which kinds are probed for an id without a kind hint. Rooms are
/// the common case, so a room id costs a single lookup.
const PROBE_ORDER: [GroupKind; 2] = [GroupKind::Room, GroupKind::Zone];

pub struct GroupResolver<C> {
    catalog: Arc<C>,
}

impl<C: GroupCatalog> GroupResolver<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Resolve `identifier`, an id or a display name.
    ///
    /// Ids are looked up directly without listing groups. Names match
    /// case-insensitively and rooms win over zones with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotFound`] with every known group when
    /// nothing matches, or [`ResolutionError::Lookup`] when the catalog fails.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        identifier: &str,
        hints: &ResolveHints,
    ) -> Result<Group, ResolutionError> {
        let identifier = identifier.trim();

        let mut group = if let Ok(id) = identifier.parse::<GroupId>() {
            match self.find_by_id(id, hints.kind).await? {
                Some(group) => group,
                None => {
                    let groups = self.catalog.list_groups().await.unwrap_or_else(|err| {
                        tracing::warn!(%err, "could not list groups for diagnostics");
                        Vec::new()
                    });
                    return Err(not_found(identifier, &groups));
                }
            }
        } else {
            let groups = self.catalog.list_groups().await?;
            match find_by_name(&groups, identifier) {
                Some(group) => group,
                None => return Err(not_found(identifier, &groups)),
            }
        };

        if let Some(handle) = hints.grouped_light {
            group = group.with_grouped_light(handle);
        }
        tracing::info!(
            group = %group.name,
            kind = %group.kind,
            lights = group.members().len(),
            grouped = group.has_grouped_light(),
            "resolved group"
        );
        Ok(group)
    }

    /// Every room followed by every zone.
    ///
    /// # Errors
    ///
    /// Returns the catalog error unchanged.
    pub async fn list(&self) -> Result<Vec<Group>, GatewayError> {
        self.catalog.list_groups().await
    }

    async fn find_by_id(
        &self,
        id: GroupId,
        kind: Option<GroupKind>,
    ) -> Result<Option<Group>, ResolutionError> {
        if let Some(kind) = kind {
            return Ok(self.catalog.fetch_group(id, kind).await?);
        }
        for kind in PROBE_ORDER {
            // A failed probe only means "not this kind".
            match self.catalog.fetch_group(id, kind).await {
                Ok(Some(group)) => return Ok(Some(group)),
                Ok(None) => {}
                Err(err) => tracing::debug!(%err, %id, %kind, "group probe failed"),
            }
        }
        Ok(None)
    }
}

fn not_found(identifier: &str, groups: &[Group]) -> ResolutionError {
    tracing::warn!(identifier, available = groups.len(), "group not found");
    ResolutionError::NotFound {
        identifier: identifier.to_string(),
        available: groups.iter().map(Group::summary).collect(),
    }
}

fn find_by_name(groups: &[Group], name: &str) -> Option<Group> {
    let of_kind = |kind: GroupKind| groups.iter().filter(move |g| g.kind == kind);
    of_kind(GroupKind::Room)
        .chain(of_kind(GroupKind::Zone))
        .find(|g| g.is_named(name))
        .cloned()
}
