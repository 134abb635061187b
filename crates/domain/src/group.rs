//! Group — a room or zone whose lights run the effect together.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DeviceId, GroupId, GroupedLightId};

/// Whether a group is a physical room or a free-form zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    Room,
    Zone,
}

impl GroupKind {
    /// Resource path segment the bridge uses for this kind.
    #[must_use]
    pub fn resource(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Zone => "zone",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room => f.write_str("Room"),
            Self::Zone => f.write_str("Zone"),
        }
    }
}

/// Returned when a string is neither `room` nor `zone`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown group kind '{0}', expected 'room' or 'zone'")]
pub struct ParseGroupKindError(String);

impl FromStr for GroupKind {
    type Err = ParseGroupKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "room" => Ok(Self::Room),
            "zone" => Ok(Self::Zone),
            _ => Err(ParseGroupKindError(s.to_string())),
        }
    }
}

/// A resolved room or zone. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub kind: GroupKind,
    members: Vec<DeviceId>,
    pub grouped_light: Option<GroupedLightId>,
}

impl Group {
    /// Create a builder for constructing a [`Group`].
    #[must_use]
    pub fn builder() -> GroupBuilder {
        GroupBuilder::default()
    }

    /// Member lights in bridge order, without duplicates.
    #[must_use]
    pub fn members(&self) -> &[DeviceId] {
        &self.members
    }

    /// Whether a single grouped write can address every member.
    #[must_use]
    pub fn has_grouped_light(&self) -> bool {
        self.grouped_light.is_some()
    }

    /// Replace the grouped-control handle, e.g. from a caller-supplied hint.
    #[must_use]
    pub fn with_grouped_light(mut self, handle: GroupedLightId) -> Self {
        self.grouped_light = Some(handle);
        self
    }

    /// Case-insensitive exact comparison against the display name.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Lightweight view used in diagnostics and listings.
    #[must_use]
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
        }
    }
}

/// Identity of a group, without its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
}

/// Step-by-step builder for [`Group`].
#[derive(Debug)]
pub struct GroupBuilder {
    id: Option<GroupId>,
    name: Option<String>,
    kind: GroupKind,
    members: Vec<DeviceId>,
    grouped_light: Option<GroupedLightId>,
}

impl Default for GroupBuilder {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            kind: GroupKind::Room,
            members: Vec::new(),
            grouped_light: None,
        }
    }
}

impl GroupBuilder {
    #[must_use]
    pub fn id(mut self, id: GroupId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: GroupKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn member(mut self, id: DeviceId) -> Self {
        self.members.push(id);
        self
    }

    #[must_use]
    pub fn members(mut self, ids: impl IntoIterator<Item = DeviceId>) -> Self {
        self.members.extend(ids);
        self
    }

    #[must_use]
    pub fn grouped_light(mut self, handle: GroupedLightId) -> Self {
        self.grouped_light = Some(handle);
        self
    }

    /// Consume the builder, validate, and return a [`Group`].
    ///
    /// Repeated member ids keep their first position.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] if `name` is missing or blank.
    pub fn build(self) -> Result<Group, ValidationError> {
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut members = Vec::with_capacity(self.members.len());
        for id in self.members {
            if !members.contains(&id) {
                members.push(id);
            }
        }

        Ok(Group {
            id: self.id.unwrap_or_default(),
            name,
            kind: self.kind,
            members,
            grouped_light: self.grouped_light,
        })
    }
}
