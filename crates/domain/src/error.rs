//! Error types shared across the workspace.
//!
//! Each failure class of an effect session has its own typed enum. Only
//! [`ResolutionError`] and [`SnapshotError`] abort a session, and both happen
//! before any light is touched. [`GatewayError`] is what a single bridge call
//! returns; callers that have already started mutating lights log it and
//! carry on.

use crate::group::GroupSummary;

/// Domain invariant violations raised by builders.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required display name was empty.
    #[error("name must not be empty")]
    EmptyName,
}

/// A single call to the bridge failed.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a usable response (connection, TLS, timeout).
    #[error("bridge request failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The bridge answered with a non-success HTTP status.
    #[error("bridge answered with HTTP status {status}")]
    Status { status: u16 },

    /// The bridge accepted the request but reported errors in its payload.
    #[error("bridge rejected the request: {0}")]
    Rejected(String),

    /// The addressed resource does not exist on the bridge.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The response could not be decoded into domain types.
    #[error("unexpected bridge payload")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The user-supplied group identifier could not be turned into a group.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// No room or zone matched; `available` lists what the bridge knows about.
    #[error("group '{identifier}' not found")]
    NotFound {
        identifier: String,
        available: Vec<GroupSummary>,
    },

    /// The catalog lookup itself failed.
    #[error("failed to look up groups")]
    Lookup(#[from] GatewayError),
}

/// The pre-effect snapshot could not produce a single controllable light.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The group has no member lights at all.
    #[error("no lights found in group '{group}'")]
    EmptyGroup { group: String },

    /// Every member light was unreachable or failed to report its state.
    #[error("no reachable lights found in group '{group}' ({unreachable} of {total} unreachable)")]
    NoReachableDevices {
        group: String,
        total: usize,
        unreachable: usize,
    },

    /// Neither the batched read nor any single-light read succeeded.
    #[error("failed to read the state of group '{group}'")]
    Fetch {
        group: String,
        #[source]
        source: GatewayError,
    },
}

/// Why an effect session never started.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl EffectError {
    /// Groups to show the user when resolution failed to find a match.
    #[must_use]
    pub fn available_groups(&self) -> Option<&[GroupSummary]> {
        match self {
            Self::Resolution(ResolutionError::NotFound { available, .. }) => Some(available),
            _ => None,
        }
    }
}
