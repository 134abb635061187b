//! Effect session lifecycle and the reports it produces.

use std::fmt;

use serde::Serialize;

use crate::error::EffectError;
use crate::group::{GroupKind, GroupSummary};
use crate::id::{DeviceId, GroupId};
use crate::time::Timestamp;

/// Where an effect session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Starting,
    Running,
    Stopping,
    Restoring,
    Completed,
    Failed,
    Interrupted,
}

impl SessionPhase {
    /// Allowed-transition table. Terminal phases go nowhere.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Starting)
                | (Self::Starting, Self::Running | Self::Stopping)
                | (Self::Running, Self::Stopping)
                | (Self::Stopping, Self::Restoring)
                | (
                    Self::Restoring,
                    Self::Completed | Self::Failed | Self::Interrupted
                )
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Interrupted)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Restoring => "restoring",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Interrupted => "interrupted",
        };
        f.write_str(label)
    }
}

/// A phase change the transition table does not allow.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid session transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
}

/// Final outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStatus {
    Completed,
    Interrupted,
    Failed,
    /// Resolution or snapshot failed; no light was touched.
    NotStarted,
}

impl EffectStatus {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Terminal session phase for a run that reached restoration.
    #[must_use]
    pub fn phase(self) -> SessionPhase {
        match self {
            Self::Completed => SessionPhase::Completed,
            Self::Interrupted => SessionPhase::Interrupted,
            Self::Failed | Self::NotStarted => SessionPhase::Failed,
        }
    }
}

/// Which restore tier ended up putting the lights back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreMethod {
    /// One grouped write restored every light.
    Batched,
    /// One write per light.
    PerDevice,
    /// The grouped write failed and per-light writes took over.
    BatchedWithFallback,
}

/// What the restore pass did, device by device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub method: RestoreMethod,
    /// Per-light restore writes that failed.
    pub failed: Vec<DeviceId>,
    /// Lights still showing an effect color that got a second restore.
    pub forced: Vec<DeviceId>,
    /// Lights whose forced restore failed as well.
    pub residual: Vec<DeviceId>,
    /// Lights whose state could not be re-read.
    pub unverified: Vec<DeviceId>,
}

impl RestoreReport {
    #[must_use]
    pub fn new(method: RestoreMethod) -> Self {
        Self {
            method,
            failed: Vec::new(),
            forced: Vec::new(),
            residual: Vec::new(),
            unverified: Vec::new(),
        }
    }

    /// No light is known to be left in an effect color.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.residual.is_empty()
    }

    /// Sort every list so reports are stable regardless of task completion order.
    pub fn normalize(&mut self) {
        self.failed.sort_unstable();
        self.forced.sort_unstable();
        self.residual.sort_unstable();
        self.unverified.sort_unstable();
    }
}

/// Structured result of one invocation, printed as JSON by the binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectReport {
    pub success: bool,
    pub status: EffectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_kind: Option<GroupKind>,
    /// Requested duration in seconds.
    #[serde(rename = "duration")]
    pub duration_secs: f64,
    pub brightness: f64,
    pub lights_controlled: usize,
    pub unreachable_lights: usize,
    pub total_lights: usize,
    pub flips: u64,
    pub failed_writes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<RestoreReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_groups: Option<Vec<GroupSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    pub finished_at: Timestamp,
}

impl EffectReport {
    /// Report for a session that failed before any light was touched.
    #[must_use]
    pub fn not_started(err: &EffectError, duration_secs: f64, brightness: f64) -> Self {
        let (total, unreachable) = match err {
            EffectError::Snapshot(crate::error::SnapshotError::NoReachableDevices {
                total,
                unreachable,
                ..
            }) => (*total, *unreachable),
            _ => (0, 0),
        };
        Self {
            success: false,
            status: EffectStatus::NotStarted,
            group_id: None,
            group_name: None,
            group_kind: None,
            duration_secs,
            brightness,
            lights_controlled: 0,
            unreachable_lights: unreachable,
            total_lights: total,
            flips: 0,
            failed_writes: 0,
            restore: None,
            message: None,
            error: Some(err.to_string()),
            available_groups: err.available_groups().map(<[_]>::to_vec),
            started_at: None,
            finished_at: crate::time::now(),
        }
    }
}

/// Human-readable message and error for a finished run.
#[must_use]
pub fn describe_outcome(status: EffectStatus, group_name: &str) -> (String, Option<String>) {
    match status {
        EffectStatus::Completed => (
            format!("Randomizer effect completed on '{group_name}'"),
            None,
        ),
        EffectStatus::Interrupted => (
            "All lights restored after interruption".to_string(),
            Some("Effect was interrupted".to_string()),
        ),
        EffectStatus::Failed => (
            format!("Lights in '{group_name}' were restored after a failure"),
            Some("Effect failed".to_string()),
        ),
        EffectStatus::NotStarted => (
            format!("Randomizer effect did not start on '{group_name}'"),
            Some("Effect did not start".to_string()),
        ),
    }
}
