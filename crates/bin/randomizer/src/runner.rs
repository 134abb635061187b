//! Runs one [`Command`] against any bridge and renders what to print.

use std::fmt::Write as _;
use std::sync::Arc;

use randomizer_app::effect::EffectTiming;
use randomizer_app::ports::{DeviceGateway, GroupCatalog};
use randomizer_app::services::EffectService;
use randomizer_domain::error::GatewayError;
use randomizer_domain::group::GroupSummary;
use tokio_util::sync::CancellationToken;

use crate::cli::Command;

/// What to print on stdout and how to exit.
#[derive(Debug)]
pub struct Outcome {
    pub stdout: String,
    pub success: bool,
}

/// Failures that prevent producing any output.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to list groups")]
    Groups(#[from] GatewayError),
    #[error("failed to encode output")]
    Encode(#[from] serde_json::Error),
}

/// Execute `command` with `bridge` serving as both catalog and gateway.
///
/// # Errors
///
/// Returns [`RunError`] when listing groups fails or output cannot be
/// encoded. Effect failures are reported in the outcome, not as errors.
pub async fn execute<B>(
    bridge: Arc<B>,
    command: Command,
    timing: EffectTiming,
    interrupt: CancellationToken,
) -> Result<Outcome, RunError>
where
    B: GroupCatalog + DeviceGateway + 'static,
{
    let service = EffectService::new(Arc::clone(&bridge), bridge, timing);
    match command {
        Command::List => {
            let groups = service.list_groups().await?;
            Ok(Outcome {
                stdout: serde_json::to_string_pretty(&groups)?,
                success: true,
            })
        }
        Command::Usage => {
            let groups = service.list_groups().await?;
            Ok(Outcome {
                stdout: usage(&groups),
                success: false,
            })
        }
        Command::Run(request) => {
            let report = service.run(&request, interrupt).await;
            tracing::info!(
                status = ?report.status,
                flips = report.flips,
                "session finished"
            );
            Ok(Outcome {
                stdout: serde_json::to_string_pretty(&report)?,
                success: report.success,
            })
        }
    }
}

fn usage(groups: &[GroupSummary]) -> String {
    let mut out = String::from("Usage: randomizer <GROUP> [DURATION] [BRIGHTNESS]\n\nAvailable groups:");
    for group in groups {
        let _ = write!(out, "\n  {}: {} ({})", group.id, group.name, group.kind);
    }
    out
}

#[cfg(test)]
mod tests {
    use randomizer_domain::group::GroupKind;
    use randomizer_domain::id::GroupId;

    use super::*;

    #[test]
    fn should_list_groups_in_usage() {
        let id = GroupId::new();
        let text = usage(&[GroupSummary {
            id,
            name: "Office".to_string(),
            kind: GroupKind::Room,
        }]);
        assert!(text.starts_with("Usage: randomizer"));
        assert!(text.ends_with(&format!("  {id}: Office (Room)")));
    }
}
