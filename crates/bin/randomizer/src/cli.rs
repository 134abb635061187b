//! Command-line surface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use randomizer_app::services::{EffectRequest, ResolveHints};
use randomizer_domain::group::GroupKind;
use randomizer_domain::id::GroupedLightId;
use randomizer_domain::light::Brightness;

/// Longest effect accepted from the command line or the config file.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Flip every light of a Hue room or zone between blue and yellow, then put
/// everything back the way it was.
#[derive(Debug, Parser)]
#[command(name = "randomizer", version, about)]
pub struct Cli {
    /// Room or zone name (case-insensitive), or its id.
    pub group: Option<String>,

    /// Effect duration in seconds. Defaults to `effect.default_duration_secs`.
    #[arg(value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Brightness in percent, clamped to 0-100.
    #[arg(default_value_t = 100.0, allow_negative_numbers = true)]
    pub brightness: f64,

    /// Kind of the group when GROUP is an id. Saves one lookup.
    #[arg(long)]
    pub kind: Option<GroupKind>,

    /// Grouped-light handle to use for group-wide writes.
    #[arg(long, value_name = "ID")]
    pub grouped_light: Option<GroupedLightId>,

    /// Print every room and zone as JSON and exit.
    #[arg(long)]
    pub list: bool,

    /// Run against a simulated bridge instead of real hardware.
    #[arg(long)]
    pub simulate: bool,

    /// Configuration file (default: `randomizer.toml` if present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the groups as JSON, exit 0.
    List,
    /// No group given: print usage and the groups, exit 1.
    Usage,
    /// Run the effect.
    Run(EffectRequest),
}

impl Cli {
    #[must_use]
    pub fn command(&self, default_duration: Duration) -> Command {
        if self.list {
            return Command::List;
        }
        let Some(identifier) = self.group.clone() else {
            return Command::Usage;
        };
        Command::Run(EffectRequest {
            identifier,
            duration: self.duration.unwrap_or(default_duration),
            brightness: Brightness::new(self.brightness),
            hints: ResolveHints {
                kind: self.kind,
                grouped_light: self.grouped_light,
            },
        })
    }
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    if secs < 0.0 {
        return Err("duration must not be negative".to_string());
    }
    let duration = Duration::try_from_secs_f64(secs).map_err(|err| err.to_string())?;
    if duration > MAX_DURATION {
        return Err(format!(
            "duration must not exceed {} seconds",
            MAX_DURATION.as_secs()
        ));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("randomizer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn should_parse_positional_arguments() {
        let cli = parse(&["Living Room", "12", "60"]);
        let Command::Run(request) = cli.command(Duration::from_secs(30)) else {
            panic!("expected a run");
        };
        assert_eq!(request.identifier, "Living Room");
        assert_eq!(request.duration, Duration::from_secs(12));
        assert_eq!(request.brightness, Brightness::new(60.0));
        assert_eq!(request.hints, ResolveHints::default());
    }

    #[test]
    fn should_apply_defaults() {
        let cli = parse(&["Office"]);
        let Command::Run(request) = cli.command(Duration::from_secs(30)) else {
            panic!("expected a run");
        };
        assert_eq!(request.duration, Duration::from_secs(30));
        assert_eq!(request.brightness, Brightness::FULL);
    }

    #[test]
    fn should_clamp_brightness() {
        let cli = parse(&["Office", "5", "250"]);
        let Command::Run(request) = cli.command(Duration::ZERO) else {
            panic!("expected a run");
        };
        assert_eq!(request.brightness, Brightness::FULL);
    }

    #[test]
    fn should_accept_fractional_duration() {
        let cli = parse(&["Office", "1.5"]);
        assert_eq!(cli.duration, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn should_reject_negative_or_garbled_duration() {
        assert!(parse_duration("-3").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn should_reject_duration_above_one_day() {
        assert!(parse_duration("1e19").is_err());
        assert!(parse_duration("86401").is_err());
        assert_eq!(parse_duration("86400"), Ok(MAX_DURATION));
    }

    #[test]
    fn should_parse_hints() {
        let handle = GroupedLightId::new();
        let cli = parse(&[
            "5d3c0a6e-1b7f-4c21-9a55-0f6a1c2e9b01",
            "--kind",
            "zone",
            "--grouped-light",
            &handle.to_string(),
        ]);
        let Command::Run(request) = cli.command(Duration::ZERO) else {
            panic!("expected a run");
        };
        assert_eq!(request.hints.kind, Some(GroupKind::Zone));
        assert_eq!(request.hints.grouped_light, Some(handle));
    }

    #[test]
    fn should_reject_unknown_kind() {
        let result = Cli::try_parse_from(["randomizer", "Office", "--kind", "house"]);
        assert!(result.is_err());
    }

    #[test]
    fn should_prefer_list_over_group() {
        let cli = parse(&["Office", "--list", "--simulate"]);
        assert!(cli.simulate);
        assert_eq!(cli.command(Duration::ZERO), Command::List);
    }

    #[test]
    fn should_ask_for_usage_without_group() {
        assert_eq!(parse(&[]).command(Duration::ZERO), Command::Usage);
    }
}
