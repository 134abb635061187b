//! Light state as reported by a bridge, as requested by a write, and as
//! captured before an effect run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::{Color, EffectColor};
use crate::id::DeviceId;

/// Maximum brightness difference (in percent points) still considered equal.
pub const BRIGHTNESS_TOLERANCE: f64 = 0.5;

/// Maximum per-axis chromaticity difference still considered equal.
pub const XY_TOLERANCE: f64 = 0.005;

/// Brightness in percent, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Brightness(f64);

impl Brightness {
    pub const FULL: Self = Self(100.0);
    pub const OFF: Self = Self(0.0);

    /// Clamp `percent` into range. `NaN` maps to zero.
    #[must_use]
    pub fn new(percent: f64) -> Self {
        if percent.is_nan() {
            return Self::OFF;
        }
        Self(percent.clamp(0.0, 100.0))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn approx_eq(self, other: Self) -> bool {
        (self.0 - other.0).abs() <= BRIGHTNESS_TOLERANCE
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::FULL
    }
}

/// What the bridge currently reports for one light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub id: DeviceId,
    pub name: Option<String>,
    pub on: bool,
    pub brightness: Brightness,
    pub color: Color,
    /// Bound to a controller; unbound lights ignore writes.
    pub reachable: bool,
}

/// A partial write. `None` fields are left untouched by the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DesiredState {
    pub on: Option<bool>,
    pub brightness: Option<Brightness>,
    pub color: Option<Color>,
    pub transition: Option<Duration>,
}

impl DesiredState {
    /// Switch on at `brightness` showing one of the effect colors.
    #[must_use]
    pub fn effect(color: EffectColor, brightness: Brightness, transition: Duration) -> Self {
        Self {
            on: Some(true),
            brightness: Some(brightness),
            color: Some(color.color()),
            transition: Some(transition),
        }
    }

    /// Apply this write on top of `state`, the way a bridge would.
    pub fn apply_to(&self, state: &mut DeviceState) {
        if let Some(on) = self.on {
            state.on = on;
        }
        if let Some(brightness) = self.brightness {
            state.brightness = brightness;
        }
        if let Some(color) = self.color {
            state.color = color;
        }
    }
}

/// Pre-effect state of one reachable light: both the restore target and the
/// equality key for batching decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub on: bool,
    pub brightness: Brightness,
    pub color: Color,
    pub reachable: bool,
}

impl DeviceSnapshot {
    #[must_use]
    pub fn capture(state: &DeviceState) -> Self {
        Self {
            id: state.id,
            on: state.on,
            brightness: state.brightness,
            color: state.color,
            reachable: state.reachable,
        }
    }

    /// Write that puts the light back exactly as captured, keeping the
    /// captured color mode.
    #[must_use]
    pub fn restore_target(&self, transition: Duration) -> DesiredState {
        DesiredState {
            on: Some(self.on),
            brightness: Some(self.brightness),
            color: Some(self.color),
            transition: Some(transition),
        }
    }

    /// Same power, brightness and chromaticity within restore tolerance.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.on == other.on
            && self.brightness.approx_eq(other.brightness)
            && self
                .color
                .to_xy()
                .approx_eq(other.color.to_xy(), XY_TOLERANCE)
    }

    /// Whether the light currently looks the way it did when captured.
    #[must_use]
    pub fn matches_state(&self, state: &DeviceState) -> bool {
        self.equivalent(&Self::capture(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(on: bool, brightness: f64, color: Color) -> DeviceState {
        DeviceState {
            id: DeviceId::new(),
            name: Some("Lamp".to_string()),
            on,
            brightness: Brightness::new(brightness),
            color,
            reachable: true,
        }
    }

    #[test]
    fn should_clamp_brightness_into_range() {
        assert_eq!(Brightness::new(150.0), Brightness::FULL);
        assert_eq!(Brightness::new(-3.0), Brightness::OFF);
        assert_eq!(Brightness::new(f64::NAN), Brightness::OFF);
        assert!((Brightness::new(42.5).value() - 42.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_build_effect_write_with_power_on() {
        let write = DesiredState::effect(EffectColor::Blue, Brightness::new(80.0), Duration::ZERO);
        assert_eq!(write.on, Some(true));
        assert_eq!(write.color, Some(EffectColor::Blue.color()));
        assert_eq!(write.transition, Some(Duration::ZERO));
    }

    #[test]
    fn should_apply_only_present_fields() {
        let mut current = state(false, 20.0, Color::Temperature { mirek: 366 });
        DesiredState {
            brightness: Some(Brightness::new(60.0)),
            ..DesiredState::default()
        }
        .apply_to(&mut current);
        assert!(!current.on);
        assert_eq!(current.brightness, Brightness::new(60.0));
        assert_eq!(current.color, Color::Temperature { mirek: 366 });
    }

    #[test]
    fn should_restore_every_captured_field() {
        let snapshot = DeviceSnapshot::capture(&state(false, 35.0, Color::xy(0.3, 0.3)));
        let target = snapshot.restore_target(Duration::from_millis(400));
        assert_eq!(target.on, Some(false));
        assert_eq!(target.brightness, Some(Brightness::new(35.0)));
        assert_eq!(target.color, Some(Color::xy(0.3, 0.3)));
        assert_eq!(target.transition, Some(Duration::from_millis(400)));
    }

    #[test]
    fn should_treat_small_drift_as_equivalent() {
        let a = DeviceSnapshot::capture(&state(true, 50.0, Color::xy(0.3000, 0.3000)));
        let b = DeviceSnapshot::capture(&state(true, 50.4, Color::xy(0.3040, 0.2960)));
        assert!(a.equivalent(&b));
    }

    #[test]
    fn should_distinguish_power_brightness_and_color() {
        let base = DeviceSnapshot::capture(&state(true, 50.0, Color::xy(0.3, 0.3)));
        let off = DeviceSnapshot::capture(&state(false, 50.0, Color::xy(0.3, 0.3)));
        let dimmer = DeviceSnapshot::capture(&state(true, 49.0, Color::xy(0.3, 0.3)));
        let shifted = DeviceSnapshot::capture(&state(true, 50.0, Color::xy(0.31, 0.3)));
        assert!(!base.equivalent(&off));
        assert!(!base.equivalent(&dimmer));
        assert!(!base.equivalent(&shifted));
    }

    #[test]
    fn should_compare_across_color_modes() {
        let xy = Color::Temperature { mirek: 250 }.to_xy();
        let a = DeviceSnapshot::capture(&state(true, 70.0, Color::Temperature { mirek: 250 }));
        let b = DeviceSnapshot::capture(&state(true, 70.0, Color::xy(xy.x, xy.y)));
        assert!(a.equivalent(&b));
    }

    #[test]
    fn should_match_state_after_restore_write() {
        let original = state(true, 64.0, Color::Temperature { mirek: 366 });
        let snapshot = DeviceSnapshot::capture(&original);

        let mut current = original.clone();
        DesiredState::effect(EffectColor::Yellow, Brightness::FULL, Duration::ZERO)
            .apply_to(&mut current);
        assert!(!snapshot.matches_state(&current));

        snapshot
            .restore_target(Duration::ZERO)
            .apply_to(&mut current);
        assert!(snapshot.matches_state(&current));
    }
}
