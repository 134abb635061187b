//! Virtual light — applies writes the way a bridge-controlled bulb would.

use randomizer_domain::color::EffectColor;
use randomizer_domain::error::GatewayError;
use randomizer_domain::light::{DesiredState, DeviceState};

/// A simulated light plus the faults injected into it.
#[derive(Debug, Clone)]
pub(crate) struct VirtualLight {
    state: DeviceState,
    failing: bool,
    swallowed_restores: usize,
}

impl VirtualLight {
    pub(crate) fn new(state: DeviceState) -> Self {
        Self {
            state,
            failing: false,
            swallowed_restores: 0,
        }
    }

    pub(crate) fn state(&self) -> &DeviceState {
        &self.state
    }

    pub(crate) fn mark_unreachable(&mut self) {
        self.state.reachable = false;
    }

    pub(crate) fn fail_writes(&mut self) {
        self.failing = true;
    }

    pub(crate) fn swallow_restores(&mut self, count: usize) {
        self.swallowed_restores = count;
    }

    /// Apply `desired`. Unbound lights accept the write but do not change.
    pub(crate) fn apply(&mut self, desired: &DesiredState) -> Result<(), GatewayError> {
        if self.failing {
            return Err(GatewayError::Rejected(format!(
                "light {} did not acknowledge the write",
                self.state.id
            )));
        }
        if !self.state.reachable {
            return Ok(());
        }
        let is_effect = desired.color.and_then(EffectColor::detect).is_some();
        if !is_effect && self.swallowed_restores > 0 {
            self.swallowed_restores -= 1;
            return Ok(());
        }
        desired.apply_to(&mut self.state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use randomizer_domain::color::Color;
    use randomizer_domain::id::DeviceId;
    use randomizer_domain::light::Brightness;

    use super::*;

    fn light() -> VirtualLight {
        VirtualLight::new(DeviceState {
            id: DeviceId::new(),
            name: Some("Desk".to_string()),
            on: false,
            brightness: Brightness::new(30.0),
            color: Color::Temperature { mirek: 366 },
            reachable: true,
        })
    }

    fn effect() -> DesiredState {
        DesiredState::effect(EffectColor::Blue, Brightness::FULL, Duration::ZERO)
    }

    #[test]
    fn should_apply_effect_write() {
        let mut light = light();
        light.apply(&effect()).unwrap();
        assert!(light.state().on);
        assert_eq!(light.state().brightness, Brightness::FULL);
        assert_eq!(light.state().color, EffectColor::Blue.color());
    }

    #[test]
    fn should_reject_writes_when_failing() {
        let mut light = light();
        light.fail_writes();
        assert!(matches!(light.apply(&effect()), Err(GatewayError::Rejected(_))));
        assert!(!light.state().on);
    }

    #[test]
    fn should_ignore_writes_when_unreachable() {
        let mut light = light();
        light.mark_unreachable();
        light.apply(&effect()).unwrap();
        assert!(!light.state().on);
    }

    #[test]
    fn should_swallow_only_restore_writes() {
        let mut light = light();
        light.swallow_restores(1);
        let restore = DesiredState {
            on: Some(false),
            ..DesiredState::default()
        };

        light.apply(&effect()).unwrap();
        light.apply(&restore).unwrap();
        assert!(light.state().on);

        light.apply(&restore).unwrap();
        assert!(!light.state().on);
    }
}
