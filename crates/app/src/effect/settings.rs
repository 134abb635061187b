//! Timing knobs for one effect run.

use std::time::Duration;

use rand::Rng;

/// Range a worker's random phase offset is drawn from. A zero-width window
/// always yields the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterWindow {
    min: Duration,
    max: Duration,
}

impl JitterWindow {
    /// Bounds given in either order are accepted.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    #[must_use]
    pub fn fixed(offset: Duration) -> Self {
        Self::new(offset, offset)
    }

    #[must_use]
    pub fn min(self) -> Duration {
        self.min
    }

    #[must_use]
    pub fn max(self) -> Duration {
        self.max
    }

    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for JitterWindow {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(2000))
    }
}

/// How an effect session paces its flips and how long it waits on stragglers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectTiming {
    /// Time between two consecutive flips of the same light.
    pub flip_interval: Duration,
    pub jitter: JitterWindow,
    /// Transition time sent with every flip.
    pub flip_transition: Duration,
    /// Transition time sent with every restore write.
    pub restore_transition: Duration,
    /// Extra time after the duration before workers are considered late.
    pub primary_grace: Duration,
    /// Time late or cancelled workers get to exit before they are detached.
    pub secondary_grace: Duration,
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            flip_interval: Duration::from_millis(1000),
            jitter: JitterWindow::default(),
            flip_transition: Duration::ZERO,
            restore_transition: Duration::from_millis(400),
            primary_grace: Duration::from_secs(10),
            secondary_grace: Duration::from_secs(5),
        }
    }
}
