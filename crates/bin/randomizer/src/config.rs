//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `randomizer.toml` in the working directory unless `--config`
//! names another file. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::Path;
use std::time::Duration;

use randomizer_adapter_hue::HueConfig;
use randomizer_app::effect::{EffectTiming, JitterWindow};
use serde::Deserialize;

use crate::cli::MAX_DURATION;

const DEFAULT_PATH: &str = "randomizer.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hue bridge connection.
    pub bridge: HueConfig,
    /// Effect timing.
    pub effect: EffectConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Effect timing, in plain integers so the file stays readable.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Used when no duration is given on the command line.
    pub default_duration_secs: u64,
    pub flip_interval_ms: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub flip_transition_ms: u64,
    pub restore_transition_ms: u64,
    pub primary_grace_secs: u64,
    pub secondary_grace_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `path`, or `randomizer.toml` if present, then
    /// apply environment-variable overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, if an explicitly named
    /// file cannot be read, or if validation fails.
    pub fn load(path: Option<&Path>, simulate: bool) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path, true)?,
            None => Self::from_file(Path::new(DEFAULT_PATH), false)?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate(simulate)?;
        Ok(config)
    }

    fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("HUE_BRIDGE_HOST") {
            self.bridge.host = val;
        }
        if let Some(val) = lookup("HUE_API_KEY") {
            self.bridge.api_key = val;
        }
        if let Some(val) = lookup("RANDOMIZER_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// Check semantic constraints. The bridge address and key are only
    /// needed when talking to real hardware.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first violated rule.
    pub fn validate(&self, simulate: bool) -> Result<(), ConfigError> {
        if self.effect.default_duration() > MAX_DURATION {
            return Err(ConfigError::Validation(format!(
                "effect.default_duration_secs must not exceed {}",
                MAX_DURATION.as_secs()
            )));
        }
        if self.effect.flip_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "effect.flip_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.effect.jitter_min_ms > self.effect.jitter_max_ms {
            return Err(ConfigError::Validation(
                "effect.jitter_min_ms must not exceed effect.jitter_max_ms".to_string(),
            ));
        }
        if self.bridge.max_connections == 0 {
            return Err(ConfigError::Validation(
                "bridge.max_connections must be non-zero".to_string(),
            ));
        }
        if !simulate {
            if self.bridge.host.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "bridge host is required (set bridge.host or HUE_BRIDGE_HOST)".to_string(),
                ));
            }
            if self.bridge.api_key.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "bridge API key is required (set bridge.api_key or HUE_API_KEY)".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl EffectConfig {
    #[must_use]
    pub fn default_duration(&self) -> Duration {
        Duration::from_secs(self.default_duration_secs)
    }

    #[must_use]
    pub fn timing(&self) -> EffectTiming {
        EffectTiming {
            flip_interval: Duration::from_millis(self.flip_interval_ms),
            jitter: JitterWindow::new(
                Duration::from_millis(self.jitter_min_ms),
                Duration::from_millis(self.jitter_max_ms),
            ),
            flip_transition: Duration::from_millis(self.flip_transition_ms),
            restore_transition: Duration::from_millis(self.restore_transition_ms),
            primary_grace: Duration::from_secs(self.primary_grace_secs),
            secondary_grace: Duration::from_secs(self.secondary_grace_secs),
        }
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 30,
            flip_interval_ms: 1000,
            jitter_min_ms: 100,
            jitter_max_ms: 2000,
            flip_transition_ms: 0,
            restore_transition_ms: 400,
            primary_grace_secs: 10,
            secondary_grace_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "randomizer=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
