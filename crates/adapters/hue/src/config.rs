//! Hue bridge connection configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for talking to one Hue bridge.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct HueConfig {
    /// Bridge hostname or IP address.
    pub host: String,
    /// Application key issued by the bridge.
    pub api_key: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum number of requests in flight at once.
    pub max_connections: usize,
    /// Accept the bridge's self-signed certificate.
    pub accept_invalid_certs: bool,
}

impl HueConfig {
    /// CLIP v2 root, e.g. `https://192.168.1.2/clip/v2`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}/clip/v2", self.host.trim().trim_end_matches('/'))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for HueConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            api_key: String::new(),
            request_timeout_ms: 2000,
            max_connections: 16,
            accept_invalid_certs: true,
        }
    }
}

impl fmt::Debug for HueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HueConfig")
            .field("host", &self.host)
            .field("api_key", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_connections", &self.max_connections)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = HueConfig::default();
        assert!(config.host.is_empty());
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.max_connections, 16);
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            host = "192.168.1.2"
            api_key = "secret"
            request_timeout_ms = 500
            max_connections = 4
            accept_invalid_certs = false
        "#;
        let config: HueConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host, "192.168.1.2");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
        assert_eq!(config.max_connections, 4);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn should_build_clip_v2_base_url() {
        let config = HueConfig {
            host: "bridge.local/".to_string(),
            ..HueConfig::default()
        };
        assert_eq!(config.base_url(), "https://bridge.local/clip/v2");
    }

    #[test]
    fn should_redact_api_key_in_debug_output() {
        let config = HueConfig {
            api_key: "super-secret".to_string(),
            ..HueConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
