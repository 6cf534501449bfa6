//! Server knobs for the connection lifecycle.
//!
//! Every value has a vanilla-compatible default and can be overridden through
//! a `BASALT_*` environment variable, so embedders and operators share one
//! configuration surface.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables consumed by the connection manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Implementation name sent in the `minecraft:brand` plugin message.
    pub brand_name: String,
    /// Minimum packet size (bytes) to compress; zero or negative disables
    /// compression entirely.
    pub compression_threshold: i32,
    /// Deadline for outstanding login plugin message replies.
    pub login_plugin_message_timeout_ms: u64,
    /// Deadline for the client's known-packs response during configuration.
    pub known_packs_response_timeout_ms: u64,
    /// Idle period after which a keep-alive is due.
    pub keep_alive_delay_ms: u64,
    /// Silence beyond which the client is kicked.
    pub keep_alive_kick_ms: u64,
    /// Await the spawn future inline during the tick. Test harnesses only.
    pub inside_test: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            brand_name: "basalt".into(),
            compression_threshold: 256,
            login_plugin_message_timeout_ms: 5_000,
            known_packs_response_timeout_ms: 5_000,
            keep_alive_delay_ms: 10_000,
            keep_alive_kick_ms: 30_000,
            inside_test: false,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with any `BASALT_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse("BASALT_BRAND_NAME") {
            config.brand_name = v;
        }
        if let Some(v) = env_parse("BASALT_COMPRESSION_THRESHOLD") {
            config.compression_threshold = v;
        }
        if let Some(v) = env_parse("BASALT_LOGIN_PLUGIN_MESSAGE_TIMEOUT_MS") {
            config.login_plugin_message_timeout_ms = v;
        }
        if let Some(v) = env_parse("BASALT_KNOWN_PACKS_RESPONSE_TIMEOUT_MS") {
            config.known_packs_response_timeout_ms = v;
        }
        if let Some(v) = env_parse("BASALT_KEEP_ALIVE_DELAY_MS") {
            config.keep_alive_delay_ms = v;
        }
        if let Some(v) = env_parse("BASALT_KEEP_ALIVE_KICK_MS") {
            config.keep_alive_kick_ms = v;
        }
        if let Some(v) = env_parse("BASALT_INSIDE_TEST") {
            config.inside_test = v;
        }
        config
    }

    pub fn login_plugin_message_timeout(&self) -> Duration {
        Duration::from_millis(self.login_plugin_message_timeout_ms)
    }

    pub fn known_packs_response_timeout(&self) -> Duration {
        Duration::from_millis(self.known_packs_response_timeout_ms)
    }

    pub fn keep_alive_delay_nanos(&self) -> u64 {
        self.keep_alive_delay_ms * 1_000_000
    }

    pub fn keep_alive_kick_nanos(&self) -> u64 {
        self.keep_alive_kick_ms * 1_000_000
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert!(config.keep_alive_delay_ms < config.keep_alive_kick_ms);
        assert!(config.compression_threshold > 0);
        assert!(!config.inside_test);
    }

    #[test]
    fn duration_helpers_convert_milliseconds() {
        let config = ServerConfig {
            keep_alive_delay_ms: 10,
            keep_alive_kick_ms: 30,
            login_plugin_message_timeout_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.keep_alive_delay_nanos(), 10_000_000);
        assert_eq!(config.keep_alive_kick_nanos(), 30_000_000);
        assert_eq!(
            config.login_plugin_message_timeout(),
            Duration::from_millis(250)
        );
    }
}
