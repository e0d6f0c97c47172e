//! Global configuration types for hookrelay.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! HTTP listener, dispatch timeouts, and the registration lookup cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.hookrelay/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5680
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Dispatch timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on credential resolution for the authentication check.
    /// Exceeding it rejects the event for that workflow.
    #[serde(default = "default_auth_timeout_ms")]
    pub auth_timeout_ms: u64,
    /// How long the caller may wait for a synchronous trigger response.
    /// Event senders retry after about three seconds without an answer.
    #[serde(default = "default_sync_response_timeout_ms")]
    pub sync_response_timeout_ms: u64,
}

fn default_auth_timeout_ms() -> u64 {
    5_000
}

fn default_sync_response_timeout_ms() -> u64 {
    2_000
}

impl DispatchConfig {
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    pub fn sync_response_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_response_timeout_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            auth_timeout_ms: default_auth_timeout_ms(),
            sync_response_timeout_ms: default_sync_response_timeout_ms(),
        }
    }
}

/// Registration lookup cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

fn default_ttl_secs() -> u64 {
    3_600
}

fn default_max_capacity() -> u64 {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_capacity: default_max_capacity(),
        }
    }
}
