//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files; every
//! section has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address and admission control.
    pub listener: ListenerConfig,

    /// Request parser buffer sizing.
    pub parser: ParserConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Settings for the bundled demo handlers.
    pub demo: DemoConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:42069").
    pub bind_address: String,

    /// Maximum concurrently served connections.
    pub max_connections: usize,

    /// How long shutdown waits for in-flight connections, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:42069".to_string(),
            max_connections: 1024,
            shutdown_grace_secs: 10,
        }
    }
}

/// Read buffer sizing for the request parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Starting capacity; doubles whenever full.
    pub initial_buffer_size: usize,

    /// Upper bound on buffer growth, and on the request line plus field
    /// lines taken together. The body is bounded only by `Content-Length`.
    pub max_buffer_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: 8,
            max_buffer_size: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Demo handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Directory static assets are served from.
    pub assets_dir: String,

    /// Upstream that `/httpbin/*` requests are streamed from.
    pub upstream_base_url: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            upstream_base_url: "https://httpbin.org".to_string(),
        }
    }
}
