//! Configuration for the relay server.
//!
//! Defaults can be overridden by environment variables:
//!
//! - `RELAY_BIND_ADDR`   (default: "127.0.0.1")
//! - `RELAY_PORT`        (default: "9100")
//! - `RELAY_MAX_CLIENTS` (default: "256")
//!
//! plus the `JES_*` variables read by [`StreamerConfig::from_env`], or by a
//! TOML file:
//!
//! ```toml
//! bind_addr = "0.0.0.0"
//! port = 9100
//!
//! [streamer]
//! event_property = "name"
//! ignore_non_json = true
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use event_streamer::config::read_env_or_default;
use event_streamer::StreamerConfig;
use serde::Deserialize;

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on. `0` picks a free port.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Wire options shared by every client connection.
    ///
    /// `emit_local_events` is always turned off for relayed connections.
    pub streamer: StreamerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1".to_string(),
            port: 9100,
            max_clients: 256,
            streamer: StreamerConfig::default(),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            bind_addr: read_env_or_default("RELAY_BIND_ADDR", defaults.bind_addr)?,
            port: read_env_or_default("RELAY_PORT", defaults.port)?,
            max_clients: read_env_or_default("RELAY_MAX_CLIENTS", defaults.max_clients)?,
            streamer: StreamerConfig::from_env()?,
        })
    }

    /// Read a TOML config file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
