//! Configuration for a [`JsonEventStreamer`](crate::JsonEventStreamer).
//!
//! All four options are independent and default to the plain protocol:
//!
//! | option               | default       |
//! |----------------------|---------------|
//! | `event_property`     | `"event"`     |
//! | `arguments_property` | `"arguments"` |
//! | `emit_local_events`  | `false`       |
//! | `ignore_non_json`    | `false`       |
//!
//! A config can be built in code (`with_*` methods), deserialized from any
//! serde format (missing keys take defaults), or read from environment
//! variables:
//!
//! - `JES_EVENT_PROPERTY`
//! - `JES_ARGUMENTS_PROPERTY`
//! - `JES_EMIT_LOCAL_EVENTS` (`true` / `false`)
//! - `JES_IGNORE_NON_JSON`   (`true` / `false`)

use std::env;
use std::str::FromStr;

use event_protocol::wire_types::{DEFAULT_ARGUMENTS_PROPERTY, DEFAULT_EVENT_PROPERTY};
use event_protocol::FieldNames;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Streamer configuration. Immutable once the streamer is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Wire key carrying the event name.
    pub event_property: String,

    /// Wire key carrying the argument list.
    pub arguments_property: String,

    /// Also dispatch locally emitted events to this streamer's listeners.
    pub emit_local_events: bool,

    /// Drop lines that are not JSON instead of reporting them.
    pub ignore_non_json: bool,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        StreamerConfig {
            event_property: DEFAULT_EVENT_PROPERTY.to_string(),
            arguments_property: DEFAULT_ARGUMENTS_PROPERTY.to_string(),
            emit_local_events: false,
            ignore_non_json: false,
        }
    }
}

impl StreamerConfig {
    pub fn new() -> Self {
        StreamerConfig::default()
    }

    pub fn with_event_property(mut self, key: impl Into<String>) -> Self {
        self.event_property = key.into();
        self
    }

    pub fn with_arguments_property(mut self, key: impl Into<String>) -> Self {
        self.arguments_property = key.into();
        self
    }

    pub fn with_emit_local_events(mut self, enabled: bool) -> Self {
        self.emit_local_events = enabled;
        self
    }

    pub fn with_ignore_non_json(mut self, enabled: bool) -> Self {
        self.ignore_non_json = enabled;
        self
    }

    /// The pair of wire keys this config selects.
    pub fn field_names(&self) -> FieldNames {
        FieldNames::new(self.event_property.clone(), self.arguments_property.clone())
    }

    /// Construct a `StreamerConfig` from environment variables, falling
    /// back to the defaults for any variable that is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = StreamerConfig::default();

        Ok(StreamerConfig {
            event_property: read_env_or_default("JES_EVENT_PROPERTY", defaults.event_property)?,
            arguments_property: read_env_or_default(
                "JES_ARGUMENTS_PROPERTY",
                defaults.arguments_property,
            )?,
            emit_local_events: read_env_or_default(
                "JES_EMIT_LOCAL_EVENTS",
                defaults.emit_local_events,
            )?,
            ignore_non_json: read_env_or_default("JES_IGNORE_NON_JSON", defaults.ignore_non_json)?,
        })
    }
}

/// Parse `key` from the environment, or return `default` when unset.
pub fn read_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: val.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
