//! Application-level configuration loading: room defaults and event channel sizing.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DISC_ROOMS_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Limits and defaults applied when rooms are created.
    pub room: RoomDefaults,
    /// Buffer size of the room event broadcast channel.
    pub event_channel_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Limits applied to room creation requests.
pub struct RoomDefaults {
    /// Lifetime used when the request does not ask for one.
    pub default_ttl_minutes: u32,
    /// Longest lifetime a request may ask for.
    pub max_ttl_minutes: u32,
    /// Largest capacity a request may ask for.
    pub max_capacity: u8,
}

impl RoomDefaults {
    /// Resolve the lifetime of a new room, clamping requests to the configured maximum.
    pub fn ttl(&self, requested_minutes: Option<u32>) -> Duration {
        let minutes = requested_minutes
            .unwrap_or(self.default_ttl_minutes)
            .min(self.max_ttl_minutes);
        Duration::from_secs(u64::from(minutes) * 60)
    }
}

impl Default for RoomDefaults {
    fn default() -> Self {
        Self {
            default_ttl_minutes: 240,
            max_ttl_minutes: 1440,
            max_capacity: 24,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room: RoomDefaults::default(),
            event_channel_capacity: 64,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        max_capacity = app_config.room.max_capacity,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; absent keys keep their default value.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    room: RawRoom,
    #[serde(default)]
    events: RawEvents,
}

#[derive(Debug, Default, Deserialize)]
struct RawRoom {
    default_ttl_minutes: Option<u32>,
    max_ttl_minutes: Option<u32>,
    max_capacity: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvents {
    channel_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let max_ttl_minutes = value
            .room
            .max_ttl_minutes
            .unwrap_or(defaults.room.max_ttl_minutes)
            .max(1);
        Self {
            room: RoomDefaults {
                default_ttl_minutes: value
                    .room
                    .default_ttl_minutes
                    .unwrap_or(defaults.room.default_ttl_minutes)
                    .clamp(1, max_ttl_minutes),
                max_ttl_minutes,
                max_capacity: value
                    .room
                    .max_capacity
                    .unwrap_or(defaults.room.max_capacity)
                    .max(1),
            },
            event_channel_capacity: value
                .events
                .channel_capacity
                .unwrap_or(defaults.event_channel_capacity)
                .max(1),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let raw = r#"{"room": {"max_capacity": 6}, "events": {"channel_capacity": 8}}"#;
        let config = AppConfig::from_json(raw).unwrap();
        assert_eq!(config.room.max_capacity, 6);
        assert_eq!(config.room.default_ttl_minutes, 240);
        assert_eq!(config.event_channel_capacity, 8);
    }

    #[test]
    fn default_ttl_never_exceeds_max() {
        let config = AppConfig::from_json(
            r#"{"room": {"default_ttl_minutes": 600, "max_ttl_minutes": 60}}"#,
        )
        .unwrap();
        assert_eq!(config.room.default_ttl_minutes, 60);
    }

    #[test]
    fn ttl_clamps_requested_minutes() {
        let room = RoomDefaults::default();
        assert_eq!(room.ttl(None), Duration::from_secs(240 * 60));
        assert_eq!(room.ttl(Some(10)), Duration::from_secs(600));
        assert_eq!(room.ttl(Some(100_000)), Duration::from_secs(1440 * 60));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json("{\"room\": 3}").is_err());
    }
}
