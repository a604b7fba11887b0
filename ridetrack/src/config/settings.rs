//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use crate::realtime::Role;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Tracking server settings
    pub server: ServerSettings,
    /// Mapping web service settings
    pub maps: MapsSettings,
    /// Geolocation settings
    pub location: LocationSettings,
    /// Realtime channel reconnection settings
    pub channel: ChannelSettings,
    /// Session orchestration settings
    pub session: SessionSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Tracking server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Realtime server URL (http(s) or ws(s)). Empty disables the channel.
    pub url: String,
}

/// Mapping web service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapsSettings {
    /// API key. `None` or a placeholder means not configured.
    pub api_key: Option<String>,
    pub base_url: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

/// Geolocation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    pub high_accuracy: bool,
    /// One-shot fix timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum cached fix age in milliseconds.
    pub max_age_ms: u64,
    /// Subscription time interval in milliseconds.
    pub update_interval_ms: u64,
    /// Subscription distance interval in meters.
    pub min_distance_m: f64,
    /// Fixes within this many meters count as accurate.
    pub accuracy_threshold_m: f64,
}

/// Realtime channel configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSettings {
    pub max_reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
    pub reconnect_delay_max_ms: u64,
    pub connect_timeout_ms: u64,
    /// Platform tag sent when identifying.
    pub platform: String,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub role: Role,
    /// Stable actor id. `None` generates `<role>_<uuid>` at startup.
    pub actor_id: Option<String>,
    pub eta_refresh_secs: u64,
    pub search_debounce_ms: u64,
    pub route_update_min_distance_m: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Full path of the log file.
    pub file: std::path::PathBuf,
}
