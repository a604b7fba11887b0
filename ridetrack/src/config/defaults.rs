//! Default values and constants for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::settings::*;
use crate::realtime::Role;

// =============================================================================
// Server
// =============================================================================

/// Default realtime tracking server.
pub const DEFAULT_SERVER_URL: &str = "https://mini-trace.onrender.com";

// =============================================================================
// Maps
// =============================================================================

/// Default mapping web service request timeout in seconds.
pub const DEFAULT_MAPS_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Location
// =============================================================================

/// Default one-shot fix timeout (15s).
pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 15_000;

/// Default maximum age of a cached fix (1s).
pub const DEFAULT_LOCATION_MAX_AGE_MS: u64 = 1_000;

/// Default subscription time interval (7s).
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 7_000;

/// Default subscription distance interval.
pub const DEFAULT_MIN_DISTANCE_M: f64 = 10.0;

/// Fixes with an accuracy radius at or below this are considered accurate.
pub const DEFAULT_ACCURACY_THRESHOLD_M: f64 = 20.0;

// =============================================================================
// Channel
// =============================================================================

pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_DELAY_MAX_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Session
// =============================================================================

pub const DEFAULT_ETA_REFRESH_SECS: u64 = 120;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                url: DEFAULT_SERVER_URL.to_string(),
            },
            maps: MapsSettings {
                api_key: None,
                base_url: crate::maps::DEFAULT_MAPS_BASE_URL.to_string(),
                timeout_secs: DEFAULT_MAPS_TIMEOUT_SECS,
            },
            location: LocationSettings {
                high_accuracy: true,
                timeout_ms: DEFAULT_LOCATION_TIMEOUT_MS,
                max_age_ms: DEFAULT_LOCATION_MAX_AGE_MS,
                update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
                min_distance_m: DEFAULT_MIN_DISTANCE_M,
                accuracy_threshold_m: DEFAULT_ACCURACY_THRESHOLD_M,
            },
            channel: ChannelSettings {
                max_reconnect_attempts: crate::realtime::DEFAULT_MAX_RECONNECT_ATTEMPTS,
                reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
                reconnect_delay_max_ms: DEFAULT_RECONNECT_DELAY_MAX_MS,
                connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
                platform: crate::realtime::DEFAULT_PLATFORM.to_string(),
            },
            session: SessionSettings {
                role: Role::Rider,
                actor_id: None,
                eta_refresh_secs: DEFAULT_ETA_REFRESH_SECS,
                search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
                route_update_min_distance_m: crate::session::DEFAULT_ROUTE_UPDATE_MIN_DISTANCE_M,
            },
            logging: LoggingSettings {
                file: crate::logging::default_log_dir().join(crate::logging::default_log_file()),
            },
        }
    }
}
