//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let api_key = config.maps.api_key.as_deref().unwrap_or("");
    let actor_id = config.session.actor_id.as_deref().unwrap_or("");

    format!(
        r#"[server]
; Realtime tracking server (http(s):// or ws(s)://). Leave empty to run
; without realtime updates.
url = {}

[maps]
; Google Maps web services API key (Places, Geocoding, Distance Matrix, Directions)
; Get one at: https://console.cloud.google.com
api_key = {}
; Base URL of the web services (default: https://maps.googleapis.com/maps/api)
base_url = {}
; HTTP request timeout in seconds (default: 10)
timeout_secs = {}

[location]
; Request GPS-grade accuracy (default: true)
high_accuracy = {}
; How long to wait for a one-shot fix in milliseconds (default: 15000)
timeout_ms = {}
; Maximum age of a cached fix in milliseconds (default: 1000)
max_age_ms = {}
; Emit a fix at least this often while moving, in milliseconds (default: 7000)
update_interval_ms = {}
; Emit a fix immediately after moving this far, in meters (default: 10)
min_distance_m = {}
; Fixes within this radius are shown as accurate, in meters (default: 20)
accuracy_threshold_m = {}

[channel]
; Reconnection attempts after a failure before giving up (default: 5)
max_reconnect_attempts = {}
; Base reconnection delay in milliseconds, doubled per failure (default: 1000)
reconnect_delay_ms = {}
; Cap on the reconnection delay in milliseconds (default: 10000)
reconnect_delay_max_ms = {}
; Timeout for a single connection attempt in milliseconds (default: 30000)
connect_timeout_ms = {}
; Platform tag sent when identifying (default: mobile-app)
platform = {}

[session]
; rider or driver (default: rider). Drivers receive job assignments.
role = {}
; Stable actor id. If empty, <role>_<uuid> is generated at startup.
actor_id = {}
; Recompute the ETA this often even without movement, in seconds (default: 120)
eta_refresh_secs = {}
; Quiet period before a place search is sent, in milliseconds (default: 300)
search_debounce_ms = {}
; Device movement needed before the route origin follows it, in meters (default: 100)
route_update_min_distance_m = {}

[logging]
; Log file path (default: ~/.ridetrack/logs/ridetrack.log)
file = {}
"#,
        config.server.url,
        api_key,
        config.maps.base_url,
        config.maps.timeout_secs,
        config.location.high_accuracy,
        config.location.timeout_ms,
        config.location.max_age_ms,
        config.location.update_interval_ms,
        config.location.min_distance_m,
        config.location.accuracy_threshold_m,
        config.channel.max_reconnect_attempts,
        config.channel.reconnect_delay_ms,
        config.channel.reconnect_delay_max_ms,
        config.channel.connect_timeout_ms,
        config.channel.platform,
        config.session.role,
        actor_id,
        config.session.eta_refresh_secs,
        config.session.search_debounce_ms,
        config.session.route_update_min_distance_m,
        path_to_string(&config.logging.file),
    )
}

/// Render a path, abbreviating the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use super::*;
    use crate::realtime::Role;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.server.url = "wss://track.example.com".to_string();
        config.maps.api_key = Some("test-api-key".to_string());
        config.location.min_distance_m = 12.5;
        config.channel.max_reconnect_attempts = 2;
        config.session.role = Role::Driver;
        config.session.actor_id = Some("driver_7".to_string());

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_defaults_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/dir/config.ini");

        ConfigFile::default().save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_output_is_commented() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("[session]\n; rider or driver"));
        assert!(text.contains("role = rider"));
        assert!(text.contains("api_key = \n"));
    }

    #[test]
    fn test_home_path_abbreviated() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("a/b.log")), "~/a/b.log");
        }
        assert_eq!(path_to_string(Path::new("/var/log/rt.log")), "/var/log/rt.log");
    }
}
