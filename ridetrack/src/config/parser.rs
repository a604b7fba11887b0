//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::realtime::Role;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("url") {
            config.server.url = v.trim().to_string();
        }
    }

    // [maps] section
    if let Some(section) = ini.section(Some("maps")) {
        if let Some(v) = section.get("api_key") {
            let v = v.trim();
            config.maps.api_key = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = section.get("base_url") {
            let v = v.trim().trim_end_matches('/');
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid("maps", "base_url", v, "must be an http(s) URL"));
            }
            config.maps.base_url = v.to_string();
        }
        if let Some(v) = parse_positive(section, "maps", "timeout_secs", "(seconds)")? {
            config.maps.timeout_secs = v;
        }
    }

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("high_accuracy") {
            config.location.high_accuracy = parse_bool(v);
        }
        if let Some(v) = parse_positive(section, "location", "timeout_ms", "(milliseconds)")? {
            config.location.timeout_ms = v;
        }
        if let Some(v) = parse_number(section, "location", "max_age_ms", "(milliseconds)")? {
            config.location.max_age_ms = v;
        }
        if let Some(v) =
            parse_positive(section, "location", "update_interval_ms", "(milliseconds)")?
        {
            config.location.update_interval_ms = v;
        }
        if let Some(v) = parse_meters(section, "location", "min_distance_m")? {
            config.location.min_distance_m = v;
        }
        if let Some(v) = parse_meters(section, "location", "accuracy_threshold_m")? {
            config.location.accuracy_threshold_m = v;
        }
    }

    // [channel] section
    if let Some(section) = ini.section(Some("channel")) {
        if let Some(v) = parse_number(section, "channel", "max_reconnect_attempts", "")? {
            config.channel.max_reconnect_attempts = v;
        }
        if let Some(v) =
            parse_positive(section, "channel", "reconnect_delay_ms", "(milliseconds)")?
        {
            config.channel.reconnect_delay_ms = v;
        }
        if let Some(v) =
            parse_positive(section, "channel", "reconnect_delay_max_ms", "(milliseconds)")?
        {
            config.channel.reconnect_delay_max_ms = v;
        }
        if let Some(v) =
            parse_positive(section, "channel", "connect_timeout_ms", "(milliseconds)")?
        {
            config.channel.connect_timeout_ms = v;
        }
        if let Some(v) = section.get("platform") {
            let v = v.trim();
            if !v.is_empty() {
                config.channel.platform = v.to_string();
            }
        }
    }

    if config.channel.reconnect_delay_max_ms < config.channel.reconnect_delay_ms {
        return Err(invalid(
            "channel",
            "reconnect_delay_max_ms",
            &config.channel.reconnect_delay_max_ms.to_string(),
            "must not be below reconnect_delay_ms",
        ));
    }

    // [session] section
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = section.get("role") {
            config.session.role = Role::from_str(v)
                .map_err(|_| invalid("session", "role", v, "must be 'rider' or 'driver'"))?;
        }
        if let Some(v) = section.get("actor_id") {
            let v = v.trim();
            config.session.actor_id = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = parse_positive(section, "session", "eta_refresh_secs", "(seconds)")? {
            config.session.eta_refresh_secs = v;
        }
        if let Some(v) = parse_number(section, "session", "search_debounce_ms", "(milliseconds)")? {
            config.session.search_debounce_ms = v;
        }
        if let Some(v) = parse_meters(section, "session", "route_update_min_distance_m")? {
            config.session.route_update_min_distance_m = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a non-negative integer key, if present.
fn parse_number<T: FromStr>(
    section: &Properties,
    name: &str,
    key: &str,
    unit: &str,
) -> Result<Option<T>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    v.trim().parse().map(Some).map_err(|_| {
        let reason = format!("must be a non-negative integer {}", unit);
        invalid(name, key, v, reason.trim_end())
    })
}

/// Parse a strictly positive integer key, if present.
fn parse_positive(
    section: &Properties,
    name: &str,
    key: &str,
    unit: &str,
) -> Result<Option<u64>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    match v.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => {
            let reason = format!("must be a positive integer {}", unit);
            Err(invalid(name, key, v, reason.trim_end()))
        }
    }
}

/// Parse a non-negative distance in meters, if present.
fn parse_meters(section: &Properties, name: &str, key: &str) -> Result<Option<f64>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    match v.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(Some(n)),
        _ => Err(invalid(name, key, v, "must be a non-negative number (meters)")),
    }
}

/// Parse a boolean value, accepting true/yes/1/on.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = load("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_full_config() {
        let config = load(
            r#"
[server]
url = wss://track.example.com

[maps]
api_key = AIzaTest
base_url = https://maps.example.com/api/
timeout_secs = 5

[location]
high_accuracy = no
timeout_ms = 8000
max_age_ms = 0
update_interval_ms = 3000
min_distance_m = 25.5
accuracy_threshold_m = 50

[channel]
max_reconnect_attempts = 3
reconnect_delay_ms = 500
reconnect_delay_max_ms = 4000
connect_timeout_ms = 10000
platform = cli

[session]
role = Driver
actor_id = driver_42
eta_refresh_secs = 60
search_debounce_ms = 250
route_update_min_distance_m = 50
"#,
        )
        .unwrap();

        assert_eq!(config.server.url, "wss://track.example.com");
        assert_eq!(config.maps.api_key.as_deref(), Some("AIzaTest"));
        assert_eq!(config.maps.base_url, "https://maps.example.com/api");
        assert_eq!(config.maps.timeout_secs, 5);
        assert!(!config.location.high_accuracy);
        assert_eq!(config.location.timeout_ms, 8000);
        assert_eq!(config.location.max_age_ms, 0);
        assert_eq!(config.location.update_interval_ms, 3000);
        assert_eq!(config.location.min_distance_m, 25.5);
        assert_eq!(config.location.accuracy_threshold_m, 50.0);
        assert_eq!(config.channel.max_reconnect_attempts, 3);
        assert_eq!(config.channel.reconnect_delay_ms, 500);
        assert_eq!(config.channel.reconnect_delay_max_ms, 4000);
        assert_eq!(config.channel.connect_timeout_ms, 10000);
        assert_eq!(config.channel.platform, "cli");
        assert_eq!(config.session.role, Role::Driver);
        assert_eq!(config.session.actor_id.as_deref(), Some("driver_42"));
        assert_eq!(config.session.eta_refresh_secs, 60);
        assert_eq!(config.session.search_debounce_ms, 250);
        assert_eq!(config.session.route_update_min_distance_m, 50.0);
    }

    #[test]
    fn test_empty_api_key_is_none() {
        let config = load("[maps]\napi_key =\n").unwrap();
        assert!(config.maps.api_key.is_none());
    }

    #[test]
    fn test_empty_server_url_is_kept() {
        let config = load("[server]\nurl =\n").unwrap();
        assert_eq!(config.server.url, "");
    }

    #[test]
    fn test_invalid_role() {
        let err = load("[session]\nrole = pilot\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "session");
                assert_eq!(key, "role");
                assert_eq!(value, "pilot");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = load("[location]\ntimeout_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("location.timeout_ms"));
    }

    #[test]
    fn test_negative_distance_rejected() {
        assert!(load("[location]\nmin_distance_m = -5\n").is_err());
        assert!(load("[session]\nroute_update_min_distance_m = far\n").is_err());
    }

    #[test]
    fn test_delay_cap_below_base_rejected() {
        let err = load("[channel]\nreconnect_delay_ms = 5000\nreconnect_delay_max_ms = 1000\n")
            .unwrap_err();
        assert!(err.to_string().contains("reconnect_delay_max_ms"));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        assert!(load("[maps]\nbase_url = ftp://maps\n").is_err());
    }

    #[test]
    fn test_logging_file_tilde_expansion() {
        let config = load("[logging]\nfile = ~/logs/rt.log\n").unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.logging.file, home.join("logs/rt.log"));
        }
    }

    #[test]
    fn test_defaults_untouched_for_missing_keys() {
        let config = load("[channel]\nplatform = web\n").unwrap();
        assert_eq!(config.channel.platform, "web");
        assert_eq!(config.channel.reconnect_delay_ms, DEFAULT_RECONNECT_DELAY_MS);
        assert_eq!(config.location.timeout_ms, DEFAULT_LOCATION_TIMEOUT_MS);
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" yes "));
        assert!(parse_bool("1"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("maybe"));
        assert!(!parse_bool(""));
    }
}
