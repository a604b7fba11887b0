//! Environment variable overrides, applied after the config file.

use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::realtime::Role;

/// Tracking server URL.
pub const ENV_SERVER_URL: &str = "RIDETRACK_SERVER_URL";
/// Legacy name for the tracking server URL, used when the primary is unset.
pub const ENV_WS_URL: &str = "WS_URL";
/// Mapping API key.
pub const ENV_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
/// `rider` or `driver`.
pub const ENV_ROLE: &str = "RIDETRACK_ROLE";
/// Stable actor id.
pub const ENV_ACTOR_ID: &str = "RIDETRACK_ACTOR_ID";

impl ConfigFile {
    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigFileError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_SERVER_URL).or_else(|| get(ENV_WS_URL)) {
            self.server.url = url;
        }
        if let Some(key) = get(ENV_MAPS_API_KEY) {
            self.maps.api_key = Some(key);
        }
        if let Some(role) = get(ENV_ROLE) {
            self.session.role = Role::from_str(&role).map_err(|reason| {
                ConfigFileError::InvalidValue {
                    section: "env".to_string(),
                    key: ENV_ROLE.to_string(),
                    value: role.clone(),
                    reason,
                }
            })?;
        }
        if let Some(id) = get(ENV_ACTOR_ID) {
            self.session.actor_id = Some(id);
        }

        Ok(self)
    }
}
