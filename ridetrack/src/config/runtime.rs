//! Conversion of file settings into the runtime configs of each component.

use std::time::Duration;

use super::settings::ConfigFile;
use crate::location::{AccuracyProfile, WatchOptions};
use crate::maps::MapsClientConfig;
use crate::realtime::{ActorIdentity, ChannelConfig};
use crate::session::SessionConfig;

impl ConfigFile {
    pub fn accuracy_profile(&self) -> AccuracyProfile {
        AccuracyProfile {
            enable_high_accuracy: self.location.high_accuracy,
            timeout: Duration::from_millis(self.location.timeout_ms),
            max_age: Duration::from_millis(self.location.max_age_ms),
        }
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            enable_high_accuracy: self.location.high_accuracy,
            time_interval: Duration::from_millis(self.location.update_interval_ms),
            min_distance_m: self.location.min_distance_m,
        }
    }

    /// Mapping client config. A missing key yields an empty credential,
    /// which the client reports as a configuration error per request.
    pub fn maps_config(&self) -> MapsClientConfig {
        MapsClientConfig {
            api_key: self.maps.api_key.clone().unwrap_or_default(),
            base_url: self.maps.base_url.clone(),
            timeout: Duration::from_secs(self.maps.timeout_secs),
        }
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            max_reconnect_attempts: self.channel.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(self.channel.reconnect_delay_ms),
            reconnect_delay_max: Duration::from_millis(self.channel.reconnect_delay_max_ms),
            connect_timeout: Duration::from_millis(self.channel.connect_timeout_ms),
            platform: self.channel.platform.clone(),
        }
    }

    /// The configured identity, or a freshly generated one.
    pub fn identity(&self) -> ActorIdentity {
        match &self.session.actor_id {
            Some(id) => ActorIdentity::new(id.clone(), self.session.role),
            None => ActorIdentity::generate(self.session.role),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            identity: self.identity(),
            server_url: self.server.url.clone(),
            channel: self.channel_config(),
            accuracy: self.accuracy_profile(),
            watch: self.watch_options(),
            eta_refresh: Duration::from_secs(self.session.eta_refresh_secs),
            search_debounce: Duration::from_millis(self.session.search_debounce_ms),
            route_update_min_distance_m: self.session.route_update_min_distance_m,
        }
    }
}
