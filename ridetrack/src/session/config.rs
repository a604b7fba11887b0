//! Session orchestrator configuration.

use std::time::Duration;

use crate::location::{AccuracyProfile, WatchOptions};
use crate::realtime::{ActorIdentity, ChannelConfig, Role};

use super::debounce::DEFAULT_SEARCH_DEBOUNCE;

/// Default ETA refresh period.
pub const DEFAULT_ETA_REFRESH: Duration = Duration::from_secs(120);

/// Shortest ETA refresh period the session will run with.
pub const MIN_ETA_REFRESH: Duration = Duration::from_secs(1);

/// Default distance the device must move before the route origin follows.
pub const DEFAULT_ROUTE_UPDATE_MIN_DISTANCE_M: f64 = 100.0;

/// Configuration for [`SessionOrchestrator`](super::SessionOrchestrator).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub identity: ActorIdentity,

    /// Tracking server URL. Empty disables the realtime channel.
    pub server_url: String,

    pub channel: ChannelConfig,
    pub accuracy: AccuracyProfile,
    pub watch: WatchOptions,

    /// How often the current route's ETA is recomputed without input.
    /// Values below [`MIN_ETA_REFRESH`] are raised to it.
    pub eta_refresh: Duration,

    /// Quiet period before a search is issued.
    pub search_debounce: Duration,

    /// Minimum device movement before the live origin updates the route.
    pub route_update_min_distance_m: f64,
}

impl SessionConfig {
    pub fn new(identity: ActorIdentity, server_url: impl Into<String>) -> Self {
        Self {
            identity,
            server_url: server_url.into(),
            channel: ChannelConfig::default(),
            accuracy: AccuracyProfile::default(),
            watch: WatchOptions::default(),
            eta_refresh: DEFAULT_ETA_REFRESH,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            route_update_min_distance_m: DEFAULT_ROUTE_UPDATE_MIN_DISTANCE_M,
        }
    }

    pub fn role(&self) -> Role {
        self.identity.role()
    }

    /// Refresh period actually used by the session.
    pub fn refresh_period(&self) -> Duration {
        self.eta_refresh.max(MIN_ETA_REFRESH)
    }
}
