//! Derived state published to the presentation layer.

use crate::location::{LocationError, LocationFix, PermissionStatus};
use crate::maps::{Directions, EtaResult, PlacePrediction, RouteQuery, TrafficLevel};
use crate::realtime::{ChannelStatus, JobAssignment};

/// Address shown when a coordinate could not be reverse geocoded.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Which end of the route a place applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationTarget {
    Origin,
    Destination,
}

/// ETAs for an assigned job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEta {
    /// Current position to pickup.
    pub to_pickup: EtaResult,
    /// Pickup to drop-off.
    pub to_destination: EtaResult,
}

/// One consistent snapshot of the tracking session.
///
/// Failures in mapping or channel calls only set flags here; they never
/// stop tracking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub permission: PermissionStatus,
    pub fix: Option<LocationFix>,
    pub connection: ChannelStatus,
    pub route_query: Option<RouteQuery>,
    pub eta: Option<EtaResult>,
    pub route: Option<Directions>,
    pub job: Option<JobAssignment>,
    pub job_eta: Option<JobEta>,
    pub predictions: Vec<PlacePrediction>,
    pub origin_address: Option<String>,
    pub destination_address: Option<String>,
    /// Summary of the most recent inbound message.
    pub last_message: Option<String>,
    pub loading_eta: bool,

    /// The last ETA computation failed.
    pub route_unavailable: bool,
    /// The last search or place lookup failed.
    pub search_failed: bool,
    /// The last reverse geocode failed; the address reads [`UNKNOWN_LOCATION`].
    pub geocode_failed: bool,
    pub location_error: Option<LocationError>,
    pub config_error: Option<String>,
}

impl SessionView {
    /// Traffic condition of the current ETA, if known.
    pub fn traffic(&self) -> Option<TrafficLevel> {
        self.eta.as_ref().and_then(EtaResult::traffic_level)
    }

    /// Returns true if the current fix is within `threshold_m`.
    pub fn has_accurate_fix(&self, threshold_m: f64) -> bool {
        self.fix.as_ref().is_some_and(|f| f.is_accurate(threshold_m))
    }
}
