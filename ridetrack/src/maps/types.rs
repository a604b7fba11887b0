//! Result types returned by the mapping service.

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// Delay above which traffic counts as heavy, in seconds.
pub const HEAVY_TRAFFIC_DELAY_SECS: u64 = 300;

/// Delay above which traffic counts as light, in seconds.
pub const LIGHT_TRAFFIC_DELAY_SECS: u64 = 60;

/// A route between two points. Compared by coordinate values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl RouteQuery {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self { origin, destination }
    }

    /// The same route travelled the other way.
    pub fn reversed(&self) -> Self {
        Self::new(self.destination, self.origin)
    }
}

/// One place autocomplete suggestion, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacePrediction {
    pub place_id: String,
    pub description: String,
    pub main_text: String,
    pub secondary_text: String,
}

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub coordinate: Coordinate,
    pub formatted_address: String,
    pub name: String,
}

/// Address for a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocode {
    pub formatted_address: String,
    /// First address component, or the full address when there is none.
    pub short_address: String,
}

/// Outcome of an ETA computation.
///
/// Provider failures are reported with `success == false` rather than an
/// error, so callers must check [`EtaResult::success`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtaResult {
    pub distance_meters: u64,
    pub distance_text: String,
    pub duration_seconds: u64,
    pub duration_text: String,
    pub duration_in_traffic_seconds: Option<u64>,
    pub duration_in_traffic_text: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl EtaResult {
    /// A failed computation with a diagnostic message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Best available duration: traffic-aware if present.
    pub fn effective_duration_seconds(&self) -> u64 {
        self.duration_in_traffic_seconds
            .unwrap_or(self.duration_seconds)
    }

    /// Human duration text, preferring the traffic-aware figure.
    pub fn effective_duration_text(&self) -> &str {
        self.duration_in_traffic_text
            .as_deref()
            .unwrap_or(&self.duration_text)
    }

    /// Classify the traffic delay, if the provider reported a traffic figure.
    pub fn traffic_level(&self) -> Option<TrafficLevel> {
        if !self.success {
            return None;
        }
        let in_traffic = self.duration_in_traffic_seconds?;
        let delay = in_traffic.saturating_sub(self.duration_seconds);

        Some(if delay > HEAVY_TRAFFIC_DELAY_SECS {
            TrafficLevel::Heavy {
                delay_minutes: (delay + 30) / 60,
            }
        } else if delay > LIGHT_TRAFFIC_DELAY_SECS {
            TrafficLevel::Light
        } else {
            TrafficLevel::Clear
        })
    }
}

/// Traffic condition derived from an ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficLevel {
    Clear,
    Light,
    Heavy { delay_minutes: u64 },
}

impl std::fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clear => write!(f, "Clear"),
            Self::Light => write!(f, "Light traffic"),
            Self::Heavy { delay_minutes } => {
                write!(f, "Heavy traffic (+{} min delay)", delay_minutes)
            }
        }
    }
}

/// A driving route with its decoded overview path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directions {
    /// Encoded overview polyline as returned by the provider.
    pub polyline: String,
    pub points: Vec<Coordinate>,
    pub distance_meters: u64,
    pub distance_text: String,
    pub duration_seconds: u64,
    pub duration_text: String,
}
