//! Location fix and acquisition option types.

use std::time::Duration;

use crate::coord::Coordinate;

use super::error::LocationError;

/// A single location reading.
///
/// Fixes are immutable once built; every new reading supersedes the previous
/// one rather than mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    speed: Option<f64>,
    heading: Option<f64>,
    altitude: Option<f64>,
    timestamp_millis: i64,
}

impl LocationFix {
    /// Create a fix, validating the coordinate ranges.
    ///
    /// Accuracy defaults to 0 m and vector fields to unknown; use the
    /// `with_*` builders to fill them in.
    pub fn new(latitude: f64, longitude: f64, timestamp_millis: i64) -> Result<Self, LocationError> {
        Coordinate::new(latitude, longitude)
            .map_err(|e| LocationError::InvalidFix(e.to_string()))?;

        Ok(Self {
            latitude,
            longitude,
            accuracy: 0.0,
            speed: None,
            heading: None,
            altitude: None,
            timestamp_millis,
        })
    }

    /// Create a fix at a coordinate stamped with the current wall-clock time.
    pub fn now_at(coordinate: Coordinate) -> Result<Self, LocationError> {
        Self::new(
            coordinate.latitude,
            coordinate.longitude,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Horizontal accuracy radius in metres.
    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = meters.max(0.0);
        self
    }

    /// Ground speed in metres per second.
    pub fn with_speed(mut self, meters_per_sec: f64) -> Self {
        self.speed = Some(meters_per_sec);
        self
    }

    /// Heading in degrees from true north (0-360).
    pub fn with_heading(mut self, degrees: f64) -> Self {
        self.heading = Some(degrees.rem_euclid(360.0));
        self
    }

    /// Altitude in metres above the WGS84 ellipsoid.
    pub fn with_altitude(mut self, meters: f64) -> Self {
        self.altitude = Some(meters);
        self
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    /// Unix timestamp of the reading in milliseconds.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    /// The fix position as a coordinate.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Age of the fix relative to `now_millis`, saturating at zero.
    pub fn age(&self, now_millis: i64) -> Duration {
        let ms = now_millis.saturating_sub(self.timestamp_millis).max(0);
        Duration::from_millis(ms as u64)
    }

    /// Returns true if the reported accuracy is within `threshold_m`.
    pub fn is_accurate(&self, threshold_m: f64) -> bool {
        self.accuracy <= threshold_m
    }
}

/// Options for a one-shot fix.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyProfile {
    /// Ask the platform for GPS-grade accuracy.
    pub enable_high_accuracy: bool,

    /// How long to wait for a fix before reporting a timeout.
    pub timeout: Duration,

    /// Maximum age of a cached fix the platform may return.
    pub max_age: Duration,
}

impl Default for AccuracyProfile {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(15_000),
            max_age: Duration::from_millis(1_000),
        }
    }
}

/// Options for a continuing location subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Ask the platform for GPS-grade accuracy.
    pub enable_high_accuracy: bool,

    /// Emit at least this often while readings keep arriving.
    pub time_interval: Duration,

    /// Emit immediately once the device moves further than this.
    pub min_distance_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            time_interval: Duration::from_millis(7_000),
            min_distance_m: 10.0,
        }
    }
}

/// OS-level permission decision for location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    /// Not asked yet.
    #[default]
    Undetermined,
    /// Location access granted.
    Granted,
    /// Location access denied; terminal until the user re-grants externally.
    Denied,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undetermined => write!(f, "undetermined"),
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}
