//! Platform binding seam for location services.
//!
//! The geolocation source owns permission state, timeouts and throttling;
//! the platform only talks to whatever produces raw readings (mobile OS
//! location APIs, a GPS daemon, a replay file).

use std::future::Future;

use tokio::sync::mpsc;

use super::error::LocationError;
use super::fix::{AccuracyProfile, LocationFix, PermissionStatus, WatchOptions};

/// Raw location provider.
pub trait LocationPlatform: Send + Sync + 'static {
    /// Ask the OS for foreground location permission.
    fn request_permission(&self) -> impl Future<Output = PermissionStatus> + Send;

    /// Produce a single fix. May return a cached reading.
    fn current_fix(
        &self,
        profile: &AccuracyProfile,
    ) -> impl Future<Output = Result<LocationFix, LocationError>> + Send;

    /// Start streaming raw readings in chronological order.
    ///
    /// The stream ends when the receiver is dropped or the platform stops.
    fn watch(&self, options: &WatchOptions) -> Result<mpsc::Receiver<LocationFix>, LocationError>;
}
