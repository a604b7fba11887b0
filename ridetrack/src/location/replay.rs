//! Scripted location platform that walks a fixed path.
//!
//! Used for demos, the CLI `track --replay` mode, and tests that need a
//! realistic stream of fixes without device hardware.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::coord::{distance_m, Coordinate};

use super::error::LocationError;
use super::fix::{AccuracyProfile, LocationFix, PermissionStatus, WatchOptions};
use super::platform::LocationPlatform;

/// Default delay between replayed readings.
pub const DEFAULT_REPLAY_CADENCE: Duration = Duration::from_secs(1);

/// Accuracy reported for replayed readings, in metres.
pub const DEFAULT_REPLAY_ACCURACY_M: f64 = 5.0;

/// Platform that replays a list of coordinates.
#[derive(Debug, Clone)]
pub struct ReplayPlatform {
    path: Arc<Vec<Coordinate>>,
    cadence: Duration,
    accuracy_m: f64,
    permission: PermissionStatus,
    looped: bool,
    cursor: Arc<AtomicUsize>,
}

impl ReplayPlatform {
    pub fn new(path: Vec<Coordinate>) -> Self {
        Self {
            path: Arc::new(path),
            cadence: DEFAULT_REPLAY_CADENCE,
            accuracy_m: DEFAULT_REPLAY_ACCURACY_M,
            permission: PermissionStatus::Granted,
            looped: false,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load a path from a text file with one `lat,lng` pair per line.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_file(path: &Path) -> Result<Self, LocationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LocationError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content).map(Self::new)
    }

    /// Parse `lat,lng` lines into a path.
    pub fn parse(content: &str) -> Result<Vec<Coordinate>, LocationError> {
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| {
                l.parse::<Coordinate>()
                    .map_err(|e| LocationError::InvalidFix(e.to_string()))
            })
            .collect()
    }

    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy_m = meters;
        self
    }

    /// Simulate the user's permission answer.
    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    /// Restart from the beginning after the last point.
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    fn fix_at(path: &[Coordinate], index: usize, cadence: Duration, accuracy_m: f64) -> Option<LocationFix> {
        let here = *path.get(index)?;
        let mut fix = LocationFix::now_at(here).ok()?.with_accuracy(accuracy_m);

        if index > 0 {
            let prev = path[index - 1];
            let secs = cadence.as_secs_f64();
            if secs > 0.0 {
                fix = fix.with_speed(distance_m(&prev, &here) / secs);
            }
            if prev != here {
                fix = fix.with_heading(bearing_deg(prev, here));
            }
        }
        Some(fix)
    }
}

impl LocationPlatform for ReplayPlatform {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn current_fix(&self, _profile: &AccuracyProfile) -> Result<LocationFix, LocationError> {
        let index = self.cursor.load(Ordering::Relaxed);
        Self::fix_at(&self.path, index, self.cadence, self.accuracy_m)
            .ok_or_else(|| LocationError::Unavailable("replay path is empty".to_string()))
    }

    fn watch(&self, _options: &WatchOptions) -> Result<mpsc::Receiver<LocationFix>, LocationError> {
        if self.path.is_empty() {
            return Err(LocationError::Unavailable("replay path is empty".to_string()));
        }

        let (tx, rx) = mpsc::channel(16);
        let path = Arc::clone(&self.path);
        let cursor = Arc::clone(&self.cursor);
        let cadence = self.cadence;
        let accuracy_m = self.accuracy_m;
        let looped = self.looped;

        tokio::spawn(async move {
            let mut index = 0;
            loop {
                if index >= path.len() {
                    if !looped {
                        break;
                    }
                    index = 0;
                }
                cursor.store(index, Ordering::Relaxed);
                let Some(fix) = Self::fix_at(&path, index, cadence, accuracy_m) else {
                    break;
                };
                if tx.send(fix).await.is_err() {
                    break;
                }
                index += 1;
                tokio::time::sleep(cadence).await;
            }
            debug!(points = path.len(), "Replay finished");
        });

        Ok(rx)
    }
}

/// Initial bearing from `a` to `b` in degrees from true north.
fn bearing_deg(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlon = (b.longitude - a.longitude).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}
