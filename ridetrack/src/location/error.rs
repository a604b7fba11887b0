//! Error types for location acquisition.

use thiserror::Error;

/// Errors reported by the geolocation source.
///
/// None of these are fatal to the process; the caller decides whether and
/// when to retry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocationError {
    /// The user (or OS policy) denied location access.
    #[error("Location permission was denied")]
    PermissionDenied,

    /// No fix arrived within the configured timeout.
    #[error("Timed out waiting for a location fix after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The platform could not produce a fix (no provider, hardware off, ...).
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    /// The platform produced a reading outside valid coordinate ranges.
    #[error("Invalid location fix: {0}")]
    InvalidFix(String),
}
