//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use ridetrack::config::{config_file_path, ConfigFileError, ENV_MAPS_API_KEY};
use ridetrack::maps::{MapsError, PolylineError};
use ridetrack::session::SessionError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Mapping service request failed
    Maps(MapsError),
    /// Polyline could not be decoded
    Polyline(PolylineError),
    /// Tracking session rejected a command
    Session(SessionError),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Maps(MapsError::Config(_)) = self {
            eprintln!();
            eprintln!("Set a Google Maps API key, either:");
            eprintln!("  1. api_key under [maps] in {}", config_file_path().display());
            eprintln!("  2. the {} environment variable", ENV_MAPS_API_KEY);
            eprintln!("The key needs the Places, Geocoding, Distance Matrix and Directions APIs.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Maps(e) => write!(f, "Mapping request failed: {}", e),
            CliError::Polyline(e) => write!(f, "Invalid polyline: {}", e),
            CliError::Session(e) => write!(f, "Tracking session error: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Maps(e) => Some(e),
            CliError::Polyline(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<MapsError> for CliError {
    fn from(e: MapsError) -> Self {
        CliError::Maps(e)
    }
}

impl From<PolylineError> for CliError {
    fn from(e: PolylineError) -> Self {
        CliError::Polyline(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}
