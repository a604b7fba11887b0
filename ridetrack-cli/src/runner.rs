//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, runtime and client
//! creation to reduce duplication across command handlers.

use tokio::runtime::Runtime;
use tracing::info;

use ridetrack::config::ConfigFile;
use ridetrack::logging::{init_logging, LoggingGuard};
use ridetrack::maps::{AsyncReqwestClient, GoogleMapsClient};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Configuration file with environment overrides applied
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - Default to debug-level logging when RUST_LOG is unset
    /// * `stdout_logging` - Mirror log records to stdout
    pub fn new(debug_mode: bool, stdout_logging: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?.with_env_overrides()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| ridetrack::logging::default_log_file().to_string());

        let logging_guard = init_logging(&log_dir, &log_file, stdout_logging, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Mutable access for command-line overrides.
    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("RideTrack v{}", ridetrack::VERSION);
        info!("RideTrack CLI: {} command", command);
    }

    /// Multi-threaded runtime for async commands.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        Runtime::new().map_err(CliError::Runtime)
    }

    /// Mapping client from the configured credentials.
    ///
    /// A missing key is not an error here; each request reports it.
    pub fn maps_client(&self) -> Result<GoogleMapsClient<AsyncReqwestClient>, CliError> {
        let client = GoogleMapsClient::from_config(self.config.maps_config())?;
        if !self.config.maps_config().has_credential() {
            info!("No mapping API key configured");
        }
        Ok(client)
    }
}
