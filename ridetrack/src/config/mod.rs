//! User configuration for ridetrack.
//!
//! Settings are read from `~/.ridetrack/config.ini`, overlaid with
//! environment variables, and converted into the runtime configs each
//! component takes.
//!
//! # Example
//!
//! ```no_run
//! use ridetrack::config::ConfigFile;
//!
//! let config = ConfigFile::load()?.with_env_overrides()?;
//! let session = config.session_config();
//! let maps = config.maps_config();
//! # Ok::<(), ridetrack::config::ConfigFileError>(())
//! ```

mod defaults;
mod env;
mod file;
mod parser;
mod runtime;
mod settings;
mod writer;

pub use env::{ENV_ACTOR_ID, ENV_MAPS_API_KEY, ENV_ROLE, ENV_SERVER_URL, ENV_WS_URL};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use defaults::*;
pub use settings::{
    ChannelSettings, ConfigFile, LocationSettings, LoggingSettings, MapsSettings, ServerSettings,
    SessionSettings,
};
