//! RideTrack - live rider/driver tracking sessions
//!
//! This library combines device geolocation, a realtime channel to a
//! tracking server, and a mapping web service into one tracking session
//! whose state is published as a single view.
//!
//! # High-Level API
//!
//! ```ignore
//! use ridetrack::config::ConfigFile;
//! use ridetrack::maps::GoogleMapsClient;
//! use ridetrack::realtime::WebSocketTransport;
//! use ridetrack::session::SessionOrchestrator;
//!
//! let config = ConfigFile::load()?.with_env_overrides()?;
//! let maps = GoogleMapsClient::from_config(config.maps_config())?;
//! let session = SessionOrchestrator::start(
//!     config.session_config(),
//!     platform,
//!     maps,
//!     WebSocketTransport::new(),
//! );
//!
//! let mut view = session.subscribe();
//! while view.changed().await.is_ok() {
//!     println!("{:?}", view.borrow().eta);
//! }
//! ```

pub mod config;
pub mod coord;
pub mod location;
pub mod logging;
pub mod maps;
pub mod realtime;
pub mod session;

/// Version of the RideTrack library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
