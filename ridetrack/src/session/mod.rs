//! Tracking session orchestration.
//!
//! The session ties the location source, mapping service and realtime
//! channel together and publishes one [`SessionView`] to the presentation
//! layer.
//!
//! ```text
//! GeolocationSource ──fix──┐
//! RealtimeChannel ──job────┼──► Session loop ──► watch<SessionView>
//! SessionHandle ──command──┘         │
//!                                    └──spawn──► MappingService calls
//! ```
//!
//! Mapping results are tagged with a [`RequestToken`]; an older request
//! finishing late never overwrites a newer one.

mod config;
mod debounce;
mod error;
mod logger;
mod orchestrator;
mod recency;
mod view;

pub use config::{SessionConfig, DEFAULT_ETA_REFRESH, DEFAULT_ROUTE_UPDATE_MIN_DISTANCE_M};
pub use debounce::{Debouncer, DEFAULT_SEARCH_DEBOUNCE};
pub use error::{ErrorKind, SessionError};
pub use logger::{spawn_session_logger, DEFAULT_LOG_INTERVAL};
pub use orchestrator::{SessionHandle, SessionOrchestrator};
pub use recency::{RequestSequencer, RequestToken};
pub use view::{JobEta, LocationTarget, SessionView, UNKNOWN_LOCATION};
