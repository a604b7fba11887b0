//! Geolocation source.
//!
//! Wraps a platform location provider with permission tracking, timeouts on
//! one-shot fixes, and a subscription that emits fixes on time or distance
//! thresholds.
//!
//! # Architecture
//!
//! ```text
//! LocationPlatform ──raw readings──► FixThrottle ──► subscriber callback
//!        ▲                                               (in order)
//!        └── request_permission / current_fix
//! ```
//!
//! Platforms ([`ReplayPlatform`] or a device binding) only produce raw
//! readings. [`GeolocationSource`] owns every policy decision.
//!
//! # Usage
//!
//! ```ignore
//! let source = GeolocationSource::new(ReplayPlatform::new(path));
//! source.request_permission().await;
//! let handle = source.subscribe(|fix| println!("{:?}", fix), WatchOptions::default())?;
//! // ...
//! source.unsubscribe(&handle);
//! ```

mod error;
mod fix;
mod platform;
mod replay;
mod source;
mod throttle;

pub use error::LocationError;
pub use fix::{AccuracyProfile, LocationFix, PermissionStatus, WatchOptions};
pub use platform::LocationPlatform;
pub use replay::{ReplayPlatform, DEFAULT_REPLAY_ACCURACY_M, DEFAULT_REPLAY_CADENCE};
pub use source::{FixCallback, GeolocationSource, SubscriptionHandle};
pub use throttle::FixThrottle;
