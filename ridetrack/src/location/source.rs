//! Geolocation source: permission, one-shot fixes and throttled subscriptions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::LocationError;
use super::fix::{AccuracyProfile, LocationFix, PermissionStatus, WatchOptions};
use super::platform::LocationPlatform;
use super::throttle::FixThrottle;

/// Callback invoked with each emitted fix.
pub type FixCallback = Box<dyn FnMut(LocationFix) + Send>;

type CallbackSlot = Arc<Mutex<Option<FixCallback>>>;

/// Handle for an active location subscription.
///
/// Cloning the handle does not create a new subscription; all clones refer
/// to the same one.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: u64,
    slot: CallbackSlot,
    cancel: CancellationToken,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true until the subscription is cancelled.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the subscription. Idempotent.
    ///
    /// Callbacks run while holding the slot lock, so once this returns no
    /// callback is running or will run. Must not be called from inside the
    /// subscription's own callback.
    fn cancel(&self) {
        self.cancel.cancel();
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Location acquisition on top of a [`LocationPlatform`].
///
/// At most one subscription is active per source; subscribing again cancels
/// the previous one.
pub struct GeolocationSource<P: LocationPlatform> {
    platform: Arc<P>,
    permission: Mutex<PermissionStatus>,
    active: Mutex<Option<SubscriptionHandle>>,
    next_id: AtomicU64,
}

impl<P: LocationPlatform> GeolocationSource<P> {
    pub fn new(platform: P) -> Self {
        Self::with_shared(Arc::new(platform))
    }

    pub fn with_shared(platform: Arc<P>) -> Self {
        Self {
            platform,
            permission: Mutex::new(PermissionStatus::Undetermined),
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Last known permission decision.
    pub fn permission(&self) -> PermissionStatus {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(PermissionStatus::Undetermined)
    }

    /// Ask the platform for location permission and remember the answer.
    pub async fn request_permission(&self) -> PermissionStatus {
        let status = self.platform.request_permission().await;
        if let Ok(mut permission) = self.permission.lock() {
            *permission = status;
        }
        match status {
            PermissionStatus::Granted => info!("Location permission granted"),
            other => warn!(status = %other, "Location permission not granted"),
        }
        status
    }

    /// Get a single fix within the profile's timeout.
    ///
    /// A fix older than `max_age` is discarded and the platform asked once
    /// more before giving up with [`LocationError::Unavailable`]. A zero
    /// `max_age` only forbids cached readings, which is the platform's job,
    /// so no age check is applied.
    pub async fn get_current_fix(
        &self,
        profile: &AccuracyProfile,
    ) -> Result<LocationFix, LocationError> {
        self.ensure_granted()?;

        let timeout_ms = profile.timeout.as_millis() as u64;
        let attempt = async {
            for _ in 0..2 {
                let fix = self.platform.current_fix(profile).await?;
                let age = fix.age(chrono::Utc::now().timestamp_millis());
                if profile.max_age.is_zero() || age <= profile.max_age {
                    return Ok(fix);
                }
                debug!(age_ms = age.as_millis() as u64, "Discarding stale cached fix");
            }
            Err(LocationError::Unavailable("only stale fixes available".to_string()))
        };

        let fix = tokio::time::timeout(profile.timeout, attempt)
            .await
            .map_err(|_| LocationError::Timeout { timeout_ms })??;

        debug!(
            lat = fix.latitude(),
            lng = fix.longitude(),
            accuracy = fix.accuracy(),
            "Got current fix"
        );
        Ok(fix)
    }

    /// Start a throttled subscription, replacing any active one.
    ///
    /// Must be called from within a tokio runtime. Fixes are delivered in
    /// chronological order.
    pub fn subscribe<F>(
        &self,
        on_fix: F,
        options: WatchOptions,
    ) -> Result<SubscriptionHandle, LocationError>
    where
        F: FnMut(LocationFix) + Send + 'static,
    {
        self.ensure_granted()?;

        if let Some(previous) = self.take_active() {
            debug!(id = previous.id, "Replacing active location subscription");
            previous.cancel();
        }

        let raw = self.platform.watch(&options)?;
        let handle = SubscriptionHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            slot: Arc::new(Mutex::new(Some(Box::new(on_fix)))),
            cancel: CancellationToken::new(),
        };

        tokio::spawn(run_subscription(
            raw,
            FixThrottle::new(options.time_interval, options.min_distance_m),
            handle.slot.clone(),
            handle.cancel.clone(),
        ));

        if let Ok(mut active) = self.active.lock() {
            *active = Some(handle.clone());
        }

        info!(
            id = handle.id,
            interval_ms = options.time_interval.as_millis() as u64,
            min_distance_m = options.min_distance_m,
            "Location subscription started"
        );
        Ok(handle)
    }

    /// Stop a subscription. Safe to call repeatedly or with a stale handle.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        if let Ok(mut active) = self.active.lock() {
            if active.as_ref().is_some_and(|h| h.id == handle.id) {
                active.take();
            }
        }
        if handle.is_active() {
            info!(id = handle.id, "Location subscription stopped");
        }
        handle.cancel();
    }

    /// The currently active subscription, if any.
    pub fn active_subscription(&self) -> Option<SubscriptionHandle> {
        self.active
            .lock()
            .ok()
            .and_then(|a| a.clone())
            .filter(SubscriptionHandle::is_active)
    }

    fn take_active(&self) -> Option<SubscriptionHandle> {
        self.active.lock().ok().and_then(|mut a| a.take())
    }

    fn ensure_granted(&self) -> Result<(), LocationError> {
        match self.permission() {
            PermissionStatus::Granted => Ok(()),
            _ => Err(LocationError::PermissionDenied),
        }
    }
}

impl<P: LocationPlatform> Drop for GeolocationSource<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.take_active() {
            handle.cancel();
        }
    }
}

async fn run_subscription(
    mut raw: mpsc::Receiver<LocationFix>,
    mut throttle: FixThrottle,
    slot: CallbackSlot,
    cancel: CancellationToken,
) {
    loop {
        let deadline = throttle
            .next_deadline()
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
        let has_pending = throttle.next_deadline().is_some();

        let emitted = tokio::select! {
            _ = cancel.cancelled() => break,
            reading = raw.recv() => match reading {
                Some(fix) => throttle.offer(fix, Instant::now()),
                None => {
                    debug!("Location platform stream ended");
                    break;
                }
            },
            _ = tokio::time::sleep_until(deadline), if has_pending => {
                throttle.flush(Instant::now())
            }
        };

        if let Some(fix) = emitted {
            if !deliver(&slot, fix) {
                break;
            }
        }
    }
}

/// Invoke the callback under the slot lock. Returns false once cancelled.
fn deliver(slot: &CallbackSlot, fix: LocationFix) -> bool {
    let Ok(mut guard) = slot.lock() else {
        return false;
    };
    match guard.as_mut() {
        Some(callback) => {
            callback(fix);
            true
        }
        None => false,
    }
}
