//! Periodic session snapshot logging.
//!
//! # Output Format
//!
//! Logs are emitted at DEBUG level with structured fields:
//! - `lat`, `lng` - Latest fix in decimal degrees
//! - `accuracy_m` - Fix accuracy in metres
//! - `connection` - Realtime channel status
//! - `eta` - Current ETA text, if any
//! - `traffic` - Traffic level of the current ETA

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::view::SessionView;

/// Default logging interval (20 seconds).
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(20);

/// Spawns a background task that periodically logs the session view.
///
/// Stops when the cancellation token is triggered. Callers should only
/// spawn it when DEBUG logging is enabled:
///
/// ```ignore
/// if tracing::enabled!(tracing::Level::DEBUG) {
///     spawn_session_logger(handle.subscribe(), cancel, DEFAULT_LOG_INTERVAL);
/// }
/// ```
pub fn spawn_session_logger(
    view: watch::Receiver<SessionView>,
    cancellation: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    log_view(&view.borrow());
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Session logger stopped");
                    break;
                }
            }
        }
    })
}

fn log_view(view: &SessionView) {
    let eta = view
        .eta
        .as_ref()
        .filter(|e| e.success)
        .map(|e| e.effective_duration_text().to_string());

    match &view.fix {
        Some(fix) => tracing::debug!(
            lat = format!("{:.5}", fix.latitude()),
            lng = format!("{:.5}", fix.longitude()),
            accuracy_m = format!("{:.0}", fix.accuracy()),
            connection = %view.connection,
            eta = ?eta,
            traffic = ?view.traffic(),
            "Session update"
        ),
        None => tracing::debug!(
            permission = %view.permission,
            connection = %view.connection,
            "Session update (no fix)"
        ),
    }
}
