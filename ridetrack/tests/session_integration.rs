//! Integration tests for the tracking session.
//!
//! These tests drive a full session through its public handle:
//! - Replayed GPS path → realtime channel (latest fix reaches the server)
//! - Destination changes → ETA results (latest query wins)
//! - Search text bursts → one place search
//! - Job assignments → driver ETAs
//!
//! Time is paused so debounce and refresh timing is deterministic.
//!
//! Run with: `cargo test --test session_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use ridetrack::coord::Coordinate;
use ridetrack::location::{LocationError, PermissionStatus, ReplayPlatform};
use ridetrack::maps::{
    Directions, EtaResult, MappingService, MapsError, PlaceDetails, PlacePrediction,
    ReverseGeocode, RouteQuery,
};
use ridetrack::realtime::{
    ActorIdentity, MemoryPeer, MemoryTransport, Role, EVENT_IDENTIFY, EVENT_JOB_ASSIGNMENT,
    EVENT_LOCATION_UPDATE,
};
use ridetrack::session::{SessionConfig, SessionHandle, SessionOrchestrator, SessionView};

// ============================================================================
// Test Helpers
// ============================================================================

const SERVER_URL: &str = "http://tracker.test";

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

/// Three points roughly 200 m apart heading north.
fn path() -> Vec<Coordinate> {
    vec![coord(6.4500, 3.3900), coord(6.4518, 3.3900), coord(6.4536, 3.3900)]
}

fn config(role: Role, server_url: &str) -> SessionConfig {
    let mut config = SessionConfig::new(ActorIdentity::generate(role), server_url);
    // Keep the periodic refresh out of the way unless a test wants it.
    config.eta_refresh = Duration::from_secs(3600);
    config
}

/// Mapping service with scripted latency and call recording.
#[derive(Clone, Default)]
struct ScriptedMaps {
    /// ETA requests to this destination take 5 s instead of 100 ms.
    slow_destination: Option<Coordinate>,
    eta_calls: Arc<AtomicUsize>,
    searches: Arc<Mutex<Vec<String>>>,
}

impl ScriptedMaps {
    fn label(c: Coordinate) -> String {
        format!("to {:.4},{:.4}", c.latitude, c.longitude)
    }

    fn latency(&self, query: &RouteQuery) -> Duration {
        if Some(query.destination) == self.slow_destination {
            Duration::from_secs(5)
        } else {
            Duration::from_millis(100)
        }
    }
}

impl MappingService for ScriptedMaps {
    async fn search_places(&self, query: &str) -> Result<Vec<PlacePrediction>, MapsError> {
        self.searches.lock().unwrap().push(query.to_string());
        Ok(vec![PlacePrediction {
            place_id: format!("place:{}", query),
            description: format!("{}, Nigeria", query),
            main_text: query.to_string(),
            secondary_text: "Nigeria".to_string(),
        }])
    }

    async fn get_place_details(&self, place_id: &str) -> Result<PlaceDetails, MapsError> {
        Err(MapsError::NotFound(place_id.to_string()))
    }

    async fn reverse_geocode(&self, c: Coordinate) -> Result<ReverseGeocode, MapsError> {
        Ok(ReverseGeocode {
            formatted_address: format!("Street at {}", c),
            short_address: "Street".to_string(),
        })
    }

    async fn calculate_eta(&self, query: RouteQuery) -> EtaResult {
        self.eta_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency(&query)).await;
        EtaResult {
            distance_meters: 1000,
            distance_text: Self::label(query.destination),
            duration_seconds: 300,
            duration_text: "5 mins".to_string(),
            success: true,
            ..Default::default()
        }
    }

    async fn get_directions(&self, query: RouteQuery) -> Result<Directions, MapsError> {
        tokio::time::sleep(self.latency(&query)).await;
        Ok(Directions {
            polyline: String::new(),
            points: vec![query.origin, query.destination],
            distance_meters: 1000,
            distance_text: Self::label(query.destination),
            duration_seconds: 300,
            duration_text: "5 mins".to_string(),
        })
    }
}

async fn wait_for(
    handle: &SessionHandle,
    what: &str,
    pred: impl FnMut(&SessionView) -> bool,
) -> SessionView {
    let mut rx = handle.subscribe();
    let view = match tokio::time::timeout(Duration::from_secs(60), rx.wait_for(pred)).await {
        Ok(Ok(view)) => view.clone(),
        Ok(Err(_)) => panic!("session ended while waiting for {}", what),
        Err(_) => panic!("timed out waiting for {}", what),
    };
    view
}

async fn next_peer(peers: &mut mpsc::UnboundedReceiver<MemoryPeer>) -> MemoryPeer {
    tokio::time::timeout(Duration::from_secs(30), peers.recv())
        .await
        .expect("no connection attempt")
        .expect("transport dropped")
}

// ============================================================================
// Location → channel
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_identifies_then_streams_latest_fix() {
    let (transport, mut peers) = MemoryTransport::new();
    let platform = ReplayPlatform::new(path()).with_cadence(Duration::from_secs(1));
    let handle = SessionOrchestrator::start(
        config(Role::Rider, SERVER_URL),
        platform,
        ScriptedMaps::default(),
        transport,
    );

    let mut peer = next_peer(&mut peers).await;
    let identify = peer.recv().await.expect("identify frame");
    assert_eq!(identify.event, EVENT_IDENTIFY);
    assert_eq!(identify.data["role"], "rider");

    let last = *path().last().unwrap();
    let mut seen = 0;
    loop {
        let update = tokio::time::timeout(
            Duration::from_secs(30),
            peer.recv_event(EVENT_LOCATION_UPDATE),
        )
        .await
        .expect("location update")
        .expect("connection open");
        seen += 1;
        assert!(update.data.get("riderId").is_some());
        if update.data["lat"].as_f64() == Some(last.latitude) {
            break;
        }
    }
    assert!(seen >= 1);

    let view = wait_for(&handle, "connected view at last fix", |v| {
        v.connection.is_connected()
            && v.origin_address.is_some()
            && v.fix.as_ref().is_some_and(|f| f.latitude() == last.latitude)
    })
    .await;
    assert!(view.location_error.is_none());

    handle.shutdown().await;
    assert!(!handle.view().connection.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_server_does_not_stop_tracking() {
    let (transport, _peers) = MemoryTransport::new();
    transport.refuse_all(Some("connection refused"));
    let platform = ReplayPlatform::new(path()).with_cadence(Duration::from_secs(1));
    let handle = SessionOrchestrator::start(
        config(Role::Rider, SERVER_URL),
        platform,
        ScriptedMaps::default(),
        transport.clone(),
    );

    let last = *path().last().unwrap();
    let view = wait_for(&handle, "last fix", |v| {
        v.fix.as_ref().is_some_and(|f| f.latitude() == last.latitude)
    })
    .await;
    assert!(!view.connection.is_connected());

    // Budget exhausted: the initial attempt plus five reconnects.
    let view = wait_for(&handle, "give up", |v| {
        v.connection.last_error.is_some() && v.connection.reconnect_attempts == 6
    })
    .await;
    assert!(view.fix.is_some());
    assert_eq!(transport.attempts(), 6);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_is_flagged() {
    let (transport, _peers) = MemoryTransport::new();
    let platform = ReplayPlatform::new(path()).with_permission(PermissionStatus::Denied);
    let handle = SessionOrchestrator::start(
        config(Role::Rider, ""),
        platform,
        ScriptedMaps::default(),
        transport,
    );

    let view = wait_for(&handle, "denial", |v| v.permission == PermissionStatus::Denied).await;
    assert_eq!(view.location_error, Some(LocationError::PermissionDenied));
    assert!(view.fix.is_none());

    handle.retry_location().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.view().location_error, Some(LocationError::PermissionDenied));
    assert!(handle.is_running());
    handle.shutdown().await;
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_latest_destination_wins_over_slow_earlier_request() {
    let slow = coord(6.6018, 3.3515);
    let fast = coord(6.5244, 3.3792);
    let maps = ScriptedMaps {
        slow_destination: Some(slow),
        ..Default::default()
    };
    let (transport, _peers) = MemoryTransport::new();
    let handle = SessionOrchestrator::start(
        config(Role::Rider, ""),
        ReplayPlatform::new(path()),
        maps,
        transport,
    );
    wait_for(&handle, "first fix", |v| v.fix.is_some()).await;

    handle.set_destination(slow, Some("Ikeja".into())).unwrap();
    handle.set_destination(fast, Some("Yaba".into())).unwrap();

    // Let both requests finish; the slow one completes last.
    tokio::time::sleep(Duration::from_secs(10)).await;

    let view = handle.view();
    assert_eq!(view.route_query.unwrap().destination, fast);
    assert_eq!(view.eta.unwrap().distance_text, ScriptedMaps::label(fast));
    assert_eq!(view.route.unwrap().distance_text, ScriptedMaps::label(fast));
    assert_eq!(view.destination_address.as_deref(), Some("Yaba"));
    assert!(!view.loading_eta);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_eta_refreshes_periodically() {
    let maps = ScriptedMaps::default();
    let calls = Arc::clone(&maps.eta_calls);
    let (transport, _peers) = MemoryTransport::new();
    let mut config = config(Role::Rider, "");
    config.eta_refresh = Duration::from_secs(60);
    let handle =
        SessionOrchestrator::start(config, ReplayPlatform::new(path()), maps, transport);
    wait_for(&handle, "first fix", |v| v.fix.is_some()).await;

    handle.set_destination(coord(6.5244, 3.3792), None).unwrap();
    wait_for(&handle, "eta", |v| v.eta.is_some()).await;
    let after_first = calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(125)).await;
    assert!(calls.load(Ordering::SeqCst) >= after_first + 2);

    handle.clear_route().unwrap();
    wait_for(&handle, "cleared", |v| v.route_query.is_none()).await;
    let after_clear = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_clear);
    handle.shutdown().await;
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_search_burst_issues_one_request() {
    let maps = ScriptedMaps::default();
    let searches = Arc::clone(&maps.searches);
    let (transport, _peers) = MemoryTransport::new();
    let handle = SessionOrchestrator::start(
        config(Role::Rider, ""),
        ReplayPlatform::new(path()),
        maps,
        transport,
    );

    for text in ["L", "La", "Lag"] {
        handle.search(text).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let view = wait_for(&handle, "predictions", |v| !v.predictions.is_empty()).await;
    assert_eq!(view.predictions[0].main_text, "Lag");
    assert_eq!(*searches.lock().unwrap(), vec!["Lag".to_string()]);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_place_lookup_is_flagged() {
    let (transport, _peers) = MemoryTransport::new();
    let handle = SessionOrchestrator::start(
        config(Role::Rider, ""),
        ReplayPlatform::new(path()),
        ScriptedMaps::default(),
        transport,
    );

    handle
        .select_place("missing", ridetrack::session::LocationTarget::Destination)
        .unwrap();
    let view = wait_for(&handle, "search failure", |v| v.search_failed).await;
    assert!(view.route_query.is_none());
    assert!(handle.is_running());
    handle.shutdown().await;
}

// ============================================================================
// Job assignments
// ============================================================================

fn job_payload() -> serde_json::Value {
    json!({
        "pickup": { "latitude": 6.5244, "longitude": 3.3792, "address": "Yaba" },
        "destination": { "latitude": 6.6018, "longitude": 3.3515, "address": "Ikeja" }
    })
}

#[tokio::test(start_paused = true)]
async fn test_driver_gets_job_etas() {
    let (transport, mut peers) = MemoryTransport::new();
    let handle = SessionOrchestrator::start(
        config(Role::Driver, SERVER_URL),
        ReplayPlatform::new(path()),
        ScriptedMaps::default(),
        transport,
    );
    let peer = next_peer(&mut peers).await;
    wait_for(&handle, "connected with fix", |v| {
        v.connection.is_connected() && v.fix.is_some()
    })
    .await;

    assert!(peer.send(EVENT_JOB_ASSIGNMENT, job_payload()));

    let view = wait_for(&handle, "job eta", |v| v.job_eta.is_some()).await;
    let job = view.job.unwrap();
    assert_eq!(job.pickup.address.as_deref(), Some("Yaba"));
    let eta = view.job_eta.unwrap();
    assert_eq!(eta.to_pickup.distance_text, ScriptedMaps::label(coord(6.5244, 3.3792)));
    assert_eq!(eta.to_destination.distance_text, ScriptedMaps::label(coord(6.6018, 3.3515)));
    assert!(view.last_message.unwrap().starts_with(EVENT_JOB_ASSIGNMENT));
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_rider_ignores_job_assignment() {
    let (transport, mut peers) = MemoryTransport::new();
    let handle = SessionOrchestrator::start(
        config(Role::Rider, SERVER_URL),
        ReplayPlatform::new(path()),
        ScriptedMaps::default(),
        transport,
    );
    let peer = next_peer(&mut peers).await;
    wait_for(&handle, "connected", |v| v.connection.is_connected()).await;

    assert!(peer.send(EVENT_JOB_ASSIGNMENT, job_payload()));
    assert!(peer.send("announcement", json!({ "text": "hello" })));

    let view = wait_for(&handle, "broadcast", |v| {
        v.last_message.as_deref().is_some_and(|m| m.starts_with("announcement"))
    })
    .await;
    assert!(view.job.is_none());
    assert!(view.job_eta.is_none());
    handle.shutdown().await;
}
