//! Session orchestrator: one event loop reconciling fixes, channel state and
//! mapping results into a single [`SessionView`].
//!
//! # Design
//!
//! - `start()` spawns the loop and returns a cloneable [`SessionHandle`]
//! - Every slow call runs in its own task and reports back as an `Outcome`
//! - ETA, search and place results carry a [`RequestToken`]; only the
//!   latest token per stream is applied, whatever the arrival order
//! - The view is republished through a `watch` channel after every event

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{distance_m, Coordinate};
use crate::location::{
    GeolocationSource, LocationError, LocationFix, LocationPlatform, PermissionStatus,
    SubscriptionHandle,
};
use crate::maps::{
    Directions, EtaResult, MappingService, MapsError, PlaceDetails, PlacePrediction,
    ReverseGeocode, RouteQuery,
};
use crate::realtime::{ChannelError, ChannelStatus, JobAssignment, RealtimeChannel, Role, Transport};

use super::config::SessionConfig;
use super::debounce::Debouncer;
use super::error::SessionError;
use super::recency::{RequestSequencer, RequestToken};
use super::view::{JobEta, LocationTarget, SessionView, UNKNOWN_LOCATION};

enum Command {
    SetDestination {
        coordinate: Coordinate,
        address: Option<String>,
    },
    SetOrigin {
        coordinate: Coordinate,
        address: Option<String>,
    },
    ClearRoute,
    SwapLocations,
    Search(String),
    SelectPlace {
        place_id: String,
        target: LocationTarget,
    },
    RefreshEta,
    RetryLocation,
}

/// What a reverse geocode was for.
enum GeocodeFor {
    LiveOrigin,
    Origin(Coordinate),
    Destination(Coordinate),
}

enum Outcome {
    Permission(PermissionStatus),
    InitialFix(Result<LocationFix, LocationError>),
    Connected(Result<(), ChannelError>),
    Eta {
        token: RequestToken,
        eta: EtaResult,
    },
    Route {
        token: RequestToken,
        result: Result<Directions, MapsError>,
    },
    Search {
        token: RequestToken,
        result: Result<Vec<PlacePrediction>, MapsError>,
    },
    Place {
        token: RequestToken,
        target: LocationTarget,
        result: Result<PlaceDetails, MapsError>,
    },
    Geocoded {
        target: GeocodeFor,
        result: Result<ReverseGeocode, MapsError>,
    },
    JobEta {
        token: RequestToken,
        eta: JobEta,
    },
}

/// Entry point for a tracking session.
pub struct SessionOrchestrator;

impl SessionOrchestrator {
    /// Start a session on the current tokio runtime.
    ///
    /// Permission is requested, a first fix acquired and the realtime
    /// channel connected in the background; progress shows up in the view.
    pub fn start<P, M, T>(config: SessionConfig, platform: P, maps: M, transport: T) -> SessionHandle
    where
        P: LocationPlatform,
        M: MappingService,
        T: Transport,
    {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (outcomes_tx, outcomes) = mpsc::unbounded_channel();
        let (fix_tx, fixes) = mpsc::unbounded_channel();
        let (jobs_tx, jobs) = mpsc::unbounded_channel();
        let (messages_tx, messages) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SessionView::default());
        let cancel = CancellationToken::new();

        let channel = Arc::new(RealtimeChannel::new(transport, config.channel.clone()));
        channel.on_job_assignment(move |job| {
            let _ = jobs_tx.send(job.clone());
        });
        channel.on_any(move |message| {
            let _ = messages_tx.send(message.summary());
        });

        let search_tx = commands_tx.clone();
        let debouncer = Arc::new(Debouncer::new(config.search_debounce, move |text: String| {
            let _ = search_tx.send(Command::Search(text));
        }));

        let session = Session {
            config,
            source: Arc::new(GeolocationSource::new(platform)),
            maps: Arc::new(maps),
            channel,
            view: SessionView::default(),
            view_tx,
            outcomes_tx,
            fix_tx,
            subscription: None,
            origin_override: None,
            live_origin: None,
            destination: None,
            live_address: None,
            geocode_requested: false,
            eta_seq: RequestSequencer::new(),
            search_seq: RequestSequencer::new(),
            place_seq: RequestSequencer::new(),
            job_seq: RequestSequencer::new(),
            cancel: cancel.clone(),
        };
        let inputs = Inputs {
            commands,
            outcomes,
            fixes,
            jobs,
            messages,
        };
        let task = tokio::spawn(session.run(inputs));

        SessionHandle {
            commands: commands_tx,
            view: view_rx,
            debouncer,
            cancel,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SessionView>,
    debouncer: Arc<Debouncer<String>>,
    cancel: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionHandle {
    /// Route to `coordinate`. Without an address it is reverse geocoded.
    pub fn set_destination(
        &self,
        coordinate: Coordinate,
        address: Option<String>,
    ) -> Result<(), SessionError> {
        self.send(Command::SetDestination {
            coordinate,
            address,
        })
    }

    /// Route from a fixed origin instead of the live position.
    pub fn set_origin(&self, coordinate: Coordinate, address: Option<String>) -> Result<(), SessionError> {
        self.send(Command::SetOrigin {
            coordinate,
            address,
        })
    }

    /// Drop the destination and any fixed origin.
    pub fn clear_route(&self) -> Result<(), SessionError> {
        self.send(Command::ClearRoute)
    }

    /// Exchange origin and destination.
    pub fn swap_locations(&self) -> Result<(), SessionError> {
        self.send(Command::SwapLocations)
    }

    /// Feed search text. Only the last text in a burst is searched.
    pub fn search(&self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.commands.is_closed() {
            return Err(SessionError::Stopped);
        }
        self.debouncer.call(text.into());
        Ok(())
    }

    /// Resolve a prediction and use it as origin or destination.
    pub fn select_place(
        &self,
        place_id: impl Into<String>,
        target: LocationTarget,
    ) -> Result<(), SessionError> {
        self.send(Command::SelectPlace {
            place_id: place_id.into(),
            target,
        })
    }

    /// Recompute ETAs now.
    pub fn refresh_eta(&self) -> Result<(), SessionError> {
        self.send(Command::RefreshEta)
    }

    /// Ask for permission and a fix again after a failure.
    pub fn retry_location(&self) -> Result<(), SessionError> {
        self.send(Command::RetryLocation)
    }

    /// Current view snapshot.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Token cancelled when the session shuts down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop tracking, disconnect the channel and wait for the loop to end.
    pub async fn shutdown(&self) {
        self.debouncer.cancel();
        self.cancel.cancel();
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands.send(command).map_err(|_| SessionError::Stopped)
    }
}

struct Inputs {
    commands: mpsc::UnboundedReceiver<Command>,
    outcomes: mpsc::UnboundedReceiver<Outcome>,
    fixes: mpsc::UnboundedReceiver<LocationFix>,
    jobs: mpsc::UnboundedReceiver<JobAssignment>,
    messages: mpsc::UnboundedReceiver<String>,
}

struct Session<P: LocationPlatform, M: MappingService, T: Transport> {
    config: SessionConfig,
    source: Arc<GeolocationSource<P>>,
    maps: Arc<M>,
    channel: Arc<RealtimeChannel<T>>,
    view: SessionView,
    view_tx: watch::Sender<SessionView>,
    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    fix_tx: mpsc::UnboundedSender<LocationFix>,
    subscription: Option<SubscriptionHandle>,

    /// Explicit origin; overrides the live position.
    origin_override: Option<Coordinate>,
    /// Position the current route was computed from.
    live_origin: Option<Coordinate>,
    destination: Option<Coordinate>,
    live_address: Option<String>,
    geocode_requested: bool,

    eta_seq: RequestSequencer,
    search_seq: RequestSequencer,
    place_seq: RequestSequencer,
    job_seq: RequestSequencer,
    cancel: CancellationToken,
}

impl<P: LocationPlatform, M: MappingService, T: Transport> Session<P, M, T> {
    async fn run(mut self, mut inputs: Inputs) {
        info!(
            actor_id = %self.config.identity.id(),
            role = %self.config.role(),
            "Tracking session started"
        );

        self.connect_channel();
        self.acquire_location();

        let mut status_rx = self.channel.watch_status();
        let period = self.config.refresh_period();
        let mut refresh = tokio::time::interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.publish();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                Some(fix) = inputs.fixes.recv() => self.on_fix(fix),
                Some(outcome) = inputs.outcomes.recv() => self.on_outcome(outcome),
                command = inputs.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => {
                        debug!("All session handles dropped");
                        self.cancel.cancel();
                        break;
                    }
                },
                Some(job) = inputs.jobs.recv() => self.on_job(job),
                Some(summary) = inputs.messages.recv() => {
                    self.view.last_message = Some(summary);
                }
                Ok(()) = status_rx.changed() => {
                    let status = status_rx.borrow_and_update().clone();
                    self.on_status(status);
                }
                _ = refresh.tick() => self.refresh_all(),
            }
            self.publish();
        }

        self.teardown();
    }

    fn publish(&self) {
        let view = &self.view;
        self.view_tx.send_if_modified(|current| {
            if current == view {
                return false;
            }
            *current = view.clone();
            true
        });
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.source.unsubscribe(&handle);
        }
        self.channel.disconnect();
        self.view.connection = self.channel.status();
        self.view.loading_eta = false;
        self.publish();
        info!("Tracking session stopped");
    }

    // ---- startup --------------------------------------------------------

    fn connect_channel(&mut self) {
        let url = self.config.server_url.trim().to_string();
        if url.is_empty() {
            warn!("Tracking server URL not configured, realtime updates disabled");
            self.view.config_error = Some("Tracking server URL not configured".to_string());
            return;
        }

        let channel = Arc::clone(&self.channel);
        let identity = self.config.identity.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = channel.connect(&url, identity).await;
            let _ = tx.send(Outcome::Connected(result));
        });
    }

    fn acquire_location(&mut self) {
        let source = Arc::clone(&self.source);
        let profile = self.config.accuracy.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let status = source.request_permission().await;
            let _ = tx.send(Outcome::Permission(status));
            if status == PermissionStatus::Granted {
                let fix = source.get_current_fix(&profile).await;
                let _ = tx.send(Outcome::InitialFix(fix));
            }
        });
    }

    fn subscribe_fixes(&mut self) {
        let fix_tx = self.fix_tx.clone();
        let result = self.source.subscribe(
            move |fix| {
                let _ = fix_tx.send(fix);
            },
            self.config.watch.clone(),
        );
        match result {
            Ok(handle) => self.subscription = Some(handle),
            Err(e) => {
                warn!(error = %e, "Failed to start location updates");
                self.view.location_error = Some(e);
            }
        }
    }

    // ---- signals --------------------------------------------------------

    fn on_fix(&mut self, fix: LocationFix) {
        if let Some(previous) = &self.view.fix {
            if fix.timestamp_millis() < previous.timestamp_millis() {
                debug!("Ignoring out-of-order fix");
                return;
            }
        }

        let here = fix.coordinate();
        self.view.fix = Some(fix.clone());
        self.view.location_error = None;

        if self.channel.is_connected() && !self.channel.send_location(&fix) {
            debug!("Location update not sent");
        }

        if !self.geocode_requested {
            self.geocode_requested = true;
            self.spawn_geocode(GeocodeFor::LiveOrigin, here);
        }

        let moved = self.live_origin.map_or(true, |origin| {
            distance_m(&origin, &here) > self.config.route_update_min_distance_m
        });
        if moved {
            self.live_origin = Some(here);
            if self.origin_override.is_none() {
                self.update_route();
            }
            if self.view.job.is_some() {
                self.trigger_job_eta();
            }
        }
    }

    fn on_status(&mut self, status: ChannelStatus) {
        let was_connected = self.view.connection.is_connected();
        let now_connected = status.is_connected();
        self.view.connection = status;

        if now_connected && !was_connected {
            if let Some(fix) = self.view.fix.clone() {
                if self.channel.send_location(&fix) {
                    info!("Re-sent latest fix after connect");
                }
            }
        }
    }

    fn on_job(&mut self, job: JobAssignment) {
        if self.config.role() != Role::Driver {
            debug!("Ignoring job assignment for non-driver");
            return;
        }
        info!(
            pickup_lat = job.pickup.latitude,
            pickup_lng = job.pickup.longitude,
            dest_lat = job.destination.latitude,
            dest_lng = job.destination.longitude,
            "Job assigned"
        );
        self.view.job = Some(job);
        self.view.job_eta = None;
        self.trigger_job_eta();
    }

    fn refresh_all(&mut self) {
        if let Some(query) = self.view.route_query {
            debug!("Refreshing ETA");
            self.trigger_eta(query);
        }
        if self.view.job.is_some() {
            self.trigger_job_eta();
        }
    }

    // ---- commands -------------------------------------------------------

    fn on_command(&mut self, command: Command) {
        match command {
            Command::SetDestination {
                coordinate,
                address,
            } => self.set_destination(coordinate, address),
            Command::SetOrigin {
                coordinate,
                address,
            } => self.set_origin(coordinate, address),
            Command::ClearRoute => {
                self.destination = None;
                self.origin_override = None;
                self.view.destination_address = None;
                self.view.origin_address = self.live_address.clone();
                self.view.predictions.clear();
                self.update_route();
            }
            Command::SwapLocations => self.swap_locations(),
            Command::Search(text) => self.search(text),
            Command::SelectPlace { place_id, target } => {
                let token = self.place_seq.next();
                let maps = Arc::clone(&self.maps);
                let tx = self.outcomes_tx.clone();
                tokio::spawn(async move {
                    let result = maps.get_place_details(&place_id).await;
                    let _ = tx.send(Outcome::Place {
                        token,
                        target,
                        result,
                    });
                });
            }
            Command::RefreshEta => self.refresh_all(),
            Command::RetryLocation => {
                info!("Retrying location acquisition");
                self.view.location_error = None;
                self.acquire_location();
            }
        }
    }

    fn set_destination(&mut self, coordinate: Coordinate, address: Option<String>) {
        self.destination = Some(coordinate);
        if address.is_none() {
            self.spawn_geocode(GeocodeFor::Destination(coordinate), coordinate);
        }
        self.view.destination_address = address;
        self.update_route();
    }

    fn set_origin(&mut self, coordinate: Coordinate, address: Option<String>) {
        self.origin_override = Some(coordinate);
        if address.is_none() {
            self.spawn_geocode(GeocodeFor::Origin(coordinate), coordinate);
        }
        self.view.origin_address = address;
        self.update_route();
    }

    fn swap_locations(&mut self) {
        let origin = self.origin_override.or(self.live_origin);
        let (Some(origin), Some(destination)) = (origin, self.destination) else {
            debug!("Nothing to swap");
            return;
        };
        self.origin_override = Some(destination);
        self.destination = Some(origin);
        std::mem::swap(
            &mut self.view.origin_address,
            &mut self.view.destination_address,
        );
        self.update_route();
    }

    fn search(&mut self, text: String) {
        let token = self.search_seq.next();
        let maps = Arc::clone(&self.maps);
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = maps.search_places(&text).await;
            let _ = tx.send(Outcome::Search { token, result });
        });
    }

    // ---- derived requests -----------------------------------------------

    /// Recompute the route query and request an ETA if it changed.
    fn update_route(&mut self) {
        let origin = self.origin_override.or(self.live_origin);
        match (origin, self.destination) {
            (Some(origin), Some(destination)) => {
                let query = RouteQuery::new(origin, destination);
                if self.view.route_query != Some(query) {
                    self.view.route_query = Some(query);
                    self.trigger_eta(query);
                }
            }
            _ => {
                if self.view.route_query.is_some() {
                    self.eta_seq.invalidate();
                    self.view.route_query = None;
                    self.view.eta = None;
                    self.view.route = None;
                    self.view.loading_eta = false;
                    self.view.route_unavailable = false;
                }
            }
        }
    }

    fn trigger_eta(&mut self, query: RouteQuery) {
        let token = self.eta_seq.next();
        self.view.loading_eta = true;
        debug!(
            token = token.value(),
            origin = %query.origin,
            destination = %query.destination,
            "Requesting ETA"
        );

        let maps = Arc::clone(&self.maps);
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let eta = maps.calculate_eta(query).await;
            let _ = tx.send(Outcome::Eta { token, eta });
        });

        let maps = Arc::clone(&self.maps);
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = maps.get_directions(query).await;
            let _ = tx.send(Outcome::Route { token, result });
        });
    }

    fn trigger_job_eta(&mut self) {
        let Some(job) = &self.view.job else {
            return;
        };
        let (Ok(pickup), Ok(dropoff)) = (job.pickup.coordinate(), job.destination.coordinate()) else {
            warn!("Job assignment has invalid coordinates");
            return;
        };
        let Some(here) = self.view.fix.as_ref().map(LocationFix::coordinate) else {
            debug!("Waiting for a fix before computing job ETA");
            return;
        };

        let token = self.job_seq.next();
        let maps = Arc::clone(&self.maps);
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let (to_pickup, to_destination) = tokio::join!(
                maps.calculate_eta(RouteQuery::new(here, pickup)),
                maps.calculate_eta(RouteQuery::new(pickup, dropoff)),
            );
            let _ = tx.send(Outcome::JobEta {
                token,
                eta: JobEta {
                    to_pickup,
                    to_destination,
                },
            });
        });
    }

    fn spawn_geocode(&self, target: GeocodeFor, coordinate: Coordinate) {
        let maps = Arc::clone(&self.maps);
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = maps.reverse_geocode(coordinate).await;
            let _ = tx.send(Outcome::Geocoded { target, result });
        });
    }

    // ---- outcomes -------------------------------------------------------

    fn on_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Permission(status) => {
                self.view.permission = status;
                if status == PermissionStatus::Granted {
                    self.view.location_error = None;
                    self.subscribe_fixes();
                } else {
                    self.view.location_error = Some(LocationError::PermissionDenied);
                }
            }
            Outcome::InitialFix(Ok(fix)) => self.on_fix(fix),
            Outcome::InitialFix(Err(e)) => {
                warn!(error = %e, "Could not get current location");
                if self.view.fix.is_none() {
                    self.view.location_error = Some(e);
                }
            }
            Outcome::Connected(Ok(())) => {}
            Outcome::Connected(Err(e)) => {
                warn!(error = %e, "Realtime channel unavailable");
                if matches!(e, ChannelError::Config(_)) {
                    self.view.config_error = Some(e.to_string());
                }
            }
            Outcome::Eta { token, eta } => {
                if !self.eta_seq.is_current(token) {
                    debug!(token = token.value(), "Discarding stale ETA");
                    return;
                }
                if !eta.success {
                    warn!(error = ?eta.error, "Route unavailable");
                }
                self.view.route_unavailable = !eta.success;
                self.view.loading_eta = false;
                self.view.eta = Some(eta);
            }
            Outcome::Route { token, result } => {
                if !self.eta_seq.is_current(token) {
                    debug!(token = token.value(), "Discarding stale directions");
                    return;
                }
                match result {
                    Ok(directions) => self.view.route = Some(directions),
                    Err(e) => {
                        debug!(error = %e, "Directions unavailable");
                        self.note_maps_error(&e);
                        self.view.route = None;
                    }
                }
            }
            Outcome::Search { token, result } => {
                if !self.search_seq.is_current(token) {
                    debug!(token = token.value(), "Discarding stale search results");
                    return;
                }
                match result {
                    Ok(predictions) => {
                        self.view.predictions = predictions;
                        self.view.search_failed = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "Place search failed");
                        self.note_maps_error(&e);
                        self.view.predictions.clear();
                        self.view.search_failed = true;
                    }
                }
            }
            Outcome::Place {
                token,
                target,
                result,
            } => {
                if !self.place_seq.is_current(token) {
                    return;
                }
                match result {
                    Ok(place) => {
                        self.view.predictions.clear();
                        self.view.search_failed = false;
                        let address = Some(place.formatted_address).filter(|a| !a.is_empty());
                        let address = address.or(Some(place.name));
                        match target {
                            LocationTarget::Origin => self.set_origin(place.coordinate, address),
                            LocationTarget::Destination => {
                                self.set_destination(place.coordinate, address)
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Place lookup failed");
                        self.note_maps_error(&e);
                        self.view.search_failed = true;
                    }
                }
            }
            Outcome::Geocoded { target, result } => self.on_geocoded(target, result),
            Outcome::JobEta { token, eta } => {
                if self.job_seq.is_current(token) && self.view.job.is_some() {
                    self.view.job_eta = Some(eta);
                }
            }
        }
    }

    fn on_geocoded(&mut self, target: GeocodeFor, result: Result<ReverseGeocode, MapsError>) {
        let address = match result {
            Ok(geocode) => {
                self.view.geocode_failed = false;
                geocode.formatted_address
            }
            Err(e) => {
                warn!(error = %e, "Reverse geocode failed");
                self.note_maps_error(&e);
                self.view.geocode_failed = true;
                UNKNOWN_LOCATION.to_string()
            }
        };

        match target {
            GeocodeFor::LiveOrigin => {
                self.live_address = Some(address.clone());
                if self.origin_override.is_none() {
                    self.view.origin_address = Some(address);
                }
            }
            GeocodeFor::Origin(c) => {
                if self.origin_override == Some(c) {
                    self.view.origin_address = Some(address);
                }
            }
            GeocodeFor::Destination(c) => {
                if self.destination == Some(c) {
                    self.view.destination_address = Some(address);
                }
            }
        }
    }

    fn note_maps_error(&mut self, error: &MapsError) {
        if matches!(error, MapsError::Config(_)) {
            self.view.config_error = Some(error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::ReplayPlatform;
    use crate::realtime::{ActorIdentity, MemoryTransport};
    use std::time::Duration;

    /// Mapping service answering instantly with fixed values.
    struct InstantMaps;

    impl MappingService for InstantMaps {
        async fn search_places(&self, query: &str) -> Result<Vec<PlacePrediction>, MapsError> {
            Ok(vec![PlacePrediction {
                place_id: format!("id:{}", query),
                description: query.to_string(),
                main_text: query.to_string(),
                secondary_text: String::new(),
            }])
        }

        async fn get_place_details(&self, place_id: &str) -> Result<PlaceDetails, MapsError> {
            Ok(PlaceDetails {
                coordinate: Coordinate::new(6.6018, 3.3515).unwrap(),
                formatted_address: format!("{} address", place_id),
                name: place_id.to_string(),
            })
        }

        async fn reverse_geocode(&self, c: Coordinate) -> Result<ReverseGeocode, MapsError> {
            Ok(ReverseGeocode {
                formatted_address: format!("near {}", c),
                short_address: "near".into(),
            })
        }

        async fn calculate_eta(&self, query: RouteQuery) -> EtaResult {
            EtaResult {
                distance_meters: crate::coord::distance_m(&query.origin, &query.destination) as u64,
                duration_seconds: 600,
                success: true,
                ..Default::default()
            }
        }

        async fn get_directions(&self, _query: RouteQuery) -> Result<Directions, MapsError> {
            Err(MapsError::NotFound("no route".into()))
        }
    }

    fn start(role: Role) -> SessionHandle {
        let path = vec![Coordinate::new(6.4541, 3.3947).unwrap()];
        let (transport, _peers) = MemoryTransport::new();
        let config = SessionConfig::new(ActorIdentity::generate(role), "");
        SessionOrchestrator::start(config, ReplayPlatform::new(path), InstantMaps, transport)
    }

    async fn wait_for(handle: &SessionHandle, pred: impl FnMut(&SessionView) -> bool) -> SessionView {
        let mut rx = handle.subscribe();
        let view = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("view condition not reached")
            .expect("session ended")
            .clone();
        view
    }

    #[tokio::test]
    async fn test_missing_server_url_is_flagged_and_tracking_continues() {
        let handle = start(Role::Rider);
        let view = wait_for(&handle, |v| v.fix.is_some()).await;
        assert_eq!(
            view.config_error.as_deref(),
            Some("Tracking server URL not configured")
        );
        assert_eq!(view.permission, PermissionStatus::Granted);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_destination_triggers_eta_and_geocode() {
        let handle = start(Role::Rider);
        wait_for(&handle, |v| v.fix.is_some()).await;

        let dest = Coordinate::new(6.6018, 3.3515).unwrap();
        handle.set_destination(dest, None).unwrap();

        let view = wait_for(&handle, |v| {
            v.eta.is_some() && v.destination_address.is_some() && v.origin_address.is_some()
        })
        .await;
        assert_eq!(view.route_query.unwrap().destination, dest);
        assert!(!view.loading_eta);
        assert!(!view.route_unavailable);
        assert!(view.route.is_none());
        assert!(view.origin_address.unwrap().starts_with("near"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_clear_and_swap() {
        let handle = start(Role::Rider);
        wait_for(&handle, |v| v.fix.is_some()).await;

        let dest = Coordinate::new(6.6018, 3.3515).unwrap();
        handle.set_destination(dest, Some("Ikeja".into())).unwrap();
        wait_for(&handle, |v| v.eta.is_some()).await;

        handle.swap_locations().unwrap();
        let view = wait_for(&handle, |v| v.route_query.is_some_and(|q| q.origin == dest)).await;
        assert_eq!(view.origin_address.as_deref(), Some("Ikeja"));

        handle.clear_route().unwrap();
        let view = wait_for(&handle, |v| v.route_query.is_none()).await;
        assert!(view.eta.is_none());
        assert!(view.destination_address.is_none());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_select_place_sets_destination() {
        let handle = start(Role::Rider);
        wait_for(&handle, |v| v.fix.is_some()).await;

        handle.select_place("ikeja", LocationTarget::Destination).unwrap();
        let view = wait_for(&handle, |v| v.destination_address.is_some()).await;
        assert_eq!(view.destination_address.as_deref(), Some("ikeja address"));
        handle.shutdown().await;
    }

    /// Mapping service whose reverse geocoding always fails.
    struct GeocodeDown;

    impl MappingService for GeocodeDown {
        async fn search_places(&self, query: &str) -> Result<Vec<PlacePrediction>, MapsError> {
            InstantMaps.search_places(query).await
        }

        async fn get_place_details(&self, place_id: &str) -> Result<PlaceDetails, MapsError> {
            InstantMaps.get_place_details(place_id).await
        }

        async fn reverse_geocode(&self, _c: Coordinate) -> Result<ReverseGeocode, MapsError> {
            Err(MapsError::Network("connection reset".into()))
        }

        async fn calculate_eta(&self, query: RouteQuery) -> EtaResult {
            InstantMaps.calculate_eta(query).await
        }

        async fn get_directions(&self, query: RouteQuery) -> Result<Directions, MapsError> {
            InstantMaps.get_directions(query).await
        }
    }

    #[tokio::test]
    async fn test_failed_geocode_is_flagged() {
        let path = vec![Coordinate::new(6.4541, 3.3947).unwrap()];
        let (transport, _peers) = MemoryTransport::new();
        let config = SessionConfig::new(ActorIdentity::generate(Role::Rider), "");
        let handle =
            SessionOrchestrator::start(config, ReplayPlatform::new(path), GeocodeDown, transport);
        wait_for(&handle, |v| v.fix.is_some()).await;

        let dest = Coordinate::new(6.6018, 3.3515).unwrap();
        handle.set_destination(dest, None).unwrap();

        let view = wait_for(&handle, |v| v.destination_address.is_some() && v.eta.is_some()).await;
        assert!(view.geocode_failed);
        assert_eq!(view.destination_address.as_deref(), Some(UNKNOWN_LOCATION));
        // Tracking and routing carry on.
        assert!(view.eta.unwrap().success);
        assert!(view.fix.is_some());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_refresh_period_does_not_panic() {
        let path = vec![Coordinate::new(6.4541, 3.3947).unwrap()];
        let (transport, _peers) = MemoryTransport::new();
        let mut config = SessionConfig::new(ActorIdentity::generate(Role::Rider), "");
        config.eta_refresh = Duration::ZERO;
        let handle =
            SessionOrchestrator::start(config, ReplayPlatform::new(path), InstantMaps, transport);

        wait_for(&handle, |v| v.fix.is_some()).await;
        assert!(handle.is_running());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_dropping_all_handles_stops_session() {
        let handle = start(Role::Rider);
        wait_for(&handle, |v| v.fix.is_some()).await;

        let token = handle.cancellation_token();
        let mut views = handle.subscribe();
        drop(handle);

        let ended = async {
            // The sender goes away once the loop has torn down.
            while views.changed().await.is_ok() {}
        };
        tokio::time::timeout(Duration::from_secs(5), ended)
            .await
            .expect("session kept running without handles");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_commands_fail_after_shutdown() {
        let handle = start(Role::Rider);
        handle.shutdown().await;
        assert!(!handle.is_running());
        assert!(matches!(handle.refresh_eta(), Err(SessionError::Stopped)));
        assert!(matches!(handle.search("Lagos"), Err(SessionError::Stopped)));
    }
}
