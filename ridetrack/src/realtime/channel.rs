//! Realtime channel: one managed connection to the tracking server.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::location::LocationFix;

use super::config::ChannelConfig;
use super::dispatch::{HandlerRegistry, MessageHandler};
use super::error::ChannelError;
use super::identity::ActorIdentity;
use super::message::{Envelope, InboundMessage, JobAssignment, MessageKind};
use super::status::{ChannelStatus, ConnectionState};
use super::transport::{Connection, Transport};
use super::websocket::websocket_url;

struct ActiveSession {
    identity: ActorIdentity,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// A single persistent connection with automatic reconnection.
///
/// Sends are at-most-once: nothing is queued while the channel is not
/// connected. Handlers run on the channel's driver task and must not
/// register further handlers from inside a callback.
pub struct RealtimeChannel<T: Transport> {
    transport: Arc<T>,
    config: ChannelConfig,
    status: Arc<watch::Sender<ChannelStatus>>,
    handlers: Arc<Mutex<HandlerRegistry>>,
    session: Mutex<Option<ActiveSession>>,
    closed: CancellationToken,
}

impl<T: Transport> RealtimeChannel<T> {
    pub fn new(transport: T, config: ChannelConfig) -> Self {
        let (status, _) = watch::channel(ChannelStatus::default());
        Self {
            transport: Arc::new(transport),
            config,
            status: Arc::new(status),
            handlers: Arc::new(Mutex::new(HandlerRegistry::new())),
            session: Mutex::new(None),
            closed: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Connect and identify.
    ///
    /// Resolves once the first identification has been sent. Failed
    /// attempts are retried with backoff; the call only fails when the
    /// attempt budget runs out. Calling it again replaces the current
    /// connection.
    pub async fn connect(&self, server_url: &str, identity: ActorIdentity) -> Result<(), ChannelError> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::Closed);
        }
        let url = websocket_url(server_url)?;
        self.stop_session();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let cancel = self.closed.child_token();

        let driver = Driver {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            url,
            identity: identity.clone(),
            status: Arc::clone(&self.status),
            handlers: Arc::clone(&self.handlers),
            cancel: cancel.clone(),
            outbound: outbound_rx,
        };

        info!(
            url = %driver.url,
            actor_id = %identity.id(),
            role = %identity.role(),
            "Realtime channel connecting"
        );
        let task = tokio::spawn(driver.run(ready_tx));

        if let Ok(mut session) = self.session.lock() {
            *session = Some(ActiveSession {
                identity,
                outbound: outbound_tx,
                cancel,
                task,
            });
        }

        ready_rx.await.unwrap_or(Err(ChannelError::Closed))
    }

    /// Send a location update. Returns false, sending nothing, unless
    /// connected.
    pub fn send_location(&self, fix: &LocationFix) -> bool {
        self.send_with(|identity| Envelope::location(identity, fix))
    }

    /// Send a custom event with the same delivery rules as locations.
    pub fn send_message(&self, event: &str, data: Value) -> bool {
        self.send_with(|_| Envelope::new(event, data))
    }

    fn send_with(&self, build: impl FnOnce(&ActorIdentity) -> Envelope) -> bool {
        if !self.status.borrow().is_connected() {
            debug!("Not connected, dropping outbound message");
            return false;
        }
        let Ok(session) = self.session.lock() else {
            return false;
        };
        let Some(session) = session.as_ref() else {
            return false;
        };
        match build(&session.identity).to_text() {
            Ok(text) => session.outbound.send(text).is_ok(),
            Err(e) => {
                warn!(error = %e, "Failed to encode outbound message");
                false
            }
        }
    }

    /// Register a handler for one kind of inbound message.
    pub fn on_event<F>(&self, kind: MessageKind, handler: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.register(kind, Arc::new(handler) as MessageHandler);
        }
    }

    /// Register a typed handler for job assignments.
    pub fn on_job_assignment<F>(&self, handler: F)
    where
        F: Fn(&JobAssignment) + Send + Sync + 'static,
    {
        self.on_event(MessageKind::JobAssignment, move |message| {
            if let InboundMessage::JobAssignment(job) = message {
                handler(job);
            }
        });
    }

    /// Register a handler that sees every inbound message.
    pub fn on_any<F>(&self, handler: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.register_any(Arc::new(handler));
        }
    }

    /// Current status snapshot.
    pub fn status(&self) -> ChannelStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status changes.
    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.status.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    /// Close the channel for good. Idempotent.
    ///
    /// Cancels any reconnection in progress. No handler runs after this
    /// returns.
    pub fn disconnect(&self) {
        let first = !self.closed.is_cancelled();
        self.closed.cancel();
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.close();
        }
        self.stop_session();
        self.status.send_modify(|status| {
            status.state = ConnectionState::Disconnected;
        });
        if first {
            info!("Realtime channel disconnected");
        }
    }

    fn stop_session(&self) {
        let previous = self.session.lock().ok().and_then(|mut s| s.take());
        if let Some(session) = previous {
            session.cancel.cancel();
            drop(session.task);
        }
    }
}

impl<T: Transport> Drop for RealtimeChannel<T> {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

enum SessionEnd {
    Cancelled,
    Lost(String),
}

/// Owns the connection for one `connect` call.
struct Driver<T: Transport> {
    transport: Arc<T>,
    config: ChannelConfig,
    url: Url,
    identity: ActorIdentity,
    status: Arc<watch::Sender<ChannelStatus>>,
    handlers: Arc<Mutex<HandlerRegistry>>,
    cancel: CancellationToken,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl<T: Transport> Driver<T> {
    async fn run(mut self, ready: oneshot::Sender<Result<(), ChannelError>>) {
        let mut ready = Some(ready);
        let mut failures: u32 = 0;
        let mut connected_before = false;

        loop {
            let state = if connected_before || failures > 0 {
                ConnectionState::Reconnecting
            } else {
                ConnectionState::Connecting
            };
            self.publish(|s| {
                s.state = state;
                s.reconnect_attempts = failures;
            });

            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.open() => result,
            };

            match attempt {
                Ok(mut conn) => {
                    failures = 0;
                    self.drain_stale();
                    self.publish(|s| {
                        s.state = ConnectionState::Connected;
                        s.reconnect_attempts = 0;
                        s.last_error = None;
                    });
                    info!(
                        actor_id = %self.identity.id(),
                        resumed = connected_before,
                        "Realtime channel connected"
                    );
                    connected_before = true;
                    if let Some(tx) = ready.take() {
                        let _ = tx.send(Ok(()));
                    }

                    match self.pump(&mut conn).await {
                        SessionEnd::Cancelled => {
                            conn.close().await;
                            break;
                        }
                        SessionEnd::Lost(reason) => {
                            warn!(reason = %reason, "Realtime connection lost");
                            self.publish(|s| {
                                s.state = ConnectionState::Reconnecting;
                                s.last_error = Some(reason);
                            });
                            if !self.pause(self.config.reconnect_delay).await {
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    let reason = e.to_string();

                    if failures >= self.config.attempt_budget() {
                        error!(attempts = failures, error = %reason, "Giving up on realtime connection");
                        self.publish(|s| {
                            s.state = ConnectionState::Disconnected;
                            s.reconnect_attempts = failures;
                            s.last_error = Some(reason.clone());
                        });
                        if let Some(tx) = ready.take() {
                            let _ = tx.send(Err(ChannelError::ConnectFailed {
                                attempts: failures,
                                reason,
                            }));
                        }
                        return;
                    }

                    let delay = self.config.backoff(failures);
                    warn!(
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %reason,
                        "Realtime connection attempt failed"
                    );
                    self.publish(|s| {
                        s.state = ConnectionState::Reconnecting;
                        s.reconnect_attempts = failures;
                        s.last_error = Some(reason);
                    });
                    if !self.pause(delay).await {
                        break;
                    }
                }
            }
        }
        debug!("Realtime channel driver stopped");
    }

    /// Connect within the timeout and identify.
    async fn open(&self) -> Result<T::Connection, ChannelError> {
        let timeout = self.config.connect_timeout;
        let mut conn = tokio::time::timeout(timeout, self.transport.connect(&self.url))
            .await
            .map_err(|_| {
                ChannelError::Transport(format!("connect timed out after {}ms", timeout.as_millis()))
            })??;

        let identify = Envelope::identify(&self.identity, &self.config.platform, Utc::now()).to_text()?;
        conn.send(identify).await?;
        debug!(actor_id = %self.identity.id(), "Identification sent");
        Ok(conn)
    }

    async fn pump(&mut self, conn: &mut T::Connection) -> SessionEnd {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                outbound = self.outbound.recv() => match outbound {
                    Some(text) => {
                        if let Err(e) = conn.send(text).await {
                            return SessionEnd::Lost(e.to_string());
                        }
                    }
                    None => return SessionEnd::Cancelled,
                },
                inbound = conn.recv() => match inbound {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                    None => return SessionEnd::Lost("connection closed by server".to_string()),
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let envelope = match Envelope::from_text(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                return;
            }
        };
        let message = InboundMessage::from_envelope(envelope);
        debug!(event = %message.event(), "Inbound message");
        if let Ok(handlers) = self.handlers.lock() {
            handlers.dispatch(&message);
        }
    }

    /// Discard sends that raced a lost connection.
    fn drain_stale(&mut self) {
        let mut dropped = 0;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Discarded messages queued while disconnected");
        }
    }

    /// Sleep unless cancelled. Returns false when cancelled.
    async fn pause(&self, delay: std::time::Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Update status unless this driver has been cancelled.
    fn publish(&self, update: impl FnOnce(&mut ChannelStatus)) {
        let cancel = &self.cancel;
        self.status.send_if_modified(|status| {
            if cancel.is_cancelled() {
                return false;
            }
            update(status);
            true
        });
    }
}
