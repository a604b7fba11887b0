//! In-process transport.
//!
//! Connects the channel to a [`MemoryPeer`] living in the same process. Used
//! by tests to script a server and by the CLI demo mode to run without a
//! tracking server. Connection attempts can be scripted to fail.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;
use url::Url;

use super::error::ChannelError;
use super::message::Envelope;
use super::transport::{Connection, Transport};

/// Scripted outcome for one connection attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    Accept,
    Refuse(String),
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<ConnectOutcome>,
    refuse_all: Option<String>,
    attempts: u32,
}

/// Transport that hands every accepted connection to an in-process server.
#[derive(Clone)]
pub struct MemoryTransport {
    script: Arc<Mutex<Script>>,
    accepted: mpsc::UnboundedSender<MemoryPeer>,
}

impl MemoryTransport {
    /// Create a transport and the receiver of server-side peers.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (accepted, peers) = mpsc::unbounded_channel();
        let transport = Self {
            script: Arc::new(Mutex::new(Script::default())),
            accepted,
        };
        (transport, peers)
    }

    /// Queue outcomes for the next attempts. Unscripted attempts accept.
    pub fn script(&self, outcomes: impl IntoIterator<Item = ConnectOutcome>) {
        if let Ok(mut script) = self.script.lock() {
            script.outcomes.extend(outcomes);
        }
    }

    /// Fail the next `n` attempts with `reason`.
    pub fn fail_next(&self, n: usize, reason: &str) {
        self.script(std::iter::repeat(ConnectOutcome::Refuse(reason.to_string())).take(n));
    }

    /// Refuse every attempt until cleared with `None`.
    pub fn refuse_all(&self, reason: Option<&str>) {
        if let Ok(mut script) = self.script.lock() {
            script.refuse_all = reason.map(str::to_string);
        }
    }

    /// Connection attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.script.lock().map(|s| s.attempts).unwrap_or(0)
    }

    fn next_outcome(&self) -> ConnectOutcome {
        let Ok(mut script) = self.script.lock() else {
            return ConnectOutcome::Refuse("transport poisoned".to_string());
        };
        script.attempts += 1;
        if let Some(reason) = &script.refuse_all {
            return ConnectOutcome::Refuse(reason.clone());
        }
        script.outcomes.pop_front().unwrap_or(ConnectOutcome::Accept)
    }
}

impl Transport for MemoryTransport {
    type Connection = MemoryConnection;

    async fn connect(&self, _url: &Url) -> Result<MemoryConnection, ChannelError> {
        match self.next_outcome() {
            ConnectOutcome::Refuse(reason) => Err(ChannelError::Transport(reason)),
            ConnectOutcome::Accept => {
                let (to_client, from_server) = mpsc::unbounded_channel();
                let (to_server, from_client) = mpsc::unbounded_channel();
                self.accepted
                    .send(MemoryPeer {
                        to_client,
                        from_client,
                    })
                    .map_err(|_| ChannelError::Transport("server is gone".to_string()))?;
                Ok(MemoryConnection {
                    from_server,
                    to_server: Some(to_server),
                })
            }
        }
    }
}

/// Client end of an in-process connection.
pub struct MemoryConnection {
    from_server: mpsc::UnboundedReceiver<String>,
    to_server: Option<mpsc::UnboundedSender<String>>,
}

impl Connection for MemoryConnection {
    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        self.to_server
            .as_ref()
            .ok_or(ChannelError::Closed)?
            .send(text)
            .map_err(|_| ChannelError::Transport("connection reset by peer".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, ChannelError>> {
        self.from_server.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.to_server.take();
        self.from_server.close();
    }
}

/// Server end of an in-process connection. Dropping it drops the connection.
pub struct MemoryPeer {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Next frame from the client, decoded; `None` once the client closed.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            let text = self.from_client.recv().await?;
            if let Ok(envelope) = Envelope::from_text(&text) {
                return Some(envelope);
            }
        }
    }

    /// Next frame with the given event name, skipping others.
    pub async fn recv_event(&mut self, event: &str) -> Option<Envelope> {
        loop {
            let envelope = self.recv().await?;
            if envelope.event == event {
                return Some(envelope);
            }
        }
    }

    /// Non-blocking: every frame already sent by the client.
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(text) = self.from_client.try_recv() {
            if let Ok(envelope) = Envelope::from_text(&text) {
                out.push(envelope);
            }
        }
        out
    }

    /// Push an event to the client. Returns false if the client is gone.
    pub fn send(&self, event: &str, data: Value) -> bool {
        Envelope::new(event, data)
            .to_text()
            .map(|text| self.to_client.send(text).is_ok())
            .unwrap_or(false)
    }

    /// Push a raw text frame to the client.
    pub fn send_raw(&self, text: &str) -> bool {
        self.to_client.send(text.to_string()).is_ok()
    }
}
