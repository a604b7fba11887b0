//! Realtime channel to the tracking server.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────── RealtimeChannel ────────────┐
//! send_location ─►│ outbound queue ─► Driver task ─► Connection ─► server
//!                 │                       │                │
//!  on_event   ◄───│ HandlerRegistry ◄─────┘ inbound frames │
//!  watch_status ◄─│ watch<ChannelStatus>                   │
//!                 └────────────────────────────────────────┘
//! ```
//!
//! The driver task owns the socket. It identifies on every (re)connect,
//! retries with exponential backoff up to the attempt budget, and publishes
//! every state change. Frames are JSON `{"event", "data"}` envelopes.

mod channel;
mod config;
mod dispatch;
mod error;
mod identity;
pub mod memory;
mod message;
mod status;
mod transport;
mod websocket;

pub use channel::RealtimeChannel;
pub use config::{
    ChannelConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_PLATFORM,
    DEFAULT_RECONNECT_DELAY, DEFAULT_RECONNECT_DELAY_MAX,
};
pub use dispatch::{HandlerRegistry, MessageHandler};
pub use error::ChannelError;
pub use identity::{ActorIdentity, Role};
pub use memory::{ConnectOutcome, MemoryPeer, MemoryTransport};
pub use message::{
    Envelope, InboundMessage, JobAssignment, MessageKind, Waypoint, EVENT_IDENTIFY,
    EVENT_JOB_ASSIGNMENT, EVENT_LOCATION_UPDATE,
};
pub use status::{ChannelStatus, ConnectionState};
pub use transport::{Connection, Transport};
pub use websocket::{websocket_url, WebSocketConnection, WebSocketTransport};
