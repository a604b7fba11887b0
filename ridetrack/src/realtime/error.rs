//! Error types for the realtime channel.

use thiserror::Error;

/// Errors that can occur on the realtime channel.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChannelError {
    /// Server URL missing or unusable.
    #[error("Realtime channel not configured: {0}")]
    Config(String),

    /// No connection could be established within the attempt budget.
    #[error("Failed to connect after {attempts} attempts: {reason}")]
    ConnectFailed { attempts: u32, reason: String },

    /// The underlying socket failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A frame could not be encoded or decoded.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A send was attempted while not connected.
    #[error("Channel is not connected")]
    Disconnected,

    /// The channel was explicitly closed.
    #[error("Channel closed")]
    Closed,
}

impl ChannelError {
    /// Returns true for failures the channel recovers from on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Disconnected)
    }
}
