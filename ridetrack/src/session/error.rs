//! Session-level error aggregation.

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::location::LocationError;
use crate::maps::MapsError;
use crate::realtime::ChannelError;

/// Failure categories exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    LocationTimeout,
    LocationUnavailable,
    ConfigError,
    NetworkError,
    NotFound,
    ChannelDisconnected,
}

impl ErrorKind {
    /// Transient failures are retried automatically without user action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::ChannelDisconnected | Self::LocationTimeout
        )
    }

    /// Failures that should offer the user a retry.
    pub fn needs_user_action(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::ConfigError)
    }
}

/// Any error surfaced by the tracking session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Maps(#[from] MapsError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Config(#[from] ConfigFileError),

    /// The session has been shut down.
    #[error("Session stopped")]
    Stopped,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Location(e) => match e {
                LocationError::PermissionDenied => ErrorKind::PermissionDenied,
                LocationError::Timeout { .. } => ErrorKind::LocationTimeout,
                LocationError::Unavailable(_) | LocationError::InvalidFix(_) => {
                    ErrorKind::LocationUnavailable
                }
            },
            Self::Maps(e) => match e {
                MapsError::Config(_) => ErrorKind::ConfigError,
                MapsError::NotFound(_) => ErrorKind::NotFound,
                MapsError::Network(_)
                | MapsError::InvalidResponse(_)
                | MapsError::Provider { .. } => ErrorKind::NetworkError,
            },
            Self::Channel(e) => match e {
                ChannelError::Config(_) => ErrorKind::ConfigError,
                ChannelError::Disconnected | ChannelError::Closed => {
                    ErrorKind::ChannelDisconnected
                }
                ChannelError::ConnectFailed { .. }
                | ChannelError::Transport(_)
                | ChannelError::Protocol(_) => ErrorKind::NetworkError,
            },
            Self::Config(_) => ErrorKind::ConfigError,
            Self::Stopped => ErrorKind::ChannelDisconnected,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
