//! Socket seam for the realtime channel.

use std::future::Future;

use url::Url;

use super::error::ChannelError;

/// Opens connections to the tracking server.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Open one connection. Timeouts are applied by the caller.
    fn connect(&self, url: &Url) -> impl Future<Output = Result<Self::Connection, ChannelError>> + Send;
}

/// One open, bidirectional text connection.
pub trait Connection: Send + 'static {
    /// Send one text frame.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Receive the next text frame; `None` once the peer has closed.
    ///
    /// Must be cancel safe: it is raced against outbound sends.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, ChannelError>>> + Send;

    /// Close gracefully.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
