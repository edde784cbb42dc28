//! Connection gateway for PromptJam.
//!
//! The room core never touches sockets; it sees connections only as the
//! [`Connection`] trait (send bytes, receive bytes, close) keyed by an
//! ephemeral [`ConnectionId`]. The [`Gateway`] trait produces those
//! connections. Player and room identity live elsewhere; a
//! `ConnectionId` is a revocable handle, gone for good when the socket
//! drops.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket gateway via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::GatewayError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketGateway};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Never reused within a process; a reconnecting client gets a fresh id
/// and re-associates with its stable player id at the room layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Gateway: Send + Sync + 'static {
    /// The connection type produced by this gateway.
    type Connection: Connection;
    /// The error type for gateway operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive event frames.
///
/// Send and receive sides are independently usable: one task may sit in
/// [`Connection::recv`] while another pushes outbound frames through
/// [`Connection::send`] on a clone.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one encoded event frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
