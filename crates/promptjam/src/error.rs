//! Unified error type for the PromptJam server.

use promptjam_gateway::GatewayError;
use promptjam_protocol::ProtocolError;
use promptjam_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// When embedding the server, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
///
/// Room errors rarely surface here: the handler turns them into advisory
/// events for the offending client instead of failing the connection.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A gateway-level error (bind, accept, send, recv).
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unknown room, bad phase).
    #[error(transparent)]
    Room(#[from] RoomError),
}
