//! Error types for the room layer.

use promptjam_protocol::{PlayerId, RoomId};

use crate::Phase;

/// Errors that can occur during room and registry operations.
///
/// Only a few of these ever reach a client, and then only as generic
/// advisory text chosen by the server layer; the rest are logged and
/// dropped.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The named level pack is not in the catalog.
    #[error("unknown level pack {0:?}")]
    InvalidLevelPack(String),

    /// Players can only join while the room is in the lobby.
    #[error("game already started")]
    GameAlreadyStarted,

    /// A rejoin named a player this room has never seen.
    #[error("no player session {0}")]
    SessionNotFound(PlayerId),

    /// A GM-only operation arrived from a connection that is not the GM.
    /// Logged and dropped; the sender learns nothing.
    #[error("connection is not the game master")]
    Unauthorized,

    /// The operation is not legal in the room's current phase.
    #[error("operation not allowed in phase {0}")]
    WrongPhase(Phase),

    /// An in-game event arrived from a connection with no seat.
    #[error("connection is not a member of this room")]
    NotAMember,

    /// A judge verdict arrived for a round the room has already left.
    #[error("evaluation {seq} is stale")]
    StaleEvaluation { seq: u64 },

    /// The room's command channel is closed or full.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
