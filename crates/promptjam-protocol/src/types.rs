//! Core wire types for the PromptJam protocol.
//!
//! Everything in this module travels on the wire as JSON: opaque
//! identifiers, roster projections, room listings, and the round-result
//! record. Browser clients key their UI off these exact shapes, so the
//! serde attributes here are part of the contract, not a style choice.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Stable for the lifetime of the room: the player keeps this id across
/// disconnects and rejoins, while connection handles come and go. Clients
/// persist it locally to reclaim their seat after a page reload.
///
/// `#[serde(transparent)]` makes a `PlayerId` serialize as the bare UUID
/// string (`"b5c0…"`), not as a wrapper object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Allocates a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a room (one game session).
///
/// Same shape as [`PlayerId`]: opaque, globally unique, serialized as the
/// bare UUID string. Room ids appear in lobby listings and in the URL the
/// GM shares with players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Allocates a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Roster and lobby projections
// ---------------------------------------------------------------------------

/// A player as shown to clients.
///
/// This is a projection of the server-side player record: connection
/// handles never leave the server. JSON shape:
///
/// ```json
/// { "id": "b5c0…", "name": "Ann", "score": 3, "isActive": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_active: bool,
}

/// One room as shown in the lobby's game list.
///
/// `active_player_count` counts only players whose active flag is set;
/// ghosts from dropped connections don't inflate the lobby view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameListing {
    pub id: RoomId,
    pub name: String,
    pub level_pack_id: String,
    pub active_player_count: usize,
}

// ---------------------------------------------------------------------------
// Round results
// ---------------------------------------------------------------------------

/// One player's row in a round's ranked outcome.
///
/// `rank` is 1-indexed (1 = winner). The name and submitted text are
/// copied by value at evaluation time, so the record stays meaningful
/// even if the player later leaves the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: u32,
    pub name: String,
    pub points: u32,
    pub prompt: String,
    pub reason: String,
}

/// The immutable record of one round's evaluation.
///
/// Created once per `closeSubmissions`, replaced wholesale by the next
/// round's evaluation, never merged. Also replayed to clients that rejoin
/// during the RESULTS phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub problem: String,
    pub winner_name: String,
    pub ai_solution: String,
    pub rankings: Vec<RankingEntry>,
}

// =========================================================================
// Tests
// =========================================================================
