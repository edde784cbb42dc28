//! Room registry: owns the live rooms and routes connections to them.
//!
//! This is the entry point for room operations from the server layer.
//! The registry owns a [`RoomHandle`] per live room plus two indexes:
//! which room each connection belongs to, and the senders of lobby
//! connections (connected but not yet in any room) that receive game
//! list updates.

use std::collections::HashMap;
use std::sync::Arc;

use promptjam_gateway::ConnectionId;
use promptjam_judge::Judge;
use promptjam_protocol::{GameListing, PlayerId, RoomId, ServerEvent};
use tokio::sync::mpsc;

use crate::catalog::LevelCatalog;
use crate::config::RoomConfig;
use crate::error::RoomError;
use crate::game::{GameAction, GameState};
use crate::room::{spawn_room, EventSender, RoomHandle};

/// Out-of-band notifications from room actors to the server loop.
///
/// Room actors cannot call back into the registry (it may be locked by
/// the very call that is awaiting them), so they push signals onto this
/// channel and the server loop acts on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomSignal {
    /// A room's lobby listing changed (join, rejoin, disconnect, game
    /// start); the lobby should see fresh lists.
    ListingChanged,
    /// A room expired after its GM grace period and must be deleted.
    Expired(RoomId),
}

/// Tracks all live rooms and the lobby.
pub struct RoomRegistry<J: Judge> {
    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle>,
    /// Which room each connection belongs to. A connection is in at
    /// most one room.
    connection_rooms: HashMap<ConnectionId, RoomId>,
    /// Connections browsing the lobby, by their outbound sender.
    lobby: HashMap<ConnectionId, EventSender>,
    catalog: Arc<LevelCatalog>,
    judge: Arc<J>,
    config: RoomConfig,
    signals: mpsc::UnboundedSender<RoomSignal>,
}

impl<J: Judge> RoomRegistry<J> {
    /// Creates an empty registry and the signal receiver the server
    /// loop should drain.
    pub fn new(
        catalog: Arc<LevelCatalog>,
        judge: Arc<J>,
        config: RoomConfig,
    ) -> (Self, mpsc::UnboundedReceiver<RoomSignal>) {
        let (signals, signal_rx) = mpsc::unbounded_channel();
        (
            Self {
                rooms: HashMap::new(),
                connection_rooms: HashMap::new(),
                lobby: HashMap::new(),
                catalog,
                judge,
                config,
                signals,
            },
            signal_rx,
        )
    }

    /// Greets a fresh connection with the catalog and current game
    /// lists, then parks it in the lobby.
    pub async fn connect(&mut self, conn: ConnectionId, sender: EventSender) {
        let _ = sender.send(ServerEvent::LevelPacksAvailable {
            packs: self.catalog.names(),
        });
        let (joinable, active) = self.game_lists().await;
        let _ = sender.send(ServerEvent::UpdateGameList { joinable, active });
        self.lobby.insert(conn, sender);
        tracing::debug!(%conn, lobby = self.lobby.len(), "connection entered lobby");
    }

    /// Creates a room with `conn` as its GM.
    ///
    /// # Errors
    /// `InvalidLevelPack` if the named pack is not in the catalog.
    pub async fn create_room(
        &mut self,
        conn: ConnectionId,
        room_name: String,
        level_pack_name: String,
        sender: EventSender,
    ) -> Result<RoomId, RoomError> {
        let Some(levels) = self.catalog.get(&level_pack_name) else {
            return Err(RoomError::InvalidLevelPack(level_pack_name));
        };

        let room_id = RoomId::random();
        let game = GameState::new(room_id, room_name.clone(), level_pack_name.clone(), levels);
        let handle = spawn_room(
            game,
            conn,
            sender,
            Arc::clone(&self.judge),
            self.config.clone(),
            self.signals.clone(),
        );
        self.rooms.insert(room_id, handle);
        self.lobby.remove(&conn);
        self.connection_rooms.insert(conn, room_id);

        tracing::info!(
            %room_id,
            name = %room_name,
            pack = %level_pack_name,
            "room created"
        );
        self.broadcast_lists().await;
        Ok(room_id)
    }

    /// Rebinds a room's GM authority to `conn`.
    pub async fn gm_connect(
        &mut self,
        conn: ConnectionId,
        room_id: RoomId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.gm_connect(conn, sender).await?;
        self.lobby.remove(&conn);
        self.connection_rooms.insert(conn, room_id);
        Ok(())
    }

    /// Seats `conn` as a new player in `room_id`.
    pub async fn join_room(
        &mut self,
        conn: ConnectionId,
        room_id: RoomId,
        player_name: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.join(conn, player_name, sender).await?;
        self.lobby.remove(&conn);
        self.connection_rooms.insert(conn, room_id);
        Ok(())
    }

    /// Reclaims an existing seat in `room_id` for `conn`.
    pub async fn rejoin_room(
        &mut self,
        conn: ConnectionId,
        room_id: RoomId,
        player_id: PlayerId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.rejoin(conn, player_id, sender).await?;
        self.lobby.remove(&conn);
        self.connection_rooms.insert(conn, room_id);
        Ok(())
    }

    /// Routes an in-game action to the sender's room. Actions from
    /// connections outside any room are dropped.
    pub async fn action(&self, conn: ConnectionId, action: GameAction) {
        let Some(room_id) = self.connection_rooms.get(&conn) else {
            tracing::debug!(%conn, "action from connection outside any room");
            return;
        };
        let Some(handle) = self.rooms.get(room_id) else {
            return;
        };
        if let Err(error) = handle.action(conn, action).await {
            tracing::debug!(%conn, %error, "action not delivered");
        }
    }

    /// Handles a closed connection, wherever it was.
    pub async fn disconnect(&mut self, conn: ConnectionId) {
        self.lobby.remove(&conn);
        let Some(room_id) = self.connection_rooms.remove(&conn) else {
            return;
        };
        if let Some(handle) = self.rooms.get(&room_id) {
            let _ = handle.disconnect(conn).await;
        }
    }

    /// Shuts a room down and forgets it. Quiet no-op if already gone,
    /// so expiry signals and explicit deletion can race safely.
    pub async fn delete_room(&mut self, room_id: RoomId) {
        let Some(handle) = self.rooms.remove(&room_id) else {
            return;
        };
        let _ = handle.shutdown().await;
        self.connection_rooms.retain(|_, bound| *bound != room_id);
        tracing::info!(%room_id, "room deleted");
        self.broadcast_lists().await;
    }

    /// Current lobby view of every room, partitioned into rooms that
    /// can still be joined and games already underway.
    ///
    /// Queries each room actor; rooms that fail to respond (shutting
    /// down) drop out of the listing.
    pub async fn game_lists(&self) -> (Vec<GameListing>, Vec<GameListing>) {
        let mut joinable = Vec::new();
        let mut active = Vec::new();
        for handle in self.rooms.values() {
            let Ok(info) = handle.info().await else { continue };
            let accepts_players = info.phase.is_joinable();
            let listing = GameListing {
                id: info.room_id,
                name: info.name,
                level_pack_id: info.level_pack_name,
                active_player_count: info.active_players,
            };
            if accepts_players {
                joinable.push(listing);
            } else {
                active.push(listing);
            }
        }
        joinable.sort_by(|a, b| a.name.cmp(&b.name));
        active.sort_by(|a, b| a.name.cmp(&b.name));
        (joinable, active)
    }

    /// Pushes fresh game lists to every lobby connection. Senders whose
    /// connection has gone away fall out of the lobby here.
    pub async fn broadcast_lists(&mut self) {
        let (joinable, active) = self.game_lists().await;
        let event = ServerEvent::UpdateGameList { joinable, active };
        self.lobby
            .retain(|_, sender| sender.send(event.clone()).is_ok());
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
