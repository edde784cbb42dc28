//! Room actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel, so game state is never shared or locked. Judge calls
//! run in a spawned task and re-enter the actor as an ordinary command,
//! which keeps the actor responsive (submissions, disconnects, rejoins)
//! while a verdict is in flight.

use std::collections::HashMap;
use std::sync::Arc;

use promptjam_gateway::ConnectionId;
use promptjam_judge::{
    explain_or_fallback, rank_or_fallback, Judge, RankedEntry, SubmissionEntry,
};
use promptjam_protocol::{PlayerId, RoomId, ServerEvent};
use promptjam_timer::GraceTimer;
use tokio::sync::{mpsc, oneshot};

use crate::config::RoomConfig;
use crate::error::RoomError;
use crate::game::{ActionEffect, DisconnectOutcome, GameAction, GameState, Recipient};
use crate::phase::Phase;
use crate::registry::RoomSignal;

/// Broadcast when the GM grace period runs out and the room resets.
const GM_GONE_MSG: &str = "The Game Master has disconnected. The game has ended.";

/// Reference solution when no ranked winner has a submission on file.
const NO_WINNER_SOLUTION: &str = "No winner.";

/// Channel sender for delivering server events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// A snapshot of room metadata for lobby listings.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub level_pack_name: String,
    pub phase: Phase,
    pub active_players: usize,
}

/// Commands sent to a room actor through its channel.
///
/// Join and rejoin carry a reply channel because the caller must learn
/// whether the seat was granted; everything else is fire-and-forget.
pub(crate) enum RoomCommand {
    /// Bind (or rebind) the GM connection.
    GmConnect {
        conn: ConnectionId,
        sender: EventSender,
    },

    /// Seat a new player.
    Join {
        conn: ConnectionId,
        player_name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Reclaim an existing seat after a dropped connection.
    Rejoin {
        conn: ConnectionId,
        player_id: PlayerId,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// A connection bound to this room went away.
    Disconnect { conn: ConnectionId },

    /// An in-game event from a connection.
    Action {
        conn: ConnectionId,
        action: GameAction,
    },

    /// A judge verdict produced by a spawned evaluation task.
    RankingComplete {
        seq: u64,
        ranking: Vec<RankedEntry>,
        solution: String,
    },

    /// Request the current room snapshot.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone, it is just an `mpsc::Sender` wrapper. The registry
/// holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Binds `conn` as the room's GM link.
    pub async fn gm_connect(
        &self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::GmConnect { conn, sender })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Sends a join request and waits for the room's verdict.
    pub async fn join(
        &self,
        conn: ConnectionId,
        player_name: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn,
                player_name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Sends a rejoin request and waits for the room's verdict.
    pub async fn rejoin(
        &self,
        conn: ConnectionId,
        player_id: PlayerId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Rejoin {
                conn,
                player_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Reports a dropped connection (fire-and-forget).
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Disconnect { conn })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Delivers an in-game action (fire-and-forget).
    pub async fn action(
        &self,
        conn: ConnectionId,
        action: GameAction,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Action { conn, action })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room snapshot.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<J: Judge> {
    game: GameState,
    config: RoomConfig,
    judge: Arc<J>,
    /// Per-connection outbound channels, the GM's included.
    senders: HashMap<ConnectionId, EventSender>,
    gm_grace: GraceTimer,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Clone of the room's own command sender; evaluation tasks use it
    /// to deliver their verdict back into the actor.
    commands: mpsc::Sender<RoomCommand>,
    signals: mpsc::UnboundedSender<RoomSignal>,
}

impl<J: Judge> RoomActor<J> {
    /// Runs the actor loop until shutdown or GM grace expiry.
    async fn run(mut self) {
        let room_id = self.game.room_id();
        tracing::info!(
            room_id = %room_id,
            name = %self.game.room_name(),
            "room actor started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    match cmd {
                        RoomCommand::GmConnect { conn, sender } => {
                            self.handle_gm_connect(conn, sender);
                        }
                        RoomCommand::Join { conn, player_name, sender, reply } => {
                            let result = self.handle_join(conn, player_name, sender);
                            let _ = reply.send(result);
                        }
                        RoomCommand::Rejoin { conn, player_id, sender, reply } => {
                            let result = self.handle_rejoin(conn, player_id, sender);
                            let _ = reply.send(result);
                        }
                        RoomCommand::Disconnect { conn } => {
                            self.handle_disconnect(conn);
                        }
                        RoomCommand::Action { conn, action } => {
                            self.handle_action(conn, action);
                        }
                        RoomCommand::RankingComplete { seq, ranking, solution } => {
                            self.handle_ranking_complete(seq, ranking, solution);
                        }
                        RoomCommand::Info { reply } => {
                            let _ = reply.send(self.info());
                        }
                        RoomCommand::Shutdown => {
                            tracing::info!(room_id = %room_id, "room shutting down");
                            break;
                        }
                    }
                }
                () = self.gm_grace.expired() => {
                    self.handle_grace_expiry();
                    break;
                }
            }
        }

        tracing::info!(room_id = %room_id, "room actor stopped");
    }

    fn handle_gm_connect(&mut self, conn: ConnectionId, sender: EventSender) {
        // A GM back inside the grace window keeps the room alive.
        self.gm_grace.disarm();
        self.senders.insert(conn, sender);
        let events = self.game.gm_connect(conn);
        self.dispatch(events);
        tracing::info!(room_id = %self.game.room_id(), %conn, "gm connected");
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        player_name: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (player_id, events) = self.game.join(conn, &player_name)?;
        self.senders.insert(conn, sender);
        self.dispatch(events);
        self.signal_listing_changed();
        tracing::info!(
            room_id = %self.game.room_id(),
            %player_id,
            name = %player_name,
            players = self.game.active_player_count(),
            "player joined"
        );
        Ok(())
    }

    fn handle_rejoin(
        &mut self,
        conn: ConnectionId,
        player_id: PlayerId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let events = self.game.rejoin(conn, player_id)?;
        self.senders.insert(conn, sender);
        self.dispatch(events);
        self.signal_listing_changed();
        tracing::info!(room_id = %self.game.room_id(), %player_id, "player rejoined");
        Ok(())
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) {
        self.senders.remove(&conn);
        let (outcome, events) = self.game.disconnect(conn);
        self.dispatch(events);
        match outcome {
            DisconnectOutcome::Gm => {
                tracing::info!(
                    room_id = %self.game.room_id(),
                    grace_ms = self.config.gm_grace.as_millis() as u64,
                    "gm disconnected, deletion timer armed"
                );
                self.gm_grace.arm(self.config.gm_grace);
            }
            DisconnectOutcome::Player => {
                self.signal_listing_changed();
                tracing::info!(
                    room_id = %self.game.room_id(),
                    %conn,
                    players = self.game.active_player_count(),
                    "player disconnected"
                );
            }
            DisconnectOutcome::Unknown => {
                tracing::debug!(
                    room_id = %self.game.room_id(),
                    %conn,
                    "unbound connection dropped"
                );
            }
        }
    }

    fn handle_action(&mut self, conn: ConnectionId, action: GameAction) {
        // Starting the game moves the room out of the joinable listing.
        let relist = matches!(action, GameAction::StartGame);
        match self.game.handle_action(conn, action) {
            Ok(ActionEffect::Events(events)) => {
                self.dispatch(events);
                if relist {
                    self.signal_listing_changed();
                }
            }
            Ok(ActionEffect::Evaluate {
                seq,
                problem,
                entries,
            }) => {
                self.spawn_evaluation(seq, problem, entries);
            }
            Err(error) => {
                // Mis-timed and mis-addressed client events are routine;
                // the sender learns nothing.
                tracing::debug!(
                    room_id = %self.game.room_id(),
                    %conn,
                    %error,
                    "action dropped"
                );
            }
        }
    }

    /// Runs the judge outside the actor so the room stays responsive
    /// while the verdict is in flight.
    fn spawn_evaluation(&self, seq: u64, problem: String, entries: Vec<SubmissionEntry>) {
        let judge = Arc::clone(&self.judge);
        let commands = self.commands.clone();
        let room_id = self.game.room_id();
        tracing::info!(
            room_id = %room_id,
            seq,
            submissions = entries.len(),
            "evaluation started"
        );

        tokio::spawn(async move {
            let ranking = rank_or_fallback(judge.as_ref(), &problem, &entries).await;
            let solution = match ranking
                .first()
                .and_then(|winner| entries.iter().find(|entry| entry.id == winner.id))
            {
                Some(winner) => {
                    explain_or_fallback(judge.as_ref(), &problem, &winner.text).await
                }
                None => NO_WINNER_SOLUTION.to_string(),
            };
            let completed = RoomCommand::RankingComplete {
                seq,
                ranking,
                solution,
            };
            if commands.send(completed).await.is_err() {
                tracing::debug!(room_id = %room_id, seq, "room gone before the verdict landed");
            }
        });
    }

    fn handle_ranking_complete(
        &mut self,
        seq: u64,
        ranking: Vec<RankedEntry>,
        solution: String,
    ) {
        match self.game.apply_ranking(seq, ranking, solution) {
            Ok(events) => {
                tracing::info!(room_id = %self.game.room_id(), seq, "round results applied");
                self.dispatch(events);
            }
            Err(error) => {
                tracing::warn!(
                    room_id = %self.game.room_id(),
                    %error,
                    "verdict discarded"
                );
            }
        }
    }

    fn handle_grace_expiry(&mut self) {
        tracing::info!(room_id = %self.game.room_id(), "gm grace expired, room expiring");
        self.broadcast(ServerEvent::GameReset {
            message: GM_GONE_MSG.into(),
        });
        let _ = self
            .signals
            .send(RoomSignal::Expired(self.game.room_id()));
    }

    /// Dispatches outbound events to the correct connections.
    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::Room => self.broadcast(event),
                Recipient::Gm => {
                    if let Some(gm) = self.game.gm_connection() {
                        self.send_to(gm, event);
                    }
                }
                Recipient::Connection(conn) => self.send_to(conn, event),
            }
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Sends to a single connection. Silently drops if the receiver is
    /// gone (connection already closed).
    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(event);
        }
    }

    fn signal_listing_changed(&self) {
        let _ = self.signals.send(RoomSignal::ListingChanged);
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.game.room_id(),
            name: self.game.room_name().to_string(),
            level_pack_name: self.game.level_pack_name().to_string(),
            phase: self.game.phase(),
            active_players: self.game.active_player_count(),
        }
    }
}

/// Spawns a room actor around `game` and returns a handle to it.
///
/// The creating connection is seated as GM before the actor starts, so
/// its `gameCreated` confirmation is already queued when this returns.
pub(crate) fn spawn_room<J: Judge>(
    mut game: GameState,
    gm_conn: ConnectionId,
    gm_sender: EventSender,
    judge: Arc<J>,
    config: RoomConfig,
    signals: mpsc::UnboundedSender<RoomSignal>,
) -> RoomHandle {
    let room_id = game.room_id();
    let (tx, rx) = mpsc::channel(config.command_buffer);

    let mut senders = HashMap::new();
    senders.insert(gm_conn, gm_sender);
    let events = game.gm_connect(gm_conn);

    let actor = RoomActor {
        game,
        config,
        judge,
        senders,
        gm_grace: GraceTimer::idle(),
        receiver: rx,
        commands: tx.clone(),
        signals,
    };
    actor.dispatch(events);
    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}

// =========================================================================
// Tests
// =========================================================================
