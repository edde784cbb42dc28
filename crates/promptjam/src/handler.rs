//! Per-connection handler: greeting, event routing, teardown.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Start the outbound pump (events → JSON frames → socket)
//!   2. Register with the registry → client receives packs and game lists
//!   3. Loop: receive frames → decode → dispatch to registry or room
//!   4. On exit, detach from the registry (lobby or room, wherever it was)

use std::sync::Arc;

use promptjam_gateway::{Connection, ConnectionId, WebSocketConnection};
use promptjam_judge::Judge;
use promptjam_protocol::{ClientEvent, Codec, ServerEvent};
use promptjam_room::{EventSender, GameAction, RoomError};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ServerError;

/// Drop guard that detaches a connection from the registry when the
/// handler exits.
///
/// This ensures cleanup happens even if the handler errors out early.
/// Since `Drop` is synchronous, it spawns a fire-and-forget task for the
/// async lock.
struct DisconnectGuard<J: Judge> {
    conn_id: ConnectionId,
    state: Arc<ServerState<J>>,
}

impl<J: Judge> Drop for DisconnectGuard<J> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.lock().await.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<J: Judge>(
    conn: WebSocketConnection,
    state: Arc<ServerState<J>>,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Outbound pump. Room actors and the registry push events onto this
    // channel from their own tasks; the pump owns the socket's send half
    // and exits when every sender is gone or the peer stops accepting.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let writer = conn.clone();
    let codec = state.codec;
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::warn!(%error, "dropping unencodable event");
                    continue;
                }
            };
            if writer.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    {
        let mut registry = state.registry.lock().await;
        registry.connect(conn_id, event_tx.clone()).await;
    }
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(error) => {
                tracing::debug!(%conn_id, %error, "undecodable frame dropped");
                continue;
            }
        };

        dispatch_event(&state, conn_id, &event_tx, event).await;
    }

    // _guard drops here → registry disconnect fires.
    Ok(())
}

/// Routes one decoded client event.
///
/// Lifecycle events go through the registry and answer failures with the
/// advisory text the clients expect; in-game events are forwarded to the
/// sender's room, which drops mis-timed ones itself.
async fn dispatch_event<J: Judge>(
    state: &Arc<ServerState<J>>,
    conn_id: ConnectionId,
    events: &EventSender,
    event: ClientEvent,
) {
    match event {
        ClientEvent::CreateGame {
            room_name,
            level_pack_name,
        } => {
            // Lock only for the registry call, drop before answering.
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .create_room(conn_id, room_name, level_pack_name, events.clone())
                    .await
            };
            if let Err(error) = result {
                tracing::debug!(%conn_id, %error, "createGame rejected");
                let _ = events.send(ServerEvent::ErrorMsg {
                    text: "Invalid level pack selected.".into(),
                });
            }
        }

        ClientEvent::GmConnect { room_id } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry.gm_connect(conn_id, room_id, events.clone()).await
            };
            if let Err(error) = result {
                tracing::debug!(%conn_id, %error, "gmConnect rejected");
                let _ = events.send(ServerEvent::ErrorMsg {
                    text: "The game you were hosting could not be found.".into(),
                });
            }
        }

        ClientEvent::JoinGame {
            player_name,
            room_id,
        } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .join_room(conn_id, room_id, player_name, events.clone())
                    .await
            };
            if let Err(error) = result {
                tracing::debug!(%conn_id, %error, "joinGame rejected");
                let text = match error {
                    RoomError::GameAlreadyStarted => {
                        "Sorry, the game has already started."
                    }
                    _ => "Game not found.",
                };
                let _ = events.send(ServerEvent::ErrorMsg { text: text.into() });
            }
        }

        ClientEvent::RejoinGame { room_id, player_id } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .rejoin_room(conn_id, room_id, player_id, events.clone())
                    .await
            };
            if let Err(error) = result {
                tracing::debug!(%conn_id, %error, "rejoinGame rejected");
                let message = match error {
                    RoomError::SessionNotFound(_) => "Player session not found.",
                    _ => "Game not found.",
                };
                let _ = events.send(ServerEvent::RejoinError {
                    message: message.into(),
                });
            }
        }

        ClientEvent::StartGame => route(state, conn_id, GameAction::StartGame).await,
        ClientEvent::StartFirstRound => {
            route(state, conn_id, GameAction::StartFirstRound).await;
        }
        ClientEvent::SubmitPrompt { text } => {
            route(state, conn_id, GameAction::SubmitPrompt { text }).await;
        }
        ClientEvent::CloseSubmissions => {
            route(state, conn_id, GameAction::CloseSubmissions).await;
        }
        ClientEvent::ShowLeaderboard => {
            route(state, conn_id, GameAction::ShowLeaderboard).await;
        }
        ClientEvent::NextLevel => route(state, conn_id, GameAction::NextLevel).await,
        ClientEvent::ShowFinalResults => {
            route(state, conn_id, GameAction::ShowFinalResults).await;
        }
    }
}

/// Forwards an in-game action to the sender's room.
async fn route<J: Judge>(
    state: &Arc<ServerState<J>>,
    conn_id: ConnectionId,
    action: GameAction,
) {
    let registry = state.registry.lock().await;
    registry.action(conn_id, action).await;
}
