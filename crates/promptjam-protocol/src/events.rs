//! The event vocabulary spoken between clients and the server.
//!
//! Every frame on the wire is one JSON object of the form
//!
//! ```json
//! { "event": "createGame", "data": { "roomName": "Trivia Night", "levelPackName": "Default" } }
//! ```
//!
//! with `data` omitted for events that carry no payload. [`ClientEvent`]
//! covers the client → server direction, [`ServerEvent`] the reverse.
//! Both enums are adjacently tagged so the event name is data, not type
//! structure, which is exactly what a browser client dispatches on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{GameListing, PlayerId, PlayerSummary, RoomId, RoundResult};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Events a client may send.
///
/// Room-lifecycle events (`createGame`, `gmConnect`, `joinGame`,
/// `rejoinGame`) are handled by the registry; everything else is routed to
/// the room the connection already belongs to. GM-only events sent by a
/// non-GM connection are silently dropped by the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Create a new room and become its GM.
    CreateGame {
        room_name: String,
        level_pack_name: String,
    },

    /// Claim (or reclaim) GM authority over an existing room.
    /// Last writer wins; issuing this cancels a pending deletion timer.
    GmConnect { room_id: RoomId },

    /// Join a room that is still in its lobby phase.
    JoinGame {
        player_name: String,
        room_id: RoomId,
    },

    /// Reclaim a seat after a dropped connection, using the stable
    /// player id handed out by `joinSuccess`.
    RejoinGame {
        room_id: RoomId,
        player_id: PlayerId,
    },

    /// GM: move the room from lobby to the instructions screen.
    StartGame,

    /// GM: start level 1 and open submissions.
    StartFirstRound,

    /// Player: submit an answer for the current problem.
    /// Only the first submission per player per round counts.
    SubmitPrompt { text: String },

    /// GM: stop accepting answers and send them to the judge.
    CloseSubmissions,

    /// GM: reveal the overall standings.
    ShowLeaderboard,

    /// GM: advance to the next level, or finish the game if the level
    /// pack is exhausted.
    NextLevel,

    /// GM: end the game and show final standings.
    ShowFinalResults,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Events the server may send.
///
/// Most are room-scoped broadcasts; `updateSubmissionStatus` and
/// `allSubmissionsIn` go to the GM only, and `errorMsg`, `joinSuccess`,
/// `promptAccepted`, `rejoinError`, and `gameCreated` go to a single
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// The room exists and the caller is its GM.
    /// Also re-sent on every successful `gmConnect`.
    GameCreated { room_id: RoomId },

    /// Generic failure advisory to the originating connection.
    /// Deliberately unstructured: no error codes reach clients.
    ErrorMsg { text: String },

    /// Catalog pack names, sent once when a connection arrives.
    LevelPacksAvailable { packs: Vec<String> },

    /// Lobby view of all rooms, partitioned by whether they can still
    /// be joined.
    UpdateGameList {
        joinable: Vec<GameListing>,
        active: Vec<GameListing>,
    },

    /// Join succeeded; `player_id` is the caller's stable identity and
    /// should be persisted client-side for `rejoinGame`.
    JoinSuccess {
        message: String,
        player_id: PlayerId,
    },

    /// Current roster, broadcast to the room whenever it changes.
    UpdatePlayerList { players: Vec<PlayerSummary> },

    /// The game has started; show the how-to-play screen.
    ShowInstructions,

    /// A new round is open for submissions.
    LevelStart { level: u32, problem: String },

    /// GM-only snapshot of who has submitted what this round.
    UpdateSubmissionStatus {
        players: Vec<PlayerSummary>,
        prompts: HashMap<PlayerId, String>,
    },

    /// GM-only advisory: every active player has submitted.
    /// Informational; the GM still closes submissions explicitly.
    AllSubmissionsIn,

    /// The sender's submission was recorded (or was already on file,
    /// for a rejoining player).
    PromptAccepted { message: String },

    /// The judged outcome of the round just closed.
    ShowRoundResults { round_results: RoundResult },

    /// Overall standings plus progress through the level pack.
    ShowLeaderboard {
        overall_leaderboard: Vec<PlayerSummary>,
        current_level: u32,
        total_levels: u32,
    },

    /// Terminal standings; the room accepts no further transitions.
    GameOver { final_leaderboard: Vec<PlayerSummary> },

    /// The room was torn down (GM gone past the grace period).
    GameReset { message: String },

    /// `rejoinGame` failed; the client should fall back to a fresh join.
    RejoinError { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! One shape test per interesting variant: the event names and field
    //! casing are load-bearing for the clients.

    use super::*;
    use uuid::Uuid;

    fn pid(n: u128) -> PlayerId {
        PlayerId(Uuid::from_u128(n))
    }

    fn rid(n: u128) -> RoomId {
        RoomId(Uuid::from_u128(n))
    }

    // =====================================================================
    // ClientEvent
    // =====================================================================

    #[test]
    fn test_create_game_json_format() {
        let ev = ClientEvent::CreateGame {
            room_name: "Trivia Night".into(),
            level_pack_name: "Default".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "createGame");
        assert_eq!(json["data"]["roomName"], "Trivia Night");
        assert_eq!(json["data"]["levelPackName"], "Default");
    }

    #[test]
    fn test_gm_connect_json_format() {
        let ev = ClientEvent::GmConnect { room_id: rid(7) };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "gmConnect");
        assert_eq!(json["data"]["roomId"], rid(7).to_string());
    }

    #[test]
    fn test_join_game_json_format() {
        let ev = ClientEvent::JoinGame {
            player_name: "Ann".into(),
            room_id: rid(1),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "joinGame");
        assert_eq!(json["data"]["playerName"], "Ann");
    }

    #[test]
    fn test_rejoin_game_json_format() {
        let ev = ClientEvent::RejoinGame {
            room_id: rid(1),
            player_id: pid(9),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "rejoinGame");
        assert_eq!(json["data"]["playerId"], pid(9).to_string());
    }

    #[test]
    fn test_unit_events_carry_no_data() {
        for (ev, name) in [
            (ClientEvent::StartGame, "startGame"),
            (ClientEvent::StartFirstRound, "startFirstRound"),
            (ClientEvent::CloseSubmissions, "closeSubmissions"),
            (ClientEvent::ShowLeaderboard, "showLeaderboard"),
            (ClientEvent::NextLevel, "nextLevel"),
            (ClientEvent::ShowFinalResults, "showFinalResults"),
        ] {
            let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
            assert_eq!(json["event"], name);
            assert!(json.get("data").is_none(), "{name} should omit data");
        }
    }

    #[test]
    fn test_unit_event_decodes_without_data_field() {
        let ev: ClientEvent =
            serde_json::from_str(r#"{"event":"startGame"}"#).unwrap();
        assert_eq!(ev, ClientEvent::StartGame);
    }

    #[test]
    fn test_submit_prompt_round_trip() {
        let ev = ClientEvent::SubmitPrompt {
            text: "answer A".into(),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_unknown_event_name_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"flyToMoon","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_payload_field_is_rejected() {
        // createGame without a levelPackName must not parse.
        let result: Result<ClientEvent, _> = serde_json::from_str(
            r#"{"event":"createGame","data":{"roomName":"x"}}"#,
        );
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_game_created_json_format() {
        let ev = ServerEvent::GameCreated { room_id: rid(3) };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "gameCreated");
        assert_eq!(json["data"]["roomId"], rid(3).to_string());
    }

    #[test]
    fn test_error_msg_json_format() {
        let ev = ServerEvent::ErrorMsg {
            text: "Game not found.".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "errorMsg");
        assert_eq!(json["data"]["text"], "Game not found.");
    }

    #[test]
    fn test_update_game_list_json_format() {
        let ev = ServerEvent::UpdateGameList {
            joinable: vec![GameListing {
                id: rid(1),
                name: "Trivia Night".into(),
                level_pack_id: "Default".into(),
                active_player_count: 2,
            }],
            active: vec![],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "updateGameList");
        assert_eq!(json["data"]["joinable"][0]["name"], "Trivia Night");
        assert_eq!(json["data"]["active"], serde_json::json!([]));
    }

    #[test]
    fn test_join_success_json_format() {
        let ev = ServerEvent::JoinSuccess {
            message: "Welcome, Ann!".into(),
            player_id: pid(5),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "joinSuccess");
        assert_eq!(json["data"]["message"], "Welcome, Ann!");
        assert_eq!(json["data"]["playerId"], pid(5).to_string());
    }

    #[test]
    fn test_level_start_json_format() {
        let ev = ServerEvent::LevelStart {
            level: 1,
            problem: "Explain gravity".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "levelStart");
        assert_eq!(json["data"]["level"], 1);
        assert_eq!(json["data"]["problem"], "Explain gravity");
    }

    #[test]
    fn test_update_submission_status_keys_prompts_by_player_id() {
        let mut prompts = HashMap::new();
        prompts.insert(pid(5), "answer A".to_string());
        let ev = ServerEvent::UpdateSubmissionStatus {
            players: vec![],
            prompts,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "updateSubmissionStatus");
        assert_eq!(json["data"]["prompts"][pid(5).to_string()], "answer A");
    }

    #[test]
    fn test_show_leaderboard_json_format() {
        let ev = ServerEvent::ShowLeaderboard {
            overall_leaderboard: vec![PlayerSummary {
                id: pid(5),
                name: "Ann".into(),
                score: 2,
                is_active: true,
            }],
            current_level: 1,
            total_levels: 3,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "showLeaderboard");
        assert_eq!(json["data"]["overallLeaderboard"][0]["score"], 2);
        assert_eq!(json["data"]["currentLevel"], 1);
        assert_eq!(json["data"]["totalLevels"], 3);
    }

    #[test]
    fn test_game_over_json_format() {
        let ev = ServerEvent::GameOver {
            final_leaderboard: vec![],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "gameOver");
        assert_eq!(json["data"]["finalLeaderboard"], serde_json::json!([]));
    }

    #[test]
    fn test_game_reset_round_trip() {
        let ev = ServerEvent::GameReset {
            message: "The Game Master has disconnected. The game has ended."
                .into(),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_show_round_results_nests_under_round_results() {
        let ev = ServerEvent::ShowRoundResults {
            round_results: RoundResult {
                problem: "p".into(),
                winner_name: "Ann".into(),
                ai_solution: "s".into(),
                rankings: vec![],
            },
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "showRoundResults");
        assert_eq!(json["data"]["roundResults"]["winnerName"], "Ann");
    }

    #[test]
    fn test_all_submissions_in_carries_no_data() {
        let json: serde_json::Value =
            serde_json::to_value(&ServerEvent::AllSubmissionsIn).unwrap();
        assert_eq!(json["event"], "allSubmissionsIn");
        assert!(json.get("data").is_none());
    }
}
