//! Pure round-lifecycle state for one room.
//!
//! [`GameState`] owns the roster, phase, submissions, and scores, and
//! never performs I/O. Every method returns the events the caller should
//! dispatch, each tagged with a [`Recipient`]. The room actor owns the
//! channel plumbing; this module owns the rules, which keeps the whole
//! round lifecycle testable without sockets or tasks.

use std::collections::HashMap;
use std::sync::Arc;

use promptjam_gateway::ConnectionId;
use promptjam_judge::{RankedEntry, SubmissionEntry};
use promptjam_protocol::{PlayerId, RankingEntry, RoomId, RoundResult, ServerEvent};

use crate::catalog::Problem;
use crate::error::RoomError;
use crate::phase::Phase;
use crate::player::{Player, Roster};

/// Shown in a ranking row when the player's submitted text is no longer
/// on file.
const MISSING_PROMPT: &str = "N/A";

/// Ack for a recorded submission; also replayed to a rejoining player
/// whose submission is already on file.
const PROMPT_ACCEPTED: &str = "Prompt received!";

/// GM advisory when a round cannot start because the pack has no levels.
const EMPTY_PACK_MSG: &str = "The selected level pack has no levels.";

// ---------------------------------------------------------------------------
// Dispatch vocabulary
// ---------------------------------------------------------------------------

/// Where an outbound event should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection bound to the room, the GM included.
    Room,
    /// The GM connection only; dropped silently if no GM is bound.
    Gm,
    /// One specific connection.
    Connection(ConnectionId),
}

/// An in-game request from a connection, already decoded.
#[derive(Debug, Clone)]
pub enum GameAction {
    StartGame,
    StartFirstRound,
    SubmitPrompt { text: String },
    CloseSubmissions,
    ShowLeaderboard,
    NextLevel,
    ShowFinalResults,
}

/// What an accepted action asks the caller to do.
#[derive(Debug)]
pub enum ActionEffect {
    /// Dispatch these events; nothing else to do.
    Events(Vec<(Recipient, ServerEvent)>),
    /// Run a judge evaluation outside the actor and feed the verdict
    /// back through [`GameState::apply_ranking`] with the same `seq`.
    Evaluate {
        seq: u64,
        problem: String,
        entries: Vec<SubmissionEntry>,
    },
}

/// Which role a dropped connection held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The GM link dropped; the caller should arm the deletion timer.
    Gm,
    /// A player seat went inactive.
    Player,
    /// The connection held no role in this room.
    Unknown,
}

/// An evaluation handed to the judge and not yet applied.
#[derive(Debug)]
struct PendingEvaluation {
    seq: u64,
    problem: String,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The full mutable state of one game.
#[derive(Debug)]
pub struct GameState {
    room_id: RoomId,
    room_name: String,
    level_pack_name: String,
    levels: Arc<[Problem]>,
    phase: Phase,
    roster: Roster,
    /// 1-based level counter; 0 until the first round starts.
    current_level: u32,
    submissions: HashMap<PlayerId, String>,
    last_round_results: Option<RoundResult>,
    gm_connection: Option<ConnectionId>,
    connections: HashMap<ConnectionId, PlayerId>,
    evaluation_seq: u64,
    pending_evaluation: Option<PendingEvaluation>,
}

impl GameState {
    pub fn new(
        room_id: RoomId,
        room_name: impl Into<String>,
        level_pack_name: impl Into<String>,
        levels: Arc<[Problem]>,
    ) -> Self {
        Self {
            room_id,
            room_name: room_name.into(),
            level_pack_name: level_pack_name.into(),
            levels,
            phase: Phase::Lobby,
            roster: Roster::new(),
            current_level: 0,
            submissions: HashMap::new(),
            last_round_results: None,
            gm_connection: None,
            connections: HashMap::new(),
            evaluation_seq: 0,
            pending_evaluation: None,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn level_pack_name(&self) -> &str {
        &self.level_pack_name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn gm_connection(&self) -> Option<ConnectionId> {
        self.gm_connection
    }

    pub fn active_player_count(&self) -> usize {
        self.roster.active_count()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.get(id)
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// Binds `conn` as the authoritative GM link. Last writer wins.
    pub fn gm_connect(&mut self, conn: ConnectionId) -> Vec<(Recipient, ServerEvent)> {
        self.gm_connection = Some(conn);
        vec![
            (
                Recipient::Connection(conn),
                ServerEvent::GameCreated {
                    room_id: self.room_id,
                },
            ),
            (Recipient::Room, self.player_list()),
        ]
    }

    /// Seats a new player. Only legal while the room is in its lobby.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        player_name: &str,
    ) -> Result<(PlayerId, Vec<(Recipient, ServerEvent)>), RoomError> {
        if !self.phase.is_joinable() {
            return Err(RoomError::GameAlreadyStarted);
        }
        let player_id = self.roster.insert(Player::new(player_name));
        self.connections.insert(conn, player_id);

        let events = vec![
            (
                Recipient::Connection(conn),
                ServerEvent::JoinSuccess {
                    message: format!("Welcome, {player_name}!"),
                    player_id,
                },
            ),
            (Recipient::Room, self.player_list()),
        ];
        Ok((player_id, events))
    }

    /// Rebinds an existing seat to a fresh connection and replays the
    /// state the client missed while away.
    pub fn rejoin(
        &mut self,
        conn: ConnectionId,
        player_id: PlayerId,
    ) -> Result<Vec<(Recipient, ServerEvent)>, RoomError> {
        let Some(player) = self.roster.get_mut(player_id) else {
            return Err(RoomError::SessionNotFound(player_id));
        };
        player.is_active = true;
        let name = player.name.clone();

        // Drop any stale binding left by the previous connection so its
        // eventual disconnect cannot mark this player inactive again.
        self.connections.retain(|_, bound| *bound != player_id);
        self.connections.insert(conn, player_id);

        let mut events = vec![(
            Recipient::Connection(conn),
            ServerEvent::JoinSuccess {
                message: format!("Welcome back, {name}!"),
                player_id,
            },
        )];
        events.extend(
            self.resync_events(player_id)
                .into_iter()
                .map(|ev| (Recipient::Connection(conn), ev)),
        );
        events.push((Recipient::Room, self.player_list()));
        events.push((Recipient::Gm, self.submission_status()));
        Ok(events)
    }

    /// Phase-appropriate catch-up events for a rejoining player.
    fn resync_events(&self, player_id: PlayerId) -> Vec<ServerEvent> {
        match self.phase {
            Phase::Lobby => Vec::new(),
            Phase::Instructions => vec![ServerEvent::ShowInstructions],
            Phase::Prompting => {
                let mut events: Vec<ServerEvent> =
                    self.level_start().into_iter().collect();
                if self.submissions.contains_key(&player_id) {
                    events.push(ServerEvent::PromptAccepted {
                        message: PROMPT_ACCEPTED.into(),
                    });
                }
                events
            }
            // A RESULTS room without stored results (zero submissions
            // last round) has nothing extra to replay.
            Phase::Results => self
                .last_round_results
                .clone()
                .map(|round_results| ServerEvent::ShowRoundResults { round_results })
                .into_iter()
                .collect(),
            Phase::Leaderboard => vec![self.leaderboard()],
            Phase::GameOver => vec![self.final_standings()],
        }
    }

    /// Handles a dropped connection and reports which role it held.
    pub fn disconnect(
        &mut self,
        conn: ConnectionId,
    ) -> (DisconnectOutcome, Vec<(Recipient, ServerEvent)>) {
        if self.gm_connection == Some(conn) {
            self.gm_connection = None;
            return (DisconnectOutcome::Gm, Vec::new());
        }
        let Some(player_id) = self.connections.remove(&conn) else {
            return (DisconnectOutcome::Unknown, Vec::new());
        };
        if let Some(player) = self.roster.get_mut(player_id) {
            player.is_active = false;
        }
        let events = vec![
            (Recipient::Room, self.player_list()),
            (Recipient::Gm, self.submission_status()),
        ];
        (DisconnectOutcome::Player, events)
    }

    // -----------------------------------------------------------------------
    // GM transitions and player submissions
    // -----------------------------------------------------------------------

    /// Applies one in-game action from `conn`.
    ///
    /// # Errors
    /// `Unauthorized`, `WrongPhase`, and `NotAMember` are expected noise
    /// from mis-timed or mis-addressed client events; the caller should
    /// drop them quietly.
    pub fn handle_action(
        &mut self,
        conn: ConnectionId,
        action: GameAction,
    ) -> Result<ActionEffect, RoomError> {
        match action {
            GameAction::StartGame => self.start_game(conn),
            GameAction::StartFirstRound => self.start_first_round(conn),
            GameAction::SubmitPrompt { text } => self.submit_prompt(conn, text),
            GameAction::CloseSubmissions => self.close_submissions(conn),
            GameAction::ShowLeaderboard => self.show_leaderboard(conn),
            GameAction::NextLevel => self.next_level(conn),
            GameAction::ShowFinalResults => self.show_final_results(conn),
        }
    }

    fn start_game(&mut self, conn: ConnectionId) -> Result<ActionEffect, RoomError> {
        self.require_gm(conn)?;
        self.require_phase(Phase::Lobby)?;
        self.phase = Phase::Instructions;
        Ok(ActionEffect::Events(vec![(
            Recipient::Room,
            ServerEvent::ShowInstructions,
        )]))
    }

    fn start_first_round(&mut self, conn: ConnectionId) -> Result<ActionEffect, RoomError> {
        self.require_gm(conn)?;
        self.require_phase(Phase::Instructions)?;
        let Some(problem) = self.levels.first() else {
            return Ok(ActionEffect::Events(vec![(
                Recipient::Gm,
                ServerEvent::ErrorMsg {
                    text: EMPTY_PACK_MSG.into(),
                },
            )]));
        };
        let level_start = ServerEvent::LevelStart {
            level: problem.level,
            problem: problem.problem.clone(),
        };
        self.current_level = 1;
        self.submissions.clear();
        self.phase = Phase::Prompting;
        Ok(ActionEffect::Events(vec![
            (Recipient::Room, level_start),
            (Recipient::Gm, self.submission_status()),
        ]))
    }

    fn submit_prompt(
        &mut self,
        conn: ConnectionId,
        text: String,
    ) -> Result<ActionEffect, RoomError> {
        if !self.phase.accepts_submissions() {
            return Err(RoomError::WrongPhase(self.phase));
        }
        let Some(&player_id) = self.connections.get(&conn) else {
            return Err(RoomError::NotAMember);
        };
        // First submission wins; repeats are dropped without an ack.
        if self.submissions.contains_key(&player_id) {
            return Ok(ActionEffect::Events(Vec::new()));
        }
        self.submissions.insert(player_id, text);

        let mut events = vec![
            (
                Recipient::Connection(conn),
                ServerEvent::PromptAccepted {
                    message: PROMPT_ACCEPTED.into(),
                },
            ),
            (Recipient::Gm, self.submission_status()),
        ];
        if self.submissions.len() >= self.roster.active_count() {
            events.push((Recipient::Gm, ServerEvent::AllSubmissionsIn));
        }
        Ok(ActionEffect::Events(events))
    }

    fn close_submissions(&mut self, conn: ConnectionId) -> Result<ActionEffect, RoomError> {
        self.require_gm(conn)?;
        self.require_phase(Phase::Prompting)?;
        // Flip the phase before anything can await: a second
        // closeSubmissions now fails the check above, so at most one
        // evaluation per round ever starts.
        self.phase = Phase::Results;

        if self.submissions.is_empty() {
            return Ok(ActionEffect::Events(Vec::new()));
        }
        let Some(problem) = self.current_problem() else {
            return Ok(ActionEffect::Events(Vec::new()));
        };
        let problem = problem.problem.clone();

        self.evaluation_seq += 1;
        let seq = self.evaluation_seq;
        self.pending_evaluation = Some(PendingEvaluation {
            seq,
            problem: problem.clone(),
        });

        // Join order, not submission order.
        let entries = self
            .roster
            .iter()
            .filter_map(|player| {
                self.submissions.get(&player.id).map(|text| SubmissionEntry {
                    id: player.id,
                    name: player.name.clone(),
                    text: text.clone(),
                })
            })
            .collect();
        Ok(ActionEffect::Evaluate {
            seq,
            problem,
            entries,
        })
    }

    fn show_leaderboard(&mut self, conn: ConnectionId) -> Result<ActionEffect, RoomError> {
        self.require_gm(conn)?;
        self.require_phase(Phase::Results)?;
        self.phase = Phase::Leaderboard;
        Ok(ActionEffect::Events(vec![(
            Recipient::Room,
            self.leaderboard(),
        )]))
    }

    fn next_level(&mut self, conn: ConnectionId) -> Result<ActionEffect, RoomError> {
        self.require_gm(conn)?;
        self.require_phase(Phase::Leaderboard)?;
        self.pending_evaluation = None;

        // `current_level` is 1-based, so it doubles as the 0-based index
        // of the level after it.
        let next = self.current_level as usize;
        if next >= self.levels.len() {
            self.phase = Phase::GameOver;
            return Ok(ActionEffect::Events(vec![(
                Recipient::Room,
                self.final_standings(),
            )]));
        }
        let level_start = ServerEvent::LevelStart {
            level: self.levels[next].level,
            problem: self.levels[next].problem.clone(),
        };
        self.current_level += 1;
        self.submissions.clear();
        self.last_round_results = None;
        self.phase = Phase::Prompting;
        Ok(ActionEffect::Events(vec![
            (Recipient::Room, level_start),
            (Recipient::Gm, self.submission_status()),
        ]))
    }

    fn show_final_results(&mut self, conn: ConnectionId) -> Result<ActionEffect, RoomError> {
        self.require_gm(conn)?;
        self.require_phase(Phase::Leaderboard)?;
        self.pending_evaluation = None;
        self.phase = Phase::GameOver;
        Ok(ActionEffect::Events(vec![(
            Recipient::Room,
            self.final_standings(),
        )]))
    }

    // -----------------------------------------------------------------------
    // Evaluation results
    // -----------------------------------------------------------------------

    /// Applies a judge verdict requested by an [`ActionEffect::Evaluate`].
    ///
    /// Scores are credited through the live roster, so the verdict lands
    /// correctly even if the roster changed while the judge was thinking.
    /// A ranked identifier no longer in the roster keeps its row in the
    /// results but scores nothing.
    ///
    /// # Errors
    /// `StaleEvaluation` if the room has moved on to a newer round; the
    /// verdict must be discarded, never re-applied.
    pub fn apply_ranking(
        &mut self,
        seq: u64,
        ranking: Vec<RankedEntry>,
        solution: String,
    ) -> Result<Vec<(Recipient, ServerEvent)>, RoomError> {
        let pending = self
            .pending_evaluation
            .take_if(|pending| pending.seq == seq)
            .ok_or(RoomError::StaleEvaluation { seq })?;

        let Some(winner) = ranking.first() else {
            return Ok(Vec::new());
        };
        let winner_name = winner.name.clone();

        let active = self.roster.active_count() as u32;
        let rankings = ranking
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let points = active.saturating_sub(index as u32);
                if let Some(player) = self.roster.get_mut(entry.id) {
                    player.score += points;
                }
                RankingEntry {
                    rank: index as u32 + 1,
                    name: entry.name.clone(),
                    points,
                    prompt: self
                        .submissions
                        .get(&entry.id)
                        .cloned()
                        .unwrap_or_else(|| MISSING_PROMPT.into()),
                    reason: entry.reason.clone(),
                }
            })
            .collect();

        let round_results = RoundResult {
            problem: pending.problem,
            winner_name,
            ai_solution: solution,
            rankings,
        };
        self.last_round_results = Some(round_results.clone());
        Ok(vec![(
            Recipient::Room,
            ServerEvent::ShowRoundResults { round_results },
        )])
    }

    // -----------------------------------------------------------------------
    // Guards and projections
    // -----------------------------------------------------------------------

    fn require_gm(&self, conn: ConnectionId) -> Result<(), RoomError> {
        if self.gm_connection == Some(conn) {
            Ok(())
        } else {
            Err(RoomError::Unauthorized)
        }
    }

    fn require_phase(&self, phase: Phase) -> Result<(), RoomError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(RoomError::WrongPhase(self.phase))
        }
    }

    fn current_problem(&self) -> Option<&Problem> {
        let index = (self.current_level as usize).checked_sub(1)?;
        self.levels.get(index)
    }

    fn level_start(&self) -> Option<ServerEvent> {
        self.current_problem().map(|problem| ServerEvent::LevelStart {
            level: problem.level,
            problem: problem.problem.clone(),
        })
    }

    fn player_list(&self) -> ServerEvent {
        ServerEvent::UpdatePlayerList {
            players: self.roster.summaries(),
        }
    }

    fn submission_status(&self) -> ServerEvent {
        ServerEvent::UpdateSubmissionStatus {
            players: self.roster.summaries(),
            prompts: self.submissions.clone(),
        }
    }

    fn leaderboard(&self) -> ServerEvent {
        ServerEvent::ShowLeaderboard {
            overall_leaderboard: self.roster.standings(),
            current_level: self.current_level,
            total_levels: self.levels.len() as u32,
        }
    }

    fn final_standings(&self) -> ServerEvent {
        ServerEvent::GameOver {
            final_leaderboard: self.roster.standings(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
