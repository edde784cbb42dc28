//! The round-lifecycle phase machine.

/// Where a room is in its round lifecycle.
///
/// Transitions are GM-driven and mostly linear:
///
/// ```text
/// LOBBY → INSTRUCTIONS → PROMPTING → RESULTS → LEADERBOARD ─┬─→ PROMPTING
///                                                           └─→ GAMEOVER
/// ```
///
/// GAMEOVER is terminal; a new room must be created to play again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Instructions,
    Prompting,
    Results,
    Leaderboard,
    GameOver,
}

impl Phase {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver)
    }

    /// Returns `true` while prompt submissions are being collected.
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Prompting)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "LOBBY"),
            Self::Instructions => write!(f, "INSTRUCTIONS"),
            Self::Prompting => write!(f, "PROMPTING"),
            Self::Results => write!(f, "RESULTS"),
            Self::Leaderboard => write!(f, "LEADERBOARD"),
            Self::GameOver => write!(f, "GAMEOVER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_is_joinable_only_in_lobby() {
        assert!(Phase::Lobby.is_joinable());
        assert!(!Phase::Instructions.is_joinable());
        assert!(!Phase::Prompting.is_joinable());
        assert!(!Phase::Results.is_joinable());
        assert!(!Phase::Leaderboard.is_joinable());
        assert!(!Phase::GameOver.is_joinable());
    }

    #[test]
    fn test_phase_game_over_is_terminal() {
        assert!(Phase::GameOver.is_terminal());
        assert!(!Phase::Lobby.is_terminal());
        assert!(!Phase::Leaderboard.is_terminal());
    }

    #[test]
    fn test_phase_accepts_submissions_only_while_prompting() {
        assert!(Phase::Prompting.accepts_submissions());
        assert!(!Phase::Results.accepts_submissions());
        assert!(!Phase::Lobby.accepts_submissions());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Lobby.to_string(), "LOBBY");
        assert_eq!(Phase::GameOver.to_string(), "GAMEOVER");
    }
}
