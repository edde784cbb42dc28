//! Players and the join-ordered roster.

use std::collections::HashMap;

use promptjam_protocol::{PlayerId, PlayerSummary};

/// One seat at the table.
///
/// The identifier outlives connections: a disconnect only flips
/// `is_active`, and a rejoin with the same identifier reclaims the seat
/// with the score intact. Names are fixed at join time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_active: bool,
}

impl Player {
    /// Creates an active player with a fresh identifier and zero score.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::random(),
            name: name.into(),
            score: 0,
            is_active: true,
        }
    }

    /// Wire projection of this player.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            is_active: self.is_active,
        }
    }
}

/// The players of one room, iterated in join order.
///
/// Join order is load-bearing: it breaks leaderboard ties
/// deterministically and fixes the order submissions are presented for
/// ranking. Players are never removed; the roster only grows.
#[derive(Debug, Default)]
pub struct Roster {
    players: HashMap<PlayerId, Player>,
    order: Vec<PlayerId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player, returning its identifier.
    pub fn insert(&mut self, player: Player) -> PlayerId {
        let id = player.id;
        self.order.push(id);
        self.players.insert(id, player);
        id
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Players in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    /// Wire projections in join order.
    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.iter().map(Player::summary).collect()
    }

    /// Standings sorted by score descending; ties keep join order.
    pub fn standings(&self) -> Vec<PlayerSummary> {
        let mut standings = self.summaries();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }

    /// Number of players currently marked active.
    pub fn active_count(&self) -> usize {
        self.players.values().filter(|p| p.is_active).count()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_of(names: &[&str]) -> (Roster, Vec<PlayerId>) {
        let mut roster = Roster::new();
        let ids = names
            .iter()
            .map(|name| roster.insert(Player::new(*name)))
            .collect();
        (roster, ids)
    }

    #[test]
    fn test_player_new_starts_clean() {
        let player = Player::new("ann");
        assert_eq!(player.name, "ann");
        assert_eq!(player.score, 0);
        assert!(player.is_active);
    }

    #[test]
    fn test_roster_iterates_in_join_order() {
        let (roster, ids) = roster_of(&["ann", "bo", "cy"]);

        let seen: Vec<PlayerId> = roster.iter().map(|p| p.id).collect();
        assert_eq!(seen, ids);
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_roster_standings_sorted_by_score_descending() {
        let (mut roster, ids) = roster_of(&["ann", "bo", "cy"]);
        roster.get_mut(ids[1]).unwrap().score = 5;
        roster.get_mut(ids[2]).unwrap().score = 3;

        let standings = roster.standings();
        assert_eq!(standings[0].name, "bo");
        assert_eq!(standings[1].name, "cy");
        assert_eq!(standings[2].name, "ann");
    }

    #[test]
    fn test_roster_standings_ties_keep_join_order() {
        let (mut roster, ids) = roster_of(&["ann", "bo", "cy"]);
        for id in &ids {
            roster.get_mut(*id).unwrap().score = 2;
        }

        let first = roster.standings();
        let second = roster.standings();
        let names: Vec<&str> = first.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ann", "bo", "cy"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_roster_active_count_tracks_flags() {
        let (mut roster, ids) = roster_of(&["ann", "bo"]);
        assert_eq!(roster.active_count(), 2);

        roster.get_mut(ids[0]).unwrap().is_active = false;
        assert_eq!(roster.active_count(), 1);

        roster.get_mut(ids[0]).unwrap().is_active = true;
        assert_eq!(roster.active_count(), 2);
    }
}
