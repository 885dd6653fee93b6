//! Player Registry
//!
//! Registered players, their positions and scores.
//! Players are stored in registration order; that order is the
//! leaderboard tie-break and the order of position snapshots.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::grid::Cell;
use crate::core::rng::DeterministicRng;
use crate::game::board::BoardConfig;
use crate::game::error::{GameError, MAX_NAME_CHARS};

// =============================================================================
// PLAYER ID
// =============================================================================

/// Registration sequence number.
///
/// The first registered player gets `PlayerId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create from a raw sequence number.
    pub const fn new(seq: u32) -> Self {
        Self(seq)
    }

    /// Raw sequence number.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single registered player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Registration sequence number
    pub id: PlayerId,

    /// Unique display name
    pub name: String,

    /// Current cell
    pub position: Cell,

    /// Accumulated score
    pub score: u32,

    /// Number of coins collected
    pub coins_collected: u32,
}

impl PlayerState {
    /// Create a new player at a spawn cell.
    pub fn new(id: PlayerId, name: String, position: Cell) -> Self {
        Self {
            id,
            name,
            position,
            score: 0,
            coins_collected: 0,
        }
    }

    /// Credit a collected coin.
    pub fn add_score(&mut self, amount: u32) -> u32 {
        self.score = self.score.saturating_add(amount);
        self.coins_collected = self.coins_collected.saturating_add(1);
        self.score
    }
}

/// Check the name length rule: 1 to [`MAX_NAME_CHARS`] characters.
pub fn validate_name(name: &str) -> Result<(), GameError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_CHARS {
        return Err(GameError::InvalidName);
    }
    Ok(())
}

// =============================================================================
// REGISTRY
// =============================================================================

/// All registered players.
#[derive(Clone, Debug, Default)]
pub struct PlayerRegistry {
    /// Players in registration order; index == `PlayerId`.
    players: Vec<PlayerState>,
    /// Name index.
    by_name: BTreeMap<String, PlayerId>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new name at a uniformly random cell with score 0.
    pub fn register(
        &mut self,
        name: &str,
        rng: &mut DeterministicRng,
        board: &BoardConfig,
    ) -> Result<PlayerId, GameError> {
        validate_name(name)?;

        if self.by_name.contains_key(name) {
            return Err(GameError::NameTaken(name.to_string()));
        }

        let id = PlayerId::new(self.players.len() as u32);
        let position = rng.random_cell(board.width, board.height);

        self.players.push(PlayerState::new(id, name.to_string(), position));
        self.by_name.insert(name.to_string(), id);

        Ok(id)
    }

    /// Overwrite a player's position.
    pub fn update_position(&mut self, name: &str, position: Cell) -> Result<(), GameError> {
        let player = self.get_mut(name)?;
        player.position = position;
        Ok(())
    }

    /// Add to a player's score, returning the new total.
    pub fn add_score(&mut self, name: &str, amount: u32) -> Result<u32, GameError> {
        let player = self.get_mut(name)?;
        Ok(player.add_score(amount))
    }

    /// Look up a player by name.
    pub fn get(&self, name: &str) -> Option<&PlayerState> {
        let id = self.by_name.get(name)?;
        self.players.get(id.0 as usize)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut PlayerState, GameError> {
        let id = self
            .by_name
            .get(name)
            .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))?;
        self.players
            .get_mut(id.0 as usize)
            .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))
    }

    /// Current cell of a player.
    pub fn position_of(&self, name: &str) -> Option<Cell> {
        self.get(name).map(|p| p.position)
    }

    /// Current score of a player.
    pub fn score_of(&self, name: &str) -> Option<u32> {
        self.get(name).map(|p| p.score)
    }

    /// Check whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True when nobody has registered yet.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.iter()
    }

    /// `(name, position)` pairs in registration order.
    pub fn snapshot(&self) -> Vec<(String, Cell)> {
        self.players
            .iter()
            .map(|p| (p.name.clone(), p.position))
            .collect()
    }

    /// `(name, score)` pairs, highest score first.
    ///
    /// The sort is stable, so equal scores keep registration order.
    pub fn ranked_scores(&self) -> Vec<(String, u32)> {
        let mut ranked: Vec<(String, u32)> = self.players
            .iter()
            .map(|p| (p.name.clone(), p.score))
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registry_with(names: &[&str]) -> PlayerRegistry {
        let mut rng = DeterministicRng::new(1);
        let board = BoardConfig::default();
        let mut registry = PlayerRegistry::new();
        for name in names {
            registry.register(name, &mut rng, &board).unwrap();
        }
        registry
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut rng = DeterministicRng::new(1);
        let board = BoardConfig::default();
        let mut registry = PlayerRegistry::new();

        assert_eq!(registry.register("alice", &mut rng, &board), Ok(PlayerId(0)));
        assert_eq!(registry.register("bob", &mut rng, &board), Ok(PlayerId(1)));
        assert_eq!(registry.len(), 2);

        let alice = registry.get("alice").unwrap();
        assert_eq!(alice.score, 0);
        assert!(board.contains(alice.position));
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let mut rng = DeterministicRng::new(1);
        let board = BoardConfig::default();
        let mut registry = PlayerRegistry::new();

        registry.register("alice", &mut rng, &board).unwrap();
        let result = registry.register("alice", &mut rng, &board);
        assert_eq!(result, Err(GameError::NameTaken("alice".to_string())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_name_length_rules() {
        assert_eq!(validate_name(""), Err(GameError::InvalidName));
        assert!(validate_name("a").is_ok());
        assert!(validate_name(&"x".repeat(32)).is_ok());
        assert_eq!(validate_name(&"x".repeat(33)), Err(GameError::InvalidName));

        // Counted in characters, not bytes
        assert!(validate_name(&"é".repeat(32)).is_ok());
        assert_eq!(validate_name(&"é".repeat(33)), Err(GameError::InvalidName));
    }

    #[test]
    fn test_update_position_and_score() {
        let mut registry = registry_with(&["alice"]);

        registry.update_position("alice", Cell::new(3, 4)).unwrap();
        assert_eq!(registry.position_of("alice"), Some(Cell::new(3, 4)));

        assert_eq!(registry.add_score("alice", 5), Ok(5));
        assert_eq!(registry.add_score("alice", 10), Ok(15));
        assert_eq!(registry.get("alice").unwrap().coins_collected, 2);
    }

    #[test]
    fn test_unknown_player_mutations() {
        let mut registry = registry_with(&["alice"]);

        assert_eq!(
            registry.update_position("bob", Cell::new(0, 0)),
            Err(GameError::UnknownPlayer("bob".to_string()))
        );
        assert_eq!(
            registry.add_score("bob", 1),
            Err(GameError::UnknownPlayer("bob".to_string()))
        );
    }

    #[test]
    fn test_snapshot_in_registration_order() {
        let registry = registry_with(&["zed", "amy", "kim"]);
        let names: Vec<String> = registry.snapshot().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zed", "amy", "kim"]);
    }

    #[test]
    fn test_ranked_scores_ties_keep_registration_order() {
        let mut registry = registry_with(&["p1", "p2", "p3", "p4"]);
        registry.add_score("p2", 5).unwrap();
        registry.add_score("p4", 5).unwrap();
        registry.add_score("p3", 10).unwrap();

        let ranked = registry.ranked_scores();
        assert_eq!(
            ranked,
            vec![
                ("p3".to_string(), 10),
                ("p2".to_string(), 5),
                ("p4".to_string(), 5),
                ("p1".to_string(), 0),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_ranked_scores_sorted_and_stable(scores in proptest::collection::vec(0u32..20, 1..40)) {
            let names: Vec<String> = (0..scores.len()).map(|i| format!("p{i}")).collect();
            let mut rng = DeterministicRng::new(5);
            let board = BoardConfig::default();
            let mut registry = PlayerRegistry::new();
            for (name, score) in names.iter().zip(&scores) {
                registry.register(name, &mut rng, &board).unwrap();
                registry.add_score(name, *score).unwrap();
            }

            let ranked = registry.ranked_scores();
            prop_assert_eq!(ranked.len(), scores.len());

            for pair in ranked.windows(2) {
                let (ref a_name, a_score) = pair[0];
                let (ref b_name, b_score) = pair[1];
                prop_assert!(a_score >= b_score);
                if a_score == b_score {
                    let a_id = registry.get(a_name).unwrap().id;
                    let b_id = registry.get(b_name).unwrap().id;
                    prop_assert!(a_id < b_id);
                }
            }
        }
    }
}
