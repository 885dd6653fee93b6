//! State Snapshot Projection
//!
//! Builds the client-facing view of the board from the registry and coin field.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::coins::CoinField;
use crate::game::registry::PlayerRegistry;

/// A player's position as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPosition {
    /// Player name.
    pub name: String,
    /// `"row,col"` key.
    pub position: String,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player name.
    pub name: String,
    /// Accumulated score.
    pub score: u32,
}

/// Client-facing game state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Positions in registration order.
    pub positions: Vec<PlayerPosition>,
    /// Scores, highest first; ties in registration order.
    pub scores: Vec<ScoreEntry>,
    /// `"row,col"` -> coin value.
    pub coins: BTreeMap<String, u32>,
}

impl GameState {
    /// Score shown for `name`.
    pub fn score_of(&self, name: &str) -> Option<u32> {
        self.scores.iter().find(|s| s.name == name).map(|s| s.score)
    }

    /// Position key shown for `name`.
    pub fn position_of(&self, name: &str) -> Option<&str> {
        self.positions
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.position.as_str())
    }
}

/// Project registry and coins into a [`GameState`].
///
/// Pure read; callers hold whatever lock makes the two inputs consistent.
pub fn project(players: &PlayerRegistry, coins: &CoinField) -> GameState {
    let positions = players
        .snapshot()
        .into_iter()
        .map(|(name, cell)| PlayerPosition {
            name,
            position: cell.key(),
        })
        .collect();

    let scores = players
        .ranked_scores()
        .into_iter()
        .map(|(name, score)| ScoreEntry { name, score })
        .collect();

    GameState {
        positions,
        scores,
        coins: coins.snapshot(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Cell;
    use crate::core::rng::DeterministicRng;
    use crate::game::board::BoardConfig;
    use crate::game::coins::CoinValue;

    #[test]
    fn test_project_combines_registry_and_coins() {
        let board = BoardConfig::default();
        let mut rng = DeterministicRng::new(2);

        let mut players = PlayerRegistry::new();
        players.register("alice", &mut rng, &board).unwrap();
        players.register("bob", &mut rng, &board).unwrap();
        players.update_position("alice", Cell::new(1, 2)).unwrap();
        players.add_score("bob", 10).unwrap();

        let mut coins = CoinField::new(board);
        coins.place(Cell::new(5, 6), CoinValue::Two);

        let state = project(&players, &coins);

        assert_eq!(state.positions.len(), 2);
        assert_eq!(state.position_of("alice"), Some("1,2"));
        assert_eq!(state.scores[0], ScoreEntry { name: "bob".into(), score: 10 });
        assert_eq!(state.scores[1], ScoreEntry { name: "alice".into(), score: 0 });
        assert_eq!(state.coins.get("5,6"), Some(&2));
    }

    #[test]
    fn test_project_empty() {
        let state = project(&PlayerRegistry::new(), &CoinField::new(BoardConfig::default()));
        assert_eq!(state, GameState::default());
    }

    #[test]
    fn test_game_state_json_shape() {
        let mut coins = BTreeMap::new();
        coins.insert("0,1".to_string(), 5);
        let state = GameState {
            positions: vec![PlayerPosition { name: "a".into(), position: "0,0".into() }],
            scores: vec![ScoreEntry { name: "a".into(), score: 3 }],
            coins,
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["positions"][0]["position"], "0,0");
        assert_eq!(json["scores"][0]["score"], 3);
        assert_eq!(json["coins"]["0,1"], 5);
    }
}
