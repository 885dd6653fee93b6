//! Game Logic Module
//!
//! Authoritative game state and the rules that mutate it.
//!
//! ## Module Structure
//!
//! - `board`: Board dimensions and coin batch size
//! - `coins`: Coin spawning and collection
//! - `registry`: Registered players, positions, scores
//! - `coordinator`: Synchronized register/move/snapshot operations
//! - `snapshot`: Client-facing state projection
//! - `error`: Errors surfaced by the above

pub mod board;
pub mod coins;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod snapshot;

// Re-export key types
pub use board::BoardConfig;
pub use coins::{CoinField, CoinValue};
pub use coordinator::{GameCoordinator, MoveOutcome};
pub use error::GameError;
pub use registry::{PlayerId, PlayerRegistry, PlayerState};
pub use snapshot::{GameState, PlayerPosition, ScoreEntry};
