//! # Coin Grid Game Server
//!
//! Authoritative server for a multiplayer coin-collecting game on a grid.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    COIN GRID SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Board primitives                         │
//! │  ├── grid.rs      - Cells, directions, wall clamping         │
//! │  └── rng.rs       - Seeded Xorshift128+ PRNG                 │
//! │                                                              │
//! │  game/            - Game rules                               │
//! │  ├── board.rs     - Board size and batch configuration       │
//! │  ├── coins.rs     - Coin spawning and collection             │
//! │  ├── registry.rs  - Players, positions, scores               │
//! │  ├── coordinator.rs - Locked register/move/snapshot          │
//! │  └── snapshot.rs  - Client-facing state projection           │
//! │                                                              │
//! │  network/         - Networking                               │
//! │  ├── server.rs    - WebSocket server                         │
//! │  ├── protocol.rs  - Message types                            │
//! │  └── session.rs   - Per-connection registration state        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! All game state lives behind one lock inside [`GameCoordinator`]:
//! - A name is registered at most once
//! - A coin is collected by at most one move
//! - A fresh batch appears only after the last coin of the old one is taken
//! - Snapshots never observe half of a move
//!
//! Given the same seed and the same sequence of operations, the board
//! evolves identically.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::grid::{Cell, Direction};
pub use crate::core::rng::DeterministicRng;
pub use crate::game::{BoardConfig, CoinValue, GameCoordinator, GameError, GameState, MoveOutcome, PlayerId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
