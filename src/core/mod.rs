//! Core primitives.
//!
//! Pure geometry and randomness helpers with no shared state.

pub mod grid;
pub mod rng;

// Re-export core types
pub use grid::{Cell, Direction, clamp_axis};
pub use rng::DeterministicRng;
