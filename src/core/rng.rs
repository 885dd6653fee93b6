//! Seeded Random Number Generator
//!
//! Uses Xorshift128+ for fast, high-quality randomness.
//! A seeded generator replays the same sequence on every platform, which
//! keeps coin layouts and spawn points reproducible in tests.

use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use super::grid::Cell;

/// PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use coin_grid::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Pick a uniformly random cell on a `width` x `height` board.
    #[inline]
    pub fn random_cell(&mut self, width: u16, height: u16) -> Cell {
        let row = self.next_int(u32::from(height)) as u16;
        let col = self.next_int(u32::from(width)) as u16;
        Cell::new(row, col)
    }

    /// Random permutation of `0..len`.
    pub fn permutation(&mut self, len: u32) -> Vec<u32> {
        let mut indices: Vec<u32> = (0..len).collect();
        self.shuffle(&mut indices);
        indices
    }

    /// Shuffle a slice in place using Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_int((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a world seed from an instance id and a start timestamp.
///
/// The same inputs always yield the same seed, so a logged
/// `(instance_id, started_at_nanos)` pair reproduces a board.
pub fn derive_world_seed(instance_id: &[u8; 16], started_at_nanos: u128) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"COIN_GRID_SEED_V1");
    hasher.update(instance_id);
    hasher.update(started_at_nanos.to_le_bytes());

    let hash = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed)
}

/// Fresh seed for a new server instance.
pub fn entropy_seed() -> u64 {
    let instance_id = uuid::Uuid::new_v4().into_bytes();
    let started_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    derive_world_seed(&instance_id, started_at)
}

// =============================================================================
// TESTS
// =============================================================================
