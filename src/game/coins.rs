//! Coin Spawning and Collection
//!
//! The coin field owns every uncollected coin on the board.
//! Coins arrive in batches laid out by a random permutation of board cells,
//! and leave only through [`CoinField::collect_at`].

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::grid::Cell;
use crate::core::rng::DeterministicRng;
use crate::game::board::BoardConfig;

/// Coin denominations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CoinValue {
    /// Half of every batch
    One = 1,
    /// Next quarter
    Two = 2,
    /// Next fifth
    Five = 5,
    /// Rarest, last twentieth
    Ten = 10,
}

impl CoinValue {
    /// Points credited on collection.
    #[inline]
    pub fn points(self) -> u32 {
        self as u32
    }

    /// Value of the coin placed at `rank` within a batch of `batch_size`.
    ///
    /// Tiers are 50% / 25% / 20% / 5% of the batch, in rank order.
    pub fn for_rank(rank: u32, batch_size: u32) -> Self {
        let scaled = u64::from(rank) * 100;
        let batch = u64::from(batch_size.max(1));

        if scaled < 50 * batch {
            CoinValue::One
        } else if scaled < 75 * batch {
            CoinValue::Two
        } else if scaled < 95 * batch {
            CoinValue::Five
        } else {
            CoinValue::Ten
        }
    }
}

/// The set of active coins.
#[derive(Clone, Debug)]
pub struct CoinField {
    coins: BTreeMap<Cell, CoinValue>,
    board: BoardConfig,
}

impl CoinField {
    /// Create an empty field for the given board.
    pub fn new(board: BoardConfig) -> Self {
        Self {
            coins: BTreeMap::new(),
            board,
        }
    }

    /// Replace every coin with a fresh batch.
    ///
    /// The first `num_coins` entries of a random permutation of all cells
    /// become coin positions, valued by their rank.
    pub fn repopulate(&mut self, rng: &mut DeterministicRng) {
        let batch_size = self.board.num_coins.min(self.board.cell_count());
        let permutation = rng.permutation(self.board.cell_count());

        let batch: BTreeMap<Cell, CoinValue> = permutation
            .into_iter()
            .take(batch_size as usize)
            .enumerate()
            .map(|(rank, index)| {
                (
                    Cell::from_index(index, self.board.width),
                    CoinValue::for_rank(rank as u32, batch_size),
                )
            })
            .collect();

        self.coins = batch;
    }

    /// Remove and return the coin at `cell`, if any.
    pub fn collect_at(&mut self, cell: Cell) -> Option<CoinValue> {
        self.coins.remove(&cell)
    }

    /// Coin at `cell` without removing it.
    pub fn value_at(&self, cell: Cell) -> Option<CoinValue> {
        self.coins.get(&cell).copied()
    }

    /// Owned `"row,col" -> points` copy for projection.
    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.coins
            .iter()
            .map(|(cell, value)| (cell.key(), value.points()))
            .collect()
    }

    /// Number of uncollected coins.
    pub fn len(&self) -> usize {
        self.coins.len()
    }

    /// True once every coin has been collected.
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Drop a coin directly onto the board.
    #[cfg(test)]
    pub(crate) fn place(&mut self, cell: Cell, value: CoinValue) {
        self.coins.insert(cell, value);
    }

    /// Remove every coin without repopulating.
    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        self.coins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_counts(field: &CoinField) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for value in field.snapshot().values() {
            *counts.entry(*value).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_for_rank_tiers_for_standard_batch() {
        assert_eq!(CoinValue::for_rank(0, 100), CoinValue::One);
        assert_eq!(CoinValue::for_rank(49, 100), CoinValue::One);
        assert_eq!(CoinValue::for_rank(50, 100), CoinValue::Two);
        assert_eq!(CoinValue::for_rank(74, 100), CoinValue::Two);
        assert_eq!(CoinValue::for_rank(75, 100), CoinValue::Five);
        assert_eq!(CoinValue::for_rank(94, 100), CoinValue::Five);
        assert_eq!(CoinValue::for_rank(95, 100), CoinValue::Ten);
        assert_eq!(CoinValue::for_rank(99, 100), CoinValue::Ten);
    }

    #[test]
    fn test_repopulate_value_distribution() {
        let mut rng = DeterministicRng::new(12345);
        let mut field = CoinField::new(BoardConfig::default());
        field.repopulate(&mut rng);

        assert_eq!(field.len(), 100);

        let counts = value_counts(&field);
        assert_eq!(counts.get(&1), Some(&50));
        assert_eq!(counts.get(&2), Some(&25));
        assert_eq!(counts.get(&5), Some(&20));
        assert_eq!(counts.get(&10), Some(&5));
    }

    #[test]
    fn test_repopulate_replaces_previous_batch() {
        let mut rng = DeterministicRng::new(7);
        let mut field = CoinField::new(BoardConfig::default());

        field.repopulate(&mut rng);
        let first = field.snapshot();
        field.repopulate(&mut rng);
        let second = field.snapshot();

        assert_eq!(second.len(), 100);
        assert_ne!(first, second);
    }

    #[test]
    fn test_repopulate_positions_on_board() {
        let board = BoardConfig { width: 10, height: 12, num_coins: 100 };
        let mut rng = DeterministicRng::new(3);
        let mut field = CoinField::new(board);
        field.repopulate(&mut rng);

        assert_eq!(field.len(), 100);
        for key in field.snapshot().keys() {
            let cell = Cell::parse_key(key).unwrap();
            assert!(board.contains(cell));
        }
    }

    #[test]
    fn test_repopulate_fills_tiny_board() {
        let board = BoardConfig { width: 2, height: 2, num_coins: 4 };
        let mut rng = DeterministicRng::new(11);
        let mut field = CoinField::new(board);
        field.repopulate(&mut rng);

        assert_eq!(field.len(), 4);
        for row in 0..2 {
            for col in 0..2 {
                assert!(field.value_at(Cell::new(row, col)).is_some());
            }
        }
    }

    #[test]
    fn test_collect_at() {
        let mut field = CoinField::new(BoardConfig::default());
        field.place(Cell::new(10, 10), CoinValue::Five);

        assert_eq!(field.collect_at(Cell::new(10, 11)), None);
        assert_eq!(field.collect_at(Cell::new(10, 10)), Some(CoinValue::Five));
        assert_eq!(field.collect_at(Cell::new(10, 10)), None);
        assert!(field.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let mut field = CoinField::new(BoardConfig::default());
        field.place(Cell::new(1, 2), CoinValue::Ten);

        let snapshot = field.snapshot();
        field.collect_at(Cell::new(1, 2));

        assert_eq!(snapshot.get("1,2"), Some(&10));
        assert!(field.snapshot().is_empty());
    }
}
