//! Board Configuration
//!
//! Board dimensions and coin batch size.

use serde::{Serialize, Deserialize};

use crate::config::{env_or, ConfigError};
use crate::core::grid::Cell;

/// Default board width (columns).
pub const DEFAULT_WIDTH: u16 = 64;

/// Default board height (rows).
pub const DEFAULT_HEIGHT: u16 = 64;

/// Default number of coins per batch.
pub const DEFAULT_NUM_COINS: u32 = 100;

/// Board shape and coin batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Number of columns.
    pub width: u16,
    /// Number of rows.
    pub height: u16,
    /// Coins placed by each repopulation.
    pub num_coins: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            num_coins: DEFAULT_NUM_COINS,
        }
    }
}

impl BoardConfig {
    /// Create config from environment variables.
    ///
    /// Reads `BOARD_WIDTH`, `BOARD_HEIGHT` and `NUM_COINS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            width: env_or("BOARD_WIDTH", DEFAULT_WIDTH)?,
            height: env_or("BOARD_HEIGHT", DEFAULT_HEIGHT)?,
            num_coins: env_or("NUM_COINS", DEFAULT_NUM_COINS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject boards that cannot hold a full coin batch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "board must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.num_coins == 0 {
            return Err(ConfigError::Invalid("num_coins must be positive".to_string()));
        }
        if self.num_coins > self.cell_count() {
            return Err(ConfigError::Invalid(format!(
                "{} coins do not fit on {} cells",
                self.num_coins,
                self.cell_count()
            )));
        }
        Ok(())
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }

    /// Check whether a cell lies on this board.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.is_within(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_board() {
        let config = BoardConfig::default();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 64);
        assert_eq!(config.num_coins, 100);
        assert_eq!(config.cell_count(), 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let empty = BoardConfig { width: 0, ..Default::default() };
        assert!(empty.validate().is_err());

        let no_coins = BoardConfig { num_coins: 0, ..Default::default() };
        assert!(no_coins.validate().is_err());

        let crowded = BoardConfig { width: 5, height: 5, num_coins: 26 };
        assert!(crowded.validate().is_err());

        let full = BoardConfig { width: 5, height: 5, num_coins: 25 };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_contains() {
        let config = BoardConfig::default();
        assert!(config.contains(Cell::new(63, 63)));
        assert!(!config.contains(Cell::new(64, 0)));
        assert!(!config.contains(Cell::new(0, 64)));
    }
}
