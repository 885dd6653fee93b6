//! Board Geometry
//!
//! Integer grid cells, movement directions and bounds clamping.
//! Rows grow downward (screen coordinates), columns grow to the right.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A single board cell.
///
/// Ordered row-major so `BTreeMap<Cell, _>` iterates top-left to bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Row index (0 = top edge)
    pub row: u16,
    /// Column index (0 = left edge)
    pub col: u16,
}

impl Cell {
    /// Create a cell from row and column.
    #[inline]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Convert a row-major cell index into a cell.
    #[inline]
    pub fn from_index(index: u32, width: u16) -> Self {
        let width = u32::from(width.max(1));
        Self {
            row: (index / width) as u16,
            col: (index % width) as u16,
        }
    }

    /// Wire key, `"row,col"`.
    pub fn key(self) -> String {
        self.to_string()
    }

    /// Parse a `"row,col"` key.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (row, col) = key.split_once(',')?;
        Some(Self {
            row: row.trim().parse().ok()?,
            col: col.trim().parse().ok()?,
        })
    }

    /// Check whether the cell lies on a `width` x `height` board.
    #[inline]
    pub fn is_within(self, width: u16, height: u16) -> bool {
        self.row < height && self.col < width
    }

    /// Move one step, clamping each axis independently.
    ///
    /// Stepping into a wall leaves that axis unchanged.
    pub fn step(self, direction: Direction, width: u16, height: u16) -> Self {
        let (d_row, d_col) = direction.delta();
        Self {
            row: clamp_axis(i32::from(self.row) + d_row, height),
            col: clamp_axis(i32::from(self.col) + d_col, width),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Clamp a coordinate into `[0, extent - 1]`.
#[inline]
pub fn clamp_axis(value: i32, extent: u16) -> u16 {
    if extent == 0 {
        return 0;
    }
    value.clamp(0, i32::from(extent) - 1) as u16
}

/// Movement direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward row 0
    Up,
    /// Toward the last row
    Down,
    /// Toward column 0
    Left,
    /// Toward the last column
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// `(row, col)` delta for one step.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Parse a wire code (`"U"`, `"D"`, `"L"`, `"R"`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "U" => Some(Direction::Up),
            "D" => Some(Direction::Down),
            "L" => Some(Direction::Left),
            "R" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Wire code for this direction.
    pub const fn code(self) -> &'static str {
        match self {
            Direction::Up => "U",
            Direction::Down => "D",
            Direction::Left => "L",
            Direction::Right => "R",
        }
    }
}
