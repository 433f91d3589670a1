use serde::{Deserialize, Serialize};

pub mod engine;
pub mod entity;
pub mod grid;
pub mod level;
pub mod save;

/// A 2D dungeon coordinate: 0-indexed, row grows downward.
///
/// Coordinates are signed so that a position one step outside the grid is
/// still representable; grid lookups at such positions simply come back
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    /// Returns this position shifted by the given row/column delta.
    pub const fn offset(self, drow: i32, dcol: i32) -> Self {
        Position {
            row: self.row + drow,
            col: self.col + dcol,
        }
    }
}

/// The four logical movement directions, independent of input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit (row, col) delta for this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }
}
