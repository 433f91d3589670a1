use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// Represents errors that can occur within grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("position ({row}, {col}) is out of bounds for grid size ({rows}, {cols})")]
    OutOfBounds {
        row: i32,
        col: i32,
        rows: usize,
        cols: usize,
    },
}

/// A rectangular 2D grid of cells.
///
/// Stores elements of type `T` in a flat vector in row-major order and
/// addresses them by [`Position`]. Positions are signed; any lookup outside
/// the grid (including negative rows or columns) yields `None` rather than
/// an error, so callers probing around the edges need no special casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default
    /// values.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn new(rows: usize, cols: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = rows.checked_mul(cols).expect("grid size overflow");
        Grid {
            rows,
            cols,
            cells: vec![T::default(); size],
        }
    }

    /// Returns the number of rows in the grid.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns in the grid.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Checks whether the given position lies within the grid boundaries.
    #[inline]
    pub fn in_bounds(&self, position: Position) -> bool {
        position.row >= 0
            && position.col >= 0
            && (position.row as usize) < self.rows
            && (position.col as usize) < self.cols
    }

    /// Converts a position to a flat vector index.
    ///
    /// Returns `None` if the position is out of bounds.
    #[inline]
    fn index_of(&self, position: Position) -> Option<usize> {
        if self.in_bounds(position) {
            Some(position.row as usize * self.cols + position.col as usize)
        } else {
            None
        }
    }

    /// Gets an immutable reference to the cell at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<&T> {
        let index = self.index_of(position)?;
        self.cells.get(index)
    }

    /// Sets the value of the cell at the given position.
    ///
    /// Returns `Ok(())` on success, or `Err(GridError::OutOfBounds)` if the
    /// position is invalid.
    pub fn set(&mut self, position: Position, value: T) -> Result<(), GridError> {
        let index = self.index_of(position).ok_or(GridError::OutOfBounds {
            row: position.row,
            col: position.col,
            rows: self.rows,
            cols: self.cols,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell in
    /// row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let row = (index / self.cols) as i32;
            let col = (index % self.cols) as i32;
            (Position { row, col }, cell)
        })
    }
}

/// Allows indexing the grid by `Position` for immutable access.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: Position) -> &Self::Output {
        match self.index_of(position) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "grid index ({}, {}) out of bounds for grid size ({}, {})",
                position.row, position.col, self.rows, self.cols
            ),
        }
    }
}

/// Allows indexing the grid by `Position` for mutable access.
impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, position: Position) -> &mut Self::Output {
        let rows = self.rows;
        let cols = self.cols;
        match self.index_of(position) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "grid index ({}, {}) out of bounds for grid size ({}, {})",
                position.row, position.col, rows, cols
            ),
        }
    }
}
