use log::info;
use serde::{Deserialize, Serialize};

use crate::Position;
use crate::grid::Grid;

/// Represents errors that can occur while constructing a level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("level text is empty")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("level has no player start cell")]
    MissingPlayerStart,
    #[error("unknown level identifier '{0}'")]
    UnknownLevel(String),
}

/// The code occupying a single dungeon cell.
///
/// Tiles map one-to-one onto the characters of the level text format.
/// Unrecognized characters (including spaces) decode to `Empty` floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Key,
    MoveBonus,
    Door,
    PlayerStart,
}

impl Tile {
    /// Decodes a level-file character.
    pub const fn from_code(code: char) -> Self {
        match code {
            '#' => Tile::Wall,
            'K' => Tile::Key,
            'M' => Tile::MoveBonus,
            'D' => Tile::Door,
            'O' => Tile::PlayerStart,
            _ => Tile::Empty,
        }
    }

    /// The level-file character for this tile.
    pub const fn code(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Wall => '#',
            Tile::Key => 'K',
            Tile::MoveBonus => 'M',
            Tile::Door => 'D',
            Tile::PlayerStart => 'O',
        }
    }
}

/// A dungeon: the cell grid, the player's start cell, and the move budget
/// granted on entry.
///
/// The grid is the source of truth for item presence. Picking an item up
/// clears its source cell to `Empty`, so a position holds an item exactly
/// as long as the cell still encodes that item's code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    name: String,
    grid: Grid<Tile>,
    start: Position,
    move_budget: i32,
}

impl Level {
    /// Parses a level from its text form: one row per line, one character
    /// per cell, all rows the same length.
    ///
    /// The first player-start cell wins and is cleared to floor (the player
    /// is tracked separately from the grid). Later duplicates are left in
    /// place but are inert. A level without a door is accepted; it simply
    /// cannot be won.
    pub fn parse(name: &str, text: &str, move_budget: i32) -> Result<Level, LevelError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() {
            return Err(LevelError::Empty);
        }
        let cols = lines[0].chars().count();
        if cols == 0 {
            return Err(LevelError::Empty);
        }

        let mut grid = Grid::new(lines.len(), cols);
        let mut start = None;

        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: cols,
                    found,
                });
            }
            for (col, code) in line.chars().enumerate() {
                let position = Position::new(row as i32, col as i32);
                let tile = Tile::from_code(code);
                if tile == Tile::PlayerStart && start.is_none() {
                    // The start cell acts as plain floor once the player
                    // has been placed on it.
                    start = Some(position);
                    continue;
                }
                grid[position] = tile;
            }
        }

        let start = start.ok_or(LevelError::MissingPlayerStart)?;
        info!(
            "loaded level '{}' ({} rows, {} cols, {} moves)",
            name,
            grid.rows(),
            cols,
            move_budget
        );

        Ok(Level {
            name: name.to_string(),
            grid,
            start,
            move_budget,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dungeon size as a row count. Levels shipped with the game are
    /// square, so this doubles as the column count for them.
    pub fn size(&self) -> usize {
        self.grid.rows()
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    /// The cell the player starts on.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Number of moves granted when the level is entered.
    pub fn move_budget(&self) -> i32 {
        self.move_budget
    }

    /// The tile at a position, or `None` outside the grid.
    pub fn tile(&self, position: Position) -> Option<Tile> {
        self.grid.get(position).copied()
    }

    /// The first position holding the given tile, in row-major scan order.
    pub fn first_position(&self, tile: Tile) -> Option<Position> {
        self.grid
            .enumerate()
            .find_map(|(position, cell)| (*cell == tile).then_some(position))
    }

    pub fn grid(&self) -> &Grid<Tile> {
        &self.grid
    }

    /// Clears a cell to empty floor. Used when an item is picked up.
    pub(crate) fn clear(&mut self, position: Position) {
        self.grid[position] = Tile::Empty;
    }
}

/// Embedded demo levels: identifier, layout, move budget.
///
/// The registry is what makes save files resumable: a save records only the
/// level identifier, and restoring re-derives the dungeon from this table.
const BUILTIN_LEVELS: &[(&str, &str, i32)] = &[
    ("game1", GAME1, 7),
    ("game2", GAME2, 12),
    ("game3", GAME3, 30),
];

const GAME1: &str = "\
#####
#K  #
#O# #
# M #
##D##";

const GAME2: &str = "\
#######
#O#  M#
# # # #
# #K# #
# # # #
#    D#
#######";

const GAME3: &str = "\
#########
#O      #
# ##### #
# #   # #
# # K # #
# # ### #
# #   M #
# ##### #
#      D#
#########";

/// Builds the embedded level with the given identifier.
pub fn builtin(name: &str) -> Result<Level, LevelError> {
    let (id, text, budget) = BUILTIN_LEVELS
        .iter()
        .find(|(id, _, _)| *id == name)
        .ok_or_else(|| LevelError::UnknownLevel(name.to_string()))?;
    Level::parse(id, text, *budget)
}

/// Identifiers of all embedded levels, in order.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_LEVELS.iter().map(|(id, _, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_records_start_and_clears_its_cell() {
        let level = Level::parse("t", "#O K#", 5).unwrap();
        assert_eq!(level.start(), Position::new(0, 1));
        assert_eq!(level.tile(Position::new(0, 1)), Some(Tile::Empty));
        assert_eq!(level.tile(Position::new(0, 3)), Some(Tile::Key));
        assert_eq!(level.move_budget(), 5);
    }

    #[test]
    fn parse_rejects_empty_text() {
        assert_eq!(Level::parse("t", "", 5), Err(LevelError::Empty));
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let err = Level::parse("t", "##O\n####", 5).unwrap_err();
        assert_eq!(
            err,
            LevelError::RaggedRow {
                row: 1,
                expected: 3,
                found: 4,
            }
        );
    }

    #[test]
    fn parse_rejects_missing_player_start() {
        assert_eq!(
            Level::parse("t", "###\n#D#\n###", 5),
            Err(LevelError::MissingPlayerStart)
        );
    }

    #[test]
    fn first_player_start_wins() {
        let level = Level::parse("t", "OO#", 5).unwrap();
        assert_eq!(level.start(), Position::new(0, 0));
        // The duplicate keeps its code but is never the player.
        assert_eq!(level.tile(Position::new(0, 1)), Some(Tile::PlayerStart));
    }

    #[test]
    fn unknown_characters_are_floor() {
        let level = Level::parse("t", "O?x.", 5).unwrap();
        for col in 1..4 {
            assert_eq!(level.tile(Position::new(0, col)), Some(Tile::Empty));
        }
    }

    #[test]
    fn missing_door_is_tolerated() {
        assert!(Level::parse("t", "#O#", 5).is_ok());
    }

    #[test]
    fn first_position_scans_row_major() {
        let level = Level::parse("t", "O K\nK  ", 5).unwrap();
        assert_eq!(level.first_position(Tile::Key), Some(Position::new(0, 2)));
    }

    #[test]
    fn builtin_levels_all_parse() {
        for name in builtin_names() {
            let level = builtin(name).unwrap();
            assert_eq!(level.rows(), level.cols(), "{name} should be square");
            assert!(level.first_position(Tile::Door).is_some());
            assert!(level.first_position(Tile::Key).is_some());
            assert!(level.move_budget() > 0);
        }
    }

    #[test]
    fn builtin_rejects_unknown_identifier() {
        assert_eq!(
            builtin("no-such-level"),
            Err(LevelError::UnknownLevel("no-such-level".to_string()))
        );
    }
}
