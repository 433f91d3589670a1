use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::level::{self, Level, LevelError, Tile};
use crate::{Direction, Position};

/// A non-fatal message produced by an interaction effect, for the
/// presentation layer to surface. Notices never change game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// The player reached the door without a key.
    DoorLocked,
}

/// The result of a single attempted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The player relocated to `position`. `notice` carries any message the
    /// target entity produced when hit.
    Moved {
        position: Position,
        notice: Option<Notice>,
    },
    /// The target cell was impassable; the player stayed at `position`.
    Blocked { position: Position },
}

impl MoveOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, MoveOutcome::Blocked { .. })
    }

    /// The player's position after the attempt, moved or not.
    pub fn position(&self) -> Position {
        match self {
            MoveOutcome::Moved { position, .. } | MoveOutcome::Blocked { position } => *position,
        }
    }

    pub fn notice(&self) -> Option<Notice> {
        match self {
            MoveOutcome::Moved { notice, .. } => *notice,
            MoveOutcome::Blocked { .. } => None,
        }
    }
}

/// Standing win/lose state of a game.
///
/// This is a query, not an event: the driving layer checks it after each
/// attempted move and stops issuing moves once the game is terminal. The
/// engine itself never refuses a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Active
    }
}

/// The player's runtime state: where they stand, how many moves they have
/// left, and what they have picked up (in pickup order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    position: Option<Position>,
    moves_remaining: i32,
    inventory: Vec<Entity>,
}

impl Player {
    pub fn new(move_budget: i32) -> Self {
        Player {
            position: None,
            moves_remaining: move_budget,
            inventory: Vec::new(),
        }
    }

    /// The player's current position.
    ///
    /// # Panics
    ///
    /// Panics if the player has not been placed yet. A constructed
    /// [`GameState`] always places the player, so hitting this indicates a
    /// bug in the driving layer.
    pub fn position(&self) -> Position {
        self.position
            .expect("player position queried before placement")
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    pub fn moves_remaining(&self) -> i32 {
        self.moves_remaining
    }

    /// Adds `delta` (possibly negative) to the remaining move count.
    pub fn change_move_count(&mut self, delta: i32) {
        self.moves_remaining += delta;
    }

    pub(crate) fn set_move_count(&mut self, moves: i32) {
        self.moves_remaining = moves;
    }

    pub fn add_item(&mut self, item: Entity) {
        self.inventory.push(item);
    }

    pub fn inventory(&self) -> &[Entity] {
        &self.inventory
    }
}

/// The game-state engine: one dungeon, one player, one win flag.
///
/// All mutation goes through [`attempt_move`](GameState::attempt_move); the
/// rest of the surface is queries the presentation layer renders from.
#[derive(Debug, Clone)]
pub struct GameState {
    dungeon: Level,
    player: Player,
    won: bool,
}

impl GameState {
    /// Starts a game on the given level, placing the player on the level's
    /// start cell with its move budget.
    pub fn new(level: Level) -> Self {
        let mut player = Player::new(level.move_budget());
        player.set_position(level.start());
        info!(
            "new game on '{}': start {:?}, {} moves",
            level.name(),
            level.start(),
            level.move_budget()
        );
        GameState {
            dungeon: level,
            player,
            won: false,
        }
    }

    /// Starts a game on an embedded level by identifier.
    pub fn from_builtin(name: &str) -> Result<Self, LevelError> {
        Ok(GameState::new(level::builtin(name)?))
    }

    pub fn dungeon(&self) -> &Level {
        &self.dungeon
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn set_win(&mut self, won: bool) {
        if won && !self.won {
            info!("player reached the door with the key");
        }
        self.won = won;
    }

    /// The standing win/lose state. A win on the final move counts as a win.
    pub fn status(&self) -> GameStatus {
        if self.won {
            GameStatus::Won
        } else if self.player.moves_remaining() == 0 {
            GameStatus::Lost
        } else {
            GameStatus::Active
        }
    }

    /// The cell one step from the player in the given direction.
    ///
    /// No bounds clamping: a position off the grid is a valid result.
    pub fn resolve_direction(&self, direction: Direction) -> Position {
        let (drow, dcol) = direction.delta();
        self.player.position().offset(drow, dcol)
    }

    /// The entity occupying a position, derived from the grid on demand.
    ///
    /// Empty floor and off-grid positions both yield `None`; an off-grid
    /// move is therefore never blocked. For the single-instance item tiles
    /// (key, move bonus, door) only the first occurrence in row-major scan
    /// order is live; later duplicates of the same tile are inert floor.
    pub fn entity_at(&self, position: Position) -> Option<Entity> {
        match self.dungeon.tile(position)? {
            Tile::Empty | Tile::PlayerStart => None,
            Tile::Wall => Some(Entity::Wall),
            Tile::Key => self.tracked(Tile::Key, position, Entity::Key),
            Tile::MoveBonus => self.tracked(Tile::MoveBonus, position, Entity::move_bonus()),
            Tile::Door => self.tracked(Tile::Door, position, Entity::Door),
        }
    }

    fn tracked(&self, tile: Tile, position: Position, entity: Entity) -> Option<Entity> {
        (self.dungeon.first_position(tile) == Some(position)).then_some(entity)
    }

    /// The entity one step from the player in the given direction.
    pub fn entity_in_direction(&self, direction: Direction) -> Option<Entity> {
        self.entity_at(self.resolve_direction(direction))
    }

    /// Attempts to move the player one step in the given direction.
    ///
    /// A cell is blocked only when it holds a non-collidable entity; the
    /// player then stays put. Either way the attempt costs exactly one move
    /// (walking into a wall is not free). When the target holds a collidable
    /// entity its on-hit effect fires exactly once, after the relocation.
    pub fn attempt_move(&mut self, direction: Direction) -> MoveOutcome {
        let target = self.resolve_direction(direction);
        let entity = self.entity_at(target);
        let blocked = entity.is_some_and(|entity| !entity.can_collide());

        if !blocked {
            self.player.set_position(target);
        }
        self.player.change_move_count(-1);

        let mut notice = None;
        if let Some(entity) = entity {
            if entity.can_collide() {
                notice = entity.on_hit(self);
            }
        }

        if blocked {
            debug!("move {direction:?} blocked at {target:?}");
            MoveOutcome::Blocked {
                position: self.player.position(),
            }
        } else {
            MoveOutcome::Moved {
                position: self.player.position(),
                notice,
            }
        }
    }

    /// Clears the live (first-occurrence) cell of the given tile, used by
    /// pickup effects.
    pub(crate) fn clear_tracked(&mut self, tile: Tile) {
        if let Some(position) = self.dungeon.first_position(tile) {
            self.dungeon.clear(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 5x5 test dungeon:
    //   #####
    //   #O K#
    //   # # #
    //   #M D#
    //   #####
    const DUNGEON: &str = "#####\n#O K#\n# # #\n#M D#\n#####";

    fn game(move_budget: i32) -> GameState {
        GameState::new(Level::parse("test", DUNGEON, move_budget).unwrap())
    }

    #[test]
    fn resolve_direction_applies_unit_deltas() {
        let game = game(10);
        let start = game.player().position();
        assert_eq!(game.resolve_direction(Direction::North), start.offset(-1, 0));
        assert_eq!(game.resolve_direction(Direction::South), start.offset(1, 0));
        assert_eq!(game.resolve_direction(Direction::East), start.offset(0, 1));
        assert_eq!(game.resolve_direction(Direction::West), start.offset(0, -1));
        assert_eq!(
            game.entity_in_direction(Direction::North),
            Some(Entity::Wall)
        );
        assert_eq!(game.entity_in_direction(Direction::East), None);
    }

    #[test]
    fn wall_blocks_but_still_costs_a_move() {
        for direction in [Direction::North, Direction::West] {
            let mut game = game(10);
            let start = game.player().position();
            let outcome = game.attempt_move(direction);
            assert!(outcome.is_blocked());
            assert_eq!(outcome.position(), start);
            assert_eq!(game.player().position(), start);
            assert_eq!(game.player().moves_remaining(), 9);
        }
    }

    #[test]
    fn moving_into_empty_space_relocates_and_costs_a_move() {
        let mut game = game(10);
        let outcome = game.attempt_move(Direction::East);
        assert!(!outcome.is_blocked());
        assert_eq!(game.player().position(), Position::new(1, 2));
        assert_eq!(game.player().moves_remaining(), 9);
        assert_eq!(outcome.notice(), None);
    }

    #[test]
    fn key_pickup_fills_inventory_and_empties_the_cell() {
        let mut game = game(10);
        let key_pos = Position::new(1, 3);
        assert_eq!(game.entity_at(key_pos), Some(Entity::Key));

        game.attempt_move(Direction::East);
        game.attempt_move(Direction::East);

        assert_eq!(game.player().position(), key_pos);
        assert_eq!(game.player().inventory(), &[Entity::Key]);
        assert_eq!(game.entity_at(key_pos), None);
        assert_eq!(game.dungeon().tile(key_pos), Some(Tile::Empty));
    }

    #[test]
    fn move_bonus_grants_extra_moves_after_the_step_cost() {
        // One step down leaves 3 moves; the next step lands on the bonus.
        let mut game = game(4);
        game.attempt_move(Direction::South);
        assert_eq!(game.player().moves_remaining(), 3);

        // 3 - 1 (step) + 5 (bonus) = 7.
        let outcome = game.attempt_move(Direction::South);
        assert!(!outcome.is_blocked());
        assert_eq!(game.player().position(), Position::new(3, 1));
        assert_eq!(game.player().moves_remaining(), 7);
        assert_eq!(game.entity_at(Position::new(3, 1)), None);
    }

    #[test]
    fn door_is_locked_with_an_empty_inventory() {
        let mut game = game(10);
        // Down the left side and across to the door, skipping the key. The
        // move bonus on the way is consumed, not stored, so it does not
        // unlock the door.
        game.attempt_move(Direction::South);
        game.attempt_move(Direction::South);
        game.attempt_move(Direction::East);
        let outcome = game.attempt_move(Direction::East);

        assert_eq!(outcome.notice(), Some(Notice::DoorLocked));
        assert_eq!(game.player().position(), Position::new(3, 3));
        assert!(!game.won());
        assert_eq!(game.status(), GameStatus::Active);
    }

    #[test]
    fn door_with_a_key_wins() {
        let mut game = game(10);
        // Fetch the key, then straight down to the door.
        game.attempt_move(Direction::East);
        game.attempt_move(Direction::East);
        assert_eq!(game.player().inventory(), &[Entity::Key]);
        game.attempt_move(Direction::South);

        let outcome = game.attempt_move(Direction::South);
        assert_eq!(outcome.notice(), None);
        assert!(game.won());
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn running_out_of_moves_loses() {
        let mut game = game(1);
        assert_eq!(game.status(), GameStatus::Active);
        game.attempt_move(Direction::East);
        assert_eq!(game.player().moves_remaining(), 0);
        assert_eq!(game.status(), GameStatus::Lost);
    }

    #[test]
    fn blocked_final_move_still_loses() {
        let mut game = game(1);
        game.attempt_move(Direction::North);
        assert_eq!(game.status(), GameStatus::Lost);
    }

    #[test]
    fn winning_on_the_final_move_counts_as_a_win() {
        let mut game = GameState::new(Level::parse("t", "OKD", 2).unwrap());
        game.attempt_move(Direction::East);
        game.attempt_move(Direction::East);
        assert_eq!(game.player().moves_remaining(), 0);
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn entity_at_is_idempotent_until_the_cell_changes() {
        let mut game = game(10);
        let key_pos = Position::new(1, 3);
        assert_eq!(game.entity_at(key_pos), game.entity_at(key_pos));

        game.attempt_move(Direction::East);
        game.attempt_move(Direction::East);
        assert_eq!(game.entity_at(key_pos), None);
        assert_eq!(game.entity_at(key_pos), game.entity_at(key_pos));
    }

    #[test]
    fn off_grid_moves_are_not_blocked() {
        let mut game = GameState::new(Level::parse("t", "OK\n D", 5).unwrap());
        let outcome = game.attempt_move(Direction::North);
        assert!(!outcome.is_blocked());
        assert_eq!(game.player().position(), Position::new(-1, 0));
        assert_eq!(game.entity_at(Position::new(-1, 0)), None);
        assert_eq!(game.player().moves_remaining(), 4);
    }

    #[test]
    fn duplicate_item_cells_beyond_the_first_are_inert() {
        let mut game = GameState::new(Level::parse("t", "OKK", 5).unwrap());
        assert_eq!(game.entity_at(Position::new(0, 1)), Some(Entity::Key));
        // While the tracked key exists, the duplicate is plain floor.
        assert_eq!(game.entity_at(Position::new(0, 2)), None);

        game.attempt_move(Direction::East);
        assert_eq!(game.player().inventory(), &[Entity::Key]);
        // The grid is the source of truth: once the tracked cell is
        // cleared, the next occurrence in scan order takes its place.
        assert_eq!(game.entity_at(Position::new(0, 2)), Some(Entity::Key));
    }

    #[test]
    fn key_then_door_scenario_end_to_end() {
        let mut game = GameState::new(Level::parse("t", "OKD", 10).unwrap());

        let first = game.attempt_move(Direction::East);
        assert!(!first.is_blocked());
        assert_eq!(game.player().inventory(), &[Entity::Key]);

        let second = game.attempt_move(Direction::East);
        assert!(!second.is_blocked());
        assert!(game.won());
        assert_eq!(game.player().moves_remaining(), 8);
    }

    #[test]
    #[should_panic(expected = "before placement")]
    fn querying_an_unplaced_player_position_panics() {
        let player = Player::new(5);
        let _ = player.position();
    }
}
