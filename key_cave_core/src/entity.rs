use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::{GameState, Notice};
use crate::level::Tile;

/// Default number of extra moves granted by a move-bonus pickup.
pub const DEFAULT_MOVE_BONUS: i32 = 5;

/// Everything that can occupy a dungeon cell.
///
/// This is a closed set: the engine matches exhaustively on it, so adding a
/// variant forces every interaction site to handle it. An entity either
/// blocks the cell it occupies (`can_collide` false, walls only) or can
/// share its cell with the player, in which case entering the cell fires
/// its [`on_hit`](Entity::on_hit) effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    Wall,
    Key,
    MoveBonus { bonus: i32 },
    Door,
    Player,
}

impl Entity {
    /// A move-bonus pickup granting the default number of extra moves.
    pub const fn move_bonus() -> Self {
        Entity::MoveBonus {
            bonus: DEFAULT_MOVE_BONUS,
        }
    }

    /// One-character tag identifying this entity in level files and
    /// renderings.
    pub const fn id(self) -> char {
        match self {
            Entity::Wall => '#',
            Entity::Key => 'K',
            Entity::MoveBonus { .. } => 'M',
            Entity::Door => 'D',
            Entity::Player => 'O',
        }
    }

    /// Returns true if the player may share this entity's cell, false if the
    /// cell is impassable.
    pub const fn can_collide(self) -> bool {
        !matches!(self, Entity::Wall)
    }

    /// Applies this entity's interaction effect after the player enters (or
    /// tries to enter) its cell.
    ///
    /// - `Key`: added to the player's inventory; its source cell is cleared.
    /// - `MoveBonus`: grants `bonus` extra moves; its source cell is cleared.
    /// - `Door`: wins the game if the player holds anything, otherwise
    ///   reports [`Notice::DoorLocked`] with no state change.
    ///
    /// # Panics
    ///
    /// Panics for `Wall` and `Player`, which have no interaction effect.
    /// Walls are non-collidable, so the engine never routes a hit to them;
    /// reaching this is a bug in the driving layer.
    pub fn on_hit(self, game: &mut GameState) -> Option<Notice> {
        match self {
            Entity::Key => {
                game.player_mut().add_item(Entity::Key);
                game.clear_tracked(Tile::Key);
                debug!("picked up the key");
                None
            }
            Entity::MoveBonus { bonus } => {
                game.player_mut().change_move_count(bonus);
                game.clear_tracked(Tile::MoveBonus);
                debug!("picked up a move bonus worth {bonus}");
                None
            }
            Entity::Door => {
                if game.player().inventory().is_empty() {
                    Some(Notice::DoorLocked)
                } else {
                    game.set_win(true);
                    None
                }
            }
            Entity::Wall | Entity::Player => {
                panic!("on_hit invoked for non-interactive entity '{}'", self.id())
            }
        }
    }
}
