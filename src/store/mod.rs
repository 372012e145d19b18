//! Persistence Contract
//!
//! The engine reads versioned records and writes them back through atomic
//! change sets. Every write names the version it was computed from; a
//! change set whose versions are stale is rejected as a whole.
//!
//! ## Backends
//!
//! - `memory`: process-local store for tests and the demo binary
//!
//! Records derive serde traits so a document or relational backend can
//! persist them as they are.

pub mod memory;

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::error::{EngineError, InvalidStateKind, NotFoundKind};
use crate::game::player::{Player, PlayerId, UserId};
use crate::game::state::{ChannelId, Game, GameId, GameStatus};

pub use memory::InMemoryStore;

// =============================================================================
// VERSIONED RECORDS
// =============================================================================

/// Version of a freshly inserted record.
pub const INITIAL_VERSION: u64 = 1;

/// A record together with the version it was read at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Record contents
    pub value: T,
    /// Bumped by one on every committed write
    pub version: u64,
}

impl<T> Versioned<T> {
    /// Wrap a newly inserted record.
    pub fn initial(value: T) -> Self {
        Self { value, version: INITIAL_VERSION }
    }

    /// Drop the version.
    pub fn into_inner(self) -> T {
        self.value
    }
}

// =============================================================================
// CHANGE SETS
// =============================================================================

/// One guarded write, or a read guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Write {
    /// Create a game; fails if the id exists.
    InsertGame(Game),
    /// Replace a game read at `expected`.
    UpdateGame {
        /// New contents
        game: Game,
        /// Version the change was computed from
        expected: u64,
    },
    /// Create a player; its game must exist.
    InsertPlayer(Player),
    /// Replace a player read at `expected`.
    UpdatePlayer {
        /// New contents
        player: Player,
        /// Version the change was computed from
        expected: u64,
    },
    /// Delete a player read at `expected`.
    DeletePlayer {
        /// Player to delete
        id: PlayerId,
        /// Version the deletion was decided on
        expected: u64,
    },
    /// Require a game to still be at `expected`.
    CheckGame {
        /// Game read
        id: GameId,
        /// Version read
        expected: u64,
    },
    /// Require a player to still be at `expected`.
    CheckPlayer {
        /// Player read
        id: PlayerId,
        /// Version read
        expected: u64,
    },
}

/// Writes applied together or not at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    writes: Vec<Write>,
}

impl ChangeSet {
    /// Empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw write.
    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    /// Insert a new game.
    pub fn insert_game(&mut self, game: Game) -> &mut Self {
        self.push(Write::InsertGame(game))
    }

    /// Replace `read` with `game`.
    pub fn update_game(&mut self, read: &Versioned<Game>, game: Game) -> &mut Self {
        self.push(Write::UpdateGame { game, expected: read.version })
    }

    /// Require `read` to be current.
    pub fn check_game(&mut self, read: &Versioned<Game>) -> &mut Self {
        self.push(Write::CheckGame { id: read.value.id, expected: read.version })
    }

    /// Insert a new player.
    pub fn insert_player(&mut self, player: Player) -> &mut Self {
        self.push(Write::InsertPlayer(player))
    }

    /// Replace `read` with `player`.
    pub fn update_player(&mut self, read: &Versioned<Player>, player: Player) -> &mut Self {
        self.push(Write::UpdatePlayer { player, expected: read.version })
    }

    /// Delete `read`.
    pub fn delete_player(&mut self, read: &Versioned<Player>) -> &mut Self {
        self.push(Write::DeletePlayer { id: read.value.id, expected: read.version })
    }

    /// Require `read` to be current.
    pub fn check_player(&mut self, read: &Versioned<Player>) -> &mut Self {
        self.push(Write::CheckPlayer { id: read.value.id, expected: read.version })
    }

    /// Number of writes and guards.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// No writes at all?
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Writes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Write> {
        self.writes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Store-level rule a change set would break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// A channel may hold one game in setup or in progress at a time.
    ActiveGamePerChannel,
}

/// Store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A guarded record changed since it was read.
    #[error("version conflict")]
    Conflict,

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(NotFoundKind),

    /// The change set would break a store-level rule.
    #[error("constraint violated: {0:?}")]
    Constraint(Constraint),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            // Only reached when a conflict escapes the retry loop
            StoreError::Conflict => EngineError::ConcurrencyConflict { attempts: 1 },
            StoreError::NotFound(kind) => EngineError::NotFound(kind),
            StoreError::Constraint(Constraint::ActiveGamePerChannel) => {
                EngineError::invalid(InvalidStateKind::ChannelBusy)
            }
            StoreError::Unavailable(reason) => EngineError::Unavailable(reason),
        }
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Versioned game and player records.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Game by id.
    async fn game(&self, id: GameId) -> Result<Option<Versioned<Game>>, StoreError>;

    /// Most recently created game in `channel` with `status`.
    async fn find_game(
        &self,
        channel: &ChannelId,
        status: GameStatus,
    ) -> Result<Option<Versioned<Game>>, StoreError>;

    /// Player by id.
    async fn player(&self, id: PlayerId) -> Result<Option<Versioned<Player>>, StoreError>;

    /// The player `user` controls in `game`.
    async fn find_player(
        &self,
        game: GameId,
        user: &UserId,
    ) -> Result<Option<Versioned<Player>>, StoreError>;

    /// Every player record of `game`, ordered by player id.
    async fn roster(&self, game: GameId) -> Result<Vec<Versioned<Player>>, StoreError>;

    /// Apply `changes` atomically.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_engine_errors() {
        assert_eq!(
            EngineError::from(StoreError::NotFound(NotFoundKind::Game)),
            EngineError::NotFound(NotFoundKind::Game)
        );
        assert_eq!(
            EngineError::from(StoreError::Constraint(Constraint::ActiveGamePerChannel)),
            EngineError::invalid(InvalidStateKind::ChannelBusy)
        );
        assert!(EngineError::from(StoreError::Conflict).is_transient());
        assert!(!EngineError::from(StoreError::Unavailable("down".into())).is_transient());
    }

    #[test]
    fn test_change_set_builder() {
        let game = Versioned { value: Game::new(
            GameId::new([1; 16]),
            ChannelId::from("c"),
            Default::default(),
            chrono::Utc::now(),
        ), version: 4 };

        let mut changes = ChangeSet::new();
        changes.check_game(&game).update_game(&game, game.value.clone());

        assert_eq!(changes.len(), 2);
        let writes: Vec<Write> = changes.into_iter().collect();
        assert_eq!(writes[0], Write::CheckGame { id: game.value.id, expected: 4 });
        assert!(matches!(writes[1], Write::UpdateGame { expected: 4, .. }));
    }
}
