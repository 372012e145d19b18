//! In-Memory Store
//!
//! Process-local `GameStore` backed by two ordered maps behind one async
//! RwLock. Commits validate every guard against the current tables under
//! the write lock, then apply, so a change set lands whole or not at all.

use std::collections::BTreeMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::NotFoundKind;
use crate::game::player::{Player, PlayerId, UserId};
use crate::game::state::{ChannelId, Game, GameId, GameStatus};
use crate::store::{ChangeSet, Constraint, GameStore, StoreError, Versioned, Write, INITIAL_VERSION};

/// Both record tables.
#[derive(Debug, Default)]
struct Tables {
    games: BTreeMap<GameId, Versioned<Game>>,
    players: BTreeMap<PlayerId, Versioned<Player>>,
}

impl Tables {
    /// Check every write against the tables without changing them.
    fn validate(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        // Versions as they will be once earlier writes in the set apply
        let mut games: BTreeMap<GameId, Option<u64>> = BTreeMap::new();
        let mut players: BTreeMap<PlayerId, Option<u64>> = BTreeMap::new();
        let mut staged: BTreeMap<GameId, &Game> = BTreeMap::new();

        for write in changes.iter() {
            match write {
                Write::InsertGame(game) => {
                    let slot = games
                        .entry(game.id)
                        .or_insert_with(|| self.games.get(&game.id).map(|g| g.version));
                    if slot.is_some() {
                        return Err(StoreError::Conflict);
                    }
                    *slot = Some(INITIAL_VERSION);
                    staged.insert(game.id, game);
                }
                Write::UpdateGame { game, expected } => {
                    let slot = games
                        .entry(game.id)
                        .or_insert_with(|| self.games.get(&game.id).map(|g| g.version));
                    *slot = Some(guard(*slot, *expected)? + 1);
                    staged.insert(game.id, game);
                }
                Write::CheckGame { id, expected } => {
                    let current = *games
                        .entry(*id)
                        .or_insert_with(|| self.games.get(id).map(|g| g.version));
                    guard(current, *expected)?;
                }
                Write::InsertPlayer(player) => {
                    let game_exists = games
                        .get(&player.game_id)
                        .copied()
                        .unwrap_or_else(|| self.games.get(&player.game_id).map(|g| g.version))
                        .is_some();
                    if !game_exists {
                        return Err(StoreError::NotFound(NotFoundKind::Game));
                    }
                    let slot = players
                        .entry(player.id)
                        .or_insert_with(|| self.players.get(&player.id).map(|p| p.version));
                    if slot.is_some() {
                        return Err(StoreError::Conflict);
                    }
                    *slot = Some(INITIAL_VERSION);
                }
                Write::UpdatePlayer { player, expected } => {
                    let slot = players
                        .entry(player.id)
                        .or_insert_with(|| self.players.get(&player.id).map(|p| p.version));
                    *slot = Some(guard(*slot, *expected)? + 1);
                }
                Write::DeletePlayer { id, expected } => {
                    let slot = players
                        .entry(*id)
                        .or_insert_with(|| self.players.get(id).map(|p| p.version));
                    guard(*slot, *expected)?;
                    *slot = None;
                }
                Write::CheckPlayer { id, expected } => {
                    let current = *players
                        .entry(*id)
                        .or_insert_with(|| self.players.get(id).map(|p| p.version));
                    guard(current, *expected)?;
                }
            }
        }

        self.check_channels(&staged)
    }

    /// At most one active game per channel once `staged` is applied.
    fn check_channels(&self, staged: &BTreeMap<GameId, &Game>) -> Result<(), StoreError> {
        let after = || {
            self.games
                .values()
                .map(|g| staged.get(&g.value.id).copied().unwrap_or(&g.value))
                .chain(
                    staged
                        .values()
                        .copied()
                        .filter(|g| !self.games.contains_key(&g.id)),
                )
        };

        for game in staged.values().filter(|g| g.status.is_active()) {
            let clash = after().any(|other| {
                other.id != game.id && other.channel == game.channel && other.status.is_active()
            });
            if clash {
                return Err(StoreError::Constraint(Constraint::ActiveGamePerChannel));
            }
        }
        Ok(())
    }

    /// Apply a validated change set.
    fn apply(&mut self, changes: ChangeSet) {
        for write in changes {
            match write {
                Write::InsertGame(game) => {
                    self.games.insert(game.id, Versioned::initial(game));
                }
                Write::UpdateGame { game, .. } => {
                    if let Some(slot) = self.games.get_mut(&game.id) {
                        slot.value = game;
                        slot.version += 1;
                    }
                }
                Write::InsertPlayer(player) => {
                    self.players.insert(player.id, Versioned::initial(player));
                }
                Write::UpdatePlayer { player, .. } => {
                    if let Some(slot) = self.players.get_mut(&player.id) {
                        slot.value = player;
                        slot.version += 1;
                    }
                }
                Write::DeletePlayer { id, .. } => {
                    self.players.remove(&id);
                }
                Write::CheckGame { .. } | Write::CheckPlayer { .. } => {}
            }
        }
    }
}

/// A missing record counts as changed: it was deleted since the read.
fn guard(current: Option<u64>, expected: u64) -> Result<u64, StoreError> {
    match current {
        Some(version) if version == expected => Ok(version),
        _ => Err(StoreError::Conflict),
    }
}

/// Store that keeps every record in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of games ever created.
    pub async fn game_count(&self) -> usize {
        self.tables.read().await.games.len()
    }

    /// Number of player records.
    pub async fn player_count(&self) -> usize {
        self.tables.read().await.players.len()
    }
}

#[async_trait]
impl GameStore for InMemoryStore {
    async fn game(&self, id: GameId) -> Result<Option<Versioned<Game>>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.games.get(&id).cloned())
    }

    async fn find_game(
        &self,
        channel: &ChannelId,
        status: GameStatus,
    ) -> Result<Option<Versioned<Game>>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .games
            .values()
            .filter(|g| &g.value.channel == channel && g.value.status == status)
            .max_by_key(|g| g.value.created_at)
            .cloned())
    }

    async fn player(&self, id: PlayerId) -> Result<Option<Versioned<Player>>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.players.get(&id).cloned())
    }

    async fn find_player(
        &self,
        game: GameId,
        user: &UserId,
    ) -> Result<Option<Versioned<Player>>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .players
            .values()
            .find(|p| p.value.game_id == game && &p.value.user.id == user)
            .cloned())
    }

    async fn roster(&self, game: GameId) -> Result<Vec<Versioned<Player>>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .players
            .values()
            .filter(|p| p.value.game_id == game)
            .cloned()
            .collect())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Err(err) = tables.validate(&changes) {
            debug!(%err, writes = changes.len(), "Rejected change set");
            return Err(err);
        }
        tables.apply(changes);
        Ok(())
    }
}
