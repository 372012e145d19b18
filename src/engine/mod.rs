//! Game Engine
//!
//! The façade a chat adapter talks to. An `Engine` owns a handle to the
//! store and the configuration; it resolves records, runs the rules and
//! commits the results through the optimistic retry loop.
//!
//! ## Module Structure
//!
//! - `combat`: Move, shoot, gifts, purchases, allowances
//! - `lifecycle`: Create, join, leave, start
//! - `txn`: Bounded read-compute-commit loop

pub mod combat;
pub mod lifecycle;
mod txn;

use std::sync::Arc;

use crate::config::{ConfigError, GameConfig};
use crate::error::{EngineError, NotFoundKind};
use crate::game::player::{Player, PlayerId, PlayerInfo, UserId};
use crate::game::rules::ensure_member;
use crate::game::state::{ChannelId, Game, GameId, GameStatus};
use crate::store::{GameStore, Versioned};

/// Rules engine over a game store.
pub struct Engine<S: GameStore> {
    store: Arc<S>,
    config: GameConfig,
}

impl<S: GameStore> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), config: self.config.clone() }
    }
}

impl<S: GameStore> Engine<S> {
    /// Create an engine over `store`.
    ///
    /// Fails if `config` does not pass [`GameConfig::validate`].
    pub fn new(store: Arc<S>, config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Most recent game in `channel` with `status`.
    pub async fn find_game(&self, channel: &ChannelId, status: GameStatus) -> Result<Game, EngineError> {
        self.store
            .find_game(channel, status)
            .await?
            .map(Versioned::into_inner)
            .ok_or(EngineError::NotFound(NotFoundKind::Game))
    }

    /// The player `user` controls in `game`.
    pub async fn find_player(&self, game: GameId, user: &UserId) -> Result<Player, EngineError> {
        self.store
            .find_player(game, user)
            .await?
            .map(Versioned::into_inner)
            .ok_or(EngineError::NotFound(NotFoundKind::Player))
    }

    /// Every player in `game`, dead or alive.
    pub async fn roster(&self, game: GameId) -> Result<Vec<Player>, EngineError> {
        self.load_game(game).await?;
        Ok(self
            .store
            .roster(game)
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect())
    }

    /// Players in `game` with health above zero.
    pub async fn alive_players(&self, game: GameId) -> Result<Vec<Player>, EngineError> {
        let mut roster = self.roster(game).await?;
        roster.retain(Player::is_alive);
        Ok(roster)
    }

    /// What `viewer` can see about `target`.
    pub async fn inspect(
        &self,
        game: GameId,
        viewer: PlayerId,
        target: PlayerId,
    ) -> Result<PlayerInfo, EngineError> {
        let game = self.load_game(game).await?.value;
        let viewer = self.load_player(viewer).await?.value;
        let target = self.load_player(target).await?.value;
        ensure_member(&game, &viewer)?;
        ensure_member(&game, &target)?;

        Ok(PlayerInfo::observe(&viewer, &target, self.config.range_metric))
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    async fn load_game(&self, id: GameId) -> Result<Versioned<Game>, EngineError> {
        self.store
            .game(id)
            .await?
            .ok_or(EngineError::NotFound(NotFoundKind::Game))
    }

    async fn load_player(&self, id: PlayerId) -> Result<Versioned<Player>, EngineError> {
        self.store
            .player(id)
            .await?
            .ok_or(EngineError::NotFound(NotFoundKind::Player))
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, attempt: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<txn::Plan<T>, EngineError>>,
    {
        txn::run(self.store.as_ref(), self.config.max_commit_attempts, operation, attempt).await
    }
}
