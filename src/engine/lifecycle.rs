//! Game Lifecycle
//!
//! Setup phase operations: creating a game in a channel, joining and
//! leaving, and starting the fight once enough players are seated.
//! Finishing happens in `combat` when a death leaves one survivor.

use std::collections::BTreeSet;
use chrono::Utc;
use tracing::info;

use crate::core::grid::Position;
use crate::core::rng::{derive_spawn_seed, DeterministicRng};
use crate::error::{EngineError, InvalidStateKind};
use crate::game::player::{Player, PlayerId, UserRef};
use crate::game::rules::ensure_member;
use crate::game::state::{ChannelId, Game, GameId, GameStatus};
use crate::store::{ChangeSet, GameStore};

use super::txn::Plan;
use super::Engine;

impl<S: GameStore> Engine<S> {
    /// Open a new game in `channel`.
    ///
    /// Fails if the channel already has a game in setup or in progress.
    pub async fn create_game(&self, channel: ChannelId) -> Result<Game, EngineError> {
        let channel = &channel;
        let grid = self.config.grid;

        let game = self
            .run("create_game", move || async move {
                for status in [GameStatus::Setup, GameStatus::InProgress] {
                    if self.store.find_game(channel, status).await?.is_some() {
                        return Err(EngineError::invalid(InvalidStateKind::ChannelBusy));
                    }
                }

                let game = Game::new(GameId::random(), channel.clone(), grid, Utc::now());
                let mut changes = ChangeSet::new();
                changes.insert_game(game.clone());
                Ok(Plan::new(changes, game))
            })
            .await?;

        info!(
            game = %hex::encode(&game.id.as_bytes()[..4]),
            channel = %game.channel.0,
            "Game created"
        );
        Ok(game)
    }

    /// Seat `user` in `game` on a free cell.
    pub async fn add_player(&self, game: &Game, user: UserRef) -> Result<Player, EngineError> {
        let game_id = game.id;
        let user = &user;
        let config = &self.config;

        let player = self
            .run("add_player", move || async move {
                let game = self.load_game(game_id).await?;
                game.value.ensure_status(GameStatus::Setup)?;

                let roster = self.store.roster(game_id).await?;
                if roster.len() >= config.max_players {
                    return Err(EngineError::GameFull { max_players: config.max_players });
                }
                if user.is_bot {
                    return Err(EngineError::BotsNotAllowed);
                }
                if roster.iter().any(|read| read.value.user.id == user.id) {
                    return Err(EngineError::AlreadyJoined);
                }

                let occupied: BTreeSet<Position> = roster.iter().map(|read| read.value.position).collect();
                let seed = derive_spawn_seed(game_id.as_bytes(), &user.id.0, roster.len());
                let position = DeterministicRng::new(seed)
                    .free_cell(game.value.grid, |cell| occupied.contains(&cell))
                    .ok_or(EngineError::invalid(InvalidStateKind::NoFreeCell))?;

                let player = Player::new(PlayerId::random(), game_id, user.clone(), position, config, Utc::now());

                let mut seated = game.value.clone();
                seated.roster.insert(player.id);

                let mut changes = ChangeSet::new();
                changes.update_game(&game, seated).insert_player(player.clone());
                Ok(Plan::new(changes, player))
            })
            .await?;

        info!(
            player = %player.id.short(),
            user = %player.user.id.0,
            position = ?player.position,
            "Player joined"
        );
        Ok(player)
    }

    /// Remove `player` from `game` during setup.
    pub async fn remove_player(&self, game: &Game, player: &Player) -> Result<(), EngineError> {
        let game_id = game.id;
        let player_id = player.id;

        self.run("remove_player", move || async move {
            let game = self.load_game(game_id).await?;
            game.value.ensure_status(GameStatus::Setup)?;
            let player = self.load_player(player_id).await?;
            ensure_member(&game.value, &player.value)?;

            let mut remaining = game.value.clone();
            remaining.roster.remove(&player_id);

            let mut changes = ChangeSet::new();
            changes.update_game(&game, remaining).delete_player(&player);
            Ok(Plan::new(changes, ()))
        })
        .await?;

        info!(player = %player_id.short(), "Player left");
        Ok(())
    }

    /// Is `game` in setup with enough players to start?
    pub async fn can_start(&self, game: &Game) -> Result<bool, EngineError> {
        let game = self.load_game(game.id).await?.value;
        Ok(game.status == GameStatus::Setup && game.player_count() >= self.config.min_players)
    }

    /// Move `game` from setup to in progress.
    pub async fn start_game(&self, game: &Game) -> Result<Game, EngineError> {
        let game_id = game.id;
        let min_players = self.config.min_players;

        let game = self
            .run("start_game", move || async move {
                let game = self.load_game(game_id).await?;
                game.value.ensure_status(GameStatus::Setup)?;
                if game.value.player_count() < min_players {
                    return Err(EngineError::invalid(InvalidStateKind::NotEnoughPlayers));
                }

                // A game with one tank alive would be over before it began
                let roster = self.store.roster(game_id).await?;
                let alive = roster
                    .iter()
                    .filter(|p| p.value.is_alive() && game.value.has_player(&p.value.id))
                    .count();
                if alive < 2 {
                    return Err(EngineError::invalid(InvalidStateKind::NotEnoughPlayers));
                }

                let mut started = game.value.clone();
                started.start(Utc::now());

                let mut changes = ChangeSet::new();
                changes.update_game(&game, started.clone());
                Ok(Plan::new(changes, started))
            })
            .await?;

        info!(
            game = %hex::encode(&game.id.as_bytes()[..4]),
            players = game.player_count(),
            "Game started"
        );
        Ok(game)
    }
}
