//! Combat & Economy Operations
//!
//! Each operation reloads the game and the players it names, runs the
//! matching rule, and commits the changed records guarded by the versions
//! it read. The records passed in only identify what to act on; their
//! contents may be stale.
//!
//! When somebody dies the whole roster is read so the finish check sees a
//! consistent alive count, and every roster record is guarded in the
//! commit.

use chrono::Utc;
use tracing::{debug, info};

use crate::core::grid::Direction;
use crate::error::{EngineError, NotFoundKind};
use crate::game::catalog::Item;
use crate::game::events::{Distribution, GameEvent, Outcome};
use crate::game::player::{Player, PlayerId};
use crate::game::rules;
use crate::game::state::{Game, GameId};
use crate::store::{ChangeSet, GameStore, Versioned};

use super::txn::Plan;
use super::Engine;

impl<S: GameStore> Engine<S> {
    /// Move `actor` by `steps` cells.
    pub async fn move_player(
        &self,
        game: &Game,
        actor: &Player,
        direction: Direction,
        steps: u32,
    ) -> Result<Outcome, EngineError> {
        self.apply("move", game.id, actor.id, None, |game, actor, _| {
            rules::move_player(game, actor, direction, steps)
        })
        .await
    }

    /// Fire up to `shots` shots from `actor` at `target`.
    pub async fn shoot(
        &self,
        game: &Game,
        actor: &Player,
        target: &Player,
        shots: u32,
    ) -> Result<Outcome, EngineError> {
        let config = &self.config;
        self.apply("shoot", game.id, actor.id, Some(target.id), |game, actor, target| {
            rules::shoot(game, actor, required(target)?, shots, config)
        })
        .await
    }

    /// Transfer `amount` action points from `actor` to `target`.
    pub async fn give_action_points(
        &self,
        game: &Game,
        actor: &Player,
        target: &Player,
        amount: u32,
    ) -> Result<Outcome, EngineError> {
        let config = &self.config;
        self.apply("give_action_points", game.id, actor.id, Some(target.id), |game, actor, target| {
            rules::give_action_points(game, actor, required(target)?, amount, config)
        })
        .await
    }

    /// Transfer health from `actor` to `target`.
    pub async fn give_health(
        &self,
        game: &Game,
        actor: &Player,
        target: &Player,
        amount: u32,
    ) -> Result<Outcome, EngineError> {
        let config = &self.config;
        self.apply("give_health", game.id, actor.id, Some(target.id), |game, actor, target| {
            rules::give_health(game, actor, required(target)?, amount, config)
        })
        .await
    }

    /// Buy `quantity` units of `item` for `actor`.
    pub async fn purchase(
        &self,
        game: &Game,
        actor: &Player,
        item: Item,
        quantity: u32,
    ) -> Result<Outcome, EngineError> {
        self.apply("purchase", game.id, actor.id, None, |game, actor, _| {
            rules::purchase(game, actor, item, quantity)
        })
        .await
    }

    /// Give every alive player the per-round action point allowance.
    pub async fn distribute_action_points(&self, game: &Game) -> Result<Distribution, EngineError> {
        let game_id = game.id;
        let amount = self.config.action_points_per_round;

        self.run("distribute_action_points", move || async move {
            let game = self.load_game(game_id).await?;
            let roster = self.store.roster(game_id).await?;
            let records: Vec<Player> = roster.iter().map(|read| read.value.clone()).collect();
            let (updated, distribution) = rules::distribute(&game.value, &records, amount)?;

            let mut changes = ChangeSet::new();
            changes.check_game(&game);
            for read in &roster {
                match updated.iter().find(|p| p.id == read.value.id) {
                    Some(player) => changes.update_player(read, player.clone()),
                    // Dead players are guarded so a concurrent revive retries us
                    None => changes.check_player(read),
                };
            }
            Ok(Plan::new(changes, distribution))
        })
        .await
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Load, run `rule`, commit the records it changed.
    async fn apply<F>(
        &self,
        operation: &'static str,
        game_id: GameId,
        actor_id: PlayerId,
        target_id: Option<PlayerId>,
        rule: F,
    ) -> Result<Outcome, EngineError>
    where
        F: Fn(&Game, &Player, Option<&Player>) -> Result<Outcome, EngineError> + Sync,
    {
        let rule = &rule;

        let outcome = self
            .run(operation, move || async move {
                let game = self.load_game(game_id).await?;
                let actor = self.load_player(actor_id).await?;
                let target = match target_id {
                    Some(id) => Some(self.load_player(id).await?),
                    None => None,
                };

                let mut outcome = rule(&game.value, &actor.value, target.as_ref().map(|t| &t.value))?;

                let mut changes = ChangeSet::new();
                changes.update_player(&actor, outcome.actor_state.clone());
                if let (Some(read), Some(state)) = (&target, &outcome.target_state) {
                    changes.update_player(read, state.clone());
                }

                if rules::caused_death(&outcome) {
                    self.settle(&game, &mut outcome, &mut changes).await?;
                } else {
                    changes.check_game(&game);
                }
                Ok(Plan::new(changes, outcome))
            })
            .await?;

        for event in &outcome.events {
            match event {
                GameEvent::PlayerDied { player, killer } => {
                    debug!(
                        player = %player.short(),
                        killer = ?killer.map(|k| k.short()),
                        "Player died"
                    );
                }
                GameEvent::PlayerRevived { player } => {
                    debug!(player = %player.short(), "Player revived");
                }
                GameEvent::GameFinished { winner } => {
                    info!(
                        game = %hex::encode(&game_id.as_bytes()[..4]),
                        winner = ?winner.map(|w| w.short()),
                        "Game finished"
                    );
                }
            }
        }
        Ok(outcome)
    }

    /// Finish detection over the whole roster after a death.
    ///
    /// Guards every roster record the outcome did not write, and either
    /// writes the finished game or guards the game as read.
    async fn settle(
        &self,
        game: &Versioned<Game>,
        outcome: &mut Outcome,
        changes: &mut ChangeSet,
    ) -> Result<(), EngineError> {
        let roster = self.store.roster(game.value.id).await?;
        let actor = outcome.actor;
        let target = outcome.target;

        let after: Vec<&Player> = roster
            .iter()
            .map(|read| {
                if read.value.id == actor {
                    &outcome.actor_state
                } else if Some(read.value.id) == target {
                    outcome.target_state.as_ref().unwrap_or(&read.value)
                } else {
                    &read.value
                }
            })
            .collect();

        let mut finished = game.value.clone();
        let event = rules::settle(&mut finished, after, Utc::now());

        for read in roster
            .iter()
            .filter(|read| read.value.id != actor && Some(read.value.id) != target)
        {
            changes.check_player(read);
        }

        match event {
            Some(event) => {
                outcome.events.push(event);
                changes.update_game(game, finished);
            }
            None => {
                changes.check_game(game);
            }
        }
        Ok(())
    }
}

fn required(target: Option<&Player>) -> Result<&Player, EngineError> {
    target.ok_or(EngineError::NotFound(NotFoundKind::Player))
}
