//! Tank Tactics Demo
//!
//! Plays one scripted game against the in-memory store and logs what
//! happens. Configuration comes from `TANK_*` environment variables.

use std::sync::Arc;
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tank_tactics::{
    ChannelId, Direction, Engine, Game, GameConfig, GameEvent, InMemoryStore, Item, Outcome,
    Player, UserRef, VERSION,
};

/// Rounds after which the demo gives up on a winner.
const MAX_ROUNDS: u32 = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = GameConfig::from_env();

    info!("Tank Tactics v{}", VERSION);
    info!(
        "Grid: {}x{}, range metric {:?}, {} AP per round",
        config.grid.width, config.grid.height, config.range_metric, config.action_points_per_round
    );

    let engine = Engine::new(Arc::new(InMemoryStore::new()), config).context("invalid configuration")?;
    demo_game(&engine).await
}

/// Seat four players and fight until one is left.
async fn demo_game(engine: &Engine<InMemoryStore>) -> anyhow::Result<()> {
    info!("=== Starting Demo Game ===");

    let game = engine.create_game(ChannelId::from("demo")).await?;
    for name in ["alice", "bob", "carol", "dave"] {
        engine.add_player(&game, UserRef::human(name)).await?;
    }
    let game = engine.start_game(&game).await?;

    for round in 1..=MAX_ROUNDS {
        engine.distribute_action_points(&game).await?;

        for actor in engine.alive_players(game.id).await? {
            // Records change during the round; act on the current one
            let actor = engine.find_player(game.id, &actor.user.id).await?;
            if !actor.is_alive() {
                continue;
            }

            let enemies: Vec<Player> = engine
                .alive_players(game.id)
                .await?
                .into_iter()
                .filter(|p| p.id != actor.id)
                .collect();

            if let Some(outcome) = take_turn(engine, &game, &actor, &enemies).await {
                report(&outcome);
                if outcome.game_finished() {
                    info!("Game ended in round {}", round);
                    return summarize(engine, &game).await;
                }
            }
        }
    }

    warn!("No winner after {} rounds", MAX_ROUNDS);
    summarize(engine, &game).await
}

/// Shoot the nearest enemy in range, otherwise upgrade or close in.
async fn take_turn(
    engine: &Engine<InMemoryStore>,
    game: &Game,
    actor: &Player,
    enemies: &[Player],
) -> Option<Outcome> {
    let metric = engine.config().range_metric;
    let nearest = enemies
        .iter()
        .min_by_key(|p| actor.position.distance(p.position, metric))?;
    let distance = actor.position.distance(nearest.position, metric);

    let result = if distance <= actor.range && actor.action_points >= engine.config().shot_cost {
        engine.shoot(game, actor, nearest, actor.action_points).await
    } else if actor.action_points >= 6 {
        engine.purchase(game, actor, Item::RangeUpgrade, 1).await
    } else if actor.action_points >= 2 {
        let direction = toward(actor, nearest);
        engine.move_player(game, actor, direction, 1).await
    } else {
        // Save up
        return None;
    };

    match result {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            warn!(player = %actor.id.short(), %err, "Turn rejected");
            None
        }
    }
}

/// Step along the axis with the larger gap.
fn toward(actor: &Player, target: &Player) -> Direction {
    let dx = target.position.x as i64 - actor.position.x as i64;
    let dy = target.position.y as i64 - actor.position.y as i64;

    if dx.abs() >= dy.abs() {
        if dx > 0 { Direction::Right } else { Direction::Left }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn report(outcome: &Outcome) {
    let actor = outcome.actor.short();
    match outcome.target {
        Some(target) => info!(
            "{} {:?} -> {}: applied {}/{}",
            actor, outcome.kind, target.short(), outcome.applied, outcome.requested
        ),
        None => info!(
            "{} {:?}: now at {:?}, {} AP",
            actor, outcome.kind, outcome.actor_state.position, outcome.actor_state.action_points
        ),
    }

    for event in &outcome.events {
        match event {
            GameEvent::PlayerDied { player, .. } => {
                info!("Player {} destroyed (bounty {})", player.short(), outcome.bounty);
            }
            GameEvent::PlayerRevived { player } => {
                info!("Player {} revived", player.short());
            }
            GameEvent::GameFinished { winner: Some(winner) } => {
                info!("Winner: {}", winner.short());
            }
            GameEvent::GameFinished { winner: None } => {
                info!("No survivors");
            }
        }
    }
}

async fn summarize(engine: &Engine<InMemoryStore>, game: &Game) -> anyhow::Result<()> {
    info!("=== Final Standings ===");

    let mut roster = engine.roster(game.id).await?;
    roster.sort_by_key(|p| (std::cmp::Reverse(p.health), std::cmp::Reverse(p.kills)));

    for player in roster {
        info!(
            "{} ({}) - health {}/{}, kills {}, range {}, at {:?}",
            player.id.short(),
            player.user.id.0,
            player.health,
            player.max_health,
            player.kills,
            player.range,
            player.position
        );
    }
    Ok(())
}
