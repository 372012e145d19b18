//! Combat & Economy Rules
//!
//! Pure functions: each takes the records it reads, validates the move,
//! and returns the outcome with updated copies of the records it changes.
//! Inputs are never mutated, so a rejected operation changes nothing.
//!
//! ## Check order
//!
//! 1. Game in progress, participants on the roster
//! 2. Actor alive
//! 3. Amount at least one, actor not targeting itself
//! 4. Operation specific (range, target state, funds)

use chrono::{DateTime, Utc};

use crate::config::GameConfig;
use crate::core::grid::{translate, Direction};
use crate::error::{EngineError, InvalidStateKind, NotFoundKind};
use crate::game::catalog::{self, Item};
use crate::game::events::{Distribution, GameEvent, OperationKind, Outcome};
use crate::game::player::{LifeTransition, Player, PlayerId};
use crate::game::state::{Game, GameStatus};

/// Fail unless `player` is on this game's roster.
pub fn ensure_member(game: &Game, player: &Player) -> Result<(), EngineError> {
    if player.game_id == game.id && game.has_player(&player.id) {
        Ok(())
    } else {
        Err(EngineError::NotFound(NotFoundKind::Player))
    }
}

fn ensure_actor(game: &Game, actor: &Player) -> Result<(), EngineError> {
    game.ensure_status(GameStatus::InProgress)?;
    ensure_member(game, actor)?;
    actor.ensure_can_act()
}

fn ensure_pair(game: &Game, actor: &Player, target: &Player, amount: u32) -> Result<(), EngineError> {
    ensure_actor(game, actor)?;
    ensure_member(game, target)?;
    ensure_positive(amount)?;
    if actor.id == target.id {
        return Err(EngineError::invalid(InvalidStateKind::SelfTarget));
    }
    Ok(())
}

fn ensure_positive(amount: u32) -> Result<(), EngineError> {
    if amount == 0 {
        Err(EngineError::invalid(InvalidStateKind::NonPositiveAmount))
    } else {
        Ok(())
    }
}

/// Enforce the optional adjacency policy for gifts.
fn ensure_transfer_range(actor: &Player, target: &Player, config: &GameConfig) -> Result<(), EngineError> {
    if let Some(range) = config.transfer_range {
        let distance = actor.position.distance(target.position, config.range_metric);
        if distance > range {
            return Err(EngineError::TargetUnreachable { distance, range });
        }
    }
    Ok(())
}

fn outcome(kind: OperationKind, actor: Player, target: Option<Player>, requested: u32) -> Outcome {
    Outcome {
        kind,
        actor: actor.id,
        target: target.as_ref().map(|t| t.id),
        requested,
        applied: 0,
        spent: 0,
        bounty: 0,
        events: Vec::new(),
        actor_state: actor,
        target_state: target,
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Move `steps` cells, one action point per step.
pub fn move_player(
    game: &Game,
    actor: &Player,
    direction: Direction,
    steps: u32,
) -> Result<Outcome, EngineError> {
    ensure_actor(game, actor)?;
    ensure_positive(steps)?;

    let mut mover = actor.clone();
    mover.spend(steps as u64)?;
    mover.position = translate(actor.position, direction, steps, game.grid)?;

    let mut result = outcome(OperationKind::Move(direction), mover, None, steps);
    result.applied = steps;
    result.spent = steps;
    Ok(result)
}

/// Fire up to `shots` shots at `target`.
///
/// Damage is clamped to what the actor can pay for and to the target's
/// remaining health; only the shots actually fired are paid for. A kill
/// hands the target's action points to the actor, up to what the actor's
/// balance can hold; the target keeps whatever does not fit.
pub fn shoot(
    game: &Game,
    actor: &Player,
    target: &Player,
    shots: u32,
    config: &GameConfig,
) -> Result<Outcome, EngineError> {
    ensure_pair(game, actor, target, shots)?;

    let distance = actor.position.distance(target.position, config.range_metric);
    if distance > actor.range {
        return Err(EngineError::TargetUnreachable { distance, range: actor.range });
    }
    if !target.is_alive() {
        return Err(EngineError::TargetDead);
    }

    let shot_cost = config.shot_cost.max(1);
    let affordable = actor.action_points / shot_cost;
    if affordable == 0 {
        return Err(EngineError::insufficient(shot_cost as u64, actor.action_points));
    }

    let actual = shots.min(affordable).min(target.health);
    let cost = actual * shot_cost;

    let mut shooter = actor.clone();
    let mut victim = target.clone();
    shooter.spend(cost as u64)?;
    let (_, transition) = victim.damage(actual);

    let mut bounty = 0;
    let mut events = Vec::new();
    if transition == Some(LifeTransition::Died) {
        bounty = victim.withdraw_up_to(shooter.headroom());
        shooter.credit_up_to(bounty);
        shooter.kills += 1;
        events.push(GameEvent::PlayerDied { player: victim.id, killer: Some(shooter.id) });
    }

    let mut result = outcome(OperationKind::Shoot, shooter, Some(victim), shots);
    result.applied = actual;
    result.spent = cost;
    result.bounty = bounty;
    result.events = events;
    Ok(result)
}

/// Give `amount` action points to `target`.
///
/// Fails with `BalanceOverflow` if the receiver cannot hold the gift.
pub fn give_action_points(
    game: &Game,
    actor: &Player,
    target: &Player,
    amount: u32,
    config: &GameConfig,
) -> Result<Outcome, EngineError> {
    ensure_pair(game, actor, target, amount)?;
    if !target.is_alive() {
        return Err(EngineError::TargetDead);
    }
    ensure_transfer_range(actor, target, config)?;

    let mut giver = actor.clone();
    let mut receiver = target.clone();
    giver.spend(amount as u64)?;
    receiver.credit(amount)?;

    let mut result = outcome(OperationKind::GiveActionPoints, giver, Some(receiver), amount);
    result.applied = amount;
    result.spent = amount;
    Ok(result)
}

/// Give health to `target` at the cost of the actor's own health.
///
/// The actor loses `min(amount, actor.health)`; the target gains that much
/// up to its cap. The actor may die doing this, and a dead target comes
/// back to life.
pub fn give_health(
    game: &Game,
    actor: &Player,
    target: &Player,
    amount: u32,
    config: &GameConfig,
) -> Result<Outcome, EngineError> {
    ensure_pair(game, actor, target, amount)?;
    ensure_transfer_range(actor, target, config)?;
    if target.missing_health() == 0 {
        return Err(EngineError::invalid(InvalidStateKind::TargetAtFullHealth));
    }

    let mut giver = actor.clone();
    let mut receiver = target.clone();
    let (paid, giver_transition) = giver.damage(amount);
    let (_, receiver_transition) = receiver.heal(paid);

    let mut events = Vec::new();
    if giver_transition == Some(LifeTransition::Died) {
        events.push(GameEvent::PlayerDied { player: giver.id, killer: None });
    }
    if receiver_transition == Some(LifeTransition::Revived) {
        events.push(GameEvent::PlayerRevived { player: receiver.id });
    }

    let mut result = outcome(OperationKind::GiveHealth, giver, Some(receiver), amount);
    result.applied = paid;
    result.events = events;
    Ok(result)
}

/// Buy `quantity` units of `item` from the catalog.
pub fn purchase(game: &Game, actor: &Player, item: Item, quantity: u32) -> Result<Outcome, EngineError> {
    ensure_actor(game, actor)?;

    let mut buyer = actor.clone();
    let receipt = catalog::purchase(&mut buyer, item, quantity)?;

    let mut result = outcome(OperationKind::Purchase(item), buyer, None, quantity);
    result.applied = receipt.applied;
    result.spent = receipt.spent;
    Ok(result)
}

/// Hand `amount` action points to every alive player on the roster.
///
/// A recipient whose balance cannot hold the full amount is topped up to
/// the maximum. Returns the updated records of the recipients only.
pub fn distribute(game: &Game, roster: &[Player], amount: u32) -> Result<(Vec<Player>, Distribution), EngineError> {
    game.ensure_status(GameStatus::InProgress)?;

    let mut updated = Vec::new();
    let mut recipients = Vec::new();
    for p in roster {
        if !(p.is_alive() && p.game_id == game.id && game.has_player(&p.id)) {
            continue;
        }
        let mut p = p.clone();
        let credited = p.credit_up_to(amount);
        recipients.push((p.id, credited));
        updated.push(p);
    }

    Ok((updated, Distribution { amount, recipients }))
}

// =============================================================================
// GAME END
// =============================================================================

/// Did anyone die in this outcome?
pub fn caused_death(outcome: &Outcome) -> bool {
    outcome.events.iter().any(|e| matches!(e, GameEvent::PlayerDied { .. }))
}

/// Finish the game if at most one player on `roster` is alive.
///
/// `roster` must reflect the records as they will be after the current
/// operation commits. Returns the finish event if the game ended.
pub fn settle<'a, I>(game: &mut Game, roster: I, now: DateTime<Utc>) -> Option<GameEvent>
where
    I: IntoIterator<Item = &'a Player>,
{
    let alive: Vec<PlayerId> = roster
        .into_iter()
        .filter(|p| p.is_alive() && game.has_player(&p.id))
        .map(|p| p.id)
        .collect();

    game.resolve_finish(&alive, now)
        .map(|winner| GameEvent::GameFinished { winner })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::core::grid::{GridSize, Position, RangeMetric};
    use crate::game::player::UserRef;
    use crate::game::state::{ChannelId, GameId};

    const GAME: GameId = GameId::new([7; 16]);

    fn create_test_game(players: &[&Player]) -> Game {
        let mut game = Game::new(GAME, ChannelId::from("arena"), GridSize::new(10, 10), Utc::now());
        for p in players {
            game.roster.insert(p.id);
        }
        game.start(Utc::now());
        game
    }

    fn tank(n: u8, x: u32, y: u32, health: u32, action_points: u32) -> Player {
        let mut player = Player::new(
            PlayerId::new([n; 16]),
            GAME,
            UserRef::human(format!("user-{n}")),
            Position::new(x, y),
            &GameConfig::default(),
            Utc::now(),
        );
        player.health = health;
        player.action_points = action_points;
        player
    }

    #[test]
    fn test_move_spends_one_per_step() {
        let actor = tank(1, 2, 2, 3, 3);
        let game = create_test_game(&[&actor]);

        let result = move_player(&game, &actor, Direction::Right, 2).unwrap();

        assert_eq!(result.actor_state.action_points, 1);
        assert_eq!(result.actor_state.position, Position::new(4, 2));
        assert_eq!(result.spent, 2);
    }

    #[test]
    fn test_move_without_funds_fails() {
        let actor = tank(1, 2, 2, 3, 3);
        let game = create_test_game(&[&actor]);

        assert_eq!(
            move_player(&game, &actor, Direction::Right, 5),
            Err(EngineError::insufficient(5, 3))
        );
    }

    #[test]
    fn test_move_off_board_fails() {
        let actor = tank(1, 1, 1, 3, 5);
        let game = create_test_game(&[&actor]);

        assert_eq!(move_player(&game, &actor, Direction::Up, 2), Err(EngineError::OutOfBounds));
    }

    #[test]
    fn test_move_zero_steps_rejected() {
        let actor = tank(1, 1, 1, 3, 5);
        let game = create_test_game(&[&actor]);

        assert_eq!(
            move_player(&game, &actor, Direction::Up, 0),
            Err(EngineError::invalid(InvalidStateKind::NonPositiveAmount))
        );
    }

    #[test]
    fn test_shoot_clamps_to_target_health() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 2, 1, 3, 0);
        let game = create_test_game(&[&actor, &target]);

        let result = shoot(&game, &actor, &target, 10, &GameConfig::default()).unwrap();

        assert_eq!(result.applied, 3);
        assert!(result.is_now_dead());
        assert_eq!(result.bounty, 0);
        assert_eq!(result.actor_state.action_points, 2);
        assert_eq!(result.actor_state.kills, 1);
        assert_eq!(result.target_state.as_ref().map(|t| t.health), Some(0));
    }

    #[test]
    fn test_shoot_clamps_to_funds() {
        let actor = tank(1, 0, 0, 3, 2);
        let target = tank(2, 1, 0, 3, 4);
        let game = create_test_game(&[&actor, &target]);

        let result = shoot(&game, &actor, &target, 3, &GameConfig::default()).unwrap();

        assert_eq!(result.applied, 2);
        assert!(!result.is_now_dead());
        assert_eq!(result.actor_state.action_points, 0);
        assert_eq!(result.target_state.as_ref().map(|t| t.health), Some(1));
    }

    #[test]
    fn test_kill_bounty_transfers_all_points() {
        let actor = tank(1, 0, 0, 3, 1);
        let target = tank(2, 1, 1, 1, 6);
        let game = create_test_game(&[&actor, &target]);

        let result = shoot(&game, &actor, &target, 1, &GameConfig::default()).unwrap();

        assert!(result.is_now_dead());
        assert_eq!(result.bounty, 6);
        assert_eq!(result.actor_state.action_points, 6);
        assert_eq!(result.target_state.as_ref().map(|t| t.action_points), Some(0));
    }

    #[test]
    fn test_kill_bounty_capped_at_shooter_headroom() {
        let actor = tank(1, 0, 0, 3, u32::MAX - 1);
        let target = tank(2, 1, 1, 1, 10);
        let game = create_test_game(&[&actor, &target]);

        let result = shoot(&game, &actor, &target, 1, &GameConfig::default()).unwrap();

        // One point paid for the shot leaves room for two
        assert!(result.is_now_dead());
        assert_eq!(result.bounty, 2);
        assert_eq!(result.actor_state.action_points, u32::MAX);
        assert_eq!(result.target_state.as_ref().map(|t| t.action_points), Some(8));
    }

    #[test]
    fn test_shoot_out_of_range() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 3, 0, 3, 0);
        let game = create_test_game(&[&actor, &target]);

        assert_eq!(
            shoot(&game, &actor, &target, 1, &GameConfig::default()),
            Err(EngineError::TargetUnreachable { distance: 3, range: 2 })
        );
    }

    #[test]
    fn test_range_metric_changes_legality() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 2, 2, 3, 0);
        let game = create_test_game(&[&actor, &target]);

        let chebyshev = GameConfig::default();
        assert!(shoot(&game, &actor, &target, 1, &chebyshev).is_ok());

        let manhattan = GameConfig { range_metric: RangeMetric::Manhattan, ..Default::default() };
        assert_eq!(
            shoot(&game, &actor, &target, 1, &manhattan),
            Err(EngineError::TargetUnreachable { distance: 4, range: 2 })
        );
    }

    #[test]
    fn test_shoot_dead_target() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 1, 0, 0, 0);
        let game = create_test_game(&[&actor, &target]);

        assert_eq!(
            shoot(&game, &actor, &target, 1, &GameConfig::default()),
            Err(EngineError::TargetDead)
        );
    }

    #[test]
    fn test_shoot_without_points() {
        let actor = tank(1, 0, 0, 3, 0);
        let target = tank(2, 1, 0, 3, 0);
        let game = create_test_game(&[&actor, &target]);

        assert_eq!(
            shoot(&game, &actor, &target, 1, &GameConfig::default()),
            Err(EngineError::insufficient(1, 0))
        );
    }

    #[test]
    fn test_shot_cost_is_configurable() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 1, 0, 3, 0);
        let game = create_test_game(&[&actor, &target]);
        let config = GameConfig { shot_cost: 2, ..Default::default() };

        let result = shoot(&game, &actor, &target, 3, &config).unwrap();

        assert_eq!(result.applied, 2);
        assert_eq!(result.spent, 4);
        assert_eq!(result.actor_state.action_points, 1);
    }

    #[test]
    fn test_cannot_shoot_self() {
        let actor = tank(1, 0, 0, 3, 5);
        let game = create_test_game(&[&actor]);

        assert_eq!(
            shoot(&game, &actor, &actor, 1, &GameConfig::default()),
            Err(EngineError::invalid(InvalidStateKind::SelfTarget))
        );
    }

    #[test]
    fn test_dead_actor_cannot_shoot() {
        let actor = tank(1, 0, 0, 0, 5);
        let target = tank(2, 1, 0, 3, 0);
        let game = create_test_game(&[&actor, &target]);

        assert_eq!(
            shoot(&game, &actor, &target, 1, &GameConfig::default()),
            Err(EngineError::invalid(InvalidStateKind::ActorDead))
        );
    }

    #[test]
    fn test_outsider_is_not_found() {
        let actor = tank(1, 0, 0, 3, 5);
        let stranger = tank(2, 1, 0, 3, 0);
        let game = create_test_game(&[&actor]);

        assert_eq!(
            shoot(&game, &actor, &stranger, 1, &GameConfig::default()),
            Err(EngineError::NotFound(NotFoundKind::Player))
        );
    }

    #[test]
    fn test_operations_need_game_in_progress() {
        let actor = tank(1, 0, 0, 3, 5);
        let mut game = create_test_game(&[&actor]);
        game.status = GameStatus::Setup;

        assert_eq!(
            move_player(&game, &actor, Direction::Down, 1),
            Err(EngineError::invalid(InvalidStateKind::GameNotInProgress))
        );
        assert_eq!(
            purchase(&game, &actor, Item::RangeUpgrade, 1),
            Err(EngineError::invalid(InvalidStateKind::GameNotInProgress))
        );
    }

    #[test]
    fn test_give_action_points() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 9, 9, 3, 1);
        let game = create_test_game(&[&actor, &target]);

        let result = give_action_points(&game, &actor, &target, 4, &GameConfig::default()).unwrap();

        assert_eq!(result.actor_state.action_points, 1);
        assert_eq!(result.target_state.as_ref().map(|t| t.action_points), Some(5));

        assert_eq!(
            give_action_points(&game, &actor, &target, 6, &GameConfig::default()),
            Err(EngineError::insufficient(6, 5))
        );
    }

    #[test]
    fn test_give_action_points_rejects_overflow() {
        let actor = tank(1, 0, 0, 3, 10);
        let target = tank(2, 1, 1, 3, u32::MAX - 2);
        let game = create_test_game(&[&actor, &target]);

        assert_eq!(
            give_action_points(&game, &actor, &target, 10, &GameConfig::default()),
            Err(EngineError::invalid(InvalidStateKind::BalanceOverflow))
        );

        // Exactly filling the balance is fine
        let result = give_action_points(&game, &actor, &target, 2, &GameConfig::default()).unwrap();
        assert_eq!(result.actor_state.action_points, 8);
        assert_eq!(result.target_state.as_ref().map(|t| t.action_points), Some(u32::MAX));
    }

    #[test]
    fn test_give_respects_transfer_range() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 9, 9, 3, 1);
        let game = create_test_game(&[&actor, &target]);
        let config = GameConfig { transfer_range: Some(1), ..Default::default() };

        assert_eq!(
            give_action_points(&game, &actor, &target, 1, &config),
            Err(EngineError::TargetUnreachable { distance: 9, range: 1 })
        );
        assert_eq!(
            give_health(&game, &actor, &target, 1, &config),
            Err(EngineError::TargetUnreachable { distance: 9, range: 1 })
        );
    }

    #[test]
    fn test_give_action_points_to_dead_player() {
        let actor = tank(1, 0, 0, 3, 5);
        let target = tank(2, 1, 1, 0, 0);
        let game = create_test_game(&[&actor, &target]);

        assert_eq!(
            give_action_points(&game, &actor, &target, 1, &GameConfig::default()),
            Err(EngineError::TargetDead)
        );
    }

    #[test]
    fn test_give_health_self_sacrifice_revives() {
        let config = GameConfig { max_health: 5, starting_health: 5, ..Default::default() };
        let mut actor = tank(1, 0, 0, 4, 0);
        let mut target = tank(2, 1, 1, 0, 0);
        actor.max_health = 5;
        target.max_health = 5;
        let game = create_test_game(&[&actor, &target]);

        let result = give_health(&game, &actor, &target, 4, &config).unwrap();

        assert_eq!(result.applied, 4);
        assert_eq!(result.actor_state.health, 0);
        assert_eq!(result.target_state.as_ref().map(|t| t.health), Some(4));
        assert!(result.is_action_player_dead());
        assert!(result.is_target_player_alive());
        assert!(!result.is_now_dead());
    }

    #[test]
    fn test_give_health_excess_is_discarded() {
        let actor = tank(1, 0, 0, 3, 0);
        let target = tank(2, 1, 1, 2, 0);
        let game = create_test_game(&[&actor, &target]);

        let result = give_health(&game, &actor, &target, 2, &GameConfig::default()).unwrap();

        assert_eq!(result.applied, 2);
        assert_eq!(result.actor_state.health, 1);
        assert_eq!(result.target_state.as_ref().map(|t| t.health), Some(3));
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_give_health_to_full_target() {
        let actor = tank(1, 0, 0, 3, 0);
        let target = tank(2, 1, 1, 3, 0);
        let game = create_test_game(&[&actor, &target]);

        assert_eq!(
            give_health(&game, &actor, &target, 1, &GameConfig::default()),
            Err(EngineError::invalid(InvalidStateKind::TargetAtFullHealth))
        );
    }

    #[test]
    fn test_purchase_outcome() {
        let actor = tank(1, 0, 0, 3, 4);
        let game = create_test_game(&[&actor]);

        let result = purchase(&game, &actor, Item::RangeUpgrade, 1).unwrap();

        assert_eq!(result.kind, OperationKind::Purchase(Item::RangeUpgrade));
        assert_eq!(result.actor_state.range, actor.range + 1);
        assert_eq!(result.actor_state.action_points, 1);
        assert_eq!(result.spent, 3);
    }

    #[test]
    fn test_distribute_skips_dead() {
        let alive = tank(1, 0, 0, 3, 0);
        let dead = tank(2, 1, 1, 0, 0);
        let game = create_test_game(&[&alive, &dead]);

        let (updated, distribution) = distribute(&game, &[alive.clone(), dead.clone()], 2).unwrap();

        assert_eq!(distribution.recipients, vec![(alive.id, 2)]);
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].action_points, 2);
    }

    #[test]
    fn test_distribute_tops_up_full_balances() {
        let rich = tank(1, 0, 0, 3, u32::MAX - 1);
        let poor = tank(2, 1, 1, 3, 0);
        let game = create_test_game(&[&rich, &poor]);

        let (updated, distribution) = distribute(&game, &[rich.clone(), poor.clone()], 5).unwrap();

        assert_eq!(distribution.amount, 5);
        assert_eq!(distribution.recipients, vec![(rich.id, 1), (poor.id, 5)]);
        assert_eq!(updated[0].action_points, u32::MAX);
        assert_eq!(updated[1].action_points, 5);
    }

    #[test]
    fn test_settle_finishes_on_last_survivor() {
        let a = tank(1, 0, 0, 3, 0);
        let b = tank(2, 1, 1, 0, 0);
        let c = tank(3, 2, 2, 0, 0);
        let mut game = create_test_game(&[&a, &b, &c]);

        let event = settle(&mut game, [&a, &b, &c], Utc::now());

        assert_eq!(event, Some(GameEvent::GameFinished { winner: Some(a.id) }));
        assert_eq!(game.status, GameStatus::Finished);
    }

    #[test]
    fn test_settle_keeps_playing_with_two_alive() {
        let a = tank(1, 0, 0, 3, 0);
        let b = tank(2, 1, 1, 1, 0);
        let c = tank(3, 2, 2, 0, 0);
        let mut game = create_test_game(&[&a, &b, &c]);

        assert_eq!(settle(&mut game, [&a, &b, &c], Utc::now()), None);
        assert_eq!(game.status, GameStatus::InProgress);
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    #[derive(Clone, Debug)]
    enum Op {
        Move(usize, Direction, u32),
        Shoot(usize, usize, u32),
        GiveAp(usize, usize, u32),
        GiveHealth(usize, usize, u32),
        Buy(usize, Item, u32),
        Distribute(u32),
    }

    fn arb_direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    fn arb_item() -> impl Strategy<Value = Item> {
        prop::sample::select(Item::ALL.to_vec())
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize, arb_direction(), 0..6u32).prop_map(|(a, d, s)| Op::Move(a, d, s)),
            (0..3usize, 0..3usize, 0..6u32).prop_map(|(a, t, n)| Op::Shoot(a, t, n)),
            (0..3usize, 0..3usize, 0..6u32).prop_map(|(a, t, n)| Op::GiveAp(a, t, n)),
            (0..3usize, 0..3usize, 0..6u32).prop_map(|(a, t, n)| Op::GiveHealth(a, t, n)),
            (0..3usize, arb_item(), 0..4u32).prop_map(|(a, i, n)| Op::Buy(a, i, n)),
            (0..4u32).prop_map(Op::Distribute),
        ]
    }

    proptest! {
        #[test]
        fn prop_attributes_stay_in_bounds(ops in prop::collection::vec(arb_op(), 1..60)) {
            let config = GameConfig::default();
            let mut players = vec![tank(1, 0, 0, 3, 2), tank(2, 2, 2, 3, 2), tank(3, 4, 4, 3, 2)];
            let refs: Vec<&Player> = players.iter().collect();
            let mut game = create_test_game(&refs);

            for op in ops {
                let before = players.clone();
                let result = match op {
                    Op::Move(a, d, s) => move_player(&game, &players[a], d, s).map(Some),
                    Op::Shoot(a, t, n) => shoot(&game, &players[a], &players[t], n, &config).map(Some),
                    Op::GiveAp(a, t, n) => give_action_points(&game, &players[a], &players[t], n, &config).map(Some),
                    Op::GiveHealth(a, t, n) => give_health(&game, &players[a], &players[t], n, &config).map(Some),
                    Op::Buy(a, i, n) => purchase(&game, &players[a], i, n).map(Some),
                    Op::Distribute(n) => distribute(&game, &players, n).map(|(updated, _)| {
                        for p in updated {
                            if let Some(slot) = players.iter_mut().find(|s| s.id == p.id) {
                                *slot = p;
                            }
                        }
                        None
                    }),
                };

                match result {
                    Ok(Some(outcome)) => {
                        let total_before: u64 = before.iter().map(|p| p.action_points as u64).sum();
                        let mut updated = vec![outcome.actor_state.clone()];
                        updated.extend(outcome.target_state.clone());
                        for p in updated {
                            if let Some(slot) = players.iter_mut().find(|s| s.id == p.id) {
                                *slot = p;
                            }
                        }
                        let total_after: u64 = players.iter().map(|p| p.action_points as u64).sum();
                        // Only distribution creates action points
                        prop_assert!(total_after <= total_before);
                        if caused_death(&outcome) {
                            settle(&mut game, players.iter(), Utc::now());
                        }
                    }
                    Ok(None) | Err(_) => {}
                }

                for p in &players {
                    prop_assert!(p.health <= p.max_health);
                    prop_assert!(game.grid.contains(p.position));
                    prop_assert!(p.range >= 1);
                }

                if game.status == GameStatus::Finished {
                    prop_assert!(players.iter().filter(|p| p.is_alive()).count() <= 1);
                    break;
                }
            }
        }
    }
}
