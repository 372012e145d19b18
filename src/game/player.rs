//! Player State
//!
//! A single tank: where it is, what it can spend, and whether it is alive.
//! Health and action points are unsigned and every mutator clamps, so the
//! attribute invariants hold by construction.

use std::collections::BTreeMap;
use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::config::GameConfig;
use crate::core::grid::{Position, RangeMetric};
use crate::error::{EngineError, InvalidStateKind};
use crate::game::catalog::Item;
use crate::game::state::GameId;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// First four bytes as hex, for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.short())
    }
}

/// External (chat platform) user identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The external user behind a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Platform user id
    pub id: UserId,
    /// Whether the platform reports this user as an automated agent
    pub is_bot: bool,
}

impl UserRef {
    /// A human user.
    pub fn human(id: impl Into<String>) -> Self {
        Self { id: UserId(id.into()), is_bot: false }
    }

    /// An automated user.
    pub fn bot(id: impl Into<String>) -> Self {
        Self { id: UserId(id.into()), is_bot: true }
    }
}

// =============================================================================
// LIFE STATE
// =============================================================================

/// A change of life state caused by a health mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifeTransition {
    /// Health dropped to zero.
    Died,
    /// Health rose above zero from zero.
    Revived,
}

// =============================================================================
// PLAYER
// =============================================================================

/// State of a single player in a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,

    /// Game this player belongs to
    pub game_id: GameId,

    /// External user
    pub user: UserRef,

    /// Current cell
    pub position: Position,

    /// Current health, `0..=max_health`
    pub health: u32,

    /// Health cap
    pub max_health: u32,

    /// Spendable currency
    pub action_points: u32,

    /// Weapon range
    pub range: u32,

    /// Purchased item counts
    pub inventory: BTreeMap<Item, u32>,

    /// Number of players this player has killed
    pub kills: u32,

    /// When the player joined
    pub joined_at: DateTime<Utc>,
}

impl Player {
    /// Create a player with the configured starting stats.
    pub fn new(
        id: PlayerId,
        game_id: GameId,
        user: UserRef,
        position: Position,
        config: &GameConfig,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            game_id,
            user,
            position,
            health: config.starting_health.min(config.max_health),
            max_health: config.max_health,
            action_points: config.starting_action_points,
            range: config.starting_range.max(1),
            inventory: BTreeMap::new(),
            kills: 0,
            joined_at,
        }
    }

    /// Alive iff health is above zero.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Fail unless this player may initiate an operation.
    pub fn ensure_can_act(&self) -> Result<(), EngineError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(EngineError::invalid(InvalidStateKind::ActorDead))
        }
    }

    /// Health that can still be added before hitting the cap.
    #[inline]
    pub fn missing_health(&self) -> u32 {
        self.max_health.saturating_sub(self.health)
    }

    /// Debit action points, or fail without touching anything.
    pub fn spend(&mut self, amount: u64) -> Result<(), EngineError> {
        if amount > self.action_points as u64 {
            return Err(EngineError::insufficient(amount, self.action_points));
        }
        // amount fits in u32 after the check above
        self.action_points -= amount as u32;
        Ok(())
    }

    /// Action points this player can still receive.
    #[inline]
    pub fn headroom(&self) -> u32 {
        u32::MAX - self.action_points
    }

    /// Credit action points, or fail without touching anything.
    pub fn credit(&mut self, amount: u32) -> Result<(), EngineError> {
        self.action_points = self
            .action_points
            .checked_add(amount)
            .ok_or(EngineError::invalid(InvalidStateKind::BalanceOverflow))?;
        Ok(())
    }

    /// Credit as much of `amount` as fits, returning what was credited.
    pub fn credit_up_to(&mut self, amount: u32) -> u32 {
        let credited = amount.min(self.headroom());
        self.action_points += credited;
        credited
    }

    /// Take up to `limit` action points away, returning how many were taken.
    pub fn withdraw_up_to(&mut self, limit: u32) -> u32 {
        let taken = self.action_points.min(limit);
        self.action_points -= taken;
        taken
    }

    /// Remove up to `amount` health.
    ///
    /// Returns the health actually removed and the transition, if any.
    pub fn damage(&mut self, amount: u32) -> (u32, Option<LifeTransition>) {
        let was_alive = self.is_alive();
        let applied = amount.min(self.health);
        self.health -= applied;

        let transition = (was_alive && !self.is_alive()).then_some(LifeTransition::Died);
        (applied, transition)
    }

    /// Add up to `amount` health; excess above the cap is discarded.
    ///
    /// Returns the health actually added and the transition, if any.
    pub fn heal(&mut self, amount: u32) -> (u32, Option<LifeTransition>) {
        let was_alive = self.is_alive();
        let applied = amount.min(self.missing_health());
        self.health += applied;

        let transition = (!was_alive && self.is_alive()).then_some(LifeTransition::Revived);
        (applied, transition)
    }

    /// Raise weapon range.
    pub fn extend_range(&mut self, amount: u32) {
        self.range = self.range.saturating_add(amount);
    }

    /// Record purchased items.
    pub fn stock(&mut self, item: Item, quantity: u32) {
        let count = self.inventory.entry(item).or_insert(0);
        *count = count.saturating_add(quantity);
    }

    /// How many of an item this player has bought.
    pub fn owned(&self, item: Item) -> u32 {
        self.inventory.get(&item).copied().unwrap_or(0)
    }
}

// =============================================================================
// PLAYER INFO
// =============================================================================

/// What one player can see about another.
///
/// Action points and inventory are private: they are only filled in when
/// the viewer looks at itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Player observed
    pub id: PlayerId,
    /// External user
    pub user: UserId,
    /// Current cell
    pub position: Position,
    /// Current health
    pub health: u32,
    /// Health cap
    pub max_health: u32,
    /// Weapon range
    pub range: u32,
    /// Health above zero
    pub alive: bool,
    /// Kills so far
    pub kills: u32,
    /// Distance from the viewer
    pub distance: u32,
    /// Whether the viewer could shoot this player right now
    pub in_range: bool,
    /// Only disclosed to the player itself
    pub action_points: Option<u32>,
    /// Only disclosed to the player itself
    pub inventory: Option<BTreeMap<Item, u32>>,
}

impl PlayerInfo {
    /// Describe `target` from `viewer`'s point of view.
    pub fn observe(viewer: &Player, target: &Player, metric: RangeMetric) -> Self {
        let distance = viewer.position.distance(target.position, metric);
        let is_self = viewer.id == target.id;

        Self {
            id: target.id,
            user: target.user.id.clone(),
            position: target.position,
            health: target.health,
            max_health: target.max_health,
            range: target.range,
            alive: target.is_alive(),
            kills: target.kills,
            distance,
            in_range: !is_self && distance <= viewer.range,
            action_points: is_self.then_some(target.action_points),
            inventory: is_self.then(|| target.inventory.clone()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
