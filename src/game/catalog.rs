//! Economy Catalog
//!
//! Static price list of everything a player can buy with action points.
//! The table is shared by every game and never changes at runtime.

use serde::{Serialize, Deserialize};

use crate::error::{EngineError, InvalidStateKind};
use crate::game::player::Player;

/// Purchasable item kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Item {
    /// Banks one action point at par
    ActionPointPack = 0,
    /// Restores one health
    HealthPack = 1,
    /// Adds one to weapon range
    RangeUpgrade = 2,
}

impl Item {
    /// All items, in catalog order.
    pub const ALL: [Item; 3] = [Item::ActionPointPack, Item::HealthPack, Item::RangeUpgrade];
}

/// Player attribute an item changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// `Player::action_points`
    ActionPoints,
    /// `Player::health`
    Health,
    /// `Player::range`
    Range,
}

/// Per-unit effect of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Attribute changed
    pub attribute: Attribute,
    /// Amount added per unit
    pub delta: u32,
}

/// One row of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Item kind
    pub item: Item,
    /// Price in action points per unit
    pub cost: u32,
    /// Effect per unit
    pub effect: Effect,
}

/// The price list.
pub static CATALOG: [CatalogEntry; 3] = [
    CatalogEntry {
        item: Item::ActionPointPack,
        cost: 1,
        effect: Effect { attribute: Attribute::ActionPoints, delta: 1 },
    },
    CatalogEntry {
        item: Item::HealthPack,
        cost: 3,
        effect: Effect { attribute: Attribute::Health, delta: 1 },
    },
    CatalogEntry {
        item: Item::RangeUpgrade,
        cost: 3,
        effect: Effect { attribute: Attribute::Range, delta: 1 },
    },
];

/// Catalog row for an item.
#[inline]
pub fn entry(item: Item) -> &'static CatalogEntry {
    // CATALOG is indexed by discriminant
    &CATALOG[item as usize]
}

/// Price of one unit.
#[inline]
pub fn price_of(item: Item) -> u32 {
    entry(item).cost
}

/// Effect of one unit.
#[inline]
pub fn effect_of(item: Item) -> Effect {
    entry(item).effect
}

/// Result of a successful purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Purchase {
    /// Item bought
    pub item: Item,
    /// Units bought
    pub quantity: u32,
    /// Action points debited
    pub spent: u32,
    /// Attribute change actually applied (health may be clamped)
    pub applied: u32,
}

/// Buy `quantity` units of `item` for `player`.
///
/// Either the whole purchase happens or the player is left untouched.
pub fn purchase(player: &mut Player, item: Item, quantity: u32) -> Result<Purchase, EngineError> {
    if quantity == 0 {
        return Err(EngineError::invalid(InvalidStateKind::NonPositiveAmount));
    }

    let entry = entry(item);
    let total_cost = entry.cost as u64 * quantity as u64;
    let total_delta = entry.effect.delta.saturating_mul(quantity);

    player.spend(total_cost)?;

    let applied = match entry.effect.attribute {
        Attribute::ActionPoints => player.credit_up_to(total_delta),
        Attribute::Health => player.heal(total_delta).0,
        Attribute::Range => {
            player.extend_range(total_delta);
            total_delta
        }
    };
    player.stock(item, quantity);

    Ok(Purchase {
        item,
        quantity,
        // spend() succeeded, so the cost fits in u32
        spent: total_cost as u32,
        applied,
    })
}
