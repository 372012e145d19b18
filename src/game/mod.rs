//! Game Logic Module
//!
//! Records and rules. Nothing here touches the store or logs; every
//! function works on values and is deterministic given its inputs.
//!
//! ## Module Structure
//!
//! - `catalog`: Static price list and purchases
//! - `player`: Player record, life state, what others can see
//! - `state`: Game record, status machine, finish detection
//! - `events`: Outcomes and derived events
//! - `rules`: Combat and economy operations on record snapshots

pub mod catalog;
pub mod player;
pub mod state;
pub mod events;
pub mod rules;

// Re-export key types
pub use catalog::{Item, CATALOG};
pub use player::{Player, PlayerId, PlayerInfo, UserId, UserRef};
pub use state::{ChannelId, Game, GameId, GameStatus};
pub use events::{Distribution, GameEvent, OperationKind, Outcome};
