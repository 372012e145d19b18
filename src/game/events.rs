//! Outcome Records
//!
//! What an engine operation did, for the adapter to render. Outcomes are
//! returned to the caller and never persisted.

use serde::{Serialize, Deserialize};

use crate::core::grid::Direction;
use crate::game::catalog::Item;
use crate::game::player::{Player, PlayerId};

/// Kind of operation that produced an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Movement in a direction
    Move(Direction),
    /// Shots at another player
    Shoot,
    /// Action point gift
    GiveActionPoints,
    /// Health gift
    GiveHealth,
    /// Catalog purchase
    Purchase(Item),
}

/// Derived event caused by an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Player's health reached zero
    PlayerDied {
        /// The player who died
        player: PlayerId,
        /// Who dealt the final damage, if anyone
        killer: Option<PlayerId>,
    },

    /// Dead player received health
    PlayerRevived {
        /// The player brought back
        player: PlayerId,
    },

    /// At most one player remains alive
    GameFinished {
        /// Last player alive, or None on a draw
        winner: Option<PlayerId>,
    },
}

/// Result of a combat or economy operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Operation performed
    pub kind: OperationKind,

    /// Acting player
    pub actor: PlayerId,

    /// Target player, for two-player operations
    pub target: Option<PlayerId>,

    /// Amount the caller asked for
    pub requested: u32,

    /// Amount actually applied after clamping
    pub applied: u32,

    /// Action points the actor paid
    pub spent: u32,

    /// Action points the actor collected from a kill
    pub bounty: u32,

    /// Derived events, in the order they happened
    pub events: Vec<GameEvent>,

    /// Actor record after the operation
    pub actor_state: Player,

    /// Target record after the operation
    pub target_state: Option<Player>,
}

impl Outcome {
    /// Did the target die?
    pub fn is_now_dead(&self) -> bool {
        self.target.is_some_and(|t| self.died(t))
    }

    /// Did the actor die (self-sacrifice)?
    pub fn is_action_player_dead(&self) -> bool {
        self.died(self.actor)
    }

    /// Was the target revived?
    pub fn is_target_player_alive(&self) -> bool {
        self.target.is_some_and(|t| {
            self.events
                .iter()
                .any(|e| matches!(e, GameEvent::PlayerRevived { player } if *player == t))
        })
    }

    /// Did this operation end the game?
    pub fn game_finished(&self) -> bool {
        self.finish().is_some()
    }

    /// Winner announced by this operation, if it ended the game.
    pub fn finish(&self) -> Option<Option<PlayerId>> {
        self.events.iter().find_map(|e| match e {
            GameEvent::GameFinished { winner } => Some(*winner),
            _ => None,
        })
    }

    fn died(&self, id: PlayerId) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerDied { player, .. } if *player == id))
    }
}

/// Result of an action point distribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Distribution {
    /// Points offered to each recipient
    pub amount: u32,
    /// Every alive player with the points it actually received
    pub recipients: Vec<(PlayerId, u32)>,
}
