//! Engine Errors
//!
//! The closed set of failures an engine operation can report. Every
//! failure leaves all records exactly as they were before the call.

use thiserror::Error;

/// Which record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    /// No game matched.
    Game,
    /// No player matched.
    Player,
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundKind::Game => f.write_str("game"),
            NotFoundKind::Player => f.write_str("player"),
        }
    }
}

/// Why an operation is not allowed in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateKind {
    /// Operation requires a game in setup.
    GameNotInSetup,
    /// Operation requires a game in progress.
    GameNotInProgress,
    /// The acting player is dead.
    ActorDead,
    /// Amount, step count or quantity below one.
    NonPositiveAmount,
    /// A player tried to target themselves.
    SelfTarget,
    /// Not enough players to start.
    NotEnoughPlayers,
    /// The board has no unoccupied cell left.
    NoFreeCell,
    /// The channel already has an active game.
    ChannelBusy,
    /// The target cannot receive any more health.
    TargetAtFullHealth,
    /// The receiver's action point balance would overflow.
    BalanceOverflow,
}

/// Engine operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A game or player lookup found nothing.
    #[error("{0} not found")]
    NotFound(NotFoundKind),

    /// Wrong lifecycle phase or malformed input.
    #[error("invalid state: {0:?}")]
    InvalidState(InvalidStateKind),

    /// Not enough action points.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Points the operation needs.
        required: u64,
        /// Points the actor has.
        available: u32,
    },

    /// Movement would leave the board.
    #[error("out of bounds")]
    OutOfBounds,

    /// Target is farther away than allowed.
    #[error("target unreachable: distance {distance} exceeds range {range}")]
    TargetUnreachable {
        /// Distance between the two players.
        distance: u32,
        /// Largest distance allowed.
        range: u32,
    },

    /// Target is already dead.
    #[error("target is dead")]
    TargetDead,

    /// Roster is at capacity.
    #[error("game is full ({max_players} players)")]
    GameFull {
        /// Configured capacity.
        max_players: usize,
    },

    /// User already has a player in this game.
    #[error("already joined")]
    AlreadyJoined,

    /// Non-human users cannot join.
    #[error("bots are not allowed to join")]
    BotsNotAllowed,

    /// Every commit attempt lost a race with a concurrent operation.
    #[error("concurrency conflict after {attempts} attempts")]
    ConcurrencyConflict {
        /// Number of attempts made.
        attempts: u32,
    },

    /// The store backend failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// True only for failures the caller may safely retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::ConcurrencyConflict { .. })
    }

    pub(crate) fn invalid(kind: InvalidStateKind) -> Self {
        EngineError::InvalidState(kind)
    }

    pub(crate) fn insufficient(required: u64, available: u32) -> Self {
        EngineError::InsufficientFunds { required, available }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_transient() {
        assert!(EngineError::ConcurrencyConflict { attempts: 5 }.is_transient());
        assert!(!EngineError::TargetDead.is_transient());
        assert!(!EngineError::NotFound(NotFoundKind::Game).is_transient());
        assert!(!EngineError::invalid(InvalidStateKind::ActorDead).is_transient());
    }

    #[test]
    fn test_display() {
        assert_eq!(EngineError::NotFound(NotFoundKind::Player).to_string(), "player not found");
        assert_eq!(
            EngineError::insufficient(5, 3).to_string(),
            "insufficient funds: need 5, have 3"
        );
    }
}
