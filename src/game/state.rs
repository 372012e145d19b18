//! Game State Definitions
//!
//! The game record: lifecycle status, board size and roster.
//! Uses BTreeSet for deterministic iteration order.

use std::collections::BTreeSet;
use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::grid::GridSize;
use crate::error::{EngineError, InvalidStateKind};
use crate::game::player::PlayerId;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique game identifier (UUID as bytes).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GameId(pub [u8; 16]);

impl GameId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameId({})", hex::encode(&self.0[..4]))
    }
}

/// Chat channel (or other context) a game is played in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// GAME STATUS
// =============================================================================

/// Lifecycle phase of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Accepting joins and leaves
    #[default]
    Setup,
    /// Players are fighting
    InProgress,
    /// One or no players left alive
    Finished,
}

impl GameStatus {
    /// Setup or in progress.
    pub fn is_active(self) -> bool {
        !matches!(self, GameStatus::Finished)
    }
}

// =============================================================================
// GAME
// =============================================================================

/// A single match in a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Game identifier
    pub id: GameId,

    /// Channel the game lives in
    pub channel: ChannelId,

    /// Current phase
    pub status: GameStatus,

    /// Board dimensions
    pub grid: GridSize,

    /// Every player that joined and did not leave during setup.
    /// Dead players stay on the roster.
    pub roster: BTreeSet<PlayerId>,

    /// Last player standing, once finished
    pub winner: Option<PlayerId>,

    /// When the game was created
    pub created_at: DateTime<Utc>,

    /// When the game left setup
    pub started_at: Option<DateTime<Utc>>,

    /// When the game finished
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Create a new game in setup.
    pub fn new(id: GameId, channel: ChannelId, grid: GridSize, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            channel,
            status: GameStatus::Setup,
            grid,
            roster: BTreeSet::new(),
            winner: None,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// Fail unless the game is in `status`.
    pub fn ensure_status(&self, status: GameStatus) -> Result<(), EngineError> {
        if self.status == status {
            return Ok(());
        }
        let kind = match status {
            GameStatus::Setup => InvalidStateKind::GameNotInSetup,
            // Nothing requires a finished game; report the closest phase
            GameStatus::InProgress | GameStatus::Finished => InvalidStateKind::GameNotInProgress,
        };
        Err(EngineError::invalid(kind))
    }

    /// Is this player on the roster?
    pub fn has_player(&self, id: &PlayerId) -> bool {
        self.roster.contains(id)
    }

    /// Number of players on the roster.
    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    /// Move from setup to in progress.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = GameStatus::InProgress;
        self.started_at = Some(now);
    }

    /// Finish the game if at most one player is alive.
    ///
    /// Returns `Some(winner)` if this call finished the game.
    pub fn resolve_finish(
        &mut self,
        alive: &[PlayerId],
        now: DateTime<Utc>,
    ) -> Option<Option<PlayerId>> {
        if self.status != GameStatus::InProgress || alive.len() > 1 {
            return None;
        }

        let winner = alive.first().copied();
        self.status = GameStatus::Finished;
        self.winner = winner;
        self.finished_at = Some(now);
        Some(winner)
    }
}

// =============================================================================
// TESTS
// =============================================================================
