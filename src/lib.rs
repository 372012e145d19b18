//! # Tank Tactics Engine
//!
//! Rules engine for Tank Tactics, a last-tank-standing game played on a
//! grid inside a chat channel. Chat adapters resolve users to records and
//! call the engine; the engine validates, applies and persists each move.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TANK TACTICS ENGINE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── grid.rs     - Bounds, directions, distance metrics      │
//! │  └── rng.rs      - Xorshift128+ PRNG for spawn placement     │
//! │                                                              │
//! │  game/           - Records and rules (pure)                  │
//! │  ├── catalog.rs  - Item price list and purchases             │
//! │  ├── player.rs   - Player record and life state              │
//! │  ├── state.rs    - Game record and status machine            │
//! │  ├── events.rs   - Outcomes and derived events               │
//! │  └── rules.rs    - Move, shoot, give, buy, distribute        │
//! │                                                              │
//! │  store/          - Persistence contract                      │
//! │  ├── mod.rs      - GameStore trait, versioned change sets    │
//! │  └── memory.rs   - In-process store                          │
//! │                                                              │
//! │  engine/         - Transactional façade                      │
//! │  ├── combat.rs   - Combat and economy operations             │
//! │  ├── lifecycle.rs- Create, join, leave, start                │
//! │  └── txn.rs      - Bounded optimistic retry loop             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! Operations never overwrite a record blindly. Each one reads versioned
//! records, computes new ones with the pure rules in `game/`, and commits
//! them in one change set guarded by the versions it read. A lost race is
//! retried from fresh reads a bounded number of times.
//!
//! The `core/` and `game/` modules are deterministic: given the same
//! records and inputs they produce the same outcome.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod game;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigError, GameConfig};
pub use core::grid::{Direction, GridSize, Position, RangeMetric};
pub use engine::Engine;
pub use error::{EngineError, InvalidStateKind, NotFoundKind};
pub use game::{
    ChannelId, Distribution, Game, GameEvent, GameId, GameStatus, Item, Outcome, Player,
    PlayerId, PlayerInfo, UserId, UserRef,
};
pub use store::{ChangeSet, GameStore, InMemoryStore, StoreError, Versioned};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
