//! Core primitives.
//!
//! Board geometry and deterministic randomness. Nothing in this module
//! knows about players or games.

pub mod grid;
pub mod rng;

// Re-export core types
pub use grid::{Direction, GridSize, Position, RangeMetric, distance, translate};
pub use rng::{DeterministicRng, derive_spawn_seed};
