//! Game Configuration
//!
//! Tunable rules shared by every game an engine runs. Values come from
//! `Default`, from `TANK_*` environment variables, or from JSON.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::grid::{GridSize, RangeMetric};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its legal range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Rules for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board dimensions for new games.
    pub grid: GridSize,
    /// Roster capacity while in setup.
    pub max_players: usize,
    /// Players needed to start.
    pub min_players: usize,
    /// Health cap for every player.
    pub max_health: u32,
    /// Health a player joins with.
    pub starting_health: u32,
    /// Action points a player joins with.
    pub starting_action_points: u32,
    /// Weapon range a player joins with.
    pub starting_range: u32,
    /// Action points per shot.
    pub shot_cost: u32,
    /// Distance metric for range checks.
    pub range_metric: RangeMetric,
    /// Largest distance for give operations, or None for unlimited.
    pub transfer_range: Option<u32>,
    /// Action points every alive player receives per distribution.
    pub action_points_per_round: u32,
    /// Commit attempts before reporting a concurrency conflict.
    pub max_commit_attempts: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::default(),
            max_players: 20,
            min_players: 2,
            max_health: 3,
            starting_health: 3,
            starting_action_points: 1,
            starting_range: 2,
            shot_cost: 1,
            range_metric: RangeMetric::Chebyshev,
            transfer_range: None,
            action_points_per_round: 1,
            max_commit_attempts: 5,
        }
    }
}

impl GameConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            grid: GridSize::new(
                env_or("TANK_GRID_WIDTH", defaults.grid.width),
                env_or("TANK_GRID_HEIGHT", defaults.grid.height),
            ),
            max_players: env_or("TANK_MAX_PLAYERS", defaults.max_players),
            min_players: env_or("TANK_MIN_PLAYERS", defaults.min_players),
            max_health: env_or("TANK_MAX_HEALTH", defaults.max_health),
            starting_health: env_or("TANK_STARTING_HEALTH", defaults.starting_health),
            starting_action_points: env_or(
                "TANK_STARTING_ACTION_POINTS",
                defaults.starting_action_points,
            ),
            starting_range: env_or("TANK_STARTING_RANGE", defaults.starting_range),
            shot_cost: env_or("TANK_SHOT_COST", defaults.shot_cost),
            range_metric: match std::env::var("TANK_RANGE_METRIC").as_deref() {
                Ok("manhattan") => RangeMetric::Manhattan,
                Ok("chebyshev") => RangeMetric::Chebyshev,
                _ => defaults.range_metric,
            },
            transfer_range: std::env::var("TANK_TRANSFER_RANGE")
                .ok()
                .and_then(|v| v.parse().ok()),
            action_points_per_round: env_or(
                "TANK_ACTION_POINTS_PER_ROUND",
                defaults.action_points_per_round,
            ),
            max_commit_attempts: env_or(
                "TANK_MAX_COMMIT_ATTEMPTS",
                defaults.max_commit_attempts,
            ),
        }
    }

    /// Parse config from JSON. Missing fields keep their default.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the rules are playable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::Invalid("grid must have at least one cell".into()));
        }
        if self.min_players < 2 {
            return Err(ConfigError::Invalid("min_players must be at least 2".into()));
        }
        if self.max_players < self.min_players {
            return Err(ConfigError::Invalid("max_players is below min_players".into()));
        }
        if (self.max_players as u64) > self.grid.cell_count() {
            return Err(ConfigError::Invalid(format!(
                "{} players cannot fit on a {}x{} grid",
                self.max_players, self.grid.width, self.grid.height
            )));
        }
        if self.starting_health == 0 || self.starting_health > self.max_health {
            return Err(ConfigError::Invalid(
                "starting_health must be in 1..=max_health".into(),
            ));
        }
        if self.starting_range == 0 {
            return Err(ConfigError::Invalid("starting_range must be at least 1".into()));
        }
        if self.shot_cost == 0 {
            return Err(ConfigError::Invalid("shot_cost must be at least 1".into()));
        }
        if self.max_commit_attempts == 0 {
            return Err(ConfigError::Invalid("max_commit_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
