//! Configuration System
//!
//! Loads run parameters from island.toml. Every section is optional and falls
//! back to its defaults.

use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::Deserialize;
use thiserror::Error;

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "island.toml";

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub initial: InitialConfig,
    pub day_cycle: DayCycleConfig,
}

/// Run parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Multiplier on every elapsed second
    pub game_speed: f32,
    /// Debug mode: no victory or defeat
    pub sandbox: bool,
}

/// Starting ledger and population
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InitialConfig {
    pub faith: f32,
    pub mana: f32,
    pub hearts: u32,
    pub natives: usize,
    pub settlers: usize,
    /// `[x, y]` pairs
    pub sacred_areas: Vec<[f32; 2]>,
}

/// Day/night cycle and opportunistic raids
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DayCycleConfig {
    pub day_length_secs: f32,
    pub invader_spawn_chance: f64,
    pub invader_spawn_min: u32,
    pub invader_spawn_max: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            initial: InitialConfig::default(),
            day_cycle: DayCycleConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            game_speed: 1.0,
            sandbox: false,
        }
    }
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            faith: 50.0,
            mana: 30.0,
            hearts: 0,
            natives: 10,
            settlers: 0,
            sacred_areas: vec![[300.0, 250.0], [500.0, 350.0]],
        }
    }
}

impl Default for DayCycleConfig {
    fn default() -> Self {
        Self {
            day_length_secs: 60.0,
            invader_spawn_chance: 0.3,
            invader_spawn_min: 1,
            invader_spawn_max: 3,
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            tracing::warn!("could not load {}: {}. Using defaults.", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.day_cycle.day_length_secs.is_nan() || self.day_cycle.day_length_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "day_cycle.day_length_secs must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.day_cycle.invader_spawn_chance) {
            return Err(ConfigError::Invalid(
                "day_cycle.invader_spawn_chance must be within [0, 1]".into(),
            ));
        }
        if self.day_cycle.invader_spawn_min > self.day_cycle.invader_spawn_max {
            return Err(ConfigError::Invalid(
                "day_cycle.invader_spawn_min exceeds invader_spawn_max".into(),
            ));
        }
        if self.simulation.game_speed.is_nan() || self.simulation.game_speed < 0.0 {
            return Err(ConfigError::Invalid(
                "simulation.game_speed must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
