//! Island god simulation engine
//!
//! Natives, settlers and invaders driven by their own state machines, a
//! faith and mana economy that the player spends on rituals, summons and
//! abilities, and a day cycle with weighted world events.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod ai;
pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;
pub use config::{ConfigError, SimConfig, DEFAULT_CONFIG_PATH};
pub use context::SimContext;
pub use error::SimError;
pub use simulation::Simulation;
pub use systems::{AbilityKind, RitualKind, SummonKind, TerrainKind, WorldEventKind};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
