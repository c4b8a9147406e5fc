//! Simulation errors
//!
//! Every rejected intent is reported through [`SimError`]; nothing in the
//! update loop panics for control flow.

use island_events::GameOutcome;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("unknown {catalog} `{key}`")]
    UnknownKey { catalog: &'static str, key: String },

    #[error("not enough mana: need {needed}, have {available}")]
    InsufficientMana { needed: f32, available: f32 },

    #[error("{ability} is on cooldown for another {remaining:.1}s")]
    OnCooldown { ability: &'static str, remaining: f32 },

    #[error("no native available to sacrifice")]
    NoSacrifice,

    #[error("simulation is paused")]
    Paused,

    #[error("simulation has already ended in {0:?}")]
    SimulationEnded(GameOutcome),
}

impl SimError {
    pub(crate) fn unknown(catalog: &'static str, key: &str) -> Self {
        Self::UnknownKey {
            catalog,
            key: key.to_string(),
        }
    }
}
