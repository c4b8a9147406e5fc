//! Game State Ledger
//!
//! Faith, mana and hearts. Every mutation clamps, so no sequence of updates can
//! push a value out of range. Population counts are never stored here; they are
//! read off the registry's collections.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Upper bound for faith and mana
pub const PERCENT_MAX: f32 = 100.0;

/// Clamp a percentage, treating NaN as empty
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, PERCENT_MAX)
    }
}

/// The shared resource ledger
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    faith: f32,
    mana: f32,
    hearts: u32,
}

/// Merge-patch for the ledger. Absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerPatch {
    pub faith: Option<f32>,
    pub mana: Option<f32>,
    pub hearts: Option<i64>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(50.0, 30.0, 0)
    }
}

impl GameState {
    pub fn new(faith: f32, mana: f32, hearts: u32) -> Self {
        Self {
            faith: clamp_percent(faith),
            mana: clamp_percent(mana),
            hearts,
        }
    }

    pub fn faith(&self) -> f32 {
        self.faith
    }

    pub fn mana(&self) -> f32 {
        self.mana
    }

    pub fn hearts(&self) -> u32 {
        self.hearts
    }

    /// Merge `patch` into the ledger, clamping every field it touches
    pub fn update(&mut self, patch: LedgerPatch) {
        if let Some(faith) = patch.faith {
            self.faith = clamp_percent(faith);
        }
        if let Some(mana) = patch.mana {
            self.mana = clamp_percent(mana);
        }
        if let Some(hearts) = patch.hearts {
            self.hearts = hearts.clamp(0, u32::MAX as i64) as u32;
        }
    }

    pub fn add_faith(&mut self, delta: f32) {
        self.update(LedgerPatch {
            faith: Some(self.faith + delta),
            ..Default::default()
        });
    }

    pub fn add_mana(&mut self, delta: f32) {
        self.update(LedgerPatch {
            mana: Some(self.mana + delta),
            ..Default::default()
        });
    }

    pub fn add_hearts(&mut self, delta: i64) {
        self.update(LedgerPatch {
            hearts: Some(self.hearts as i64 + delta),
            ..Default::default()
        });
    }

    /// Check that `cost` can be paid without touching the ledger
    pub fn ensure_mana(&self, cost: f32) -> Result<(), SimError> {
        if self.mana < cost {
            return Err(SimError::InsufficientMana {
                needed: cost,
                available: self.mana,
            });
        }
        Ok(())
    }

    /// Deduct `cost`, or fail without mutation
    pub fn spend_mana(&mut self, cost: f32) -> Result<(), SimError> {
        self.ensure_mana(cost)?;
        self.add_mana(-cost);
        Ok(())
    }
}

/// Live population sizes, always computed from the registry collections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub natives: usize,
    pub settlers: usize,
    pub invaders: usize,
}
