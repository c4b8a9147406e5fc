//! Entities
//!
//! One struct covers natives, settlers and invaders. Per-kind behavior lives in
//! the [`Brain`], which owns that entity's state machine.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use island_events::PopulationKind;

use super::geometry::Vec2;
use super::ledger::clamp_percent;
use crate::ai::invader::{InvaderAi, INVADER_SPEED};
use crate::ai::native::{NativeAi, NATIVE_SPEED};
use crate::ai::settler::{SettlerAi, SETTLER_SPEED};
use crate::ai::StateKind;

/// Starting vitals for each population
pub mod vitals {
    pub const NATIVE_HAPPINESS: f32 = 50.0;
    pub const NATIVE_FAITH_MIN: u32 = 30;
    pub const NATIVE_FAITH_MAX: u32 = 70;
    pub const NATIVE_TRUE_BELIEVER_CHANCE: f64 = 0.2;

    pub const SETTLER_HAPPINESS: f32 = 20.0;
    pub const SETTLER_FAITH_MIN: u32 = 10;
    pub const SETTLER_FAITH_MAX: u32 = 30;

    pub const CONVERT_HAPPINESS: f32 = 70.0;
    pub const CONVERT_FAITH: f32 = 60.0;
    pub const CONVERT_TRUE_BELIEVER_CHANCE: f64 = 0.5;

    pub const INVADER_HEALTH: f32 = 100.0;
    pub const INVADER_DAMAGE: f32 = 10.0;
}

/// Unique across all populations for the life of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity_{:04}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SummonId(pub u64);

/// The part of an entity its state machine is allowed to move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: EntityId,
    pub position: Vec2,
    /// Current speed in px/s, after any penalty
    pub speed: f32,
}

/// Per-kind state machine
#[derive(Debug, Clone)]
pub enum Brain {
    Native(NativeAi),
    Settler(SettlerAi),
    Invader(InvaderAi),
}

impl Brain {
    pub fn state_name(&self) -> &'static str {
        match self {
            Brain::Native(ai) => ai.state().name(),
            Brain::Settler(ai) => ai.state().name(),
            Brain::Invader(ai) => ai.state().name(),
        }
    }

    pub fn state_timer(&self) -> f32 {
        match self {
            Brain::Native(ai) => ai.state_timer(),
            Brain::Settler(ai) => ai.state_timer(),
            Brain::Invader(ai) => ai.state_timer(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: PopulationKind,
    pub body: Body,
    /// Speed to restore once a penalty wears off
    pub base_speed: f32,
    /// Only invaders can be wounded
    pub health: Option<f32>,
    pub damage: f32,
    pub happiness: f32,
    pub faith: f32,
    pub is_true_believer: bool,
    pub brain: Brain,
}

impl Entity {
    /// A native born on the island with randomized faith
    pub fn native<R: Rng>(id: EntityId, position: Vec2, rng: &mut R) -> Self {
        let faith = rng.gen_range(vitals::NATIVE_FAITH_MIN..=vitals::NATIVE_FAITH_MAX) as f32;
        let true_believer = rng.gen_bool(vitals::NATIVE_TRUE_BELIEVER_CHANCE);
        Self::new_native(id, position, vitals::NATIVE_HAPPINESS, faith, true_believer, rng)
    }

    /// A settler who has come around to the island's god
    pub fn converted<R: Rng>(id: EntityId, position: Vec2, rng: &mut R) -> Self {
        let true_believer = rng.gen_bool(vitals::CONVERT_TRUE_BELIEVER_CHANCE);
        Self::new_native(
            id,
            position,
            vitals::CONVERT_HAPPINESS,
            vitals::CONVERT_FAITH,
            true_believer,
            rng,
        )
    }

    fn new_native<R: Rng>(
        id: EntityId,
        position: Vec2,
        happiness: f32,
        faith: f32,
        is_true_believer: bool,
        rng: &mut R,
    ) -> Self {
        Self {
            kind: PopulationKind::Native,
            body: Body {
                id,
                position,
                speed: NATIVE_SPEED,
            },
            base_speed: NATIVE_SPEED,
            health: None,
            damage: 0.0,
            happiness,
            faith,
            is_true_believer,
            brain: Brain::Native(NativeAi::new(rng)),
        }
    }

    pub fn settler<R: Rng>(id: EntityId, position: Vec2, rng: &mut R) -> Self {
        Self {
            kind: PopulationKind::Settler,
            body: Body {
                id,
                position,
                speed: SETTLER_SPEED,
            },
            base_speed: SETTLER_SPEED,
            health: None,
            damage: 0.0,
            happiness: vitals::SETTLER_HAPPINESS,
            faith: rng.gen_range(vitals::SETTLER_FAITH_MIN..=vitals::SETTLER_FAITH_MAX) as f32,
            is_true_believer: false,
            brain: Brain::Settler(SettlerAi::new()),
        }
    }

    pub fn invader(id: EntityId, position: Vec2) -> Self {
        Self {
            kind: PopulationKind::Invader,
            body: Body {
                id,
                position,
                speed: INVADER_SPEED,
            },
            base_speed: INVADER_SPEED,
            health: Some(vitals::INVADER_HEALTH),
            damage: vitals::INVADER_DAMAGE,
            happiness: 0.0,
            faith: 0.0,
            is_true_believer: false,
            brain: Brain::Invader(InvaderAi::new()),
        }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn gifts_received(&self) -> u32 {
        match &self.brain {
            Brain::Settler(ai) => ai.gifts_received(),
            _ => 0,
        }
    }

    pub fn adjust_happiness(&mut self, delta: f32) {
        self.happiness = clamp_percent(self.happiness + delta);
    }

    pub fn adjust_faith(&mut self, delta: f32) {
        self.faith = clamp_percent(self.faith + delta);
    }

    /// Apply damage and return the remaining health. Entities without health
    /// shrug it off and report `None`.
    pub fn take_damage(&mut self, amount: f32) -> Option<f32> {
        let health = self.health.as_mut()?;
        *health -= amount;
        Some(*health)
    }
}
