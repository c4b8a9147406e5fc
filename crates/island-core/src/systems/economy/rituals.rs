//! Ritual catalog
//!
//! Rituals trade mana for faith. Each kind maps to one static definition whose
//! `effect` is applied once the cost has been paid.

use std::fmt;
use std::str::FromStr;

use island_events::{PopulationKind, RemovalCause};

use super::{ActiveBlessing, FaithSystem};
use crate::components::EntityId;
use crate::context::SimContext;
use crate::error::SimError;

/// Extra tuning not carried in the catalog rows
pub mod ritual_constants {
    /// Added on top of the sacrifice's faith gain when the victim was a true believer
    pub const TRUE_BELIEVER_SACRIFICE_BONUS: f32 = 15.0;
    pub const BLESSING_HAPPINESS: f32 = 10.0;
    pub const BLESSING_FERTILITY: f32 = 5.0;
}

use ritual_constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RitualKind {
    Basic,
    Sacrifice,
    Blessing,
}

/// What a ritual changed, beyond the mana it cost
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RitualEffects {
    pub faith_gained: f32,
    pub hearts_gained: u32,
    pub sacrificed: Option<EntityId>,
}

pub type RitualEffect = fn(&mut FaithSystem, &mut SimContext<'_>) -> RitualEffects;

pub struct RitualDef {
    pub key: &'static str,
    pub name: &'static str,
    pub mana_cost: f32,
    pub faith_gain: f32,
    /// How long the ritual site stays lit
    pub duration: f32,
    pub effect: RitualEffect,
}

static RITUALS: [RitualDef; 3] = [
    RitualDef {
        key: "basic",
        name: "Basic Ritual",
        mana_cost: 10.0,
        faith_gain: 5.0,
        duration: 10.0,
        effect: basic_rite,
    },
    RitualDef {
        key: "sacrifice",
        name: "Sacrifice",
        mana_cost: 25.0,
        faith_gain: 15.0,
        duration: 20.0,
        effect: sacrifice_rite,
    },
    RitualDef {
        key: "blessing",
        name: "Blessing",
        mana_cost: 15.0,
        faith_gain: 0.0,
        duration: 30.0,
        effect: blessing_rite,
    },
];

impl RitualKind {
    pub const ALL: [RitualKind; 3] = [Self::Basic, Self::Sacrifice, Self::Blessing];

    pub fn definition(self) -> &'static RitualDef {
        &RITUALS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.definition().key
    }
}

impl fmt::Display for RitualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for RitualKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SimError::unknown("ritual", s))
    }
}

fn basic_rite(_faith: &mut FaithSystem, ctx: &mut SimContext<'_>) -> RitualEffects {
    let gain = RitualKind::Basic.definition().faith_gain;
    ctx.ledger.add_faith(gain);
    RitualEffects {
        faith_gained: gain,
        ..Default::default()
    }
}

fn sacrifice_rite(_faith: &mut FaithSystem, ctx: &mut SimContext<'_>) -> RitualEffects {
    let Some(victim) = ctx.population.random_id(PopulationKind::Native, ctx.rng) else {
        return RitualEffects::default();
    };
    let true_believer = ctx
        .population
        .get(victim)
        .is_some_and(|n| n.is_true_believer);
    ctx.population.remove_entity(
        PopulationKind::Native,
        victim,
        RemovalCause::Sacrificed,
        ctx.notifications,
    );

    let mut effects = RitualEffects {
        faith_gained: RitualKind::Sacrifice.definition().faith_gain,
        hearts_gained: 0,
        sacrificed: Some(victim),
    };
    if true_believer {
        effects.faith_gained += TRUE_BELIEVER_SACRIFICE_BONUS;
        effects.hearts_gained = 1;
        ctx.ledger.add_hearts(1);
    }
    ctx.ledger.add_faith(effects.faith_gained);
    effects
}

fn blessing_rite(faith: &mut FaithSystem, ctx: &mut SimContext<'_>) -> RitualEffects {
    for native in ctx.population.natives_mut() {
        native.adjust_happiness(BLESSING_HAPPINESS);
    }
    faith.blessings.push(ActiveBlessing {
        time_remaining: RitualKind::Blessing.definition().duration,
        fertility: BLESSING_FERTILITY,
    });
    RitualEffects::default()
}
