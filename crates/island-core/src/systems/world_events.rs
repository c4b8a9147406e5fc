//! Event Scheduler
//!
//! Weighted random world events gated by the island's faith and by per-event
//! cooldowns.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::{debug, info};

use island_events::{GameEvent, PopulationKind};

use crate::context::SimContext;
use crate::error::SimError;

/// Effect sizes
pub mod event_constants {
    pub const BLESSING_FAITH: f32 = 15.0;
    pub const BLESSING_HAPPINESS: f32 = 20.0;

    pub const DISASTER_HAPPINESS: f32 = -30.0;
    /// Chance each native comes out of a disaster more devout
    pub const DISASTER_TESTED_CHANCE: f64 = 0.3;
    pub const DISASTER_FAITH: f32 = 10.0;

    pub const HARVEST_HAPPINESS: f32 = 15.0;

    pub const SETTLERS_MIN: u32 = 2;
    pub const SETTLERS_MAX: u32 = 4;

    pub const RAIDERS_MIN: u32 = 3;
    pub const RAIDERS_MAX: u32 = 6;

    pub const MIRACLE_FAITH: f32 = 25.0;
    pub const MIRACLE_MANA: f32 = 30.0;
}

use event_constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEventKind {
    Blessing,
    NaturalDisaster,
    BountifulHarvest,
    SettlerArrival,
    InvaderRaid,
    Miracle,
}

/// What an event did, in the words the player sees
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub notice: &'static str,
    pub message: String,
}

pub type EventEffect = fn(&mut SimContext<'_>) -> EventOutcome;

#[derive(Debug)]
pub struct EventDef {
    pub key: &'static str,
    pub name: &'static str,
    pub weight: f32,
    pub min_faith: Option<f32>,
    pub max_faith: Option<f32>,
    pub cooldown: Option<f32>,
    pub effect: EventEffect,
}

impl EventDef {
    pub fn allows(&self, faith: f32) -> bool {
        self.min_faith.map_or(true, |min| faith >= min)
            && self.max_faith.map_or(true, |max| faith <= max)
    }
}

static EVENTS: [EventDef; 6] = [
    EventDef {
        key: "blessing",
        name: "Divine Blessing",
        weight: 0.2,
        min_faith: Some(30.0),
        max_faith: None,
        cooldown: None,
        effect: divine_blessing,
    },
    EventDef {
        key: "naturalDisaster",
        name: "Natural Disaster",
        weight: 0.15,
        min_faith: None,
        max_faith: Some(70.0),
        cooldown: None,
        effect: natural_disaster,
    },
    EventDef {
        key: "bountifulHarvest",
        name: "Bountiful Harvest",
        weight: 0.25,
        min_faith: Some(20.0),
        max_faith: None,
        cooldown: None,
        effect: bountiful_harvest,
    },
    EventDef {
        key: "settlerArrival",
        name: "Settler Arrival",
        weight: 0.3,
        min_faith: Some(0.0),
        max_faith: None,
        cooldown: Some(120.0),
        effect: settler_arrival,
    },
    EventDef {
        key: "invaderRaid",
        name: "Invader Raid",
        weight: 0.4,
        min_faith: None,
        max_faith: Some(90.0),
        cooldown: Some(180.0),
        effect: invader_raid,
    },
    EventDef {
        key: "miracle",
        name: "Island Miracle",
        weight: 0.1,
        min_faith: Some(50.0),
        max_faith: None,
        cooldown: Some(300.0),
        effect: island_miracle,
    },
];

impl WorldEventKind {
    pub const ALL: [WorldEventKind; 6] = [
        Self::Blessing,
        Self::NaturalDisaster,
        Self::BountifulHarvest,
        Self::SettlerArrival,
        Self::InvaderRaid,
        Self::Miracle,
    ];

    pub fn definition(self) -> &'static EventDef {
        &EVENTS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.definition().key
    }
}

impl fmt::Display for WorldEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for WorldEventKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SimError::unknown("event", s))
    }
}

fn lift_natives(ctx: &mut SimContext<'_>, happiness: f32) {
    for native in ctx.population.natives_mut() {
        native.adjust_happiness(happiness);
    }
}

fn divine_blessing(ctx: &mut SimContext<'_>) -> EventOutcome {
    ctx.ledger.add_faith(BLESSING_FAITH);
    lift_natives(ctx, BLESSING_HAPPINESS);
    EventOutcome {
        notice: "blessing",
        message: "A divine blessing has increased faith and happiness!".to_string(),
    }
}

fn natural_disaster(ctx: &mut SimContext<'_>) -> EventOutcome {
    for native in ctx.population.natives_mut() {
        native.adjust_happiness(DISASTER_HAPPINESS);
        if ctx.rng.gen_bool(DISASTER_TESTED_CHANCE) {
            native.adjust_faith(DISASTER_FAITH);
        }
    }
    EventOutcome {
        notice: "disaster",
        message: "A natural disaster has tested the natives' faith!".to_string(),
    }
}

fn bountiful_harvest(ctx: &mut SimContext<'_>) -> EventOutcome {
    lift_natives(ctx, HARVEST_HAPPINESS);
    EventOutcome {
        notice: "harvest",
        message: "A bountiful harvest has increased native happiness!".to_string(),
    }
}

fn settler_arrival(ctx: &mut SimContext<'_>) -> EventOutcome {
    let count = ctx.rng.gen_range(SETTLERS_MIN..=SETTLERS_MAX);
    for _ in 0..count {
        ctx.population.spawn_settler(ctx.rng, ctx.notifications);
    }
    EventOutcome {
        notice: "settlers",
        message: format!("{} new settlers have arrived on the island!", count),
    }
}

fn invader_raid(ctx: &mut SimContext<'_>) -> EventOutcome {
    let count = ctx.rng.gen_range(RAIDERS_MIN..=RAIDERS_MAX);
    ctx.population.spawn_invaders(count, ctx.rng, ctx.notifications);
    EventOutcome {
        notice: "raid",
        message: format!("Warning: {} invaders are raiding the island!", count),
    }
}

fn island_miracle(ctx: &mut SimContext<'_>) -> EventOutcome {
    ctx.ledger.add_faith(MIRACLE_FAITH);
    ctx.ledger.add_mana(MIRACLE_MANA);

    // The heart only comes with a convert
    if let Some(settler) = ctx.population.random_id(PopulationKind::Settler, ctx.rng) {
        let convert =
            ctx.population
                .convert_settler_to_native(settler, ctx.rng, ctx.notifications);
        if let Some(native) = convert.and_then(|id| ctx.population.get_mut(id)) {
            native.is_true_believer = true;
            ctx.ledger.add_hearts(1);
        }
    }

    EventOutcome {
        notice: "miracle",
        message: "A miracle has occurred! Faith is strengthened and a new true believer emerges!"
            .to_string(),
    }
}

/// One entry in the event history
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub kind: WorldEventKind,
    pub key: &'static str,
    pub name: &'static str,
    /// Simulated seconds since the run started
    pub time: f64,
}

#[derive(Resource, Debug, Default)]
pub struct EventSystem {
    cooldowns: HashMap<WorldEventKind, f32>,
    history: Vec<EventRecord>,
}

impl EventSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cooldown(&self, kind: WorldEventKind) -> f32 {
        self.cooldowns.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn history(&self) -> &[EventRecord] {
        &self.history
    }

    /// Events that could fire right now, in catalog order
    pub fn eligible(&self, faith: f32) -> Vec<WorldEventKind> {
        WorldEventKind::ALL
            .into_iter()
            .filter(|k| self.cooldown(*k) <= 0.0 && k.definition().allows(faith))
            .collect()
    }

    /// Roll for a world event. Returns the event that fired, if any could.
    pub fn trigger_random_event(
        &mut self,
        ctx: &mut SimContext<'_>,
        now: f64,
    ) -> Option<WorldEventKind> {
        let candidates: Vec<(WorldEventKind, f32)> = self
            .eligible(ctx.ledger.faith())
            .into_iter()
            .map(|k| (k, k.definition().weight))
            .collect();

        let Some(&kind) = select_weighted(ctx.rng, &candidates) else {
            debug!("no world event is possible right now");
            return None;
        };

        if let Some(cooldown) = kind.definition().cooldown {
            self.cooldowns.insert(kind, cooldown);
        }
        self.record(kind, now);
        self.apply_event_effects(kind, ctx);
        Some(kind)
    }

    /// Fire `kind` immediately, ignoring gates and leaving cooldowns alone
    pub fn force(&mut self, kind: WorldEventKind, ctx: &mut SimContext<'_>, now: f64) {
        self.record(kind, now);
        self.apply_event_effects(kind, ctx);
    }

    pub fn apply_event_effects(
        &self,
        kind: WorldEventKind,
        ctx: &mut SimContext<'_>,
    ) -> EventOutcome {
        let outcome = (kind.definition().effect)(ctx);
        info!("world event: {} ({})", kind, outcome.message);
        ctx.notifications.emit(GameEvent::EventOccurred {
            kind: outcome.notice.to_string(),
            message: outcome.message.clone(),
        });
        outcome
    }

    fn record(&mut self, kind: WorldEventKind, now: f64) {
        let def = kind.definition();
        self.history.push(EventRecord {
            kind,
            key: def.key,
            name: def.name,
            time: now,
        });
    }

    pub fn update(&mut self, dt: f32) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = (*remaining - dt).max(0.0);
        }
    }
}

/// Weighted random pick. Draws from `[0, total)` and walks the list
/// subtracting weights until the roll is spent.
pub fn select_weighted<'a, T, R: Rng>(rng: &mut R, candidates: &'a [(T, f32)]) -> Option<&'a T> {
    let (last, _) = candidates.last()?;
    let total: f32 = candidates.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return candidates.first().map(|(item, _)| item);
    }

    let mut roll = rng.gen::<f32>() * total;
    for (item, weight) in candidates {
        roll -= weight;
        if roll <= 0.0 {
            return Some(item);
        }
    }

    // Float rounding can leave a sliver of roll behind
    Some(last)
}
