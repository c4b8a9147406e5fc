//! Summon catalog
//!
//! Temporary god-controlled entities. Each kind has a static definition and a
//! behavior function run every frame while it lives.

use rand::Rng;
use std::fmt;
use std::str::FromStr;

use island_events::{GameEvent, PopulationKind, RemovalCause};

use crate::components::world::HEARTLAND;
use crate::components::{EntityId, Rect, SummonId, Vec2};
use crate::context::SimContext;
use crate::error::SimError;

/// Summon behavior tuning
pub mod summon_constants {
    pub const PATROL_ARRIVAL_SQ: f32 = 25.0;

    pub const DEFENDER_RETARGET_SECS: f32 = 2.0;
    /// Fraction of the remaining gap closed per second
    pub const DEFENDER_DRIFT: f32 = 0.5;
    pub const DEFENDER_REACH: f32 = 50.0;
    pub const DEFENDER_DPS: f32 = 5.0;

    pub const SHADOW_TURN_SECS: f32 = 0.5;
    pub const SHADOW_SPEED: f32 = 30.0;
    pub const SHADOW_REACH: f32 = 70.0;
    pub const SHADOW_FEAR_FACTOR: f32 = 0.5;
    pub const SHADOW_FEAR_SECS: f32 = 5.0;

    pub const DEMON_DRIFT: f32 = 0.7;
    pub const DEMON_WANDER_DRIFT: f32 = 0.3;
    pub const DEMON_WANDER_SECS: f32 = 3.0;
    pub const DEMON_REACH_SQ: f32 = 100.0;
    pub const DEMON_DPS: f32 = 15.0;
}

use summon_constants::*;

/// Shadows stay inside this box, bouncing off its sides
pub const SHADOW_BOUNDS: Rect = Rect::new(200.0, 100.0, 600.0, 500.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummonKind {
    Defender,
    Shadow,
    Demon,
}

pub type SummonBehavior = fn(&mut Summon, &mut SimContext<'_>, f32);

pub struct SummonDef {
    pub key: &'static str,
    pub name: &'static str,
    pub mana_cost: f32,
    pub lifespan: f32,
    pub behavior: SummonBehavior,
}

static SUMMONS: [SummonDef; 3] = [
    SummonDef {
        key: "defender",
        name: "Defender",
        mana_cost: 15.0,
        lifespan: 60.0,
        behavior: defender_patrol,
    },
    SummonDef {
        key: "shadow",
        name: "Shadow",
        mana_cost: 20.0,
        lifespan: 60.0,
        behavior: shadow_haunt,
    },
    SummonDef {
        key: "demon",
        name: "Demon",
        mana_cost: 35.0,
        lifespan: 60.0,
        behavior: demon_hunt,
    },
];

impl SummonKind {
    pub const ALL: [SummonKind; 3] = [Self::Defender, Self::Shadow, Self::Demon];

    pub fn definition(self) -> &'static SummonDef {
        &SUMMONS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.definition().key
    }
}

impl fmt::Display for SummonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for SummonKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SimError::unknown("summon", s))
    }
}

/// A live summon
#[derive(Debug, Clone, PartialEq)]
pub struct Summon {
    pub id: SummonId,
    pub kind: SummonKind,
    pub position: Vec2,
    pub time_remaining: f32,
    /// Patrol or wander point
    pub target: Vec2,
    /// Time since the last retarget or turn
    pub timer: f32,
    /// Shadow movement direction, each axis in [-1, 1]
    pub heading: Vec2,
}

impl Summon {
    pub fn new(id: SummonId, kind: SummonKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            time_remaining: kind.definition().lifespan,
            target: position,
            timer: 0.0,
            heading: Vec2::default(),
        }
    }
}

fn invaders_within(ctx: &SimContext<'_>, from: Vec2, radius: f32) -> Vec<EntityId> {
    ctx.population
        .invaders()
        .iter()
        .filter(|i| i.position().within(from, radius))
        .map(|i| i.id())
        .collect()
}

/// Wound an invader; on a kill, remove it and report `message`
fn strike(ctx: &mut SimContext<'_>, target: EntityId, amount: f32, message: &str) -> bool {
    match ctx.population.damage(target, amount) {
        Some(health) if health <= 0.0 => {
            ctx.population.remove_entity(
                PopulationKind::Invader,
                target,
                RemovalCause::Slain,
                ctx.notifications,
            );
            tracing::info!("{}", message);
            ctx.notifications.emit(GameEvent::CombatResult {
                result: message.to_string(),
            });
            true
        }
        _ => false,
    }
}

fn defender_patrol(summon: &mut Summon, ctx: &mut SimContext<'_>, dt: f32) {
    summon.timer += dt;
    if summon.timer > DEFENDER_RETARGET_SECS {
        summon.target = HEARTLAND.random_point(ctx.rng);
        summon.timer = 0.0;
    }
    if summon.position.distance_sq(summon.target) > PATROL_ARRIVAL_SQ {
        summon.position.ease_toward(summon.target, DEFENDER_DRIFT, dt);
    }

    // One kill per frame at most
    for id in invaders_within(ctx, summon.position, DEFENDER_REACH) {
        if strike(ctx, id, DEFENDER_DPS * dt, "Invader defeated by Defender") {
            break;
        }
    }
}

fn shadow_haunt(summon: &mut Summon, ctx: &mut SimContext<'_>, dt: f32) {
    summon.timer += dt;
    if summon.timer > SHADOW_TURN_SECS {
        summon.heading = Vec2::new(ctx.rng.gen_range(-1.0..=1.0), ctx.rng.gen_range(-1.0..=1.0));
        summon.timer = 0.0;
    }
    summon.position.x += summon.heading.x * SHADOW_SPEED * dt;
    summon.position.y += summon.heading.y * SHADOW_SPEED * dt;

    if !(SHADOW_BOUNDS.min.x..=SHADOW_BOUNDS.max.x).contains(&summon.position.x) {
        summon.heading.x = -summon.heading.x;
    }
    if !(SHADOW_BOUNDS.min.y..=SHADOW_BOUNDS.max.y).contains(&summon.position.y) {
        summon.heading.y = -summon.heading.y;
    }
    summon.position = SHADOW_BOUNDS.clamp(summon.position);

    for id in invaders_within(ctx, summon.position, SHADOW_REACH) {
        ctx.population
            .apply_fear(id, SHADOW_FEAR_FACTOR, SHADOW_FEAR_SECS, Some(summon.id));
    }
}

fn demon_hunt(summon: &mut Summon, ctx: &mut SimContext<'_>, dt: f32) {
    match ctx
        .population
        .find_closest(PopulationKind::Invader, summon.position)
    {
        Some((prey, dist_sq)) if dist_sq > DEMON_REACH_SQ => {
            if let Some(target) = ctx.population.get(prey).map(|p| p.position()) {
                summon.position.ease_toward(target, DEMON_DRIFT, dt);
            }
        }
        Some((prey, _)) => {
            strike(ctx, prey, DEMON_DPS * dt, "Invader obliterated by Demon");
        }
        None => {
            summon.timer += dt;
            if summon.timer > DEMON_WANDER_SECS {
                summon.target = HEARTLAND.random_point(ctx.rng);
                summon.timer = 0.0;
            }
            if summon.position.distance_sq(summon.target) > PATROL_ARRIVAL_SQ {
                summon.position.ease_toward(summon.target, DEMON_WANDER_DRIFT, dt);
            }
        }
    }
}
