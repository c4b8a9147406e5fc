//! Simulation Clock
//!
//! Day/night progression, the once-a-day economy pass, and the victory and
//! defeat checks.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::info;

use island_events::GameOutcome;

use crate::components::{GameState, PopulationCounts};
use crate::config::DayCycleConfig;
use crate::context::SimContext;
use crate::systems::economy::FaithSystem;
use crate::systems::world_events::{EventSystem, WorldEventKind};

/// Victory and defeat thresholds
pub mod outcome_constants {
    pub const VICTORY_FAITH: f32 = 90.0;
    pub const VICTORY_NATIVES: usize = 10;
    pub const DEFEAT_FAITH: f32 = 0.0;
}

use outcome_constants::*;

#[derive(Resource, Debug, Clone)]
pub struct SimulationClock {
    day_length: f32,
    day_fraction: f32,
    day: u32,
    elapsed: f64,
    pub game_speed: f32,
    pub paused: bool,
    /// Debug mode: outcomes are never declared
    pub sandbox: bool,
    outcome: Option<GameOutcome>,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(60.0, 1.0, false)
    }
}

impl SimulationClock {
    pub fn new(day_length: f32, game_speed: f32, sandbox: bool) -> Self {
        Self {
            day_length,
            day_fraction: 0.0,
            day: 0,
            elapsed: 0.0,
            game_speed,
            paused: false,
            sandbox,
            outcome: None,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Position within the current day, in [0, 1)
    pub fn day_fraction(&self) -> f32 {
        self.day_fraction
    }

    /// Simulated seconds since the run started
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// False while paused or once the game is decided
    pub fn is_running(&self) -> bool {
        !self.paused && self.outcome.is_none()
    }

    /// Move time forward by `dt` simulated seconds. Returns how many days
    /// rolled over; the leftover carries into the next day.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.elapsed += f64::from(dt);
        self.day_fraction += dt / self.day_length;
        let mut rolled = 0;
        while self.day_fraction >= 1.0 {
            self.day_fraction -= 1.0;
            self.day += 1;
            rolled += 1;
        }
        rolled
    }

    /// Record the outcome if the game has just been decided. Sandbox runs
    /// never end.
    pub fn check_end(
        &mut self,
        ledger: &GameState,
        counts: PopulationCounts,
    ) -> Option<GameOutcome> {
        if self.outcome.is_some() || self.sandbox {
            return self.outcome;
        }
        self.outcome = evaluate_outcome(ledger, counts);
        match self.outcome {
            Some(GameOutcome::Victory) => {
                info!("Victory! The island has grown strong with the power of its believers")
            }
            Some(GameOutcome::Defeat) => {
                info!("Defeat! The island has lost its power as faith has waned")
            }
            None => {}
        }
        self.outcome
    }
}

/// Defeat wins ties, though both cannot hold at once with valid ranges
pub fn evaluate_outcome(ledger: &GameState, counts: PopulationCounts) -> Option<GameOutcome> {
    if ledger.faith() <= DEFEAT_FAITH || counts.natives == 0 {
        Some(GameOutcome::Defeat)
    } else if ledger.faith() >= VICTORY_FAITH
        && counts.invaders == 0
        && counts.natives >= VICTORY_NATIVES
    {
        Some(GameOutcome::Victory)
    } else {
        None
    }
}

/// What happened at a day boundary
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub day: u32,
    pub mana_gain: u32,
    pub faith_change: f32,
    pub invaders_spawned: u32,
    pub event: Option<WorldEventKind>,
}

/// Collect the day's mana and faith, maybe land raiders, then roll for a
/// world event
pub fn run_day_cycle(
    day: u32,
    now: f64,
    tuning: &DayCycleConfig,
    economy: &FaithSystem,
    events: &mut EventSystem,
    ctx: &mut SimContext<'_>,
) -> DayReport {
    let mana_gain = economy.calculate_mana_gain(ctx.ledger, ctx.population);
    let faith_change = economy.calculate_faith_change(ctx.population);
    ctx.ledger.add_mana(mana_gain as f32);
    ctx.ledger.add_faith(faith_change);

    let invaders_spawned = if ctx.rng.gen_bool(tuning.invader_spawn_chance) {
        let count = ctx
            .rng
            .gen_range(tuning.invader_spawn_min..=tuning.invader_spawn_max);
        ctx.population.spawn_invaders(count, ctx.rng, ctx.notifications);
        count
    } else {
        0
    };

    let event = events.trigger_random_event(ctx, now);

    info!(
        "day {}: mana +{}, faith {:+.1}, {} invaders landed, event: {}",
        day,
        mana_gain,
        faith_change,
        invaders_spawned,
        event.map_or("none", |e| e.as_str())
    );

    DayReport {
        day,
        mana_gain,
        faith_change,
        invaders_spawned,
        event,
    }
}
