//! ECS Systems
//!
//! Island systems plus the bevy system functions that drive them. Two
//! cadences share the world: the per-frame schedule and the coarse tick.

pub mod clock;
pub mod combat;
pub mod economy;
pub mod population;
pub mod tasks;
pub mod terrain;
pub mod world_events;

use bevy_ecs::prelude::*;

use crate::components::GameState;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::events::Notifications;
use crate::SimRng;

pub use clock::{evaluate_outcome, run_day_cycle, DayReport, SimulationClock};
pub use combat::{AbilityKind, AbilityReport, CombatSystem};
pub use economy::{FaithSystem, RitualKind, RitualReport, SummonKind};
pub use population::PopulationRegistry;
pub use terrain::{TerrainKind, TerrainSystem};
pub use world_events::{EventSystem, WorldEventKind};

/// Scaled seconds the current schedule pass covers
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct DeltaTime(pub f32);

/// Run condition: nothing advances while paused or after the game is decided
pub fn simulation_running(clock: Res<SimulationClock>) -> bool {
    clock.is_running()
}

/// Step every entity state machine
pub fn update_population(
    dt: Res<DeltaTime>,
    faith: Res<FaithSystem>,
    mut population: ResMut<PopulationRegistry>,
    mut rng: ResMut<SimRng>,
    mut notes: ResMut<Notifications>,
) {
    let economy = faith.sightings();
    population.update(dt.0, &economy, &mut rng.0, &mut notes);
}

/// Ritual sites, blessings and summons
pub fn update_economy(
    dt: Res<DeltaTime>,
    mut faith: ResMut<FaithSystem>,
    mut ledger: ResMut<GameState>,
    mut population: ResMut<PopulationRegistry>,
    mut rng: ResMut<SimRng>,
    mut notes: ResMut<Notifications>,
) {
    let mut ctx = SimContext::new(&mut ledger, &mut population, &mut rng.0, &mut notes);
    faith.update(dt.0, &mut ctx);
}

/// Ability cooldowns, effect markers and invader melee
pub fn update_combat(
    dt: Res<DeltaTime>,
    mut combat: ResMut<CombatSystem>,
    mut ledger: ResMut<GameState>,
    mut population: ResMut<PopulationRegistry>,
    mut rng: ResMut<SimRng>,
    mut notes: ResMut<Notifications>,
) {
    let mut ctx = SimContext::new(&mut ledger, &mut population, &mut rng.0, &mut notes);
    combat.update(dt.0, &mut ctx);
}

pub fn update_event_cooldowns(dt: Res<DeltaTime>, mut events: ResMut<EventSystem>) {
    events.update(dt.0);
}

/// Advance the day/night cycle and run the economy pass for each new day.
/// A decided game stops the remaining days of a long step.
#[allow(clippy::too_many_arguments)]
pub fn advance_day_cycle(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    faith: Res<FaithSystem>,
    mut clock: ResMut<SimulationClock>,
    mut events: ResMut<EventSystem>,
    mut ledger: ResMut<GameState>,
    mut population: ResMut<PopulationRegistry>,
    mut rng: ResMut<SimRng>,
    mut notes: ResMut<Notifications>,
) {
    let rolled = clock.advance(dt.0);
    if rolled == 0 {
        return;
    }
    let day = clock.day();
    let now = clock.elapsed();
    let mut ctx = SimContext::new(&mut ledger, &mut population, &mut rng.0, &mut notes);
    for offset in 0..rolled {
        run_day_cycle(
            day + 1 + offset - rolled,
            now,
            &config.day_cycle,
            &faith,
            &mut events,
            &mut ctx,
        );
        if clock.check_end(&*ctx.ledger, ctx.population.counts()).is_some() {
            break;
        }
    }
}

/// Declare victory or defeat once the ledger and population allow it
pub fn check_end_conditions(
    mut clock: ResMut<SimulationClock>,
    ledger: Res<GameState>,
    population: Res<PopulationRegistry>,
) {
    clock.check_end(&ledger, population.counts());
}
