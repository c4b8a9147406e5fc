//! Simulation facade
//!
//! Owns the ECS world and both schedules, and is the one door through which
//! a host advances time and issues god intents.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use bevy_ecs::system::SystemState;
use tracing::{info, warn};

use island_events::{GameOutcome, Notification, WorldSnapshot};

use crate::components::{GameState, LedgerPatch, SummonId};
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::error::SimError;
use crate::events::Notifications;
use crate::output::generate_snapshot;
use crate::setup::build_world;
use crate::systems::terrain::TerrainFeature;
use crate::systems::{
    advance_day_cycle, check_end_conditions, simulation_running, update_combat, update_economy,
    update_event_cooldowns, update_population, AbilityKind, AbilityReport, CombatSystem,
    DeltaTime, EventSystem, FaithSystem, PopulationRegistry, RitualKind, RitualReport,
    SimulationClock, SummonKind, TerrainKind, TerrainSystem, WorldEventKind,
};
use crate::SimRng;

/// Entities `spawn_test_entities` adds
pub mod sandbox_constants {
    pub const TEST_NATIVES: usize = 5;
    pub const TEST_SETTLERS: usize = 3;
    pub const TEST_INVADERS: u32 = 2;
}

type Intent<'w, S> = (
    ResMut<'w, S>,
    ResMut<'w, GameState>,
    ResMut<'w, PopulationRegistry>,
    ResMut<'w, SimRng>,
    ResMut<'w, Notifications>,
);

pub struct Simulation {
    config: SimConfig,
    world: World,
    frame_schedule: Schedule,
    tick_schedule: Schedule,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let world = build_world(&config);

        let mut frame_schedule = Schedule::default();
        frame_schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        frame_schedule.add_systems(
            (
                update_population,
                update_economy,
                update_combat,
                update_event_cooldowns,
                check_end_conditions,
            )
                .chain()
                .run_if(simulation_running),
        );

        let mut tick_schedule = Schedule::default();
        tick_schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        tick_schedule.add_systems(
            (advance_day_cycle, check_end_conditions)
                .chain()
                .run_if(simulation_running),
        );

        Self {
            config,
            world,
            frame_schedule,
            tick_schedule,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Per-frame update: state machines, summons, combat and event cooldowns
    pub fn frame(&mut self, dt: f32) {
        self.run(dt, Cadence::Frame);
    }

    /// Coarse update: the day/night cycle
    pub fn tick(&mut self, elapsed: f32) {
        self.run(elapsed, Cadence::Tick);
    }

    fn run(&mut self, dt: f32, cadence: Cadence) {
        let speed = self.world.resource::<SimulationClock>().game_speed;
        self.world.resource_mut::<DeltaTime>().0 = dt * speed;
        match cadence {
            Cadence::Frame => self.frame_schedule.run(&mut self.world),
            Cadence::Tick => self.tick_schedule.run(&mut self.world),
        }
    }

    pub fn pause(&mut self) {
        self.world.resource_mut::<SimulationClock>().paused = true;
    }

    pub fn resume(&mut self) {
        self.world.resource_mut::<SimulationClock>().paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.clock().paused
    }

    pub fn set_game_speed(&mut self, speed: f32) {
        self.world.resource_mut::<SimulationClock>().game_speed = speed.max(0.0);
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.clock().outcome()
    }

    /// Throw the island away and start over from the same config and seed
    pub fn reset(&mut self) {
        info!("simulation reset");
        self.world = build_world(&self.config);
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn clock(&self) -> &SimulationClock {
        self.world.resource::<SimulationClock>()
    }

    pub fn ledger(&self) -> &GameState {
        self.world.resource::<GameState>()
    }

    pub fn population(&self) -> &PopulationRegistry {
        self.world.resource::<PopulationRegistry>()
    }

    pub fn faith_system(&self) -> &FaithSystem {
        self.world.resource::<FaithSystem>()
    }

    pub fn combat(&self) -> &CombatSystem {
        self.world.resource::<CombatSystem>()
    }

    pub fn events(&self) -> &EventSystem {
        self.world.resource::<EventSystem>()
    }

    pub fn terrain(&self) -> &TerrainSystem {
        self.world.resource::<TerrainSystem>()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        generate_snapshot(&self.world)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.world.resource_mut::<Notifications>().drain()
    }

    /// Merge-patch the ledger the way a host would
    pub fn update_game_state(&mut self, patch: LedgerPatch) {
        self.world.resource_mut::<GameState>().update(patch);
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    fn accepting(&self) -> Result<(), SimError> {
        let clock = self.clock();
        if let Some(outcome) = clock.outcome() {
            return Err(SimError::SimulationEnded(outcome));
        }
        if clock.paused {
            return Err(SimError::Paused);
        }
        Ok(())
    }

    /// Run `act` against system `S` with a borrowed context
    fn with_context<S, T>(
        &mut self,
        act: impl FnOnce(&mut S, &mut SimContext<'_>) -> Result<T, SimError>,
    ) -> Result<T, SimError>
    where
        S: Resource,
    {
        let mut state: SystemState<Intent<S>> = SystemState::new(&mut self.world);
        let (mut system, mut ledger, mut population, mut rng, mut notes) =
            state.get_mut(&mut self.world);
        let mut ctx = SimContext::new(&mut ledger, &mut population, &mut rng.0, &mut notes);
        act(&mut *system, &mut ctx)
    }

    pub fn try_perform_ritual(&mut self, kind: RitualKind) -> Result<RitualReport, SimError> {
        self.accepting()?;
        self.with_context::<FaithSystem, _>(|faith, ctx| faith.perform_ritual(kind, ctx))
    }

    pub fn try_summon_entity(&mut self, kind: SummonKind) -> Result<SummonId, SimError> {
        self.accepting()?;
        self.with_context::<FaithSystem, _>(|faith, ctx| faith.summon_entity(kind, ctx))
    }

    pub fn try_use_ability(
        &mut self,
        kind: AbilityKind,
        x: f32,
        y: f32,
    ) -> Result<AbilityReport, SimError> {
        self.accepting()?;
        self.with_context::<CombatSystem, _>(|combat, ctx| combat.use_ability(kind, x, y, ctx))
    }

    pub fn try_modify_terrain(&mut self, kind: TerrainKind) -> Result<TerrainFeature, SimError> {
        self.accepting()?;
        self.with_context::<TerrainSystem, _>(|terrain, ctx| terrain.modify_terrain(kind, ctx))
    }

    /// Fire a world event right away, ignoring its gates and cooldown
    pub fn try_force_event(&mut self, kind: WorldEventKind) -> Result<(), SimError> {
        self.accepting()?;
        let now = self.clock().elapsed();
        self.with_context::<EventSystem, _>(|events, ctx| {
            events.force(kind, ctx, now);
            Ok(())
        })
    }

    /// Ritual by catalog key, e.g. `"sacrifice"`
    pub fn perform_ritual(&mut self, key: &str) -> bool {
        let result = key
            .parse()
            .and_then(|kind| self.try_perform_ritual(kind));
        report("ritual", key, result)
    }

    pub fn summon_entity(&mut self, key: &str) -> bool {
        let result = key.parse().and_then(|kind| self.try_summon_entity(kind));
        report("summon", key, result)
    }

    pub fn use_ability(&mut self, key: &str, x: f32, y: f32) -> bool {
        let result = key.parse().and_then(|kind| self.try_use_ability(kind, x, y));
        report("ability", key, result)
    }

    pub fn modify_terrain(&mut self, key: &str) -> bool {
        let result = key.parse().and_then(|kind| self.try_modify_terrain(kind));
        report("terrain", key, result)
    }

    pub fn force_event(&mut self, key: &str) -> bool {
        let result = key.parse().and_then(|kind| self.try_force_event(kind));
        report("event", key, result)
    }

    /// Debug helper: drop a handful of each population onto the island
    pub fn spawn_test_entities(&mut self) -> bool {
        use sandbox_constants::*;

        if let Err(e) = self.accepting() {
            return report("debug spawn", "test entities", Err::<(), _>(e));
        }
        let mut state: SystemState<(
            ResMut<PopulationRegistry>,
            ResMut<SimRng>,
            ResMut<Notifications>,
        )> = SystemState::new(&mut self.world);
        let (mut population, mut rng, mut notes) = state.get_mut(&mut self.world);
        for _ in 0..TEST_NATIVES {
            population.spawn_native(&mut rng.0, &mut notes);
        }
        for _ in 0..TEST_SETTLERS {
            population.spawn_settler(&mut rng.0, &mut notes);
        }
        population.spawn_invaders(TEST_INVADERS, &mut rng.0, &mut notes);
        info!("debug spawn: test entities placed");
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum Cadence {
    Frame,
    Tick,
}

fn report<T>(what: &str, key: &str, result: Result<T, SimError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            warn!("{} `{}` rejected: {}", what, key, e);
            false
        }
    }
}
