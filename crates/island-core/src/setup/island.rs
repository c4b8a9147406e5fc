//! Island Setup
//!
//! Inserts every simulation resource and places the starting natives,
//! settlers and sacred areas.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::components::{GameState, Vec2};
use crate::config::{InitialConfig, SimConfig};
use crate::events::Notifications;
use crate::systems::{
    CombatSystem, DeltaTime, EventSystem, FaithSystem, PopulationRegistry, SimulationClock,
    TerrainSystem,
};
use crate::SimRng;

/// What the island started with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSummary {
    pub natives: usize,
    pub settlers: usize,
    pub sacred_areas: usize,
}

/// A fresh world for `config`, population included
pub fn build_world(config: &SimConfig) -> World {
    let mut world = World::new();

    let mut rng = SmallRng::seed_from_u64(config.simulation.seed);
    let mut notes = Notifications::new();
    let mut population = PopulationRegistry::new();
    seed_population(&mut population, &config.initial, &mut rng, &mut notes);

    world.insert_resource(GameState::new(
        config.initial.faith,
        config.initial.mana,
        config.initial.hearts,
    ));
    world.insert_resource(population);
    world.insert_resource(FaithSystem::new());
    world.insert_resource(CombatSystem::new());
    world.insert_resource(EventSystem::new());
    world.insert_resource(TerrainSystem::new());
    world.insert_resource(SimulationClock::new(
        config.day_cycle.day_length_secs,
        config.simulation.game_speed,
        config.simulation.sandbox,
    ));
    world.insert_resource(notes);
    world.insert_resource(SimRng(rng));
    world.insert_resource(DeltaTime::default());
    world.insert_resource(config.clone());

    world
}

/// Consecrate the starting sacred areas and spawn the starting population
pub fn seed_population(
    population: &mut PopulationRegistry,
    initial: &InitialConfig,
    rng: &mut SmallRng,
    notes: &mut Notifications,
) -> SpawnSummary {
    for &[x, y] in &initial.sacred_areas {
        population.create_sacred_area(Vec2::new(x, y));
    }
    for _ in 0..initial.natives {
        population.spawn_native(rng, notes);
    }
    for _ in 0..initial.settlers {
        population.spawn_settler(rng, notes);
    }

    let summary = SpawnSummary {
        natives: initial.natives,
        settlers: initial.settlers,
        sacred_areas: initial.sacred_areas.len(),
    };
    tracing::debug!(?summary, "island seeded");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use island_events::PopulationKind;

    #[test]
    fn test_default_island() {
        let world = build_world(&SimConfig::default());
        let population = world.resource::<PopulationRegistry>();
        assert_eq!(population.count(PopulationKind::Native), 10);
        assert_eq!(population.count(PopulationKind::Settler), 0);
        assert_eq!(population.sacred_areas().len(), 2);

        let ledger = world.resource::<GameState>();
        assert_eq!(ledger.faith(), 50.0);
        assert_eq!(ledger.mana(), 30.0);

        // Renderers hear about the starting population too
        assert_eq!(world.resource::<Notifications>().len(), 10);
    }

    #[test]
    fn test_seed_population_with_settlers() {
        let mut population = PopulationRegistry::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut notes = Notifications::new();
        let initial = InitialConfig {
            natives: 2,
            settlers: 3,
            sacred_areas: Vec::new(),
            ..InitialConfig::default()
        };
        let summary = seed_population(&mut population, &initial, &mut rng, &mut notes);
        assert_eq!(summary.settlers, 3);
        assert_eq!(population.counts().settlers, 3);
        assert_eq!(population.counts().natives, 2);
        assert!(population.sacred_areas().is_empty());
    }
}
