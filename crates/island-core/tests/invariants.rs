//! Property tests: whatever the player does, the ledger stays in range and
//! population counts match the live collections.

use proptest::prelude::*;

use island_core::{
    AbilityKind, RitualKind, SimConfig, Simulation, SummonKind, TerrainKind, WorldEventKind,
};
use island_events::PopulationKind;

#[derive(Debug, Clone)]
enum Op {
    Frame(f32),
    Tick(f32),
    Ritual(usize),
    Summon(usize),
    Ability(usize, f32, f32),
    Terrain(usize),
    Event(usize),
    Pause,
    Resume,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0.0f32..0.5).prop_map(Op::Frame),
        2 => (0.0f32..30.0).prop_map(Op::Tick),
        1 => (0usize..3).prop_map(Op::Ritual),
        1 => (0usize..3).prop_map(Op::Summon),
        1 => ((0usize..3), 0.0f32..800.0, 0.0f32..600.0)
            .prop_map(|(k, x, y)| Op::Ability(k, x, y)),
        1 => (0usize..4).prop_map(Op::Terrain),
        1 => (0usize..6).prop_map(Op::Event),
        1 => Just(Op::Pause),
        1 => Just(Op::Resume),
    ]
}

fn apply(sim: &mut Simulation, op: &Op) {
    match *op {
        Op::Frame(dt) => sim.frame(dt),
        Op::Tick(secs) => sim.tick(secs),
        Op::Ritual(i) => {
            let _ = sim.try_perform_ritual(RitualKind::ALL[i]);
        }
        Op::Summon(i) => {
            let _ = sim.try_summon_entity(SummonKind::ALL[i]);
        }
        Op::Ability(i, x, y) => {
            let _ = sim.try_use_ability(AbilityKind::ALL[i], x, y);
        }
        Op::Terrain(i) => {
            let _ = sim.try_modify_terrain(TerrainKind::ALL[i]);
        }
        Op::Event(i) => {
            let _ = sim.try_force_event(WorldEventKind::ALL[i]);
        }
        Op::Pause => sim.pause(),
        Op::Resume => sim.resume(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn ledger_and_counts_hold(
        seed in any::<u64>(),
        settlers in 0usize..6,
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut config = SimConfig::default();
        config.simulation.seed = seed;
        config.simulation.sandbox = true;
        config.initial.settlers = settlers;
        config.day_cycle.day_length_secs = 20.0;
        let mut sim = Simulation::new(config);

        for op in &ops {
            apply(&mut sim, op);

            let ledger = sim.ledger();
            prop_assert!(
                (0.0..=100.0).contains(&ledger.faith()),
                "faith {} after {:?}",
                ledger.faith(),
                op
            );
            prop_assert!(
                (0.0..=100.0).contains(&ledger.mana()),
                "mana {} after {:?}",
                ledger.mana(),
                op
            );

            let snapshot = sim.snapshot();
            for kind in PopulationKind::ALL {
                let live = snapshot.entities.iter().filter(|e| e.kind == kind).count();
                prop_assert_eq!(live, sim.population().count(kind));
            }
            prop_assert_eq!(
                snapshot.ledger.natives + snapshot.ledger.settlers + snapshot.ledger.invaders,
                snapshot.entities.len()
            );
            for entity in &snapshot.entities {
                prop_assert!((0.0..=100.0).contains(&entity.happiness));
            }
        }
    }

    #[test]
    fn removal_is_idempotent(seed in any::<u64>()) {
        use island_core::events::Notifications;
        use island_core::systems::PopulationRegistry;
        use island_events::RemovalCause;
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let mut rng = SmallRng::seed_from_u64(seed);
        let mut notes = Notifications::new();
        let mut population = PopulationRegistry::new();
        let ids = population.spawn_invaders(3, &mut rng, &mut notes);

        let target = ids[1];
        prop_assert!(population.remove_entity(
            PopulationKind::Invader,
            target,
            RemovalCause::Retreated,
            &mut notes
        ));
        prop_assert!(!population.remove_entity(
            PopulationKind::Invader,
            target,
            RemovalCause::Retreated,
            &mut notes
        ));
        prop_assert_eq!(population.count(PopulationKind::Invader), 2);
    }
}
