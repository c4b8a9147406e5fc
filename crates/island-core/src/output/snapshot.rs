//! Snapshot Generation
//!
//! Captures the whole island into an [`island_events::WorldSnapshot`].

use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;

use island_events::{
    EntitySnapshot, EventRecordSnapshot, LedgerSnapshot, RitualSiteSnapshot, SacredAreaSnapshot,
    SummonSnapshot, TerrainSnapshot, WorldSnapshot,
};

use crate::components::{Entity, GameState};
use crate::systems::{EventSystem, FaithSystem, PopulationRegistry, SimulationClock, TerrainSystem};

/// Generate a complete world snapshot
pub fn generate_snapshot(world: &World) -> WorldSnapshot {
    let clock = world.resource::<SimulationClock>();
    let ledger = world.resource::<GameState>();
    let population = world.resource::<PopulationRegistry>();
    let faith = world.resource::<FaithSystem>();
    let terrain = world.resource::<TerrainSystem>();
    let events = world.resource::<EventSystem>();

    let counts = population.counts();

    WorldSnapshot {
        day: clock.day(),
        day_fraction: clock.day_fraction(),
        elapsed_secs: clock.elapsed(),
        paused: clock.paused,
        outcome: clock.outcome(),
        ledger: LedgerSnapshot {
            faith: ledger.faith(),
            mana: ledger.mana(),
            hearts: ledger.hearts(),
            natives: counts.natives,
            settlers: counts.settlers,
            invaders: counts.invaders,
        },
        entities: population.all().map(entity_snapshot).collect(),
        sacred_areas: population
            .sacred_areas()
            .iter()
            .map(|a| SacredAreaSnapshot {
                x: a.position.x,
                y: a.position.y,
                radius: a.radius,
            })
            .collect(),
        ritual_sites: faith
            .ritual_sites()
            .iter()
            .map(|s| RitualSiteSnapshot {
                x: s.position.x,
                y: s.position.y,
                active: s.active,
                ritual: s.ritual.map(|r| r.as_str().to_string()),
                time_remaining: s.time_remaining,
            })
            .collect(),
        summons: faith
            .summons()
            .iter()
            .map(|s| SummonSnapshot {
                id: s.id.0,
                summon: s.kind.as_str().to_string(),
                x: s.position.x,
                y: s.position.y,
                time_remaining: s.time_remaining,
            })
            .collect(),
        terrain: terrain
            .features()
            .iter()
            .map(|f| TerrainSnapshot {
                terrain: f.kind.as_str().to_string(),
                x: f.position.x,
                y: f.position.y,
            })
            .collect(),
        event_history: events
            .history()
            .iter()
            .map(|r| EventRecordSnapshot {
                key: r.key.to_string(),
                name: r.name.to_string(),
                time: r.time,
            })
            .collect(),
    }
}

fn entity_snapshot(entity: &Entity) -> EntitySnapshot {
    let pos = entity.position();
    EntitySnapshot {
        id: entity.id().0,
        kind: entity.kind,
        x: pos.x,
        y: pos.y,
        state: entity.brain.state_name().to_string(),
        state_timer: entity.brain.state_timer(),
        speed: entity.body.speed,
        health: entity.health,
        happiness: entity.happiness,
        faith: entity.faith,
        is_true_believer: entity.is_true_believer,
    }
}

/// Write a snapshot as pretty JSON
pub fn write_snapshot(snapshot: &WorldSnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::setup::build_world;

    #[test]
    fn test_snapshot_counts_match_entities() {
        let world = build_world(&SimConfig::default());
        let snapshot = generate_snapshot(&world);
        assert_eq!(snapshot.ledger.natives, 10);
        assert_eq!(snapshot.entities.len(), 10);
        assert_eq!(snapshot.sacred_areas.len(), 2);
        assert_eq!(snapshot.day, 0);
        assert!(snapshot.outcome.is_none());
        assert!(snapshot.entities.iter().all(|e| e.state == "idle"));
    }

    #[test]
    fn test_write_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("final.json");
        let world = build_world(&SimConfig::default());
        write_snapshot(&generate_snapshot(&world), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let back: WorldSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back.entities.len(), 10);
    }
}
