//! World Snapshot
//!
//! Point-in-time view of the whole island, for renderers and for run reports.

use serde::{Deserialize, Serialize};

use crate::kinds::{GameOutcome, PopulationKind};

/// Complete serializable state of a running simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub day: u32,
    /// Position within the current day, in [0, 1)
    pub day_fraction: f32,
    pub elapsed_secs: f64,
    pub paused: bool,
    pub outcome: Option<GameOutcome>,
    pub ledger: LedgerSnapshot,
    pub entities: Vec<EntitySnapshot>,
    pub sacred_areas: Vec<SacredAreaSnapshot>,
    pub ritual_sites: Vec<RitualSiteSnapshot>,
    pub summons: Vec<SummonSnapshot>,
    pub terrain: Vec<TerrainSnapshot>,
    pub event_history: Vec<EventRecordSnapshot>,
}

/// Shared resources plus population counts derived from the live collections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub faith: f32,
    pub mana: f32,
    pub hearts: u32,
    pub natives: usize,
    pub settlers: usize,
    pub invaders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u64,
    pub kind: PopulationKind,
    pub x: f32,
    pub y: f32,
    pub state: String,
    pub state_timer: f32,
    pub speed: f32,
    pub health: Option<f32>,
    pub happiness: f32,
    pub faith: f32,
    pub is_true_believer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SacredAreaSnapshot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualSiteSnapshot {
    pub x: f32,
    pub y: f32,
    pub active: bool,
    pub ritual: Option<String>,
    pub time_remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummonSnapshot {
    pub id: u64,
    #[serde(rename = "type")]
    pub summon: String,
    pub x: f32,
    pub y: f32,
    pub time_remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    #[serde(rename = "type")]
    pub terrain: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecordSnapshot {
    pub key: String,
    pub name: String,
    pub time: f64,
}
