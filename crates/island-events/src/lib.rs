//! Shared notification and snapshot types for the island simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! The simulation core emits these and hosts (renderers, loggers, UIs) consume them.

pub mod kinds;
pub mod notification;
pub mod snapshot;

pub use kinds::{GameOutcome, PopulationKind, RemovalCause};
pub use notification::{GameEvent, LifecycleEvent, Notification};
pub use snapshot::{
    EntitySnapshot, EventRecordSnapshot, LedgerSnapshot, RitualSiteSnapshot, SacredAreaSnapshot,
    SummonSnapshot, TerrainSnapshot, WorldSnapshot,
};
