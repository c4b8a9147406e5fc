//! ECS Components and plain data
//!
//! Geometry, entities, the shared ledger and island-wide constants.

pub mod entity;
pub mod geometry;
pub mod ledger;
pub mod world;

pub use entity::{Body, Brain, Entity, EntityId, SummonId};
pub use geometry::{Rect, Vec2};
pub use ledger::{GameState, LedgerPatch, PopulationCounts};
pub use world::SacredArea;
