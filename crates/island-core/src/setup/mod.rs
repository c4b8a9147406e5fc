//! World Setup
//!
//! Builds the ECS world and seeds the island's starting population.

pub mod island;

pub use island::*;
