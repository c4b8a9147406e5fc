//! Small enums shared between the core and its observers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three populations living on (or attacking) the island
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationKind {
    Native,
    Settler,
    Invader,
}

impl PopulationKind {
    pub const ALL: [PopulationKind; 3] = [Self::Native, Self::Settler, Self::Invader];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Settler => "settler",
            Self::Invader => "invader",
        }
    }
}

impl fmt::Display for PopulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Victory,
    Defeat,
}

/// Why an entity left its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCause {
    /// Health or happiness ran out
    Slain,
    /// Offered up in a sacrifice ritual
    Sacrificed,
    /// Became a member of another population
    Converted,
    /// Walked off the edge of the map
    Retreated,
}
