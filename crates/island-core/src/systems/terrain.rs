//! Terrain shaping
//!
//! The god can raise features anywhere in the island interior. Mountains are
//! also holy ground.

use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use tracing::info;

use island_events::GameEvent;

use crate::components::world::ISLAND_INTERIOR;
use crate::components::Vec2;
use crate::context::SimContext;
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    Mountain,
    Forest,
    Volcano,
    Barrier,
}

#[derive(Debug)]
pub struct TerrainDef {
    pub key: &'static str,
    pub name: &'static str,
    pub mana_cost: f32,
    /// Whether the feature doubles as a sacred area
    pub consecrates: bool,
}

static TERRAIN: [TerrainDef; 4] = [
    TerrainDef {
        key: "mountain",
        name: "Mountain",
        mana_cost: 20.0,
        consecrates: true,
    },
    TerrainDef {
        key: "forest",
        name: "Forest",
        mana_cost: 20.0,
        consecrates: false,
    },
    TerrainDef {
        key: "volcano",
        name: "Volcano",
        mana_cost: 20.0,
        consecrates: false,
    },
    TerrainDef {
        key: "barrier",
        name: "Barrier",
        mana_cost: 20.0,
        consecrates: false,
    },
];

impl TerrainKind {
    pub const ALL: [TerrainKind; 4] = [Self::Mountain, Self::Forest, Self::Volcano, Self::Barrier];

    pub fn definition(self) -> &'static TerrainDef {
        &TERRAIN[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.definition().key
    }
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for TerrainKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SimError::unknown("terrain", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainFeature {
    pub kind: TerrainKind,
    pub position: Vec2,
}

#[derive(Resource, Debug, Default)]
pub struct TerrainSystem {
    features: Vec<TerrainFeature>,
}

impl TerrainSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn features(&self) -> &[TerrainFeature] {
        &self.features
    }

    pub fn modify_terrain(
        &mut self,
        kind: TerrainKind,
        ctx: &mut SimContext<'_>,
    ) -> Result<TerrainFeature, SimError> {
        let def = kind.definition();
        ctx.ledger.spend_mana(def.mana_cost)?;

        let position = ISLAND_INTERIOR.random_point(ctx.rng);
        let feature = TerrainFeature { kind, position };
        self.features.push(feature);
        if def.consecrates {
            ctx.population.create_sacred_area(position);
        }

        info!("{} raised at ({:.0}, {:.0})", kind, position.x, position.y);
        ctx.notifications.emit(GameEvent::TerrainModified {
            terrain: def.key.to_string(),
        });
        Ok(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::GameState;
    use crate::events::Notifications;
    use crate::systems::population::PopulationRegistry;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_mountain_consecrates_ground() {
        let mut ledger = GameState::new(50.0, 30.0, 0);
        let mut population = PopulationRegistry::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut notes = Notifications::new();
        let mut terrain = TerrainSystem::new();

        let feature = terrain
            .modify_terrain(
                TerrainKind::Mountain,
                &mut SimContext::new(&mut ledger, &mut population, &mut rng, &mut notes),
            )
            .unwrap();

        assert!(ISLAND_INTERIOR.contains(feature.position));
        assert_eq!(ledger.mana(), 10.0);
        assert_eq!(population.sacred_areas().len(), 1);
        assert_eq!(population.sacred_areas()[0].position, feature.position);
        assert!(notes.game_events().any(|e| *e
            == GameEvent::TerrainModified {
                terrain: "mountain".to_string()
            }));

        let err = terrain
            .modify_terrain(
                TerrainKind::Forest,
                &mut SimContext::new(&mut ledger, &mut population, &mut rng, &mut notes),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientMana { .. }));
        assert_eq!(terrain.features().len(), 1);
    }

    #[test]
    fn test_forest_is_not_holy() {
        let mut ledger = GameState::new(50.0, 30.0, 0);
        let mut population = PopulationRegistry::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut notes = Notifications::new();
        let mut terrain = TerrainSystem::new();
        terrain
            .modify_terrain(
                "forest".parse().unwrap(),
                &mut SimContext::new(&mut ledger, &mut population, &mut rng, &mut notes),
            )
            .unwrap();
        assert!(population.sacred_areas().is_empty());
        assert!("swamp".parse::<TerrainKind>().is_err());
    }
}
