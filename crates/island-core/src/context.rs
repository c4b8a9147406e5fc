//! Simulation context
//!
//! The mutable state every god action and world event needs, borrowed for the
//! length of one operation.

use rand::rngs::SmallRng;

use crate::components::GameState;
use crate::events::Notifications;
use crate::systems::population::PopulationRegistry;

pub struct SimContext<'a> {
    pub ledger: &'a mut GameState,
    pub population: &'a mut PopulationRegistry,
    pub rng: &'a mut SmallRng,
    pub notifications: &'a mut Notifications,
}

impl<'a> SimContext<'a> {
    pub fn new(
        ledger: &'a mut GameState,
        population: &'a mut PopulationRegistry,
        rng: &'a mut SmallRng,
        notifications: &'a mut Notifications,
    ) -> Self {
        Self {
            ledger,
            population,
            rng,
            notifications,
        }
    }
}
