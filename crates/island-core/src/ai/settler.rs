//! Settler Behavior
//!
//! Settlers land at the map edge, walk inland, explore and sometimes settle.
//! Gifts from active rituals and blessings wear them down until they convert.

use rand::Rng;

use super::{first_within, occurs, Fsm, StateKind, WorldView};
use crate::components::world::{ISLAND_CENTER, ISLAND_INTERIOR, OPEN_GROUND};
use crate::components::{Body, EntityId, Vec2};

pub const SETTLER_SPEED: f32 = 25.0;

/// Settler tuning
pub mod settler_constants {
    pub const LANDFALL_SQ: f32 = 2_500.0;
    pub const ARRIVAL_SQ: f32 = 25.0;

    pub const EXPLORE_REPICK_CHANCE: f32 = 0.7;
    pub const EXPLORE_REPICK_SECS: f32 = 30.0;
    pub const SETTLE_CHANCE: f32 = 0.3;

    pub const SETTLE_ATTEMPTS: usize = 10;
    pub const SETTLE_SPACING_SQ: f32 = 2_500.0;
    pub const SETTLE_MIN_SECS: f32 = 10.0;

    pub const THREAT_RADIUS: f32 = 70.0;
    pub const FLEE_CLEAR_SQ: f32 = 40_000.0;
    pub const FLEE_STEP: f32 = 100.0;
    pub const FLEE_SPEED_MULTIPLIER: f32 = 1.5;
    pub const FLEE_MAX_SECS: f32 = 7.0;

    pub const RITUAL_ATTRACTION_RADIUS: f32 = 50.0;
    /// Per-second chance of wandering into a blessing's gifts
    pub const BLESSING_GIFT_RATE: f32 = 0.01;
    /// One 0.5s glow, there and back
    pub const RECEIVE_SECS: f32 = 1.0;
    pub const RECEIVE_MAX_SECS: f32 = 3.0;
    pub const CONVERSION_THRESHOLD: u32 = 3;
}

use settler_constants::*;

#[derive(Debug, Clone, PartialEq)]
pub enum SettlerState {
    Approaching,
    Exploring { destination: Vec2 },
    Settling { spot: Option<Vec2> },
    Fleeing { threat: EntityId },
    Receiving { progress: f32 },
}

impl SettlerState {
    pub fn exploring<R: Rng>(rng: &mut R) -> Self {
        SettlerState::Exploring {
            destination: ISLAND_INTERIOR.random_point(rng),
        }
    }
}

impl StateKind for SettlerState {
    fn name(&self) -> &'static str {
        match self {
            SettlerState::Approaching => "approaching",
            SettlerState::Exploring { .. } => "exploring",
            SettlerState::Settling { .. } => "settling",
            SettlerState::Fleeing { .. } => "fleeing",
            SettlerState::Receiving { .. } => "receiving",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlerOutcome {
    /// Enough gifts received; the registry should turn this settler into a native
    ReadyToConvert,
}

#[derive(Debug, Clone)]
pub struct SettlerAi {
    fsm: Fsm<SettlerState>,
    gifts_received: u32,
}

impl Default for SettlerAi {
    fn default() -> Self {
        Self::new()
    }
}

impl SettlerAi {
    pub fn new() -> Self {
        Self::with_state(SettlerState::Approaching)
    }

    pub fn with_state(state: SettlerState) -> Self {
        Self {
            fsm: Fsm::new(state),
            gifts_received: 0,
        }
    }

    pub fn state(&self) -> &SettlerState {
        self.fsm.state()
    }

    pub fn state_timer(&self) -> f32 {
        self.fsm.timer()
    }

    pub fn gifts_received(&self) -> u32 {
        self.gifts_received
    }

    pub fn update<R: Rng>(
        &mut self,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) -> Option<SettlerOutcome> {
        self.fsm.advance(dt);
        match self.fsm.state().clone() {
            SettlerState::Approaching => {
                body.position.step_toward(ISLAND_CENTER, body.speed, dt);
                if body.position.distance_sq(ISLAND_CENTER) < LANDFALL_SQ {
                    self.fsm.transition_to(SettlerState::exploring(rng));
                    return None;
                }
                self.check_threats(body, view);
                None
            }
            SettlerState::Exploring { destination } => {
                self.update_exploring(destination, body, view, rng, dt);
                None
            }
            SettlerState::Settling { spot } => {
                self.update_settling(spot, body, view, rng, dt);
                None
            }
            SettlerState::Fleeing { threat } => {
                self.update_fleeing(threat, body, view, rng, dt);
                None
            }
            SettlerState::Receiving { progress } => self.update_receiving(progress, rng, dt),
        }
    }

    /// Returns true if the settler started fleeing
    fn check_threats(&mut self, body: &Body, view: &WorldView) -> bool {
        match first_within(&view.invaders, body.position, THREAT_RADIUS) {
            Some(threat) => {
                self.fsm
                    .transition_to(SettlerState::Fleeing { threat: threat.id });
                true
            }
            None => false,
        }
    }

    /// Returns true if the settler started receiving gifts
    fn check_blessings<R: Rng>(
        &mut self,
        body: &Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) -> bool {
        let near_ritual = view
            .economy
            .active_ritual_sites
            .iter()
            .any(|site| body.position.within(*site, RITUAL_ATTRACTION_RADIUS));
        let blessed = view.economy.blessing_active && occurs(rng, BLESSING_GIFT_RATE, dt);
        if near_ritual || blessed {
            self.fsm
                .transition_to(SettlerState::Receiving { progress: 0.0 });
            return true;
        }
        false
    }

    fn update_exploring<R: Rng>(
        &mut self,
        destination: Vec2,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        body.position.step_toward(destination, body.speed, dt);
        if body.position.distance_sq(destination) < ARRIVAL_SQ {
            if self.fsm.timer() < EXPLORE_REPICK_SECS
                && rng.gen::<f32>() < EXPLORE_REPICK_CHANCE
            {
                *self.fsm.state_mut() = SettlerState::exploring(rng);
            } else if rng.gen::<f32>() < SETTLE_CHANCE {
                self.fsm.transition_to(SettlerState::Settling { spot: None });
                return;
            } else {
                *self.fsm.state_mut() = SettlerState::exploring(rng);
            }
        }

        if self.check_threats(body, view) {
            return;
        }
        self.check_blessings(body, view, rng, dt);
    }

    fn update_settling<R: Rng>(
        &mut self,
        spot: Option<Vec2>,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        let spot = match spot {
            Some(spot) => spot,
            None => match find_settlement_spot(body.id, view, rng) {
                Some(spot) => {
                    *self.fsm.state_mut() = SettlerState::Settling { spot: Some(spot) };
                    spot
                }
                None => {
                    self.fsm.transition_to(SettlerState::exploring(rng));
                    return;
                }
            },
        };

        body.position.step_toward(spot, body.speed, dt);
        if body.position.distance_sq(spot) < ARRIVAL_SQ && self.fsm.timer() > SETTLE_MIN_SECS {
            self.fsm.transition_to(SettlerState::exploring(rng));
            return;
        }
        self.check_threats(body, view);
    }

    fn update_fleeing<R: Rng>(
        &mut self,
        threat: EntityId,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        let Some(threat_pos) = view.invader(threat) else {
            self.fsm.transition_to(SettlerState::exploring(rng));
            return;
        };
        if body.position.distance_sq(threat_pos) >= FLEE_CLEAR_SQ {
            self.fsm.transition_to(SettlerState::exploring(rng));
            return;
        }

        if let Some(refuge) = body.position.away_from(threat_pos, FLEE_STEP) {
            let refuge = OPEN_GROUND.clamp(refuge);
            body.position
                .step_toward(refuge, body.speed * FLEE_SPEED_MULTIPLIER, dt);
        }

        if self.fsm.timer() > FLEE_MAX_SECS {
            self.fsm.transition_to(SettlerState::exploring(rng));
        }
    }

    fn update_receiving<R: Rng>(
        &mut self,
        progress: f32,
        rng: &mut R,
        dt: f32,
    ) -> Option<SettlerOutcome> {
        let progress = progress + dt;
        if progress >= RECEIVE_SECS {
            self.gifts_received += 1;
            tracing::debug!(gifts = self.gifts_received, "settler received a gift");
            if self.gifts_received >= CONVERSION_THRESHOLD {
                return Some(SettlerOutcome::ReadyToConvert);
            }
            self.fsm.transition_to(SettlerState::exploring(rng));
            return None;
        }
        *self.fsm.state_mut() = SettlerState::Receiving { progress };

        if self.fsm.timer() > RECEIVE_MAX_SECS {
            self.fsm.transition_to(SettlerState::exploring(rng));
        }
        None
    }
}

/// A spot on the island at least 50px from every native and every other settler
pub fn find_settlement_spot<R: Rng>(me: EntityId, view: &WorldView, rng: &mut R) -> Option<Vec2> {
    (0..SETTLE_ATTEMPTS)
        .map(|_| ISLAND_INTERIOR.random_point(rng))
        .find(|candidate| {
            let clear_of_natives = view
                .natives
                .iter()
                .all(|n| candidate.distance_sq(n.position) >= SETTLE_SPACING_SQ);
            let clear_of_settlers = view
                .settlers
                .iter()
                .filter(|s| s.id != me)
                .all(|s| candidate.distance_sq(s.position) >= SETTLE_SPACING_SQ);
            clear_of_natives && clear_of_settlers
        })
}
