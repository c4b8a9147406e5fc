//! Invader Behavior
//!
//! Invaders land, raid whoever they can find, attack, and eventually retreat
//! off the map. Defender and demon summons can scare them off.

use rand::Rng;

use super::{occurs, Fsm, Sighting, StateKind, WorldView};
use crate::components::geometry::nearest;
use crate::components::world::{
    ISLAND_CENTER, NATIVE_RANGE, OPEN_GROUND, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use crate::components::{Body, EntityId, SummonId, Vec2};
use crate::systems::economy::SummonKind;

pub const INVADER_SPEED: f32 = 40.0;

/// Invader tuning
pub mod invader_constants {
    pub const LANDFALL_SQ: f32 = 2_500.0;
    pub const ARRIVAL_SQ: f32 = 25.0;

    pub const ENGAGE_SQ: f32 = 400.0;
    pub const STRIKE_SQ: f32 = 100.0;
    pub const DISENGAGE_SQ: f32 = 2_500.0;
    pub const ATTACK_MAX_SECS: f32 = 10.0;

    pub const RAID_RETREAT_AFTER_SECS: f32 = 30.0;
    /// Per-second chance of giving up once the raid drags on
    pub const RAID_RETREAT_RATE: f32 = 0.05;

    pub const EXIT_SQ: f32 = 100.0;

    pub const SUMMON_DREAD_RADIUS: f32 = 100.0;
    pub const DEFENDER_FEAR_CHANCE: f32 = 0.3;
    pub const DEMON_FEAR_CHANCE: f32 = 0.7;

    pub const SCARED_RUN: f32 = 300.0;
    pub const SCARED_CLEAR_SQ: f32 = 40_000.0;
    pub const SCARED_MAX_SECS: f32 = 5.0;
}

use invader_constants::*;

#[derive(Debug, Clone, PartialEq)]
pub enum InvaderState {
    Approaching,
    Raiding {
        destination: Option<Vec2>,
    },
    /// `struck` flips once when the invader first closes to striking range
    Attacking {
        target: EntityId,
        struck: bool,
    },
    Retreating {
        exit: Option<Vec2>,
    },
    Scared {
        source: Option<SummonId>,
        refuge: Option<Vec2>,
    },
}

impl StateKind for InvaderState {
    fn name(&self) -> &'static str {
        match self {
            InvaderState::Approaching => "approaching",
            InvaderState::Raiding { .. } => "raiding",
            InvaderState::Attacking { .. } => "attacking",
            InvaderState::Retreating { .. } => "retreating",
            InvaderState::Scared { .. } => "scared",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvaderOutcome {
    /// Walked off the map; remove this invader
    ReachedEdge,
}

#[derive(Debug, Clone)]
pub struct InvaderAi {
    fsm: Fsm<InvaderState>,
    approach_target: Vec2,
    fear_factor: f32,
}

impl Default for InvaderAi {
    fn default() -> Self {
        Self::new()
    }
}

impl InvaderAi {
    pub fn new() -> Self {
        Self::with_state(InvaderState::Approaching)
    }

    pub fn with_state(state: InvaderState) -> Self {
        Self {
            fsm: Fsm::new(state),
            approach_target: ISLAND_CENTER,
            fear_factor: 1.0,
        }
    }

    /// Land somewhere other than the island center
    pub fn with_target(mut self, target: Vec2) -> Self {
        self.approach_target = target;
        self
    }

    pub fn state(&self) -> &InvaderState {
        self.fsm.state()
    }

    pub fn state_timer(&self) -> f32 {
        self.fsm.timer()
    }

    pub fn fear_factor(&self) -> f32 {
        self.fear_factor
    }

    /// True on the frame range is first closed on the current target
    pub fn has_struck(&self) -> bool {
        matches!(self.fsm.state(), InvaderState::Attacking { struck: true, .. })
    }

    /// Slow the invader and send it running from `source`. The registry
    /// schedules [`InvaderAi::calm`] for when the fear wears off. Without a
    /// source the invader bolts for the nearest edge until the scare times out.
    pub fn frighten(&mut self, factor: f32, source: Option<SummonId>) {
        self.fear_factor = factor;
        if !matches!(self.fsm.state(), InvaderState::Scared { .. }) {
            self.fsm.transition_to(InvaderState::Scared {
                source,
                refuge: None,
            });
        }
    }

    pub fn calm(&mut self) {
        self.fear_factor = 1.0;
    }

    pub fn update<R: Rng>(
        &mut self,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) -> Option<InvaderOutcome> {
        self.fsm.advance(dt);
        match self.fsm.state().clone() {
            InvaderState::Approaching => {
                body.position.step_toward(self.approach_target, body.speed, dt);
                if body.position.distance_sq(self.approach_target) < LANDFALL_SQ {
                    self.fsm
                        .transition_to(InvaderState::Raiding { destination: None });
                    return None;
                }
                self.check_for_defenders(body, view, rng);
                None
            }
            InvaderState::Raiding { destination } => {
                self.update_raiding(destination, body, view, rng, dt);
                None
            }
            InvaderState::Attacking { target, struck } => {
                self.update_attacking(target, struck, body, view, rng, dt);
                None
            }
            InvaderState::Retreating { exit } => self.update_retreating(exit, body, rng, dt),
            InvaderState::Scared { source, refuge } => {
                self.update_scared(source, refuge, body, view, rng, dt);
                None
            }
        }
    }

    /// Returns true if a nearby summon scared the invader
    fn check_for_defenders<R: Rng>(
        &mut self,
        body: &Body,
        view: &WorldView,
        rng: &mut R,
    ) -> bool {
        for summon in &view.economy.summons {
            let chance = match summon.kind {
                SummonKind::Defender => DEFENDER_FEAR_CHANCE,
                SummonKind::Demon => DEMON_FEAR_CHANCE,
                SummonKind::Shadow => continue,
            };
            if body.position.within(summon.position, SUMMON_DREAD_RADIUS)
                && rng.gen::<f32>() < chance
            {
                self.fsm.transition_to(InvaderState::Scared {
                    source: Some(summon.id),
                    refuge: None,
                });
                return true;
            }
        }
        false
    }

    fn update_raiding<R: Rng>(
        &mut self,
        destination: Option<Vec2>,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        let prey = view
            .natives
            .iter()
            .chain(view.settlers.iter())
            .map(|s| (*s, s.position));
        match nearest(body.position, prey) {
            Some((Sighting { id: target, position: target_pos }, _)) => {
                body.position.step_toward(target_pos, body.speed, dt);
                if body.position.distance_sq(target_pos) < ENGAGE_SQ {
                    self.fsm.transition_to(InvaderState::Attacking {
                        target,
                        struck: false,
                    });
                    return;
                }
            }
            None => {
                let destination = match destination {
                    Some(d) if body.position.distance_sq(d) >= ARRIVAL_SQ => d,
                    _ => NATIVE_RANGE.random_point(rng),
                };
                *self.fsm.state_mut() = InvaderState::Raiding {
                    destination: Some(destination),
                };
                body.position.step_toward(destination, body.speed, dt);
            }
        }

        if self.check_for_defenders(body, view, rng) {
            return;
        }

        if self.fsm.timer() > RAID_RETREAT_AFTER_SECS && occurs(rng, RAID_RETREAT_RATE, dt) {
            tracing::debug!(invader = %body.id, "raid abandoned");
            self.fsm.transition_to(InvaderState::Retreating { exit: None });
        }
    }

    fn update_attacking<R: Rng>(
        &mut self,
        target: EntityId,
        struck: bool,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        let Some(target_pos) = view.prey(target) else {
            self.fsm
                .transition_to(InvaderState::Raiding { destination: None });
            return;
        };

        body.position.step_toward(target_pos, body.speed, dt);
        let dist_sq = body.position.distance_sq(target_pos);
        if dist_sq < STRIKE_SQ && !struck {
            *self.fsm.state_mut() = InvaderState::Attacking {
                target,
                struck: true,
            };
        } else if dist_sq > DISENGAGE_SQ {
            self.fsm
                .transition_to(InvaderState::Raiding { destination: None });
            return;
        }

        if self.check_for_defenders(body, view, rng) {
            return;
        }

        if self.fsm.timer() > ATTACK_MAX_SECS {
            self.fsm
                .transition_to(InvaderState::Raiding { destination: None });
        }
    }

    fn update_retreating<R: Rng>(
        &mut self,
        exit: Option<Vec2>,
        body: &mut Body,
        rng: &mut R,
        dt: f32,
    ) -> Option<InvaderOutcome> {
        let exit = exit.unwrap_or_else(|| nearest_exit(body.position, rng));
        *self.fsm.state_mut() = InvaderState::Retreating { exit: Some(exit) };

        body.position.step_toward(exit, body.speed, dt);
        if body.position.distance_sq(exit) < EXIT_SQ {
            return Some(InvaderOutcome::ReachedEdge);
        }
        None
    }

    fn update_scared<R: Rng>(
        &mut self,
        source: Option<SummonId>,
        refuge: Option<Vec2>,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        let source_pos = source.and_then(|id| view.summon(id));
        let refuge = refuge.unwrap_or_else(|| {
            source_pos
                .and_then(|s| body.position.away_from(s, SCARED_RUN))
                .map(|p| OPEN_GROUND.clamp(p))
                .unwrap_or_else(|| nearest_exit(body.position, rng))
        });
        *self.fsm.state_mut() = InvaderState::Scared {
            source,
            refuge: Some(refuge),
        };

        body.position
            .step_toward(refuge, body.speed * self.fear_factor, dt);

        let safe = match (source, source_pos) {
            (Some(_), Some(s)) => body.position.distance_sq(s) > SCARED_CLEAR_SQ,
            // The summon it fled from is gone
            (Some(_), None) => true,
            (None, _) => false,
        };
        if safe || self.fsm.timer() > SCARED_MAX_SECS {
            self.fsm.transition_to(InvaderState::Approaching);
        }
    }
}

/// Closest of four randomized points, one on each screen edge
pub fn nearest_exit<R: Rng>(from: Vec2, rng: &mut R) -> Vec2 {
    let exits = [
        Vec2::new(0.0, rng.gen_range(100.0..=500.0)),
        Vec2::new(SCREEN_WIDTH, rng.gen_range(100.0..=500.0)),
        Vec2::new(rng.gen_range(100.0..=700.0), 0.0),
        Vec2::new(rng.gen_range(100.0..=700.0), SCREEN_HEIGHT),
    ];
    nearest(from, exits.into_iter().map(|e| (e, e)))
        .map(|(exit, _)| exit)
        .unwrap_or(exits[0])
}
