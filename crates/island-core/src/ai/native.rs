//! Native Behavior
//!
//! Natives idle, worship at sacred areas, wander their range, flee nearby
//! invaders and occasionally build new sacred areas.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{first_within, Fsm, StateKind, WorldView};
use crate::components::world::{HEARTLAND, ISLAND_INTERIOR, NATIVE_RANGE};
use crate::components::{Body, EntityId, Vec2};

pub const NATIVE_SPEED: f32 = 30.0;

/// Native tuning
pub mod native_constants {
    pub const IDLE_MIN_SECS: f32 = 2.0;
    pub const IDLE_MAX_SECS: f32 = 6.0;

    /// Idle roll below this worships (when there is somewhere to worship)
    pub const WORSHIP_ROLL: f32 = 0.6;
    /// Idle roll below this (and above worship) wanders; the rest build
    pub const WANDER_ROLL: f32 = 0.9;

    pub const WORSHIP_ARRIVAL_SQ: f32 = 100.0;
    pub const WORSHIP_MIN_SECS: f32 = 10.0;

    pub const ARRIVAL_SQ: f32 = 25.0;
    pub const WANDER_REPICK_CHANCE: f32 = 0.7;
    pub const WANDER_REPICK_SECS: f32 = 10.0;

    pub const THREAT_RADIUS: f32 = 50.0;
    pub const FLEE_CLEAR_SQ: f32 = 40_000.0;
    pub const FLEE_STEP: f32 = 100.0;
    pub const FLEE_SPEED_MULTIPLIER: f32 = 1.5;
    pub const FLEE_MAX_SECS: f32 = 7.0;

    pub const BUILD_ATTEMPTS: usize = 10;
    pub const BUILD_SPACING_SQ: f32 = 10_000.0;
    /// Six 0.3s swings of the hammer, there and back
    pub const BUILD_WORK_SECS: f32 = 3.6;
    pub const BUILD_MAX_SECS: f32 = 15.0;
}

use native_constants::*;

#[derive(Debug, Clone, PartialEq)]
pub enum NativeState {
    Idle {
        duration: f32,
    },
    Worshipping {
        shrine: Option<Vec2>,
    },
    Wandering {
        destination: Vec2,
    },
    Fleeing {
        threat: EntityId,
    },
    /// `site` is picked on the first update; `work` starts counting on arrival
    Building {
        site: Option<Vec2>,
        work: Option<f32>,
    },
}

impl NativeState {
    pub fn idle<R: Rng>(rng: &mut R) -> Self {
        NativeState::Idle {
            duration: rng.gen_range(IDLE_MIN_SECS..=IDLE_MAX_SECS),
        }
    }

    pub fn wandering<R: Rng>(rng: &mut R) -> Self {
        NativeState::Wandering {
            destination: NATIVE_RANGE.random_point(rng),
        }
    }
}

impl StateKind for NativeState {
    fn name(&self) -> &'static str {
        match self {
            NativeState::Idle { .. } => "idle",
            NativeState::Worshipping { .. } => "worshipping",
            NativeState::Wandering { .. } => "wandering",
            NativeState::Fleeing { .. } => "fleeing",
            NativeState::Building { .. } => "building",
        }
    }
}

/// Things a native does that the registry has to carry out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeOutcome {
    SacredAreaBuilt(Vec2),
}

#[derive(Debug, Clone)]
pub struct NativeAi {
    fsm: Fsm<NativeState>,
}

impl NativeAi {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            fsm: Fsm::new(NativeState::idle(rng)),
        }
    }

    pub fn with_state(state: NativeState) -> Self {
        Self {
            fsm: Fsm::new(state),
        }
    }

    pub fn state(&self) -> &NativeState {
        self.fsm.state()
    }

    pub fn state_timer(&self) -> f32 {
        self.fsm.timer()
    }

    pub fn update<R: Rng>(
        &mut self,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) -> Option<NativeOutcome> {
        self.fsm.advance(dt);
        match self.fsm.state().clone() {
            NativeState::Idle { duration } => {
                self.update_idle(duration, view, rng);
                None
            }
            NativeState::Worshipping { shrine } => {
                self.update_worshipping(shrine, body, view, rng, dt);
                None
            }
            NativeState::Wandering { destination } => {
                self.update_wandering(destination, body, view, rng, dt);
                None
            }
            NativeState::Fleeing { threat } => {
                self.update_fleeing(threat, body, view, rng, dt);
                None
            }
            NativeState::Building { site, work } => {
                self.update_building(site, work, body, view, rng, dt)
            }
        }
    }

    fn update_idle<R: Rng>(&mut self, duration: f32, view: &WorldView, rng: &mut R) {
        if self.fsm.timer() < duration {
            return;
        }
        let roll: f32 = rng.gen();
        let next = if roll < WORSHIP_ROLL && !view.sacred_areas.is_empty() {
            NativeState::Worshipping { shrine: None }
        } else if roll < WANDER_ROLL {
            NativeState::wandering(rng)
        } else {
            NativeState::Building {
                site: None,
                work: None,
            }
        };
        self.fsm.transition_to(next);
    }

    fn update_worshipping<R: Rng>(
        &mut self,
        shrine: Option<Vec2>,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        let target = match shrine {
            Some(target) => target,
            None => match view.sacred_areas.choose(rng) {
                Some(&target) => {
                    *self.fsm.state_mut() = NativeState::Worshipping {
                        shrine: Some(target),
                    };
                    target
                }
                None => {
                    self.fsm.transition_to(NativeState::idle(rng));
                    return;
                }
            },
        };

        body.position.step_toward(target, body.speed, dt);
        if body.position.distance_sq(target) < WORSHIP_ARRIVAL_SQ
            && self.fsm.timer() > WORSHIP_MIN_SECS
        {
            self.fsm.transition_to(NativeState::idle(rng));
        }
    }

    fn update_wandering<R: Rng>(
        &mut self,
        destination: Vec2,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) {
        if let Some(threat) = first_within(&view.invaders, body.position, THREAT_RADIUS) {
            self.fsm
                .transition_to(NativeState::Fleeing { threat: threat.id });
            return;
        }

        body.position.step_toward(destination, body.speed, dt);
        if body.position.distance_sq(destination) < ARRIVAL_SQ {
            if self.fsm.timer() < WANDER_REPICK_SECS && rng.gen::<f32>() < WANDER_REPICK_CHANCE {
                // Keep the timer running so long walks eventually end
                *self.fsm.state_mut() = NativeState::wandering(rng);
            } else {
                self.fsm.transition_to(NativeState::idle(rng));
            }
        }
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
            self.fsm.transition_to(NativeState::idle(rng));
            return;
        };

        if body.position.distance_sq(threat_pos) >= FLEE_CLEAR_SQ {
            self.fsm.transition_to(NativeState::idle(rng));
            return;
        }

        if let Some(refuge) = body.position.away_from(threat_pos, FLEE_STEP) {
            let refuge = ISLAND_INTERIOR.clamp(refuge);
            body.position
                .step_toward(refuge, body.speed * FLEE_SPEED_MULTIPLIER, dt);
        }

        if self.fsm.timer() > FLEE_MAX_SECS {
            self.fsm.transition_to(NativeState::idle(rng));
        }
    }

    fn update_building<R: Rng>(
        &mut self,
        site: Option<Vec2>,
        work: Option<f32>,
        body: &mut Body,
        view: &WorldView,
        rng: &mut R,
        dt: f32,
    ) -> Option<NativeOutcome> {
        let site = match site {
            Some(site) => site,
            None => match find_building_site(&view.sacred_areas, rng) {
                Some(site) => site,
                None => {
                    self.fsm.transition_to(NativeState::idle(rng));
                    return None;
                }
            },
        };

        body.position.step_toward(site, body.speed, dt);
        let work = if body.position.distance_sq(site) < ARRIVAL_SQ {
            let done = work.map_or(0.0, |w| w + dt);
            if done >= BUILD_WORK_SECS {
                self.fsm.transition_to(NativeState::idle(rng));
                return Some(NativeOutcome::SacredAreaBuilt(site));
            }
            Some(done)
        } else {
            work
        };
        *self.fsm.state_mut() = NativeState::Building {
            site: Some(site),
            work,
        };

        if self.fsm.timer() > BUILD_MAX_SECS {
            self.fsm.transition_to(NativeState::idle(rng));
        }
        None
    }
}

/// Pick a spot in the village core well clear of every existing sacred area
pub fn find_building_site<R: Rng>(sacred_areas: &[Vec2], rng: &mut R) -> Option<Vec2> {
    (0..BUILD_ATTEMPTS)
        .map(|_| HEARTLAND.random_point(rng))
        .find(|candidate| {
            sacred_areas
                .iter()
                .all(|area| candidate.distance_sq(*area) >= BUILD_SPACING_SQ)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Sighting;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn body_at(x: f32, y: f32) -> Body {
        Body {
            id: EntityId(1),
            position: Vec2::new(x, y),
            speed: NATIVE_SPEED,
        }
    }

    #[test]
    fn test_idle_waits_out_duration() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ai = NativeAi::with_state(NativeState::Idle { duration: 3.0 });
        let mut body = body_at(400.0, 300.0);
        let view = WorldView::default();

        ai.update(&mut body, &view, &mut rng, 1.0);
        assert_eq!(ai.state().name(), "idle");

        ai.update(&mut body, &view, &mut rng, 2.5);
        assert_ne!(ai.state().name(), "idle");
        assert_eq!(ai.state_timer(), 0.0);
    }

    #[test]
    fn test_idle_never_worships_without_sacred_areas() {
        let view = WorldView::default();
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut ai = NativeAi::with_state(NativeState::Idle { duration: 0.0 });
            let mut body = body_at(400.0, 300.0);
            ai.update(&mut body, &view, &mut rng, 0.1);
            assert_ne!(ai.state().name(), "worshipping");
        }
    }

    #[test]
    fn test_wandering_flees_nearby_invader() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut ai = NativeAi::with_state(NativeState::Wandering {
            destination: Vec2::new(500.0, 300.0),
        });
        let mut body = body_at(400.0, 300.0);
        let view = WorldView {
            invaders: vec![Sighting {
                id: EntityId(99),
                position: Vec2::new(430.0, 300.0),
            }],
            ..Default::default()
        };

        ai.update(&mut body, &view, &mut rng, 0.1);
        assert_eq!(
            ai.state(),
            &NativeState::Fleeing {
                threat: EntityId(99)
            }
        );

        // Running away moves the native further from the threat
        let before = body.position.distance_sq(Vec2::new(430.0, 300.0));
        ai.update(&mut body, &view, &mut rng, 0.5);
        let after = body.position.distance_sq(Vec2::new(430.0, 300.0));
        assert!(after > before);
    }

    #[test]
    fn test_fleeing_idles_when_threat_vanishes() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut ai = NativeAi::with_state(NativeState::Fleeing {
            threat: EntityId(99),
        });
        let mut body = body_at(400.0, 300.0);
        ai.update(&mut body, &WorldView::default(), &mut rng, 0.1);
        assert_eq!(ai.state().name(), "idle");
    }

    #[test]
    fn test_worship_stays_at_least_ten_seconds() {
        let mut rng = SmallRng::seed_from_u64(4);
        let shrine = Vec2::new(400.0, 300.0);
        let mut ai = NativeAi::with_state(NativeState::Worshipping { shrine: None });
        let mut body = body_at(401.0, 300.0);
        let view = WorldView {
            sacred_areas: vec![shrine],
            ..Default::default()
        };

        for _ in 0..9 {
            ai.update(&mut body, &view, &mut rng, 1.0);
            assert_eq!(ai.state().name(), "worshipping");
        }
        ai.update(&mut body, &view, &mut rng, 1.5);
        assert_eq!(ai.state().name(), "idle");
    }

    #[test]
    fn test_building_completes_after_work_delay() {
        let mut rng = SmallRng::seed_from_u64(6);
        let site = Vec2::new(400.0, 300.0);
        let mut ai = NativeAi::with_state(NativeState::Building {
            site: Some(site),
            work: None,
        });
        let mut body = body_at(400.0, 301.0);
        let view = WorldView::default();

        let mut built = None;
        for _ in 0..10 {
            if let Some(outcome) = ai.update(&mut body, &view, &mut rng, 0.5) {
                built = Some(outcome);
                break;
            }
        }
        assert_eq!(built, Some(NativeOutcome::SacredAreaBuilt(site)));
        assert_eq!(ai.state().name(), "idle");
    }

    #[test]
    fn test_building_gives_up_when_crowded() {
        // Sacred areas packed across the village core leave no valid spot
        let mut crowded = Vec::new();
        for x in (300..=500).step_by(20) {
            for y in (200..=400).step_by(20) {
                crowded.push(Vec2::new(x as f32, y as f32));
            }
        }
        let mut rng = SmallRng::seed_from_u64(8);
        assert!(find_building_site(&crowded, &mut rng).is_none());

        let mut ai = NativeAi::with_state(NativeState::Building {
            site: None,
            work: None,
        });
        let mut body = body_at(400.0, 300.0);
        let view = WorldView {
            sacred_areas: crowded,
            ..Default::default()
        };
        let outcome = ai.update(&mut body, &view, &mut rng, 0.1);
        assert!(outcome.is_none());
        assert_eq!(ai.state().name(), "idle");
    }

    #[test]
    fn test_building_site_spacing() {
        let mut rng = SmallRng::seed_from_u64(10);
        let areas = vec![Vec2::new(300.0, 250.0)];
        for _ in 0..50 {
            if let Some(site) = find_building_site(&areas, &mut rng) {
                assert!(site.distance_sq(areas[0]) >= BUILD_SPACING_SQ);
                assert!(HEARTLAND.contains(site));
            }
        }
    }
}
