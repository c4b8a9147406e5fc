//! Entity Behavior
//!
//! Each population runs its own finite-state machine. They share one contract:
//! exactly one state at a time, a timer that resets on every transition, and
//! per-state data carried inside the state variant so a transition can never
//! leak a previous state's payload.
//!
//! State machines never reach into the registry. They read a [`WorldView`]
//! captured at the start of the frame and report anything that needs the
//! registry (building, converting, leaving the map) as an outcome.

pub mod invader;
pub mod native;
pub mod settler;

use rand::Rng;
use std::fmt::Debug;

use crate::components::{EntityId, SummonId, Vec2};
use crate::systems::economy::SummonKind;

pub use invader::{InvaderAi, InvaderOutcome, InvaderState};
pub use native::{NativeAi, NativeOutcome, NativeState};
pub use settler::{SettlerAi, SettlerOutcome, SettlerState};

/// A state enum usable with [`Fsm`]
pub trait StateKind: Debug + Clone + PartialEq {
    /// Short lowercase label for renderers and snapshots
    fn name(&self) -> &'static str;
}

/// Current state plus time spent in it
#[derive(Debug, Clone)]
pub struct Fsm<S: StateKind> {
    state: S,
    state_timer: f32,
}

impl<S: StateKind> Fsm<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            state_timer: 0.0,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Edit the current state's payload in place (no transition)
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn timer(&self) -> f32 {
        self.state_timer
    }

    pub fn advance(&mut self, dt: f32) {
        self.state_timer += dt;
    }

    /// Leave the current state and enter `next`. The old payload is dropped
    /// and the timer restarts from zero.
    pub fn transition_to(&mut self, next: S) {
        tracing::trace!(from = self.state.name(), to = next.name(), "state transition");
        self.state = next;
        self.state_timer = 0.0;
    }
}

/// Where some entity was at the start of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub id: EntityId,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummonSighting {
    pub id: SummonId,
    pub kind: SummonKind,
    pub position: Vec2,
}

/// What the economy exposes to entity behavior
#[derive(Debug, Clone, Default)]
pub struct EconomyView {
    pub active_ritual_sites: Vec<Vec2>,
    pub summons: Vec<SummonSighting>,
    pub blessing_active: bool,
}

/// Read-only picture of the island handed to every state machine
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    pub natives: Vec<Sighting>,
    pub settlers: Vec<Sighting>,
    pub invaders: Vec<Sighting>,
    pub sacred_areas: Vec<Vec2>,
    pub economy: EconomyView,
}

impl WorldView {
    pub fn invader(&self, id: EntityId) -> Option<Vec2> {
        locate(&self.invaders, id)
    }

    /// A native or settler, the two things invaders hunt
    pub fn prey(&self, id: EntityId) -> Option<Vec2> {
        locate(&self.natives, id).or_else(|| locate(&self.settlers, id))
    }

    pub fn summon(&self, id: SummonId) -> Option<Vec2> {
        self.economy
            .summons
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.position)
    }
}

fn locate(list: &[Sighting], id: EntityId) -> Option<Vec2> {
    list.iter().find(|s| s.id == id).map(|s| s.position)
}

/// First sighting strictly inside `radius` of `from`, in collection order
pub fn first_within(list: &[Sighting], from: Vec2, radius: f32) -> Option<Sighting> {
    list.iter().copied().find(|s| from.within(s.position, radius))
}

/// Sample whether a Poisson process with `rate` events per second fires at
/// least once during `dt`.
///
/// Uses `1 - e^(-rate*dt)`, which matches `rate*dt` for small frames and stays
/// a valid probability for long ones. It is still a per-frame draw, so results
/// only approximate the continuous process when `dt` is small relative to
/// `1/rate`. Prefer an accumulated-time check where exact cadence matters.
pub fn occurs<R: Rng>(rng: &mut R, rate: f32, dt: f32) -> bool {
    if rate <= 0.0 || dt <= 0.0 {
        return false;
    }
    let p = 1.0 - (-rate * dt).exp();
    rng.gen::<f32>() < p
}
