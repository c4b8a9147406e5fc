//! Population Registry
//!
//! Owns every native, settler and invader plus the sacred areas they build.
//! Population counts are always the live collection lengths.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use island_events::{GameEvent, LifecycleEvent, PopulationKind, RemovalCause};

use crate::ai::{
    occurs, EconomyView, InvaderOutcome, NativeOutcome, SettlerOutcome, Sighting, WorldView,
};
use crate::components::geometry::nearest;
use crate::components::world::{HEARTLAND, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::components::{Brain, Entity, EntityId, PopulationCounts, SacredArea, SummonId, Vec2};
use crate::events::Notifications;
use crate::systems::tasks::{DeferredTasks, ScheduledTask, TaskKind};

/// Spawn placement and conversion tuning
pub mod population_constants {
    /// Newcomers land somewhere along this stretch of the left/right edges
    pub const EDGE_MIN_Y: f32 = 150.0;
    pub const EDGE_MAX_Y: f32 = 450.0;
    /// ...or along this stretch of the top/bottom edges
    pub const EDGE_MIN_X: f32 = 200.0;
    pub const EDGE_MAX_X: f32 = 600.0;

    /// True believers preach to settlers this close
    pub const EVANGELISM_RADIUS: f32 = 30.0;
    /// Conversion rate per second is the preacher's faith over this
    pub const EVANGELISM_FAITH_DIVISOR: f32 = 200.0;
}

use population_constants::*;

#[derive(Resource, Debug, Default)]
pub struct PopulationRegistry {
    natives: Vec<Entity>,
    settlers: Vec<Entity>,
    invaders: Vec<Entity>,
    sacred_areas: Vec<SacredArea>,
    tasks: DeferredTasks,
    next_id: u64,
}

impl PopulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_entity_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    fn collection(&self, kind: PopulationKind) -> &Vec<Entity> {
        match kind {
            PopulationKind::Native => &self.natives,
            PopulationKind::Settler => &self.settlers,
            PopulationKind::Invader => &self.invaders,
        }
    }

    fn collection_mut(&mut self, kind: PopulationKind) -> &mut Vec<Entity> {
        match kind {
            PopulationKind::Native => &mut self.natives,
            PopulationKind::Settler => &mut self.settlers,
            PopulationKind::Invader => &mut self.invaders,
        }
    }

    pub fn natives(&self) -> &[Entity] {
        &self.natives
    }

    pub fn settlers(&self) -> &[Entity] {
        &self.settlers
    }

    pub fn invaders(&self) -> &[Entity] {
        &self.invaders
    }

    /// Mutable access for in-place changes. Adding or removing goes through
    /// the spawn and remove operations.
    pub fn natives_mut(&mut self) -> &mut [Entity] {
        &mut self.natives
    }

    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.natives
            .iter()
            .chain(self.settlers.iter())
            .chain(self.invaders.iter())
    }

    pub fn sacred_areas(&self) -> &[SacredArea] {
        &self.sacred_areas
    }

    pub fn count(&self, kind: PopulationKind) -> usize {
        self.collection(kind).len()
    }

    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            natives: self.natives.len(),
            settlers: self.settlers.len(),
            invaders: self.invaders.len(),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.all().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.natives
            .iter_mut()
            .chain(self.settlers.iter_mut())
            .chain(self.invaders.iter_mut())
            .find(|e| e.id() == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Deferred restores still waiting on this entity
    pub fn pending_tasks(&self, id: EntityId) -> usize {
        self.tasks.pending_for(id)
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    fn insert(&mut self, entity: Entity, notes: &mut Notifications) -> EntityId {
        let id = entity.id();
        let pos = entity.position();
        debug!("spawned {} {} at ({:.0}, {:.0})", entity.kind, id, pos.x, pos.y);
        notes.lifecycle(LifecycleEvent::EntitySpawned {
            id: id.0,
            kind: entity.kind,
            x: pos.x,
            y: pos.y,
        });
        self.collection_mut(entity.kind).push(entity);
        id
    }

    /// A native born somewhere in the village core
    pub fn spawn_native<R: Rng>(&mut self, rng: &mut R, notes: &mut Notifications) -> EntityId {
        let pos = HEARTLAND.random_point(rng);
        self.spawn_native_at(pos, rng, notes)
    }

    pub fn spawn_native_at<R: Rng>(
        &mut self,
        pos: Vec2,
        rng: &mut R,
        notes: &mut Notifications,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.insert(Entity::native(id, pos, rng), notes)
    }

    /// A settler landing at a random edge of the map
    pub fn spawn_settler<R: Rng>(&mut self, rng: &mut R, notes: &mut Notifications) -> EntityId {
        let pos = edge_point(rng);
        self.spawn_settler_at(pos, rng, notes)
    }

    pub fn spawn_settler_at<R: Rng>(
        &mut self,
        pos: Vec2,
        rng: &mut R,
        notes: &mut Notifications,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.insert(Entity::settler(id, pos, rng), notes)
    }

    /// Land `count` invaders on random edges and announce them
    pub fn spawn_invaders<R: Rng>(
        &mut self,
        count: u32,
        rng: &mut R,
        notes: &mut Notifications,
    ) -> Vec<EntityId> {
        if count == 0 {
            return Vec::new();
        }
        notes.emit(GameEvent::InvadersApproaching { count });
        (0..count)
            .map(|_| {
                let pos = edge_point(rng);
                self.spawn_invader_at(pos, notes)
            })
            .collect()
    }

    pub fn spawn_invader_at(&mut self, pos: Vec2, notes: &mut Notifications) -> EntityId {
        let id = self.next_entity_id();
        self.insert(Entity::invader(id, pos), notes)
    }

    /// Replace a settler with a freshly devout native on the same spot.
    /// Returns the new native's id, or `None` if the settler is already gone.
    pub fn convert_settler_to_native<R: Rng>(
        &mut self,
        settler: EntityId,
        rng: &mut R,
        notes: &mut Notifications,
    ) -> Option<EntityId> {
        let old = self.take(PopulationKind::Settler, settler, RemovalCause::Converted, notes)?;
        let id = self.next_entity_id();
        let native = Entity::converted(id, old.position(), rng);
        debug!(
            "settler {} converted to native {} (true believer: {})",
            settler, id, native.is_true_believer
        );
        Some(self.insert(native, notes))
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove an entity from its collection. Returns false if it was not there.
    pub fn remove_entity(
        &mut self,
        kind: PopulationKind,
        id: EntityId,
        cause: RemovalCause,
        notes: &mut Notifications,
    ) -> bool {
        self.take(kind, id, cause, notes).is_some()
    }

    fn take(
        &mut self,
        kind: PopulationKind,
        id: EntityId,
        cause: RemovalCause,
        notes: &mut Notifications,
    ) -> Option<Entity> {
        let list = self.collection_mut(kind);
        let index = list.iter().position(|e| e.id() == id)?;
        let entity = list.remove(index);
        let cancelled = self.tasks.cancel_owner(id);
        debug!("removed {} {} ({:?}, {} tasks cancelled)", kind, id, cause, cancelled);
        notes.lifecycle(LifecycleEvent::EntityRemoved {
            id: id.0,
            kind,
            cause,
        });
        Some(entity)
    }

    // ------------------------------------------------------------------
    // Places and queries
    // ------------------------------------------------------------------

    pub fn create_sacred_area(&mut self, pos: Vec2) -> usize {
        self.sacred_areas.push(SacredArea::new(pos));
        debug!(
            "sacred area #{} consecrated at ({:.0}, {:.0})",
            self.sacred_areas.len(),
            pos.x,
            pos.y
        );
        self.sacred_areas.len() - 1
    }

    /// Closest member of `kind` to `from`, with its squared distance
    pub fn find_closest(&self, kind: PopulationKind, from: Vec2) -> Option<(EntityId, f32)> {
        nearest(
            from,
            self.collection(kind).iter().map(|e| (e.id(), e.position())),
        )
    }

    pub fn random_id<R: Rng>(&self, kind: PopulationKind, rng: &mut R) -> Option<EntityId> {
        self.collection(kind).choose(rng).map(|e| e.id())
    }

    /// Wound an entity. Returns remaining health, or `None` if it is absent or
    /// cannot be wounded.
    pub fn damage(&mut self, id: EntityId, amount: f32) -> Option<f32> {
        self.get_mut(id)?.take_damage(amount)
    }

    // ------------------------------------------------------------------
    // Timed mutators
    // ------------------------------------------------------------------

    /// Scale the entity's speed by `factor` for `duration` seconds
    pub fn apply_movement_penalty(&mut self, id: EntityId, factor: f32, duration: f32) -> bool {
        let Some(entity) = self.get_mut(id) else {
            return false;
        };
        entity.body.speed = entity.base_speed * factor;
        self.tasks.schedule(id, TaskKind::RestoreSpeed, duration);
        true
    }

    /// Frighten an invader away from `source` for `duration` seconds
    pub fn apply_fear(
        &mut self,
        id: EntityId,
        factor: f32,
        duration: f32,
        source: Option<SummonId>,
    ) -> bool {
        let Some(entity) = self.get_mut(id) else {
            return false;
        };
        let Brain::Invader(ai) = &mut entity.brain else {
            return false;
        };
        ai.frighten(factor, source);
        self.tasks.schedule(id, TaskKind::RestoreFear, duration);
        true
    }

    fn run_task(&mut self, task: ScheduledTask) {
        let Some(entity) = self.get_mut(task.owner) else {
            return;
        };
        match task.kind {
            TaskKind::RestoreSpeed => entity.body.speed = entity.base_speed,
            TaskKind::RestoreFear => {
                if let Brain::Invader(ai) = &mut entity.brain {
                    ai.calm();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// What every state machine sees this frame
    pub fn world_view(&self, economy: &EconomyView) -> WorldView {
        fn sightings(list: &[Entity]) -> Vec<Sighting> {
            list.iter()
                .map(|e| Sighting {
                    id: e.id(),
                    position: e.position(),
                })
                .collect()
        }

        WorldView {
            natives: sightings(&self.natives),
            settlers: sightings(&self.settlers),
            invaders: sightings(&self.invaders),
            sacred_areas: self.sacred_areas.iter().map(|a| a.position).collect(),
            economy: economy.clone(),
        }
    }

    /// Fire due tasks, step every state machine, then apply what they asked for
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        economy: &EconomyView,
        rng: &mut R,
        notes: &mut Notifications,
    ) {
        for task in self.tasks.advance(dt) {
            self.run_task(task);
        }

        let view = self.world_view(economy);

        let mut built = Vec::new();
        for native in &mut self.natives {
            if let Brain::Native(ai) = &mut native.brain {
                if let Some(NativeOutcome::SacredAreaBuilt(site)) =
                    ai.update(&mut native.body, &view, rng, dt)
                {
                    built.push(site);
                }
            }
        }

        let mut ready = Vec::new();
        for settler in &mut self.settlers {
            if let Brain::Settler(ai) = &mut settler.brain {
                if ai.update(&mut settler.body, &view, rng, dt)
                    == Some(SettlerOutcome::ReadyToConvert)
                {
                    ready.push(settler.body.id);
                }
            }
        }

        let mut departed = Vec::new();
        for invader in &mut self.invaders {
            if let Brain::Invader(ai) = &mut invader.brain {
                if ai.update(&mut invader.body, &view, rng, dt)
                    == Some(InvaderOutcome::ReachedEdge)
                {
                    departed.push(invader.body.id);
                }
            }
        }

        for site in built {
            self.create_sacred_area(site);
        }
        for id in ready {
            self.convert_settler_to_native(id, rng, notes);
        }
        for id in departed {
            if self.remove_entity(PopulationKind::Invader, id, RemovalCause::Retreated, notes) {
                debug!("invader {} left the island", id);
            }
        }

        self.evangelize(dt, rng, notes);
    }

    /// True believers win over settlers standing close to them
    fn evangelize<R: Rng>(&mut self, dt: f32, rng: &mut R, notes: &mut Notifications) {
        let preachers: Vec<(Vec2, f32)> = self
            .natives
            .iter()
            .filter(|n| n.is_true_believer)
            .map(|n| (n.position(), n.faith))
            .collect();
        if preachers.is_empty() {
            return;
        }

        let mut converts = Vec::new();
        for settler in &self.settlers {
            let heard = preachers.iter().any(|(pos, faith)| {
                settler.position().within(*pos, EVANGELISM_RADIUS)
                    && occurs(rng, faith / EVANGELISM_FAITH_DIVISOR, dt)
            });
            if heard {
                converts.push(settler.id());
            }
        }

        for id in converts {
            self.convert_settler_to_native(id, rng, notes);
        }
    }
}

/// Random point along one of the four map edges
fn edge_point<R: Rng>(rng: &mut R) -> Vec2 {
    match rng.gen_range(0..4) {
        0 => Vec2::new(0.0, rng.gen_range(EDGE_MIN_Y..=EDGE_MAX_Y)),
        1 => Vec2::new(SCREEN_WIDTH, rng.gen_range(EDGE_MIN_Y..=EDGE_MAX_Y)),
        2 => Vec2::new(rng.gen_range(EDGE_MIN_X..=EDGE_MAX_X), 0.0),
        _ => Vec2::new(rng.gen_range(EDGE_MIN_X..=EDGE_MAX_X), SCREEN_HEIGHT),
    }
}
