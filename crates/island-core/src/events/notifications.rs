//! Notification queue
//!
//! Systems push, the host drains once per frame.

use bevy_ecs::prelude::*;

use island_events::{GameEvent, LifecycleEvent, Notification};

#[derive(Resource, Debug, Default)]
pub struct Notifications {
    pending: Vec<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: GameEvent) {
        tracing::debug!(event = event.name(), "notify");
        self.pending.push(event.into());
    }

    pub fn lifecycle(&mut self, event: LifecycleEvent) {
        self.pending.push(event.into());
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    /// Semantic events still queued, oldest first
    pub fn game_events(&self) -> impl Iterator<Item = &GameEvent> {
        self.pending.iter().filter_map(Notification::as_game_event)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use island_events::{PopulationKind, RemovalCause};

    #[test]
    fn test_drain_empties_queue() {
        let mut notes = Notifications::new();
        notes.emit(GameEvent::InvadersApproaching { count: 2 });
        notes.lifecycle(LifecycleEvent::EntityRemoved {
            id: 1,
            kind: PopulationKind::Native,
            cause: RemovalCause::Sacrificed,
        });
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.game_events().count(), 1);

        let drained = notes.drain();
        assert_eq!(drained.len(), 2);
        assert!(notes.is_empty());
    }
}
