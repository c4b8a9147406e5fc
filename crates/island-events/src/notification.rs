//! Notification Types
//!
//! Everything the simulation tells the outside world, in emission order.

use serde::{Deserialize, Serialize};

use crate::kinds::{PopulationKind, RemovalCause};

/// Semantic events a renderer or UI subscribes to.
///
/// Serialized with an `event` tag in kebab-case, so `RitualCompleted` becomes
/// `{"event":"ritual-completed","type":"basic"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GameEvent {
    RitualCompleted {
        #[serde(rename = "type")]
        ritual: String,
    },
    EntitySummoned {
        #[serde(rename = "type")]
        summon: String,
    },
    TerrainModified {
        #[serde(rename = "type")]
        terrain: String,
    },
    InvadersApproaching {
        count: u32,
    },
    CombatResult {
        result: String,
    },
    EventOccurred {
        #[serde(rename = "type")]
        kind: String,
        message: String,
    },
}

impl GameEvent {
    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::RitualCompleted { .. } => "ritual-completed",
            Self::EntitySummoned { .. } => "entity-summoned",
            Self::TerrainModified { .. } => "terrain-modified",
            Self::InvadersApproaching { .. } => "invaders-approaching",
            Self::CombatResult { .. } => "combat-result",
            Self::EventOccurred { .. } => "event-occurred",
        }
    }
}

/// Create/destroy notices so a renderer can keep its sprites in sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "lifecycle", rename_all = "kebab-case")]
pub enum LifecycleEvent {
    EntitySpawned {
        id: u64,
        kind: PopulationKind,
        x: f32,
        y: f32,
    },
    EntityRemoved {
        id: u64,
        kind: PopulationKind,
        cause: RemovalCause,
    },
    SummonAppeared {
        id: u64,
        #[serde(rename = "type")]
        summon: String,
        x: f32,
        y: f32,
    },
    SummonExpired {
        id: u64,
        #[serde(rename = "type")]
        summon: String,
    },
}

/// Either kind of notification, as queued by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Notification {
    Game(GameEvent),
    Lifecycle(LifecycleEvent),
}

impl Notification {
    pub fn as_game_event(&self) -> Option<&GameEvent> {
        match self {
            Self::Game(event) => Some(event),
            Self::Lifecycle(_) => None,
        }
    }
}

impl From<GameEvent> for Notification {
    fn from(event: GameEvent) -> Self {
        Self::Game(event)
    }
}

impl From<LifecycleEvent> for Notification {
    fn from(event: LifecycleEvent) -> Self {
        Self::Lifecycle(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_event_wire_shape() {
        let event = GameEvent::RitualCompleted {
            ritual: "basic".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ritual-completed");
        assert_eq!(json["type"], "basic");
        assert_eq!(event.name(), "ritual-completed");
    }

    #[test]
    fn test_event_occurred_carries_message() {
        let event = GameEvent::EventOccurred {
            kind: "raid".to_string(),
            message: "Warning: 4 invaders are raiding the island!".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "event-occurred");
        assert_eq!(json["type"], "raid");
        assert_eq!(json["message"], "Warning: 4 invaders are raiding the island!");
    }

    #[test]
    fn test_invaders_approaching_count() {
        let json = serde_json::to_string(&GameEvent::InvadersApproaching { count: 3 }).unwrap();
        assert_eq!(json, r#"{"event":"invaders-approaching","count":3}"#);
    }

    #[test]
    fn test_notification_roundtrip_untagged() {
        let notes = vec![
            Notification::from(GameEvent::CombatResult {
                result: "Lightning Strike hit 2 invaders".to_string(),
            }),
            Notification::from(LifecycleEvent::EntityRemoved {
                id: 7,
                kind: PopulationKind::Invader,
                cause: RemovalCause::Slain,
            }),
        ];
        let json = serde_json::to_string(&notes).unwrap();
        let parsed: Vec<Notification> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, notes);
        assert!(parsed[0].as_game_event().is_some());
        assert!(parsed[1].as_game_event().is_none());
    }
}
