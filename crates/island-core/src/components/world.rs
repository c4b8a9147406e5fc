//! Island geometry
//!
//! The map is an 800x600 screen with a roughly circular island in the middle.

use serde::{Deserialize, Serialize};

use super::geometry::{Rect, Vec2};

pub const SCREEN_WIDTH: f32 = 800.0;
pub const SCREEN_HEIGHT: f32 = 600.0;

pub const ISLAND_CENTER: Vec2 = Vec2::new(400.0, 300.0);
pub const ISLAND_RADIUS: f32 = 250.0;

/// Full screen, minus a margin. Settlers and scared invaders are clamped here.
pub const OPEN_GROUND: Rect = Rect::new(50.0, 50.0, 750.0, 550.0);

/// Walkable island. Natives never flee past it; settlers explore inside it.
pub const ISLAND_INTERIOR: Rect = Rect::new(200.0, 150.0, 600.0, 450.0);

/// Native home range, also where raiders mill about when they find nobody.
pub const NATIVE_RANGE: Rect = Rect::new(250.0, 150.0, 550.0, 450.0);

/// Village core. Natives are born and build here; summons appear here.
pub const HEARTLAND: Rect = Rect::new(300.0, 200.0, 500.0, 400.0);

pub const SACRED_AREA_RADIUS: f32 = 20.0;

/// A worship destination for natives
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SacredArea {
    pub position: Vec2,
    pub radius: f32,
}

impl SacredArea {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            radius: SACRED_AREA_RADIUS,
        }
    }
}
