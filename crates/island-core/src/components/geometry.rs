//! Geometry
//!
//! Screen-space points and rectangles. Distance checks compare squared values.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Movement stops once the mover is this close to its target
pub const STEP_EPSILON: f32 = 3.0;

/// A point in screen space (pixels, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Vec2) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Strictly inside a circle of `radius` around `other`
    pub fn within(self, other: Vec2, radius: f32) -> bool {
        self.distance_sq(other) < radius * radius
    }

    /// Move toward `target` at `speed` px/s. Does nothing once within
    /// [`STEP_EPSILON`] so movers settle instead of jittering.
    pub fn step_toward(&mut self, target: Vec2, speed: f32, dt: f32) {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > STEP_EPSILON {
            self.x += dx / dist * speed * dt;
            self.y += dy / dist * speed * dt;
        }
    }

    /// Move a fixed fraction of the remaining gap per second. Summons drift
    /// this way and slow as they close in. Never passes the target.
    pub fn ease_toward(&mut self, target: Vec2, rate: f32, dt: f32) {
        let t = (rate * dt).clamp(0.0, 1.0);
        self.x += (target.x - self.x) * t;
        self.y += (target.y - self.y) * t;
    }

    /// The point `reach` pixels from `self`, directly away from `threat`.
    /// `None` when the two coincide and there is no direction to flee in.
    pub fn away_from(self, threat: Vec2, reach: f32) -> Option<Vec2> {
        let dx = self.x - threat.x;
        let dy = self.y - threat.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= f32::EPSILON {
            return None;
        }
        Some(Vec2::new(
            self.x + dx / dist * reach,
            self.y + dy / dist * reach,
        ))
    }
}

/// Axis-aligned rectangle, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        )
    }

    /// Uniform random point inside the rectangle
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.gen_range(self.min.x..=self.max.x),
            rng.gen_range(self.min.y..=self.max.y),
        )
    }
}

/// Closest item to `from`, with its squared distance
pub fn nearest<T, I>(from: Vec2, items: I) -> Option<(T, f32)>
where
    I: IntoIterator<Item = (T, Vec2)>,
{
    items
        .into_iter()
        .map(|(item, pos)| (item, from.distance_sq(pos)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
