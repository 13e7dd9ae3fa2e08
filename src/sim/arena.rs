//! Arena bounds
//!
//! An axis-aligned rectangle in world space. It may be resized between
//! battles but `BattleState` only ever reads it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which wall a body touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

/// Axis-aligned battle bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            x: ARENA_X,
            y: ARENA_Y,
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

impl Arena {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when both dimensions are positive and finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Clamp a point onto the arena rectangle (wall contact point)
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.left(), self.right()),
            p.y.clamp(self.top(), self.bottom()),
        )
    }

    /// Whether a circle lies fully inside the bounds
    pub fn contains_circle(&self, center: Vec2, radius: f32) -> bool {
        center.x - radius >= self.left()
            && center.x + radius <= self.right()
            && center.y - radius >= self.top()
            && center.y + radius <= self.bottom()
    }

    /// Starting spot for the `index`-th side: left quarter or right quarter, vertically centred
    pub fn spawn_point(&self, index: usize) -> Vec2 {
        let fraction = if index == 0 { 0.25 } else { 0.75 };
        Vec2::new(self.x + self.width * fraction, self.y + self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_center() {
        let arena = Arena::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(arena.right(), 110.0);
        assert_eq!(arena.bottom(), 70.0);
        assert_eq!(arena.center(), Vec2::new(60.0, 45.0));
    }

    #[test]
    fn test_validity() {
        assert!(Arena::default().is_valid());
        assert!(!Arena::new(0.0, 0.0, 0.0, 10.0).is_valid());
        assert!(!Arena::new(0.0, 0.0, f32::NAN, 10.0).is_valid());
    }

    #[test]
    fn test_contains_circle() {
        let arena = Arena::new(0.0, 0.0, 100.0, 100.0);
        assert!(arena.contains_circle(Vec2::new(50.0, 50.0), 10.0));
        assert!(!arena.contains_circle(Vec2::new(5.0, 50.0), 10.0));
    }

    #[test]
    fn test_spawn_points_mirror() {
        let arena = Arena::new(0.0, 0.0, 400.0, 200.0);
        assert_eq!(arena.spawn_point(0), Vec2::new(100.0, 100.0));
        assert_eq!(arena.spawn_point(1), Vec2::new(300.0, 100.0));
    }
}
