//! Weapon Balls - deterministic ball-vs-ball weapon combat
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, weapons, projectiles, hazards, win rules)
//! - `settings`: Per-battle configuration threaded through the simulation
//! - `driver`: Real-time fixed-timestep driver around `sim::tick`
//! - `headless`: Unthrottled single and batch runs for win-rate statistics
//! - `best_of`: Ranked "best of" battle table

pub mod best_of;
pub mod driver;
pub mod error;
pub mod headless;
pub mod settings;
pub mod sim;

pub use best_of::BestOf;
pub use error::SimError;
pub use settings::Settings;

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Logical tick rate (ticks per second) for real-time pacing
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default safety cap: two minutes of logical time
    pub const MAX_TICKS: u64 = 7200;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 25.0;
    pub const BALL_MASS: f32 = 1.0;
    pub const BALL_MAX_HP: f32 = 100.0;
    pub const BALL_MAX_SPEED: f32 = 9.0;
    pub const BALL_FRICTION: f32 = 0.999;
    pub const BALL_RESTITUTION: f32 = 0.95;
    pub const WALL_RESTITUTION: f32 = 1.0;
    /// Spread of the launch velocity applied at battle start (per axis)
    pub const LAUNCH_SPREAD: f32 = 14.0;

    /// Ticks a weapon waits after a confirmed hit
    pub const WEAPON_HIT_COOLDOWN: u32 = 30;
    /// Ticks a weapon waits after a parry
    pub const PARRY_COOLDOWN: u32 = 10;
    /// Ticks of reversed spin after a parry deflection
    pub const PARRY_REVERSE_TICKS: u32 = 20;
    /// Tip-to-tip distance below which two weapons parry
    pub const PARRY_TIP_DISTANCE: f32 = 15.0;
    /// Hit threshold used when a weapon does not declare its own
    pub const SUPER_THRESHOLD: u32 = 10;

    /// Impulse a melee tip receives when it pokes through a wall
    pub const WEAPON_WALL_BOUNCE_STRENGTH: f32 = 1.5;

    /// Arena gravity (per tick^2) and its direction
    pub const GRAVITY: f32 = 0.15;
    pub const GRAVITY_ANGLE: f32 = std::f32::consts::FRAC_PI_2;

    /// Active projectile cap
    pub const MAX_PROJECTILES: usize = 256;

    /// Default arena rectangle
    pub const ARENA_X: f32 = 20.0;
    pub const ARENA_Y: f32 = 20.0;
    pub const ARENA_WIDTH: f32 = 500.0;
    pub const ARENA_HEIGHT: f32 = 500.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Heading of a vector, falling back to 0 for a zero-length input
#[inline]
pub fn heading(v: Vec2) -> f32 {
    if v.length_squared() < f32::EPSILON {
        0.0
    } else {
        v.y.atan2(v.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(2.5 * PI) - (0.5 * PI)).abs() < 1e-4);
        assert!((normalize_angle(-3.5 * PI) - (0.5 * PI)).abs() < 1e-4);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_heading_zero_vector() {
        assert_eq!(heading(Vec2::ZERO), 0.0);
        assert!((heading(Vec2::new(0.0, 2.0)) - PI / 2.0).abs() < 1e-5);
    }
}
