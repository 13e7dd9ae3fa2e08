//! Battle settings
//!
//! Every physics and rule constant a battle reads. Passed into `configure`
//! and stored on the battle, so concurrent battles never share it.
//! Persisted as JSON by the CLI.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;
use crate::polar_to_cartesian;
use crate::sim::Arena;

/// Tuning presets for the physics feel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PhysicsPreset {
    /// Frictionless, fully elastic walls
    #[default]
    Classic,
    /// Downward gravity with slightly lossy walls
    Gravity,
    /// Heavy friction, short battles
    Arena,
}

impl PhysicsPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicsPreset::Classic => "Classic",
            PhysicsPreset::Gravity => "Gravity",
            PhysicsPreset::Arena => "Arena",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(PhysicsPreset::Classic),
            "gravity" | "grav" => Some(PhysicsPreset::Gravity),
            "arena" => Some(PhysicsPreset::Arena),
            _ => None,
        }
    }
}

/// Per-battle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Physics preset last applied
    pub preset: PhysicsPreset,

    // === Arena ===
    pub arena: Arena,

    // === Ball physics ===
    pub ball_radius: f32,
    pub ball_mass: f32,
    pub ball_max_hp: f32,
    pub ball_max_speed: f32,
    /// Velocity multiplier applied every tick
    pub friction: f32,
    /// Ball-ball restitution coefficient
    pub ball_restitution: f32,
    /// Wall restitution coefficient
    pub wall_restitution: f32,
    /// Per-axis spread of the random launch velocity
    pub launch_spread: f32,

    // === Gravity ===
    /// Apply gravity to balls (projectiles flagged `gravity_affected` always feel it)
    pub gravity_mode: bool,
    pub gravity: f32,
    /// Gravity direction in radians (π/2 points down the screen)
    pub gravity_angle: f32,

    // === Combat rules ===
    pub hit_cooldown: u32,
    pub parry_cooldown: u32,
    pub parry_tip_distance: f32,
    pub supers_enabled: bool,
    /// Melee tips poking through a wall push the ball back
    pub weapon_wall_bounce: bool,
    pub weapon_wall_bounce_strength: f32,
    /// Scale the tip bounce with the weapon's current damage
    pub weapon_wall_damage_bounce: bool,
    /// Brief freezes after heavy impacts
    pub hit_stop: bool,

    // === Limits ===
    pub max_projectiles: usize,
    pub max_ticks: u64,
    /// Logical ticks per second when paced in real time
    pub tick_rate: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: PhysicsPreset::Classic,

            arena: Arena::default(),

            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            ball_max_hp: BALL_MAX_HP,
            ball_max_speed: BALL_MAX_SPEED,
            friction: BALL_FRICTION,
            ball_restitution: BALL_RESTITUTION,
            wall_restitution: WALL_RESTITUTION,
            launch_spread: LAUNCH_SPREAD,

            gravity_mode: false,
            gravity: GRAVITY,
            gravity_angle: GRAVITY_ANGLE,

            hit_cooldown: WEAPON_HIT_COOLDOWN,
            parry_cooldown: PARRY_COOLDOWN,
            parry_tip_distance: PARRY_TIP_DISTANCE,
            supers_enabled: true,
            weapon_wall_bounce: true,
            weapon_wall_bounce_strength: WEAPON_WALL_BOUNCE_STRENGTH,
            weapon_wall_damage_bounce: false,
            hit_stop: true,

            max_projectiles: MAX_PROJECTILES,
            max_ticks: MAX_TICKS,
            tick_rate: TICK_RATE,
        }
    }
}

impl Settings {
    /// Create settings from a physics preset (applies preset defaults)
    pub fn from_preset(preset: PhysicsPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a physics preset (updates preset-dependent settings)
    pub fn apply_preset(&mut self, preset: PhysicsPreset) {
        self.preset = preset;
        match preset {
            PhysicsPreset::Classic => {
                self.gravity_mode = false;
                self.friction = BALL_FRICTION;
                self.wall_restitution = WALL_RESTITUTION;
            }
            PhysicsPreset::Gravity => {
                self.gravity_mode = true;
                self.wall_restitution = 0.9;
            }
            PhysicsPreset::Arena => {
                self.gravity_mode = false;
                self.friction = 0.99;
                self.max_ticks = MAX_TICKS / 2;
            }
        }
    }

    /// Replace the arena rectangle
    pub fn with_arena(mut self, arena: Arena) -> Self {
        self.arena = arena;
        self
    }

    /// Seconds of real time one tick represents
    pub fn timestep(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Gravity acceleration per tick
    pub fn gravity_vector(&self) -> Vec2 {
        polar_to_cartesian(self.gravity, self.gravity_angle)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.arena.is_valid() {
            return Err(SimError::InvalidArena {
                width: self.arena.width,
                height: self.arena.height,
            });
        }
        if !(self.ball_radius > 0.0) || !(self.ball_mass > 0.0) || !(self.ball_max_hp > 0.0) {
            return Err(SimError::InvalidSettings(
                "ball radius, mass and max hp must be positive".into(),
            ));
        }
        if self.ball_radius * 2.0 > self.arena.width.min(self.arena.height) {
            return Err(SimError::InvalidSettings(format!(
                "ball radius {} does not fit the arena",
                self.ball_radius
            )));
        }
        if self.max_ticks == 0 {
            return Err(SimError::InvalidSettings("max_ticks must be non-zero".into()));
        }
        if self.tick_rate == 0 {
            return Err(SimError::InvalidSettings("tick_rate must be non-zero".into()));
        }
        if self.max_projectiles == 0 {
            return Err(SimError::InvalidSettings(
                "max_projectiles must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_arena_rejected() {
        let settings = Settings::default().with_arena(Arena::new(0.0, 0.0, -5.0, 100.0));
        assert!(matches!(
            settings.validate(),
            Err(SimError::InvalidArena { .. })
        ));
    }

    #[test]
    fn test_zero_caps_rejected() {
        let settings = Settings {
            max_ticks: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SimError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_preset_parse_and_apply() {
        assert_eq!(PhysicsPreset::from_str("GRAV"), Some(PhysicsPreset::Gravity));
        assert_eq!(PhysicsPreset::from_str("nope"), None);
        let settings = Settings::from_preset(PhysicsPreset::Gravity);
        assert!(settings.gravity_mode);
        assert_eq!(settings.preset.as_str(), "Gravity");
    }

    #[test]
    fn test_gravity_vector_points_down() {
        let g = Settings::default().gravity_vector();
        assert!(g.x.abs() < 1e-5);
        assert!(g.y > 0.0);
    }

    #[test]
    fn test_json_roundtrip_with_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"max_ticks": 900}"#).unwrap();
        assert_eq!(settings.max_ticks, 900);
        assert_eq!(settings.ball_radius, BALL_RADIUS);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("weapon_balls_settings_{}.json", std::process::id()));
        let settings = Settings {
            supers_enabled: false,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        assert!(!loaded.supers_enabled);
        let _ = std::fs::remove_file(&path);
    }
}
