//! Battle state and core simulation types
//!
//! Everything a battle needs to replay identically lives here: the settings
//! it was configured with, its RNG stream, and the ball, projectile and
//! hazard collections the tick mutates.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Wall;
use super::collision::{bounce_off_walls, RigidCircle};
use super::excitement::Excitement;
use super::hazard::Hazard;
use super::outcome::BattleResult;
use super::projectile::Projectile;
use super::rng::BattleRng;
use super::status::{StatusEffect, StatusKind};
use super::weapon::{self, Weapon};
use crate::error::SimError;
use crate::polar_to_cartesian;
use crate::settings::Settings;

/// Per-side ball cap; splits stop once a side reaches it
pub const MAX_SIDE_BALLS: usize = 32;
/// Clones never drop below these
pub const MIN_CLONE_HP: f32 = 5.0;
pub const MIN_CLONE_RADIUS: f32 = 10.0;

/// Index into `BattleState::balls`. Balls are never removed, so ids stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub usize);

/// The two factions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Read-only view of a ball handed to weapons, projectiles and hazards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub side: Side,
    pub alive: bool,
    pub is_original: bool,
    pub hp: f32,
    pub max_hp: f32,
}

/// A combatant
#[derive(Debug)]
pub struct Ball {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// HP when the current tick began (double-KO tie-break)
    pub hp_at_tick_start: f32,
    pub alive: bool,
    pub side: Side,
    /// The "king": its death ends the side even if clones survive
    pub is_original: bool,
    pub max_speed: f32,
    pub status: BTreeMap<StatusKind, StatusEffect>,
    pub weapon: Weapon,
}

impl Ball {
    pub fn new(id: BallId, side: Side, pos: Vec2, mut weapon: Weapon, settings: &Settings) -> Self {
        weapon.stats.owner = id;
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: settings.ball_radius,
            mass: settings.ball_mass,
            hp: settings.ball_max_hp,
            max_hp: settings.ball_max_hp,
            hp_at_tick_start: settings.ball_max_hp,
            alive: true,
            side,
            is_original: true,
            max_speed: settings.ball_max_speed,
            status: BTreeMap::new(),
            weapon,
        }
    }

    pub fn body(&self) -> Body {
        Body {
            id: self.id,
            pos: self.pos,
            vel: self.vel,
            radius: self.radius,
            side: self.side,
            alive: self.alive,
            is_original: self.is_original,
            hp: self.hp,
            max_hp: self.max_hp,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Subtract hp, clamped to `[0, max_hp]`. Returns true if this call killed the ball.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive || !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.hp = (self.hp - amount).clamp(0.0, self.max_hp);
        if self.hp <= 0.0 {
            self.kill();
            return true;
        }
        false
    }

    /// Kill outright. Returns true if the ball was alive.
    pub fn kill(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.hp = 0.0;
        self.alive = false;
        self.vel = Vec2::ZERO;
        true
    }

    pub fn apply_status(&mut self, effect: StatusEffect) {
        if !self.alive {
            return;
        }
        self.status
            .entry(effect.kind())
            .and_modify(|current| current.merge(effect))
            .or_insert(effect);
    }

    /// Combined speed multiplier from slow and venom
    pub fn speed_multiplier(&self) -> f32 {
        self.status.values().map(StatusEffect::speed_multiplier).product()
    }

    /// Move, apply gravity and friction, clamp speed, bounce off walls
    pub fn integrate(&mut self, settings: &Settings) -> Option<Wall> {
        self.pos += self.vel;
        if settings.gravity_mode {
            self.vel += settings.gravity_vector();
        }
        self.vel *= settings.friction;

        let cap = self.max_speed * self.speed_multiplier();
        let speed = self.vel.length();
        if speed > cap && speed > f32::EPSILON {
            self.vel *= cap / speed;
        }

        if !self.pos.is_finite() || !self.vel.is_finite() {
            log::warn!("Ball {:?} left finite space, recentring", self.id);
            self.pos = settings.arena.clamp_point(if self.pos.is_finite() {
                self.pos
            } else {
                settings.arena.center()
            });
            self.vel = Vec2::ZERO;
        }

        bounce_off_walls(self, &settings.arena, settings.wall_restitution)
    }

    /// Advance status effects one tick; returns the damage they deal
    pub fn tick_status(&mut self) -> f32 {
        let mut damage = 0.0;
        self.status.retain(|_, effect| {
            let (dealt, active) = effect.advance();
            damage += dealt;
            active
        });
        damage
    }
}

impl RigidCircle for Ball {
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn vel(&self) -> Vec2 {
        self.vel
    }
    fn radius(&self) -> f32 {
        self.radius
    }
    fn mass(&self) -> f32 {
        self.mass
    }
    fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }
    fn set_vel(&mut self, vel: Vec2) {
        self.vel = vel;
    }
}

/// Running counters for summaries and logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    pub total_hits: u32,
    pub parries: u32,
    pub supers: u32,
    pub projectiles_fired: u32,
    pub projectiles_evicted: u32,
    pub hazards_spawned: u32,
    pub clones_spawned: u32,
}

/// A single battle in progress
#[derive(Debug)]
pub struct BattleState {
    pub seed: u64,
    pub settings: Settings,
    pub rng: BattleRng,
    /// Ticks elapsed, including hit-stop ticks
    pub tick: u64,
    /// Ticks of frozen physics left
    pub hit_stop: u32,
    pub balls: Vec<Ball>,
    pub projectiles: Vec<Projectile>,
    pub hazards: Vec<Hazard>,
    pub stats: BattleStats,
    pub excitement: Excitement,
    pub result: Option<BattleResult>,
}

/// Build a fresh battle
///
/// Rejects invalid settings and unregistered weapon kinds. Both balls start
/// at mirrored spawn points with a random launch velocity drawn from the
/// battle's own seeded RNG.
pub fn configure(left: &str, right: &str, seed: u64, settings: Settings) -> Result<BattleState, SimError> {
    settings.validate()?;
    let left_weapon = weapon::create(left)?;
    let right_weapon = weapon::create(right)?;

    let mut rng = BattleRng::seeded(seed);
    let arena = settings.arena;
    let mut balls = vec![
        Ball::new(BallId(0), Side::Left, arena.spawn_point(0), left_weapon, &settings),
        Ball::new(BallId(1), Side::Right, arena.spawn_point(1), right_weapon, &settings),
    ];
    for ball in &mut balls {
        ball.weapon.stats.angle = rng.angle();
    }
    for ball in &mut balls {
        let spread = settings.launch_spread;
        ball.vel = Vec2::new(rng.centered(spread / 2.0), rng.centered(spread / 2.0));
    }

    log::info!(
        "Battle configured: {} vs {} (seed {})",
        balls[0].weapon.kind(),
        balls[1].weapon.kind(),
        seed
    );

    Ok(BattleState {
        seed,
        settings,
        rng,
        tick: 0,
        hit_stop: 0,
        balls,
        projectiles: Vec::new(),
        hazards: Vec::new(),
        stats: BattleStats::default(),
        excitement: Excitement::default(),
        result: None,
    })
}

impl BattleState {
    /// Snapshot of every ball, indexed by id
    pub fn bodies(&self) -> Vec<Body> {
        self.balls.iter().map(Ball::body).collect()
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.0)
    }

    pub fn side_balls(&self, side: Side) -> impl Iterator<Item = &Ball> {
        self.balls.iter().filter(move |b| b.side == side)
    }

    pub fn living(&self, side: Side) -> impl Iterator<Item = &Ball> {
        self.side_balls(side).filter(|b| b.alive)
    }

    /// The side's king if it has one, else its first ball
    pub fn representative(&self, side: Side) -> Option<&Ball> {
        self.side_balls(side)
            .find(|b| b.is_original)
            .or_else(|| self.side_balls(side).next())
    }

    /// Weapon kind the side started with
    pub fn weapon_kind(&self, side: Side) -> &'static str {
        self.representative(side).map_or("", |b| b.weapon.kind())
    }

    /// Two distinct balls, mutably
    pub fn pair_mut(&mut self, a: usize, b: usize) -> (&mut Ball, &mut Ball) {
        assert_ne!(a, b, "pair_mut needs two distinct balls");
        if a < b {
            let (lo, hi) = self.balls.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.balls.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    /// Clone `parent`, halving its hp. Returns the new ball's id.
    ///
    /// The clone gets at least `MIN_CLONE_HP`; the parent never gains hp.
    pub fn spawn_clone(&mut self, parent: BallId, bonus_hp: f32) -> Result<Option<BallId>, SimError> {
        let Some(source) = self.balls.get(parent.0) else {
            return Ok(None);
        };
        if !source.alive || self.side_balls(source.side).count() >= MAX_SIDE_BALLS {
            return Ok(None);
        }
        let side = source.side;
        let kind = source.weapon.kind();
        let split_hp = (source.hp / 2.0).floor().max(MIN_CLONE_HP);
        let radius = (source.radius * 0.75).max(MIN_CLONE_RADIUS);
        let origin = source.pos;
        let speed = source.speed().max(2.0);
        let mut weapon = weapon::create(kind)?;
        weapon.stats.angle = self.rng.angle();

        let offset = polar_to_cartesian(radius * 2.0, self.rng.angle());
        let id = BallId(self.balls.len());
        let arena = self.settings.arena;
        let pos = Vec2::new(
            (origin.x + offset.x).clamp(arena.left() + radius, arena.right() - radius),
            (origin.y + offset.y).clamp(arena.top() + radius, arena.bottom() - radius),
        );
        let vel = polar_to_cartesian(speed, self.rng.angle());

        let parent_ball = &mut self.balls[parent.0];
        // the clone floor never heals a nearly dead parent
        parent_ball.hp = parent_ball.hp.min(split_hp);

        let mut clone = Ball::new(id, side, pos, weapon, &self.settings);
        clone.is_original = false;
        clone.radius = radius;
        clone.hp = split_hp + bonus_hp;
        clone.max_hp = clone.hp;
        clone.hp_at_tick_start = clone.hp;
        clone.vel = vel;
        self.balls.push(clone);
        self.stats.clones_spawned += 1;
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_configure_rejects_unknown_weapon() {
        let err = configure("sword", "banana", 1, Settings::default()).unwrap_err();
        assert!(matches!(err, SimError::UnknownWeapon(k) if k == "banana"));
    }

    #[test]
    fn test_configure_rejects_bad_arena() {
        let settings = Settings::default().with_arena(crate::sim::Arena::new(0.0, 0.0, 0.0, 0.0));
        assert!(matches!(
            configure("sword", "dagger", 1, settings),
            Err(SimError::InvalidArena { .. })
        ));
    }

    #[test]
    fn test_configure_is_seeded() {
        let a = configure("sword", "bow", 42, Settings::default()).unwrap();
        let b = configure("sword", "bow", 42, Settings::default()).unwrap();
        assert_eq!(a.balls[0].vel, b.balls[0].vel);
        assert_eq!(a.balls[1].weapon.stats.angle, b.balls[1].weapon.stats.angle);
        assert_eq!(a.balls[0].side, Side::Left);
        assert_eq!(a.balls[1].weapon.stats.owner, BallId(1));
    }

    #[test]
    fn test_take_damage_kills_once() {
        let mut state = configure("sword", "dagger", 1, Settings::default()).unwrap();
        let ball = &mut state.balls[0];
        assert!(!ball.take_damage(40.0));
        assert!(ball.take_damage(500.0));
        assert_eq!(ball.hp, 0.0);
        assert!(!ball.alive);
        assert!(!ball.take_damage(5.0));
        assert!(!ball.kill());
    }

    #[test]
    fn test_negative_and_nan_damage_ignored() {
        let mut state = configure("sword", "dagger", 1, Settings::default()).unwrap();
        let ball = &mut state.balls[0];
        ball.take_damage(-10.0);
        ball.take_damage(f32::NAN);
        assert_eq!(ball.hp, ball.max_hp);
    }

    #[test]
    fn test_status_slows_ball() {
        let mut state = configure("sword", "dagger", 1, Settings::default()).unwrap();
        let ball = &mut state.balls[0];
        ball.apply_status(StatusEffect::slow(0.5, 10));
        ball.apply_status(StatusEffect::venom(5));
        assert!((ball.speed_multiplier() - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_clone_halves_parent() {
        let mut state = configure("duplicator", "sword", 3, Settings::default()).unwrap();
        let id = state.spawn_clone(BallId(0), 10.0).unwrap().unwrap();
        assert_eq!(id, BallId(2));
        assert_eq!(state.balls[0].hp, 50.0);
        let clone = &state.balls[2];
        assert_eq!(clone.hp, 60.0);
        assert_eq!(clone.max_hp, 60.0);
        assert!(!clone.is_original);
        assert_eq!(clone.side, Side::Left);
        assert_eq!(clone.weapon.stats.owner, BallId(2));
        assert!(state.settings.arena.contains_circle(clone.pos, clone.radius));
    }

    #[test]
    fn test_spawn_clone_never_heals_parent() {
        let mut state = configure("duplicator", "sword", 3, Settings::default()).unwrap();
        state.balls[0].hp = 3.0;
        let id = state.spawn_clone(BallId(0), 10.0).unwrap().unwrap();
        assert_eq!(state.balls[0].hp, 3.0);
        assert_eq!(state.balls[id.0].hp, MIN_CLONE_HP + 10.0);
    }

    #[test]
    fn test_pair_mut_order() {
        let mut state = configure("sword", "dagger", 1, Settings::default()).unwrap();
        let (b, a) = state.pair_mut(1, 0);
        assert_eq!(b.id, BallId(1));
        assert_eq!(a.id, BallId(0));
    }

    proptest! {
        #[test]
        fn prop_hp_stays_in_bounds(hits in prop::collection::vec(-50.0f32..80.0, 0..20)) {
            let mut state = configure("sword", "dagger", 9, Settings::default()).unwrap();
            let ball = &mut state.balls[1];
            for amount in hits {
                ball.take_damage(amount);
                prop_assert!(ball.hp >= 0.0 && ball.hp <= ball.max_hp);
                prop_assert_eq!(ball.alive, ball.hp > 0.0);
            }
        }
    }
}
