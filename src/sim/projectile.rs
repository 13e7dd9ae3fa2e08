//! Projectiles
//!
//! Owned by the battle, not by the weapon that fired them. The owner is kept
//! as a `BallId` so hits can be credited back to that ball's weapon.

use glam::Vec2;

use super::arena::Arena;
use super::collision::{circle_circle, reflect_velocity};
use super::hazard::Hazard;
use super::state::{BallId, Body, Side};
use crate::heading;

/// Outcome of one projectile step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProjectileStep {
    /// Wall contact point when the projectile bounced this tick
    pub bounced_at: Option<Vec2>,
    /// Set when the projectile expired this tick
    pub expired: bool,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub owner: Option<BallId>,
    pub owner_side: Option<Side>,
    /// Ticks left before expiry
    pub lifespan: u32,
    /// Wall bounces left
    pub bounces: u32,
    /// Keep flying after a hit, at most once per target until the next bounce
    pub piercing: bool,
    /// Fraction of the angular gap to the nearest enemy closed per tick
    pub homing: f32,
    /// Fraction of damage lost per bounce
    pub damage_falloff: f32,
    pub gravity_affected: bool,
    pub color: u32,
    pub alive: bool,
    /// Whether it ever connected
    pub has_hit: bool,
    hit_set: Vec<BallId>,
    miss_hazard: Option<Box<Hazard>>,
}

impl Projectile {
    pub fn new(pos: Vec2, vel: Vec2, damage: f32, radius: f32, lifespan: u32) -> Self {
        Self {
            pos,
            vel,
            radius,
            damage,
            owner: None,
            owner_side: None,
            lifespan,
            bounces: 0,
            piercing: false,
            homing: 0.0,
            damage_falloff: 0.0,
            gravity_affected: false,
            color: 0xFFFFFF,
            alive: true,
            has_hit: false,
            hit_set: Vec::new(),
            miss_hazard: None,
        }
    }

    pub fn owned_by(mut self, owner: &Body) -> Self {
        self.owner = Some(owner.id);
        self.owner_side = Some(owner.side);
        self
    }

    pub fn with_bounces(mut self, bounces: u32) -> Self {
        self.bounces = bounces;
        self
    }

    pub fn piercing(mut self) -> Self {
        self.piercing = true;
        self
    }

    pub fn with_homing(mut self, strength: f32) -> Self {
        self.homing = strength;
        self
    }

    pub fn with_falloff(mut self, falloff: f32) -> Self {
        self.damage_falloff = falloff.clamp(0.0, 1.0);
        self
    }

    pub fn with_gravity(mut self) -> Self {
        self.gravity_affected = true;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Hazard left behind at the expiry point if this never hits anything
    pub fn on_miss(mut self, hazard: Hazard) -> Self {
        self.miss_hazard = Some(Box::new(hazard));
        self
    }

    pub fn on_miss_hazard(&self) -> Option<&Hazard> {
        self.miss_hazard.as_deref()
    }

    /// Hazard to spawn now that this projectile has expired, if it never hit
    pub fn take_miss_hazard(&mut self) -> Option<Hazard> {
        if self.alive || self.has_hit {
            return None;
        }
        self.miss_hazard.take().map(|mut hazard| {
            hazard.pos = self.pos;
            *hazard
        })
    }

    /// Move, steer, age, then resolve walls
    pub fn update(&mut self, arena: &Arena, gravity: Vec2, bodies: &[Body]) -> ProjectileStep {
        let mut step = ProjectileStep::default();
        if !self.alive {
            return step;
        }

        self.pos += self.vel;
        if self.gravity_affected {
            self.vel += gravity;
        }
        if self.homing > 0.0 {
            self.steer(bodies);
        }

        self.lifespan = self.lifespan.saturating_sub(1);
        if self.lifespan == 0 {
            self.expire(arena);
            step.expired = true;
            return step;
        }

        let contact = arena.clamp_point(self.pos);
        for normal in self.walls_crossed(arena).into_iter().flatten() {
            // a corner costs one bounce per wall
            if self.bounces == 0 {
                self.expire(arena);
                step.expired = true;
                return step;
            }
            self.bounce(arena, normal);
            step.bounced_at = Some(contact);
        }
        step
    }

    /// Normals of the walls the projectile has crossed, x axis first
    fn walls_crossed(&self, arena: &Arena) -> [Option<Vec2>; 2] {
        let r = self.radius;
        let x = if self.pos.x - r < arena.left() {
            Some(Vec2::X)
        } else if self.pos.x + r > arena.right() {
            Some(Vec2::NEG_X)
        } else {
            None
        };
        let y = if self.pos.y - r < arena.top() {
            Some(Vec2::Y)
        } else if self.pos.y + r > arena.bottom() {
            Some(Vec2::NEG_Y)
        } else {
            None
        };
        [x, y]
    }

    /// Reflect off one wall, spending a bounce
    fn bounce(&mut self, arena: &Arena, normal: Vec2) {
        let r = self.radius;
        self.vel = reflect_velocity(self.vel, normal);
        if normal.x != 0.0 {
            self.pos.x = self.pos.x.clamp(arena.left() + r, arena.right() - r);
        } else {
            self.pos.y = self.pos.y.clamp(arena.top() + r, arena.bottom() - r);
        }
        self.bounces -= 1;
        self.damage *= 1.0 - self.damage_falloff;
        // a bounce makes earlier targets hittable again
        self.hit_set.clear();
    }

    fn steer(&mut self, bodies: &[Body]) {
        let target = bodies
            .iter()
            .filter(|b| b.alive && Some(b.side) != self.owner_side)
            .map(|b| (b, b.pos.distance_squared(self.pos)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((target, _)) = target else {
            return;
        };
        let speed = self.vel.length();
        if speed < f32::EPSILON {
            return;
        }
        let current = heading(self.vel);
        let wanted = heading(target.pos - self.pos);
        let diff = crate::normalize_angle(wanted - current);
        let turned = current + diff * self.homing;
        self.vel = crate::polar_to_cartesian(speed, turned);
    }

    fn expire(&mut self, arena: &Arena) {
        self.alive = false;
        self.pos = arena.clamp_point(self.pos);
    }

    /// Whether this projectile would hit `target` now
    pub fn can_hit(&self, target: &Body) -> bool {
        self.alive
            && target.alive
            && Some(target.id) != self.owner
            && Some(target.side) != self.owner_side
            && !self.hit_set.contains(&target.id)
            && circle_circle(self.pos, self.radius, target.pos, target.radius)
    }

    /// Record a landed hit; non-piercing projectiles die on their first hit
    pub fn register_hit(&mut self, target: BallId) {
        self.has_hit = true;
        if self.piercing {
            self.hit_set.push(target);
        } else {
            self.alive = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BALL_MAX_HP;

    fn target(id: usize, side: Side, pos: Vec2) -> Body {
        Body {
            id: BallId(id),
            pos,
            vel: Vec2::ZERO,
            radius: 20.0,
            side,
            alive: true,
            is_original: true,
            hp: BALL_MAX_HP,
            max_hp: BALL_MAX_HP,
        }
    }

    fn shooter() -> Body {
        target(0, Side::Left, Vec2::new(50.0, 50.0))
    }

    fn arena() -> Arena {
        Arena::new(0.0, 0.0, 200.0, 200.0)
    }

    #[test]
    fn test_never_hits_own_side() {
        let p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::ZERO, 1.0, 4.0, 10).owned_by(&shooter());
        assert!(!p.can_hit(&target(0, Side::Left, Vec2::new(100.0, 100.0))));
        assert!(!p.can_hit(&target(2, Side::Left, Vec2::new(100.0, 100.0))));
        assert!(p.can_hit(&target(1, Side::Right, Vec2::new(100.0, 100.0))));
    }

    #[test]
    fn test_non_piercing_dies_on_hit() {
        let mut p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::ZERO, 1.0, 4.0, 10);
        p.register_hit(BallId(1));
        assert!(!p.alive);
        assert!(p.has_hit);
    }

    #[test]
    fn test_piercing_rehits_only_after_bounce() {
        let enemy = target(1, Side::Right, Vec2::new(185.0, 100.0));
        let mut p = Projectile::new(Vec2::new(194.0, 100.0), Vec2::new(5.0, 0.0), 2.0, 4.0, 100)
            .owned_by(&shooter())
            .piercing()
            .with_bounces(2);
        assert!(p.can_hit(&enemy));
        p.register_hit(enemy.id);
        assert!(p.alive);
        assert!(!p.can_hit(&enemy));

        let step = p.update(&arena(), Vec2::ZERO, &[]);
        assert!(step.bounced_at.is_some());
        assert!(p.vel.x < 0.0);
        assert!(p.can_hit(&enemy));
    }

    #[test]
    fn test_falloff_per_bounce() {
        let mut p = Projectile::new(Vec2::new(198.0, 100.0), Vec2::new(5.0, 0.0), 4.0, 4.0, 100)
            .with_bounces(1)
            .with_falloff(0.25);
        p.update(&arena(), Vec2::ZERO, &[]);
        assert_eq!(p.damage, 3.0);
        assert_eq!(p.bounces, 0);
    }

    #[test]
    fn test_wall_without_bounces_expires() {
        let mut p = Projectile::new(Vec2::new(198.0, 100.0), Vec2::new(5.0, 0.0), 4.0, 4.0, 100);
        let step = p.update(&arena(), Vec2::ZERO, &[]);
        assert!(step.expired);
        assert!(!p.alive);
    }

    #[test]
    fn test_lifespan_expiry_drops_miss_hazard() {
        let mut p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0), 1.0, 4.0, 2)
            .on_miss(Hazard::new(Vec2::ZERO, 30.0, 1.0, 30, 100));
        p.update(&arena(), Vec2::ZERO, &[]);
        assert!(p.take_miss_hazard().is_none());
        p.update(&arena(), Vec2::ZERO, &[]);
        let hazard = p.take_miss_hazard().unwrap();
        assert_eq!(hazard.pos, Vec2::new(102.0, 100.0));
    }

    #[test]
    fn test_hit_projectile_leaves_no_hazard() {
        let mut p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::ZERO, 1.0, 4.0, 1)
            .on_miss(Hazard::new(Vec2::ZERO, 30.0, 1.0, 30, 100));
        p.register_hit(BallId(1));
        assert!(p.take_miss_hazard().is_none());
    }

    #[test]
    fn test_homing_turns_toward_enemy() {
        let enemy = target(1, Side::Right, Vec2::new(150.0, 150.0));
        let mut p = Projectile::new(Vec2::new(50.0, 100.0), Vec2::new(3.0, 0.0), 1.0, 4.0, 100)
            .owned_by(&shooter())
            .with_homing(0.1);
        p.update(&arena(), Vec2::ZERO, &[enemy]);
        assert!(p.vel.y > 0.0);
        assert!((p.vel.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_homing_closes_fraction_of_gap() {
        let big = Arena::new(0.0, 0.0, 1000.0, 1000.0);
        // enemy straight below the post-move position
        let enemy = target(1, Side::Right, Vec2::new(503.0, 700.0));
        let mut p = Projectile::new(Vec2::new(500.0, 500.0), Vec2::new(3.0, 0.0), 1.0, 4.0, 100)
            .owned_by(&shooter())
            .with_homing(0.5);
        p.update(&big, Vec2::ZERO, &[enemy]);
        assert!((heading(p.vel) - std::f32::consts::FRAC_PI_4).abs() < 1e-4);
        assert!((p.vel.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_homing_tracks_distant_enemy() {
        let big = Arena::new(0.0, 0.0, 2000.0, 2000.0);
        let enemy = target(1, Side::Right, Vec2::new(1400.0, 1500.0));
        let mut p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::new(3.0, 0.0), 1.0, 4.0, 100)
            .owned_by(&shooter())
            .with_homing(0.1);
        p.update(&big, Vec2::ZERO, &[enemy]);
        assert!(p.vel.y > 0.0);
    }

    #[test]
    fn test_corner_spends_bounce_per_wall() {
        let mut p = Projectile::new(Vec2::new(198.0, 198.0), Vec2::new(5.0, 5.0), 4.0, 4.0, 100)
            .with_bounces(2)
            .with_falloff(0.5);
        let step = p.update(&arena(), Vec2::ZERO, &[]);
        assert!(p.alive);
        assert!(step.bounced_at.is_some());
        assert_eq!(p.bounces, 0);
        assert_eq!(p.vel, Vec2::new(-5.0, -5.0));
        assert_eq!(p.damage, 1.0);

        let mut short = Projectile::new(Vec2::new(198.0, 198.0), Vec2::new(5.0, 5.0), 4.0, 4.0, 100).with_bounces(1);
        let step = short.update(&arena(), Vec2::ZERO, &[]);
        assert!(step.expired);
        assert!(!short.alive);
    }

    #[test]
    fn test_gravity_bends_path() {
        let mut p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::new(2.0, 0.0), 1.0, 4.0, 100).with_gravity();
        p.update(&arena(), Vec2::new(0.0, 0.5), &[]);
        p.update(&arena(), Vec2::new(0.0, 0.5), &[]);
        assert!(p.pos.y > 100.0);
    }
}
