//! Collision detection and response for circles, segments and walls
//!
//! Predicates are pure. The resolvers mutate positions and velocities in
//! place and never fail: degenerate inputs (coincident centres, zero-length
//! segments) fall through as "no contact".

use glam::Vec2;

use super::arena::{Arena, Wall};

/// A movable circle with mass
pub trait RigidCircle {
    fn pos(&self) -> Vec2;
    fn vel(&self) -> Vec2;
    fn radius(&self) -> f32;
    fn mass(&self) -> f32;
    fn set_pos(&mut self, pos: Vec2);
    fn set_vel(&mut self, vel: Vec2);
}

/// Overlap test between two circles
#[inline]
pub fn circle_circle(p1: Vec2, r1: f32, p2: Vec2, r2: f32) -> bool {
    let min_dist = r1 + r2;
    p1.distance_squared(p2) < min_dist * min_dist
}

/// Segment `a`-`b` against circle (`c`, `r`)
///
/// Hits when the segment crosses the circle boundary. A segment lying entirely
/// inside the circle counts as a hit as well.
pub fn line_circle(a: Vec2, b: Vec2, c: Vec2, r: f32) -> bool {
    let d = b - a;
    let f = a - c;
    let len_sq = d.length_squared();
    if len_sq < 1e-8 {
        return f.length_squared() < r * r;
    }
    let bq = 2.0 * f.dot(d);
    let cq = f.length_squared() - r * r;
    let discriminant = bq * bq - 4.0 * len_sq * cq;
    if discriminant < 0.0 {
        return false;
    }
    let root = discriminant.sqrt();
    let t1 = (-bq - root) / (2.0 * len_sq);
    let t2 = (-bq + root) / (2.0 * len_sq);
    (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2) || (t1 < 0.0 && t2 > 1.0)
}

/// Push two overlapping circles apart along their centre line, weighted by inverse mass
pub fn separate_circles<A: RigidCircle + ?Sized, B: RigidCircle + ?Sized>(a: &mut A, b: &mut B) {
    let delta = b.pos() - a.pos();
    let dist = delta.length();
    let min_dist = a.radius() + b.radius();
    if dist >= min_dist || dist < 1e-6 {
        return;
    }
    let normal = delta / dist;
    // Small slop so the pair does not re-collide next tick from rounding
    let overlap = min_dist - dist + 1.0;

    let inv_a = inverse_mass(a.mass());
    let inv_b = inverse_mass(b.mass());
    let inv_total = inv_a + inv_b;
    if inv_total <= 0.0 {
        return;
    }
    a.set_pos(a.pos() - normal * overlap * (inv_a / inv_total));
    b.set_pos(b.pos() + normal * overlap * (inv_b / inv_total));
}

/// Exchange velocity along the collision normal, conserving mass-weighted momentum
pub fn resolve_circle_circle<A: RigidCircle + ?Sized, B: RigidCircle + ?Sized>(
    a: &mut A,
    b: &mut B,
    restitution: f32,
) {
    let delta = b.pos() - a.pos();
    let dist = delta.length();
    if dist < 1e-6 {
        return;
    }
    let normal = delta / dist;
    let closing = (a.vel() - b.vel()).dot(normal);
    // Already separating
    if closing < 0.0 {
        return;
    }
    let (ma, mb) = (a.mass(), b.mass());
    let total = ma + mb;
    if total <= 0.0 {
        return;
    }
    let j = (1.0 + restitution) * closing / total;
    a.set_vel(a.vel() - normal * (j * mb));
    b.set_vel(b.vel() + normal * (j * ma));
}

#[inline]
fn inverse_mass(mass: f32) -> f32 {
    if mass > 0.0 { 1.0 / mass } else { 0.0 }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Keep a circle inside the arena, reflecting the velocity on contact
///
/// Returns the last wall touched this call.
pub fn bounce_off_walls<A: RigidCircle + ?Sized>(
    body: &mut A,
    arena: &Arena,
    restitution: f32,
) -> Option<Wall> {
    let r = body.radius();
    let mut pos = body.pos();
    let mut vel = body.vel();
    let mut hit = None;

    if pos.x - r < arena.left() {
        pos.x = arena.left() + r;
        vel.x = vel.x.abs() * restitution;
        hit = Some(Wall::Left);
    }
    if pos.x + r > arena.right() {
        pos.x = arena.right() - r;
        vel.x = -vel.x.abs() * restitution;
        hit = Some(Wall::Right);
    }
    if pos.y - r < arena.top() {
        pos.y = arena.top() + r;
        vel.y = vel.y.abs() * restitution;
        hit = Some(Wall::Top);
    }
    if pos.y + r > arena.bottom() {
        pos.y = arena.bottom() - r;
        vel.y = -vel.y.abs() * restitution;
        hit = Some(Wall::Bottom);
    }

    if hit.is_some() {
        body.set_pos(pos);
        body.set_vel(vel);
    }
    hit
}

/// Impulse to apply to a ball whose weapon tip pokes outside the arena
///
/// Returns the first wall pierced and the velocity change pushing back inside.
pub fn tip_wall_impulse(tip: Vec2, arena: &Arena, strength: f32) -> Option<(Wall, Vec2)> {
    let mut impulse = Vec2::ZERO;
    let mut hit = None;

    if tip.x < arena.left() {
        impulse.x += strength;
        hit = Some(Wall::Left);
    } else if tip.x > arena.right() {
        impulse.x -= strength;
        hit = Some(Wall::Right);
    }
    if tip.y < arena.top() {
        impulse.y += strength;
        hit = hit.or(Some(Wall::Top));
    } else if tip.y > arena.bottom() {
        impulse.y -= strength;
        hit = hit.or(Some(Wall::Bottom));
    }

    hit.map(|wall| (wall, impulse))
}
