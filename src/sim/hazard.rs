//! Area hazards
//!
//! Static or drifting circles that damage every non-owner ball inside them on
//! a fixed interval. The interval is one timer per hazard, so all targets
//! inside on a due tick are hit together.

use glam::Vec2;

use super::arena::Arena;
use super::collision::circle_circle;
use super::state::{BallId, Body, Side};
use super::status::StatusEffect;

#[derive(Debug, Clone)]
pub struct Hazard {
    pub pos: Vec2,
    /// Drift per tick; zero for a static hazard
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Ticks between damage ticks
    pub tick_rate: u32,
    /// Ticks until the next damage tick (0 means due now)
    pub timer: u32,
    pub lifespan: u32,
    pub owner: Option<BallId>,
    pub owner_side: Option<Side>,
    /// Applied alongside the damage
    pub status: Option<StatusEffect>,
    pub color: u32,
    pub alive: bool,
}

impl Hazard {
    pub fn new(pos: Vec2, radius: f32, damage: f32, tick_rate: u32, lifespan: u32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            damage,
            tick_rate: tick_rate.max(1),
            timer: 0,
            lifespan,
            owner: None,
            owner_side: None,
            status: None,
            color: 0xFFFFFF,
            alive: true,
        }
    }

    pub fn owned_by(mut self, owner: &Body) -> Self {
        self.owner = Some(owner.id);
        self.owner_side = Some(owner.side);
        self
    }

    pub fn drifting(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_status(mut self, effect: StatusEffect) -> Self {
        self.status = Some(effect);
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Age, drift and advance the damage timer. Returns true on a damage tick.
    pub fn update(&mut self, arena: &Arena) -> bool {
        if !self.alive {
            return false;
        }
        self.lifespan = self.lifespan.saturating_sub(1);
        if self.lifespan == 0 {
            self.alive = false;
            return false;
        }

        if self.vel != Vec2::ZERO {
            self.drift(arena);
        }

        if self.timer == 0 {
            self.timer = self.tick_rate - 1;
            true
        } else {
            self.timer -= 1;
            false
        }
    }

    fn drift(&mut self, arena: &Arena) {
        self.pos += self.vel;
        let r = self.radius;
        if self.pos.x - r < arena.left() || self.pos.x + r > arena.right() {
            self.vel.x = -self.vel.x;
            self.pos.x = self.pos.x.clamp(arena.left() + r, (arena.right() - r).max(arena.left() + r));
        }
        if self.pos.y - r < arena.top() || self.pos.y + r > arena.bottom() {
            self.vel.y = -self.vel.y;
            self.pos.y = self.pos.y.clamp(arena.top() + r, (arena.bottom() - r).max(arena.top() + r));
        }
    }

    /// Whether `target` takes damage from this hazard on a damage tick
    pub fn affects(&self, target: &Body) -> bool {
        self.alive
            && target.alive
            && Some(target.side) != self.owner_side
            && circle_circle(self.pos, self.radius, target.pos, target.radius)
    }
}
