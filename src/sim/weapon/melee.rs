//! Spinning blade weapons
//!
//! All of these rotate around the owner and hit with the outer part of the
//! blade. They differ in what grows with hits and in their super.

use std::f32::consts::TAU;

use glam::Vec2;

use super::{Action, Weapon, WeaponBehavior, WeaponCtx, WeaponStats};
use crate::sim::projectile::Projectile;
use crate::sim::state::Body;
use crate::sim::status::StatusEffect;
use crate::polar_to_cartesian;

pub const SWORD_COLOR: u32 = 0xE74C3C;
pub const DAGGER_COLOR: u32 = 0x3498DB;
pub const SPEAR_COLOR: u32 = 0x2ECC71;
pub const HAMMER_COLOR: u32 = 0xE67E22;
pub const POISON_COLOR: u32 = 0x9B59B6;
pub const TRIDENT_COLOR: u32 = 0x1ABC9C;

// === Sword ===

const SWORD_SPIN: f32 = 0.06;

/// +1 damage per hit; super doubles the spin
#[derive(Debug, Default)]
struct Sword;

impl WeaponBehavior for Sword {
    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        stats.current_damage = stats.base_damage + stats.hit_count as f32;
        stats.rotation_speed = if stats.super_active { SWORD_SPIN * 2.0 } else { SWORD_SPIN };
    }
}

pub(super) fn sword() -> Weapon {
    Weapon::new(
        WeaponStats::new("sword", SWORD_COLOR, 3.0, SWORD_SPIN, 80.0).super_at(10),
        Box::new(Sword),
    )
}

// === Dagger ===

const DAGGER_SPIN: f32 = 0.08;
const DAGGER_SPIN_PER_HIT: f32 = 0.008;
const DAGGER_MAX_SPIN: f32 = 0.3;

/// Spins faster with every hit; super triples the reach
#[derive(Debug, Default)]
struct Dagger;

impl WeaponBehavior for Dagger {
    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        stats.rotation_speed =
            (DAGGER_SPIN + stats.hit_count as f32 * DAGGER_SPIN_PER_HIT).min(DAGGER_MAX_SPIN);
        if stats.super_active {
            stats.reach = stats.base_reach * 3.0;
            stats.current_damage = stats.base_damage + 2.0;
        } else {
            stats.reach = stats.base_reach;
            stats.current_damage = stats.base_damage;
        }
    }

    fn scaling_stat(&self, stats: &WeaponStats) -> (&'static str, f32) {
        ("spin", stats.rotation_speed)
    }
}

pub(super) fn dagger() -> Weapon {
    Weapon::new(
        WeaponStats::new("dagger", DAGGER_COLOR, 2.0, DAGGER_SPIN, 62.0),
        Box::new(Dagger),
    )
}

// === Spear ===

const SPEAR_SPIN: f32 = 0.045;
const SPEAR_REACH_PER_HIT: f32 = 4.0;
const SPEAR_MAX_REACH: f32 = 200.0;

/// Grows longer with hits
#[derive(Debug, Default)]
struct Spear;

impl WeaponBehavior for Spear {
    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        let hits = stats.hit_count as f32;
        stats.reach = (stats.base_reach + hits * SPEAR_REACH_PER_HIT).min(SPEAR_MAX_REACH);
        stats.current_damage = stats.base_damage + hits * 0.5;
        stats.rotation_speed = SPEAR_SPIN;
        if stats.super_active {
            stats.current_damage += 3.0;
            stats.rotation_speed = SPEAR_SPIN * 1.5;
        }
    }

    fn scaling_stat(&self, stats: &WeaponStats) -> (&'static str, f32) {
        ("reach", stats.reach)
    }
}

pub(super) fn spear() -> Weapon {
    Weapon::new(
        WeaponStats::new("spear", SPEAR_COLOR, 3.0, SPEAR_SPIN, 95.0).super_at(12),
        Box::new(Spear),
    )
}

// === Hammer ===

const HAMMER_SWING_RATE: f32 = 0.018;
const HAMMER_MAX_SPIN: f32 = 0.07;
const HAMMER_SPIN_PER_HIT: f32 = 0.005;

/// Swings back and forth instead of spinning; each hit widens the swing
#[derive(Debug, Default)]
struct Hammer {
    phase: f32,
    max_spin: f32,
}

impl WeaponBehavior for Hammer {
    fn update(&mut self, stats: &mut WeaponStats, _ctx: &mut WeaponCtx<'_>) {
        self.phase = (self.phase + HAMMER_SWING_RATE) % TAU;
        stats.rotation_speed = self.max_spin * self.phase.sin().abs().max(0.25);
        stats.spin();
        stats.tick_cooldowns();
    }

    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        self.max_spin = HAMMER_MAX_SPIN + stats.hit_count as f32 * HAMMER_SPIN_PER_HIT;
        stats.current_damage = stats.base_damage + if stats.super_active { 3.0 } else { 0.0 };
        stats.unparryable = stats.super_active;
    }

    fn scaling_stat(&self, _stats: &WeaponStats) -> (&'static str, f32) {
        ("swing", self.max_spin)
    }
}

pub(super) fn hammer() -> Weapon {
    Weapon::new(
        WeaponStats::new("hammer", HAMMER_COLOR, 5.0, HAMMER_MAX_SPIN, 78.0),
        Box::new(Hammer::default()),
    )
}

// === Poison blade ===

const POISON_MAX_STACKS: u32 = 8;
const POISON_RING_GLOBS: usize = 10;
const POISON_GLOB_SPEED: f32 = 4.0;
const POISON_GLOB_DAMAGE: f32 = 4.0;

/// Stacks poison on every hit; super sprays a ring of poison globs
#[derive(Debug, Default)]
struct PoisonBlade;

impl PoisonBlade {
    fn stacks_per_hit(hits: u32) -> u32 {
        (1 + hits / 2).min(POISON_MAX_STACKS)
    }
}

impl WeaponBehavior for PoisonBlade {
    fn on_hit(&mut self, stats: &mut WeaponStats, target: &Body, ctx: &mut WeaponCtx<'_>) {
        ctx.push(Action::Status {
            target: target.id,
            effect: StatusEffect::poison(Self::stacks_per_hit(stats.hit_count)),
        });
    }

    fn on_projectile_hit(&mut self, stats: &mut WeaponStats, target: &Body, ctx: &mut WeaponCtx<'_>) {
        ctx.push(Action::Status {
            target: target.id,
            effect: StatusEffect::poison(Self::stacks_per_hit(stats.hit_count)),
        });
    }

    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        stats.current_damage = stats.base_damage + stats.hit_count as f32 * 0.3;
    }

    fn activate_super(&mut self, stats: &mut WeaponStats, ctx: &mut WeaponCtx<'_>) {
        let owner = ctx.owner;
        for i in 0..POISON_RING_GLOBS {
            let angle = i as f32 / POISON_RING_GLOBS as f32 * TAU;
            let dir = polar_to_cartesian(1.0, angle);
            ctx.fire(
                Projectile::new(
                    owner.pos + dir * (owner.radius + 6.0),
                    dir * POISON_GLOB_SPEED,
                    POISON_GLOB_DAMAGE,
                    5.0,
                    120,
                )
                .owned_by(&owner)
                .with_bounces(1)
                .with_color(stats.color),
            );
        }
        let enemies: Vec<_> = ctx.enemies().map(|b| b.id).collect();
        for target in enemies {
            ctx.push(Action::Status {
                target,
                effect: StatusEffect::poison(POISON_MAX_STACKS),
            });
            ctx.push(Action::Damage { target, amount: 4.0 });
        }
    }

    fn scaling_stat(&self, stats: &WeaponStats) -> (&'static str, f32) {
        ("venom", Self::stacks_per_hit(stats.hit_count) as f32)
    }
}

pub(super) fn poison() -> Weapon {
    Weapon::new(
        WeaponStats::new("poison", POISON_COLOR, 2.0, 0.05, 55.0),
        Box::new(PoisonBlade),
    )
}

// === Trident ===

const TRIDENT_SLOW: f32 = 0.6;
const TRIDENT_SUPER_SLOW: f32 = 0.35;
const TRIDENT_KNOCKBACK: f32 = 3.0;

/// Every hit slows the target; super deepens the slow and adds knockback
#[derive(Debug, Default)]
struct Trident;

impl WeaponBehavior for Trident {
    fn on_hit(&mut self, stats: &mut WeaponStats, target: &Body, ctx: &mut WeaponCtx<'_>) {
        let (factor, duration) = if stats.super_active {
            (TRIDENT_SUPER_SLOW, 150)
        } else {
            (TRIDENT_SLOW, 90)
        };
        ctx.push(Action::Status {
            target: target.id,
            effect: StatusEffect::slow(factor, duration),
        });
        if stats.super_active {
            let away = (target.pos - ctx.owner.pos).try_normalize().unwrap_or(Vec2::X);
            ctx.push(Action::Knockback {
                target: target.id,
                impulse: away * TRIDENT_KNOCKBACK,
            });
        }
    }

    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        stats.current_damage = stats.base_damage
            + stats.hit_count as f32 * 0.5
            + if stats.super_active { 2.0 } else { 0.0 };
    }
}

pub(super) fn trident() -> Weapon {
    Weapon::new(
        WeaponStats::new("trident", TRIDENT_COLOR, 3.0, 0.05, 85.0),
        Box::new(Trident),
    )
}
