//! Zero-reach weapons that hurt on body contact

use glam::Vec2;

use super::{Action, Weapon, WeaponBehavior, WeaponCtx, WeaponStats};
use crate::sim::state::Body;

pub const UNARMED_COLOR: u32 = 0xF1C40F;
pub const DUPLICATOR_COLOR: u32 = 0xBDC3C7;

// === Unarmed ===

const UNARMED_SPEED_DAMAGE: f32 = 0.8;
const UNARMED_KNOCKBACK: f32 = 3.0;
const UNARMED_SPEED_PER_HIT: f32 = 0.3;
const UNARMED_MAX_SPEED_BONUS: f32 = 6.0;
const UNARMED_SUPER_SPEED_BONUS: f32 = 100.0;

/// Damage comes from the owner's speed; each hit raises the speed cap
#[derive(Debug, Default)]
struct Unarmed;

impl Unarmed {
    fn speed_bonus(hits: u32) -> f32 {
        (hits as f32 * UNARMED_SPEED_PER_HIT).min(UNARMED_MAX_SPEED_BONUS)
    }
}

impl WeaponBehavior for Unarmed {
    fn update(&mut self, stats: &mut WeaponStats, _ctx: &mut WeaponCtx<'_>) {
        stats.tick_cooldowns();
    }

    fn hit_damage(&self, stats: &WeaponStats, owner: &Body) -> f32 {
        let from_speed = (owner.vel.length() * UNARMED_SPEED_DAMAGE).floor().max(1.0);
        from_speed + if stats.super_active { 2.0 } else { 0.0 }
    }

    fn on_hit(&mut self, stats: &mut WeaponStats, target: &Body, ctx: &mut WeaponCtx<'_>) {
        let away = (target.pos - ctx.owner.pos).try_normalize().unwrap_or(Vec2::X);
        ctx.push(Action::Knockback {
            target: target.id,
            impulse: away * UNARMED_KNOCKBACK,
        });
        if !stats.super_active {
            let cap = ctx.settings.ball_max_speed + Self::speed_bonus(stats.hit_count + 1);
            ctx.push(Action::SetOwnerMaxSpeed(cap));
        }
    }

    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        stats.current_damage = stats.base_damage;
    }

    fn activate_super(&mut self, _stats: &mut WeaponStats, ctx: &mut WeaponCtx<'_>) {
        let cap = ctx.settings.ball_max_speed + UNARMED_SUPER_SPEED_BONUS;
        ctx.push(Action::SetOwnerMaxSpeed(cap));
        ctx.push(Action::SetOwnerVelocity(ctx.owner.vel * 1.5));
    }

    fn scaling_stat(&self, stats: &WeaponStats) -> (&'static str, f32) {
        ("speed", Self::speed_bonus(stats.hit_count))
    }
}

pub(super) fn unarmed() -> Weapon {
    Weapon::new(
        WeaponStats::new("unarmed", UNARMED_COLOR, 1.0, 0.0, 0.0)
            .contact(0.0)
            .super_at(8),
        Box::new(Unarmed),
    )
}

// === Duplicator ===

/// Ticks between splits (8 seconds)
pub const SPLIT_INTERVAL: u32 = 480;
const DUPLICATOR_AURA: f32 = 8.0;
const SUPER_CLONE_HP: f32 = 10.0;

/// The original ball periodically clones its whole side
#[derive(Debug, Default)]
struct Duplicator {
    split_timer: u32,
}

impl WeaponBehavior for Duplicator {
    fn update(&mut self, stats: &mut WeaponStats, ctx: &mut WeaponCtx<'_>) {
        stats.tick_cooldowns();
        if !ctx.owner.is_original {
            return;
        }
        self.split_timer += 1;
        if self.split_timer >= SPLIT_INTERVAL {
            self.split_timer = 0;
            let bonus_hp = if stats.super_active { SUPER_CLONE_HP } else { 0.0 };
            ctx.push(Action::Split { bonus_hp });
        }
    }

    fn apply_scaling(&mut self, stats: &mut WeaponStats) {
        stats.current_damage = stats.base_damage + (stats.hit_count / 4) as f32;
    }

    fn scaling_stat(&self, _stats: &WeaponStats) -> (&'static str, f32) {
        ("split", self.split_timer as f32 / SPLIT_INTERVAL as f32)
    }
}

pub(super) fn duplicator() -> Weapon {
    Weapon::new(
        WeaponStats::new("duplicator", DUPLICATOR_COLOR, 2.0, 0.0, 0.0)
            .contact(DUPLICATOR_AURA)
            .super_at(12),
        Box::new(Duplicator::default()),
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body, with_ctx};
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::Side;

    #[test]
    fn test_unarmed_damage_from_speed() {
        let weapon = unarmed();
        let mut owner = body(0, Side::Left, Vec2::ZERO);
        assert_eq!(Unarmed.hit_damage(&weapon.stats, &owner), 1.0);
        owner.vel = Vec2::new(6.0, 8.0);
        assert_eq!(Unarmed.hit_damage(&weapon.stats, &owner), 8.0);
    }

    #[test]
    fn test_unarmed_cannot_parry() {
        assert!(!unarmed().can_parry());
        assert!(!duplicator().can_parry());
    }

    #[test]
    fn test_duplicator_splits_on_interval() {
        let settings = Settings::default();
        let mut weapon = duplicator();
        let mut splits = 0;
        for _ in 0..SPLIT_INTERVAL * 2 {
            let (_, actions) = with_ctx(&settings, |ctx| weapon.update(ctx));
            splits += actions.iter().filter(|a| matches!(a, Action::Split { .. })).count();
        }
        assert_eq!(splits, 2);
    }
}
