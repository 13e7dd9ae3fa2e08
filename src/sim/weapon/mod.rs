//! Weapon ability contract and registry
//!
//! A `Weapon` pairs the common `WeaponStats` every weapon carries with a boxed
//! `WeaponBehavior` holding the variant's own hooks and private state. Hooks
//! never reach into other balls; they read snapshots through `WeaponCtx` and
//! queue `Action`s that the tick applies once the hook returns.

mod contact;
mod melee;
mod ranged;

pub use contact::SPLIT_INTERVAL;

use std::fmt;

use glam::Vec2;

use super::hazard::Hazard;
use super::projectile::Projectile;
use super::rng::BattleRng;
use super::state::{BallId, Body};
use super::status::StatusEffect;
use crate::consts::*;
use crate::error::SimError;
use crate::settings::Settings;
use crate::{normalize_angle, polar_to_cartesian};

/// Fraction of the reach where the hitting part of a blade starts
pub const SHAFT_START: f32 = 0.4;

/// Data every weapon carries regardless of variant
#[derive(Debug, Clone)]
pub struct WeaponStats {
    /// Registry identifier
    pub kind: &'static str,
    pub owner: BallId,
    /// Display color (0xRRGGBB)
    pub color: u32,

    pub base_damage: f32,
    pub current_damage: f32,
    /// Confirmed hits credited to this weapon; never decreases
    pub hit_count: u32,
    pub total_damage_dealt: f32,

    /// Ticks until the next contact hit is allowed
    pub cooldown: u32,
    /// Ticks until this weapon can parry or hit again after a clash
    pub parry_cooldown: u32,

    pub reach: f32,
    pub base_reach: f32,
    pub angle: f32,
    pub rotation_speed: f32,
    /// Ticks of reversed spin left after a deflection
    pub deflect_reverse: u32,

    pub is_ranged: bool,
    pub can_parry: bool,
    pub unparryable: bool,
    /// Extra contact range beyond touching, for zero-reach weapons
    pub contact_aura: f32,

    /// Hits needed to trigger the super; `None` disables it
    pub super_threshold: Option<u32>,
    /// Latched once triggered
    pub super_active: bool,
}

impl WeaponStats {
    pub fn new(kind: &'static str, color: u32, base_damage: f32, rotation_speed: f32, reach: f32) -> Self {
        Self {
            kind,
            owner: BallId(0),
            color,
            base_damage,
            current_damage: base_damage,
            hit_count: 0,
            total_damage_dealt: 0.0,
            cooldown: 0,
            parry_cooldown: 0,
            reach,
            base_reach: reach,
            angle: 0.0,
            rotation_speed,
            deflect_reverse: 0,
            is_ranged: false,
            can_parry: true,
            unparryable: false,
            contact_aura: 0.0,
            super_threshold: Some(SUPER_THRESHOLD),
            super_active: false,
        }
    }

    pub fn ranged(mut self) -> Self {
        self.is_ranged = true;
        self
    }

    pub fn contact(mut self, aura: f32) -> Self {
        self.reach = 0.0;
        self.base_reach = 0.0;
        self.contact_aura = aura;
        self.can_parry = false;
        self
    }

    pub fn super_at(mut self, threshold: u32) -> Self {
        self.super_threshold = Some(threshold);
        self
    }

    /// Unit direction the weapon points in
    #[inline]
    pub fn direction(&self) -> Vec2 {
        polar_to_cartesian(1.0, self.angle)
    }

    /// Tip position for a ball centred at `pivot`
    #[inline]
    pub fn tip(&self, pivot: Vec2) -> Vec2 {
        pivot + self.direction() * self.reach
    }

    /// Hitting segment of the blade: from 40% of the reach out to the tip
    pub fn blade(&self, pivot: Vec2) -> (Vec2, Vec2) {
        let dir = self.direction();
        (pivot + dir * (self.reach * SHAFT_START), pivot + dir * self.reach)
    }

    /// Spin one tick, honoring a pending deflection
    pub fn spin(&mut self) {
        let dir = if self.deflect_reverse > 0 {
            self.deflect_reverse -= 1;
            -1.0
        } else {
            1.0
        };
        self.angle = normalize_angle(self.angle + self.rotation_speed * dir);
    }

    /// Count down hit and parry cooldowns
    pub fn tick_cooldowns(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.parry_cooldown = self.parry_cooldown.saturating_sub(1);
    }

    /// Turn toward `target_angle` by at most `rate` radians
    pub fn turn_toward(&mut self, target_angle: f32, rate: f32) {
        let diff = normalize_angle(target_angle - self.angle);
        self.angle = normalize_angle(self.angle + diff.clamp(-rate, rate));
    }
}

/// Deferred effect queued by a weapon hook
#[derive(Debug, Clone)]
pub enum Action {
    Fire(Projectile),
    SpawnHazard(Hazard),
    Status { target: BallId, effect: StatusEffect },
    Knockback { target: BallId, impulse: Vec2 },
    /// Unattributed damage (does not count as a hit)
    Damage { target: BallId, amount: f32 },
    SetOwnerVelocity(Vec2),
    SetOwnerMaxSpeed(f32),
    /// Clone every living ally on the owner's side
    Split { bonus_hp: f32 },
}

/// What a hook may see and do
pub struct WeaponCtx<'a> {
    /// Owner's body at the time the hook runs
    pub owner: Body,
    /// Every ball, indexed by `BallId`
    pub bodies: &'a [Body],
    pub settings: &'a Settings,
    pub rng: &'a mut BattleRng,
    pub actions: &'a mut Vec<Action>,
}

impl WeaponCtx<'_> {
    /// Closest living ball on the other side
    pub fn nearest_enemy(&self) -> Option<&Body> {
        self.enemies().min_by(|a, b| {
            let da = a.pos.distance_squared(self.owner.pos);
            let db = b.pos.distance_squared(self.owner.pos);
            da.total_cmp(&db)
        })
    }

    /// Living balls on the other side, in id order
    pub fn enemies(&self) -> impl Iterator<Item = &Body> {
        let side = self.owner.side;
        self.bodies.iter().filter(move |b| b.alive && b.side != side)
    }

    #[inline]
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn fire(&mut self, projectile: Projectile) {
        self.actions.push(Action::Fire(projectile));
    }
}

/// Variant-specific hooks
///
/// Defaults describe a plain spinning melee weapon; variants override what
/// differs. `apply_scaling` must be a pure function of the hit count and the
/// super latch so calling it twice is harmless.
pub trait WeaponBehavior: fmt::Debug + Send + Sync {
    /// Per-tick behavior (spin, aim, fire, spawn)
    fn update(&mut self, stats: &mut WeaponStats, _ctx: &mut WeaponCtx<'_>) {
        stats.spin();
        stats.tick_cooldowns();
    }

    /// Extra gate on contact hits beyond the shared cooldowns
    fn contact_ready(&self, _stats: &WeaponStats) -> bool {
        true
    }

    /// Damage a contact hit deals right now
    fn hit_damage(&self, stats: &WeaponStats, _owner: &Body) -> f32 {
        stats.current_damage
    }

    /// Variant side effects of a contact hit (status, knockback)
    fn on_hit(&mut self, _stats: &mut WeaponStats, _target: &Body, _ctx: &mut WeaponCtx<'_>) {}

    /// Variant side effects when one of this weapon's projectiles lands
    fn on_projectile_hit(
        &mut self,
        _stats: &mut WeaponStats,
        _target: &Body,
        _ctx: &mut WeaponCtx<'_>,
    ) {
    }

    /// Recompute scaled stats from the hit count
    fn apply_scaling(&mut self, stats: &mut WeaponStats);

    /// One-time super effect; the latch is already set when this runs
    fn activate_super(&mut self, _stats: &mut WeaponStats, _ctx: &mut WeaponCtx<'_>) {}

    /// Name and value of the stat that grows with hits
    fn scaling_stat(&self, stats: &WeaponStats) -> (&'static str, f32) {
        ("damage", stats.current_damage)
    }
}

/// Result of crediting a hit to a weapon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitReport {
    pub damage: f32,
    pub super_activated: bool,
}

/// A weapon attached to a ball
#[derive(Debug)]
pub struct Weapon {
    pub stats: WeaponStats,
    behavior: Box<dyn WeaponBehavior>,
}

impl Weapon {
    pub fn new(stats: WeaponStats, behavior: Box<dyn WeaponBehavior>) -> Self {
        let mut weapon = Self { stats, behavior };
        weapon.apply_scaling();
        weapon
    }

    #[inline]
    pub fn kind(&self) -> &'static str {
        self.stats.kind
    }

    pub fn update(&mut self, ctx: &mut WeaponCtx<'_>) {
        self.behavior.update(&mut self.stats, ctx);
    }

    /// Whether a contact hit may land this tick
    pub fn can_hit(&self) -> bool {
        !self.stats.is_ranged
            && self.stats.cooldown == 0
            && self.stats.parry_cooldown == 0
            && self.behavior.contact_ready(&self.stats)
    }

    /// Whether this weapon takes part in parries right now
    pub fn can_parry(&self) -> bool {
        self.stats.can_parry
            && !self.stats.unparryable
            && self.stats.parry_cooldown == 0
            && self.stats.reach > 0.0
    }

    /// Land a contact hit on `target`
    ///
    /// Counts the hit, starts the cooldown, rescales, then checks the super.
    /// The caller applies the returned damage to the target.
    pub fn on_hit(&mut self, target: &Body, ctx: &mut WeaponCtx<'_>) -> HitReport {
        let damage = self.behavior.hit_damage(&self.stats, &ctx.owner);
        self.behavior.on_hit(&mut self.stats, target, ctx);
        self.stats.cooldown = ctx.settings.hit_cooldown;
        self.credit(damage, ctx)
    }

    /// Credit damage dealt by one of this weapon's projectiles or hazards
    pub fn credit_hit(
        &mut self,
        damage: f32,
        target: &Body,
        from_projectile: bool,
        ctx: &mut WeaponCtx<'_>,
    ) -> HitReport {
        if from_projectile {
            self.behavior.on_projectile_hit(&mut self.stats, target, ctx);
        }
        self.credit(damage, ctx)
    }

    fn credit(&mut self, damage: f32, ctx: &mut WeaponCtx<'_>) -> HitReport {
        self.stats.hit_count += 1;
        self.stats.total_damage_dealt += damage;
        self.apply_scaling();
        let super_activated = self.check_super(ctx);
        HitReport {
            damage,
            super_activated,
        }
    }

    pub fn apply_scaling(&mut self) {
        self.behavior.apply_scaling(&mut self.stats);
    }

    /// Latch and fire the super once the hit threshold is reached
    pub fn check_super(&mut self, ctx: &mut WeaponCtx<'_>) -> bool {
        if !ctx.settings.supers_enabled || self.stats.super_active {
            return false;
        }
        let Some(threshold) = self.stats.super_threshold else {
            return false;
        };
        if self.stats.hit_count < threshold {
            return false;
        }
        self.stats.super_active = true;
        self.behavior.activate_super(&mut self.stats, ctx);
        self.apply_scaling();
        log::debug!(
            "{} super activated after {} hits",
            self.stats.kind,
            self.stats.hit_count
        );
        true
    }

    pub fn scaling_stat(&self) -> (&'static str, f32) {
        self.behavior.scaling_stat(&self.stats)
    }
}

/// Registry row: identifier, pack, constructor
#[derive(Debug, Clone, Copy)]
pub struct WeaponEntry {
    pub kind: &'static str,
    pub pack: &'static str,
    pub color: u32,
    build: fn() -> Weapon,
}

pub const PACK_CLASSIC: &str = "classic";
pub const PACK_PANTHEON: &str = "pantheon";

static REGISTRY: &[WeaponEntry] = &[
    WeaponEntry { kind: "sword", pack: PACK_CLASSIC, color: melee::SWORD_COLOR, build: melee::sword },
    WeaponEntry { kind: "dagger", pack: PACK_CLASSIC, color: melee::DAGGER_COLOR, build: melee::dagger },
    WeaponEntry { kind: "spear", pack: PACK_CLASSIC, color: melee::SPEAR_COLOR, build: melee::spear },
    WeaponEntry { kind: "hammer", pack: PACK_CLASSIC, color: melee::HAMMER_COLOR, build: melee::hammer },
    WeaponEntry { kind: "poison", pack: PACK_CLASSIC, color: melee::POISON_COLOR, build: melee::poison },
    WeaponEntry { kind: "trident", pack: PACK_PANTHEON, color: melee::TRIDENT_COLOR, build: melee::trident },
    WeaponEntry { kind: "unarmed", pack: PACK_CLASSIC, color: contact::UNARMED_COLOR, build: contact::unarmed },
    WeaponEntry { kind: "duplicator", pack: PACK_CLASSIC, color: contact::DUPLICATOR_COLOR, build: contact::duplicator },
    WeaponEntry { kind: "bow", pack: PACK_CLASSIC, color: ranged::BOW_COLOR, build: ranged::bow },
    WeaponEntry { kind: "crossbow", pack: PACK_CLASSIC, color: ranged::CROSSBOW_COLOR, build: ranged::crossbow },
    WeaponEntry { kind: "shuriken", pack: PACK_CLASSIC, color: ranged::SHURIKEN_COLOR, build: ranged::shuriken },
    WeaponEntry { kind: "artemis", pack: PACK_PANTHEON, color: ranged::ARTEMIS_COLOR, build: ranged::artemis },
    WeaponEntry { kind: "zeus", pack: PACK_PANTHEON, color: ranged::ZEUS_COLOR, build: ranged::zeus },
    WeaponEntry { kind: "wadjet", pack: PACK_PANTHEON, color: ranged::WADJET_COLOR, build: ranged::wadjet },
    WeaponEntry { kind: "apollo", pack: PACK_PANTHEON, color: ranged::APOLLO_COLOR, build: ranged::apollo },
];

fn lookup(kind: &str) -> Option<&'static WeaponEntry> {
    let kind = kind.trim();
    REGISTRY.iter().find(|e| e.kind.eq_ignore_ascii_case(kind))
}

/// Build a fresh weapon of the named kind
pub fn create(kind: &str) -> Result<Weapon, SimError> {
    lookup(kind)
        .map(|entry| (entry.build)())
        .ok_or_else(|| SimError::UnknownWeapon(kind.to_string()))
}

/// Whether `kind` names a registered weapon
pub fn contains(kind: &str) -> bool {
    lookup(kind).is_some()
}

/// Registered kinds in registry order, optionally limited to one pack
pub fn kinds(pack: Option<&str>) -> Vec<&'static str> {
    REGISTRY
        .iter()
        .filter(|e| pack.is_none_or(|p| e.pack.eq_ignore_ascii_case(p)))
        .map(|e| e.kind)
        .collect()
}

/// Pack names in registry order
pub fn packs() -> Vec<&'static str> {
    let mut packs: Vec<&'static str> = Vec::new();
    for entry in REGISTRY {
        if !packs.contains(&entry.pack) {
            packs.push(entry.pack);
        }
    }
    packs
}

/// Registry row for `kind`
pub fn entry(kind: &str) -> Option<&'static WeaponEntry> {
    lookup(kind)
}
