//! Status effects carried by balls
//!
//! Keyed by kind so a ball holds at most one entry per kind; re-applying an
//! effect merges into the existing entry.

use serde::{Deserialize, Serialize};

/// Ticks between poison damage ticks
pub const POISON_TICK_RATE: u32 = 30;
/// Damage per poison stack per poison tick
pub const POISON_DAMAGE_PER_STACK: f32 = 0.5;
/// Speed lost per venom stack
pub const VENOM_SLOW_PER_STACK: f32 = 0.04;
/// Venom never slows below this multiplier
pub const VENOM_FLOOR: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Poison,
    Burn,
    Slow,
    Venom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Damage over time that grows with stacks; never expires
    Poison { stacks: u32, timer: u32 },
    /// Fixed damage every `tick_rate` ticks for `remaining` ticks
    Burn {
        damage: f32,
        remaining: u32,
        tick_rate: u32,
        timer: u32,
    },
    /// Velocity multiplier while `remaining` > 0
    Slow { factor: f32, remaining: u32 },
    /// Permanent speed reduction
    Venom { stacks: u32 },
}

impl StatusEffect {
    pub fn poison(stacks: u32) -> Self {
        StatusEffect::Poison { stacks, timer: 0 }
    }

    pub fn burn(damage: f32, duration: u32, tick_rate: u32) -> Self {
        StatusEffect::Burn {
            damage,
            remaining: duration,
            tick_rate: tick_rate.max(1),
            timer: 0,
        }
    }

    pub fn slow(factor: f32, duration: u32) -> Self {
        StatusEffect::Slow {
            factor: factor.clamp(0.0, 1.0),
            remaining: duration,
        }
    }

    pub fn venom(stacks: u32) -> Self {
        StatusEffect::Venom { stacks }
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            StatusEffect::Poison { .. } => StatusKind::Poison,
            StatusEffect::Burn { .. } => StatusKind::Burn,
            StatusEffect::Slow { .. } => StatusKind::Slow,
            StatusEffect::Venom { .. } => StatusKind::Venom,
        }
    }

    /// Fold a newly applied effect of the same kind into this one
    pub fn merge(&mut self, incoming: StatusEffect) {
        match (self, incoming) {
            (StatusEffect::Poison { stacks, .. }, StatusEffect::Poison { stacks: more, .. }) => {
                *stacks += more;
            }
            (
                StatusEffect::Burn {
                    damage,
                    remaining,
                    tick_rate,
                    ..
                },
                StatusEffect::Burn {
                    damage: d,
                    remaining: r,
                    tick_rate: t,
                    ..
                },
            ) => {
                *damage = damage.max(d);
                *remaining = (*remaining).max(r);
                *tick_rate = (*tick_rate).min(t);
            }
            (StatusEffect::Slow { factor, remaining }, StatusEffect::Slow { factor: f, remaining: r }) => {
                *factor = factor.min(f);
                *remaining = (*remaining).max(r);
            }
            (StatusEffect::Venom { stacks }, StatusEffect::Venom { stacks: more }) => {
                *stacks += more;
            }
            (current, other) => {
                log::warn!("Ignoring mismatched status merge {:?} <- {:?}", current.kind(), other.kind());
            }
        }
    }

    /// Advance one tick. Returns damage dealt this tick and whether the effect is still active.
    pub fn advance(&mut self) -> (f32, bool) {
        match self {
            StatusEffect::Poison { stacks, timer } => {
                if *stacks == 0 {
                    return (0.0, false);
                }
                *timer += 1;
                if *timer >= POISON_TICK_RATE {
                    *timer = 0;
                    (*stacks as f32 * POISON_DAMAGE_PER_STACK, true)
                } else {
                    (0.0, true)
                }
            }
            StatusEffect::Burn {
                damage,
                remaining,
                tick_rate,
                timer,
            } => {
                let mut dealt = 0.0;
                *timer += 1;
                if *timer >= *tick_rate {
                    *timer = 0;
                    dealt = *damage;
                }
                *remaining = remaining.saturating_sub(1);
                (dealt, *remaining > 0)
            }
            StatusEffect::Slow { remaining, .. } => {
                *remaining = remaining.saturating_sub(1);
                (0.0, *remaining > 0)
            }
            StatusEffect::Venom { stacks } => (0.0, *stacks > 0),
        }
    }

    /// Velocity multiplier this effect imposes while active
    pub fn speed_multiplier(&self) -> f32 {
        match *self {
            StatusEffect::Slow { factor, remaining } if remaining > 0 => factor,
            StatusEffect::Venom { stacks } => {
                (1.0 - stacks as f32 * VENOM_SLOW_PER_STACK).max(VENOM_FLOOR)
            }
            _ => 1.0,
        }
    }
}
