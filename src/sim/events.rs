//! Discrete notifications produced by a tick
//!
//! Rendering and audio consume these instead of reading simulation internals.

use glam::Vec2;
use serde::Serialize;

use super::state::{BallId, Side};

/// What dealt a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    /// Outer blade of a spinning weapon
    Melee,
    /// Zero-reach weapon on body overlap
    Body,
    /// Zero-reach weapon inside its contact aura
    Aura,
    Projectile,
    Hazard,
    /// Ticking status effect (unattributed)
    Status,
    /// One-off weapon side effect (unattributed)
    Effect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickEvent {
    WallImpact {
        ball: BallId,
        pos: Vec2,
        speed: f32,
    },
    WeaponWallImpact {
        ball: BallId,
        pos: Vec2,
        speed: f32,
    },
    BallImpact {
        a: BallId,
        b: BallId,
        pos: Vec2,
        speed: f32,
    },
    Hit {
        attacker: Option<BallId>,
        target: BallId,
        damage: f32,
        pos: Vec2,
        color: u32,
        source: HitSource,
    },
    Parry {
        a: BallId,
        b: BallId,
        pos: Vec2,
    },
    SuperActivated {
        ball: BallId,
        weapon: &'static str,
        pos: Vec2,
        color: u32,
    },
    ProjectileFired {
        owner: BallId,
        pos: Vec2,
        color: u32,
    },
    ProjectileBounce {
        pos: Vec2,
        speed: f32,
        color: u32,
    },
    HazardSpawned {
        pos: Vec2,
        radius: f32,
        color: u32,
    },
    Split {
        parent: BallId,
        clone: BallId,
    },
    Death {
        ball: BallId,
        side: Side,
        pos: Vec2,
    },
    Victory {
        winner: BallId,
        side: Side,
    },
    Draw {
        /// Tie-break winner of a double KO; `None` on timeout
        winner: Option<BallId>,
        timed_out: bool,
    },
}

/// Everything one tick produced, in order
pub type TickEvents = Vec<TickEvent>;

impl TickEvent {
    /// Whether this event ends the battle
    pub fn is_final(&self) -> bool {
        matches!(self, TickEvent::Victory { .. } | TickEvent::Draw { .. })
    }
}
