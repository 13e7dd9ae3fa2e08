//! Deterministic simulation module
//!
//! All combat logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, owned by the battle
//! - Stable iteration order (by ball id, then spawn order)
//! - No rendering or platform dependencies

pub mod arena;
pub mod collision;
pub mod events;
pub mod excitement;
pub mod hazard;
pub mod outcome;
pub mod projectile;
pub mod rng;
pub mod state;
pub mod status;
pub mod tick;
pub mod weapon;

pub use arena::{Arena, Wall};
pub use events::{HitSource, TickEvent, TickEvents};
pub use excitement::{Excitement, ExcitementScore};
pub use hazard::Hazard;
pub use outcome::BattleResult;
pub use projectile::Projectile;
pub use rng::BattleRng;
pub use state::{configure, Ball, BallId, BattleState, BattleStats, Body, Side};
pub use status::StatusEffect;
pub use tick::{is_terminal, tick};
pub use weapon::Weapon;
