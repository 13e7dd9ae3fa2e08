//! Battle random source
//!
//! One `BattleRng` per battle. Every stochastic effect in `sim` draws from it:
//! launch velocities, aim jitter, parry deflection, clone offsets, chance rolls.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Seedable PCG stream with an explicit seed/unseed lifecycle
#[derive(Debug, Clone)]
pub struct BattleRng {
    seed: Option<u64>,
    rng: Pcg32,
}

impl BattleRng {
    /// Reproducible stream pinned to `seed`
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Non-reproducible stream derived from the wall clock
    pub fn unseeded() -> Self {
        let mut rng = Self::seeded(0);
        rng.unseed();
        rng
    }

    /// Pin the generator to a reproducible stream
    pub fn seed(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// Return to a wall-clock-derived stream
    pub fn unseed(&mut self) {
        self.seed = None;
        self.rng = Pcg32::seed_from_u64(wall_clock_entropy());
    }

    /// Seed currently pinned, if any
    pub fn current_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn is_seeded(&self) -> bool {
        self.seed.is_some()
    }

    /// Uniform float in [0, 1). The only primitive; everything below derives from it.
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform float in [-half, half)
    pub fn centered(&mut self, half: f32) -> f32 {
        (self.next_f32() - 0.5) * 2.0 * half
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// Uniform angle in [0, 2π)
    pub fn angle(&mut self) -> f32 {
        self.next_f32() * std::f32::consts::TAU
    }
}

/// Fresh seed for callers that want a random but recordable battle
pub fn generate_seed() -> u64 {
    wall_clock_entropy() & 0x7FFF_FFFF
}

fn wall_clock_entropy() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15);
    // splitmix64 finaliser so adjacent timestamps diverge
    let mut z = nanos.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
