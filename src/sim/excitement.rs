//! Excitement scoring
//!
//! Tracks how a battle unfolded and rates it out of 115, so batch runs can
//! surface the battles worth watching.

use serde::{Deserialize, Serialize};

use super::state::Side;
use crate::consts::TICK_RATE;

/// Fraction of max hp below which a ball is in the critical zone
const CRITICAL_FRACTION: f32 = 0.3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Excitement {
    pub frames: u32,
    pub total_hits: u32,
    pub supers: u32,
    pub lead_changes: u32,
    pub critical_frames: u32,
    last_leader: Option<Side>,
    left_max_deficit: f32,
    right_max_deficit: f32,
}

/// Per-category scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcitementBreakdown {
    /// How close the winner came to dying (0-30)
    pub closeness: f32,
    /// 5 per lead change (0-25)
    pub lead_changes: f32,
    /// Largest deficit the winner overcame (0-20)
    pub comeback: f32,
    /// Share of the battle spent in the critical zone (0-15)
    pub critical_zone: f32,
    /// Hits per second (0-10)
    pub action: f32,
    /// Peaks for 10-30 second battles (0-10)
    pub duration: f32,
    /// 2 per super (0-5)
    pub supers: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcitementScore {
    pub total: f32,
    pub breakdown: ExcitementBreakdown,
    pub winner_hp_remaining: f32,
    pub comeback_deficit: f32,
}

impl Excitement {
    pub fn record_frame(&mut self, left_hp: f32, right_hp: f32, max_hp: f32) {
        self.frames += 1;

        let leader = if left_hp >= right_hp { Side::Left } else { Side::Right };
        if self.last_leader.is_some_and(|last| last != leader) {
            self.lead_changes += 1;
        }
        self.last_leader = Some(leader);

        self.left_max_deficit = self.left_max_deficit.max(right_hp - left_hp);
        self.right_max_deficit = self.right_max_deficit.max(left_hp - right_hp);

        let threshold = max_hp * CRITICAL_FRACTION;
        if left_hp < threshold || right_hp < threshold {
            self.critical_frames += 1;
        }
    }

    pub fn record_hit(&mut self) {
        self.total_hits += 1;
    }

    pub fn record_super(&mut self) {
        self.supers += 1;
    }

    /// Rate the battle from the winner's point of view
    pub fn score(&self, winner: Side, winner_hp: f32, max_hp: f32) -> ExcitementScore {
        let max_hp = max_hp.max(f32::EPSILON);
        let frames = self.frames.max(1) as f32;

        let closeness = (1.0 - (winner_hp / max_hp).clamp(0.0, 1.0)) * 30.0;
        let lead_changes = (self.lead_changes as f32 * 5.0).min(25.0);

        let deficit = match winner {
            Side::Left => self.left_max_deficit,
            Side::Right => self.right_max_deficit,
        };
        let comeback = (deficit / max_hp * 40.0).min(20.0);

        let critical_zone = (self.critical_frames as f32 / frames * 50.0).min(15.0);

        let seconds = (self.frames as f32 / TICK_RATE as f32).max(1.0);
        let action = (self.total_hits as f32 / seconds * 3.0).min(10.0);

        let duration = duration_curve(self.frames);
        let supers = (self.supers as f32 * 2.0).min(5.0);

        let breakdown = ExcitementBreakdown {
            closeness: round1(closeness),
            lead_changes,
            comeback: round1(comeback),
            critical_zone: round1(critical_zone),
            action: round1(action),
            duration: round1(duration),
            supers,
        };
        let total = closeness + lead_changes + comeback + critical_zone + action + duration + supers;

        ExcitementScore {
            total: round1(total),
            breakdown,
            winner_hp_remaining: winner_hp.max(0.0).ceil(),
            comeback_deficit: deficit.round(),
        }
    }
}

fn duration_curve(frames: u32) -> f32 {
    let f = frames as f32;
    match frames {
        0..300 => f / 300.0 * 5.0,
        300..600 => 5.0 + (f - 300.0) / 300.0 * 5.0,
        600..=1800 => 10.0,
        1801..=3600 => 10.0 - (f - 1800.0) / 1800.0 * 10.0,
        _ => 0.0,
    }
}

#[inline]
fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}
