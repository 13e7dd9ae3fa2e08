//! Headless battle runner
//!
//! Calls `tick` back to back with no pacing and no event consumers. Batches
//! fan out across threads with rayon; every battle owns its state, so a
//! batch reports the same numbers however it is scheduled.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::best_of::{BestOf, BestOfEntry};
use crate::error::SimError;
use crate::settings::Settings;
use crate::sim::excitement::ExcitementScore;
use crate::sim::{configure, is_terminal, tick, weapon, BattleResult, BattleState, BattleStats, Side};

/// Outcome of one headless battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub result: BattleResult,
    pub stats: BattleStats,
    /// `None` when nobody won (timeout)
    pub excitement: Option<ExcitementScore>,
    /// HP the winning ball finished with
    pub winner_hp: f32,
}

impl BattleSummary {
    pub fn total_hits(&self) -> u32 {
        self.stats.total_hits
    }

    pub fn supers(&self) -> u32 {
        self.stats.supers
    }

    fn best_of_entry(&self) -> Option<BestOfEntry> {
        let score = self.excitement?;
        Some(BestOfEntry {
            score: score.total,
            seed: self.result.seed,
            left_weapon: self.result.left_weapon.clone(),
            right_weapon: self.result.right_weapon.clone(),
            winner_side: self.result.winner_side,
            ticks: self.result.ticks,
        })
    }
}

/// Run one battle to completion
pub fn run_battle(left: &str, right: &str, seed: u64, settings: &Settings) -> Result<BattleSummary, SimError> {
    let mut state = configure(left, right, seed, settings.clone())?;
    let result = loop {
        if let Some(result) = is_terminal(&state) {
            break result.clone();
        }
        tick(&mut state);
    };
    Ok(finish(&mut state, result))
}

/// Run one battle, checking `cancel` between ticks
///
/// Returns `Ok(None)` if the battle was abandoned.
pub fn run_battle_cancellable(
    left: &str,
    right: &str,
    seed: u64,
    settings: &Settings,
    cancel: &AtomicBool,
) -> Result<Option<BattleSummary>, SimError> {
    let mut state = configure(left, right, seed, settings.clone())?;
    let result = loop {
        if let Some(result) = is_terminal(&state) {
            break result.clone();
        }
        if cancel.load(Ordering::Relaxed) {
            log::debug!("Battle {} cancelled at tick {}", seed, state.tick);
            state.rng.unseed();
            return Ok(None);
        }
        tick(&mut state);
    };
    Ok(Some(finish(&mut state, result)))
}

fn finish(state: &mut BattleState, result: BattleResult) -> BattleSummary {
    // Leave the stream unpinned so nothing after the battle replays its draws
    state.rng.unseed();
    let winner_hp = result
        .winner
        .and_then(|id| state.ball(id))
        .map_or(0.0, |b| b.hp);
    let excitement = result.winner_side.map(|side| {
        state
            .excitement
            .score(side, winner_hp, state.settings.ball_max_hp)
    });
    BattleSummary {
        result,
        stats: state.stats,
        excitement,
        winner_hp,
    }
}

/// Aggregate of a left-vs-right batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub left_weapon: String,
    pub right_weapon: String,
    pub base_seed: u64,
    /// Battles that reached a result
    pub battles: u32,
    pub left_wins: u32,
    pub right_wins: u32,
    /// Double KOs and timeouts
    pub draws: u32,
    pub timeouts: u32,
    /// Battles skipped because the batch was cancelled
    pub cancelled: u32,
    pub avg_ticks: f64,
    pub avg_hits: f64,
    pub best_of: BestOf,
}

impl BatchReport {
    fn new(left: &str, right: &str, base_seed: u64, top: usize) -> Self {
        Self {
            left_weapon: left.to_string(),
            right_weapon: right.to_string(),
            base_seed,
            battles: 0,
            left_wins: 0,
            right_wins: 0,
            draws: 0,
            timeouts: 0,
            cancelled: 0,
            avg_ticks: 0.0,
            avg_hits: 0.0,
            best_of: BestOf::new(top),
        }
    }

    /// Fold summaries in seed order
    fn from_summaries(left: &str, right: &str, base_seed: u64, top: usize, runs: Vec<Option<BattleSummary>>) -> Self {
        let mut report = Self::new(left, right, base_seed, top);
        let mut ticks = 0u64;
        let mut hits = 0u64;
        for run in runs {
            let Some(summary) = run else {
                report.cancelled += 1;
                continue;
            };
            report.battles += 1;
            ticks += summary.result.ticks;
            hits += summary.total_hits() as u64;

            if summary.result.timed_out {
                report.timeouts += 1;
            }
            match (summary.result.is_draw, summary.result.winner_side) {
                (false, Some(Side::Left)) => report.left_wins += 1,
                (false, Some(Side::Right)) => report.right_wins += 1,
                _ => report.draws += 1,
            }
            if let Some(entry) = summary.best_of_entry() {
                report.best_of.add(entry);
            }
        }
        if report.battles > 0 {
            report.avg_ticks = ticks as f64 / report.battles as f64;
            report.avg_hits = hits as f64 / report.battles as f64;
        }
        report
    }

    fn rate(&self, count: u32) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            count as f64 / self.battles as f64
        }
    }

    pub fn left_win_rate(&self) -> f64 {
        self.rate(self.left_wins)
    }

    pub fn right_win_rate(&self) -> f64 {
        self.rate(self.right_wins)
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }
}

/// Run `count` battles with seeds `base_seed..base_seed + count` in parallel
///
/// Setting `cancel` stops the batch between ticks; finished battles still
/// count. `top` sizes the best-of table.
pub fn run_batch(
    left: &str,
    right: &str,
    base_seed: u64,
    count: u32,
    settings: &Settings,
    top: usize,
    cancel: &AtomicBool,
) -> Result<BatchReport, SimError> {
    settings.validate()?;
    for kind in [left, right] {
        if !weapon::contains(kind) {
            return Err(SimError::UnknownWeapon(kind.to_string()));
        }
    }

    log::info!(
        "Running {} battles: {} vs {} (seeds from {})",
        count,
        left,
        right,
        base_seed
    );
    let runs = (0..count)
        .into_par_iter()
        .map(|i| run_battle_cancellable(left, right, base_seed.wrapping_add(i as u64), settings, cancel))
        .collect::<Result<Vec<_>, _>>()?;

    let report = BatchReport::from_summaries(left, right, base_seed, top, runs);
    log::info!(
        "{} vs {}: {} - {} ({} draws, {} timeouts, avg {:.0} ticks)",
        left,
        right,
        report.left_wins,
        report.right_wins,
        report.draws,
        report.timeouts,
        report.avg_ticks
    );
    if report.cancelled > 0 {
        log::warn!("Batch cancelled, {} battles skipped", report.cancelled);
    }
    Ok(report)
}

/// One left-vs-right pairing of a round robin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub left: String,
    pub right: String,
    pub left_win_rate: f64,
    pub right_win_rate: f64,
    pub draw_rate: f64,
}

/// Round robin of every ordered pair of `kinds`, mirror matches included
pub fn matrix(
    kinds: &[&str],
    base_seed: u64,
    count: u32,
    settings: &Settings,
    cancel: &AtomicBool,
) -> Result<Vec<MatrixCell>, SimError> {
    let mut cells = Vec::with_capacity(kinds.len() * kinds.len());
    for &left in kinds {
        for &right in kinds {
            let report = run_batch(left, right, base_seed, count, settings, 0, cancel)?;
            cells.push(MatrixCell {
                left: left.to_string(),
                right: right.to_string(),
                left_win_rate: report.left_win_rate(),
                right_win_rate: report.right_win_rate(),
                draw_rate: report.draw_rate(),
            });
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short() -> Settings {
        Settings {
            max_ticks: 900,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_battle_repeats() {
        let a = run_battle("dagger", "bow", 77, &Settings::default()).unwrap();
        let b = run_battle("dagger", "bow", 77, &Settings::default()).unwrap();
        assert_eq!(a, b);
        assert!(a.result.ticks <= Settings::default().max_ticks);
    }

    #[test]
    fn test_summary_scores_winner_only() {
        let summary = run_battle("sword", "spear", 5, &short()).unwrap();
        assert_eq!(summary.excitement.is_some(), summary.result.winner_side.is_some());
        if summary.result.timed_out {
            assert_eq!(summary.winner_hp, 0.0);
        }
    }

    #[test]
    fn test_timeout_still_summarized() {
        let settings = Settings {
            max_ticks: 1,
            ..Default::default()
        };
        let summary = run_battle("bow", "bow", 3, &settings).unwrap();
        assert!(summary.result.timed_out);
        assert_eq!(summary.result.ticks, 1);
        assert!(summary.excitement.is_none());

        let never = AtomicBool::new(false);
        let same = run_battle_cancellable("bow", "bow", 3, &settings, &never).unwrap();
        assert_eq!(same, Some(summary));
        let stop = AtomicBool::new(true);
        assert_eq!(run_battle_cancellable("bow", "bow", 3, &settings, &stop).unwrap(), None);
    }

    #[test]
    fn test_unknown_weapon_rejected_before_running() {
        let cancel = AtomicBool::new(false);
        let err = run_batch("sword", "laser", 1, 10, &short(), 3, &cancel).unwrap_err();
        assert!(matches!(err, SimError::UnknownWeapon(k) if k == "laser"));
    }

    #[test]
    fn test_batch_counts_add_up() {
        let cancel = AtomicBool::new(false);
        let report = run_batch("hammer", "shuriken", 100, 12, &short(), 5, &cancel).unwrap();
        assert_eq!(report.battles, 12);
        assert_eq!(report.left_wins + report.right_wins + report.draws, 12);
        assert!(report.timeouts <= report.draws);
        assert!(report.best_of.len() <= 5);
        let total = report.left_win_rate() + report.right_win_rate() + report.draw_rate();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_batch_matches_sequential_runs() {
        let cancel = AtomicBool::new(false);
        let report = run_batch("sword", "poison", 40, 6, &short(), 6, &cancel).unwrap();
        let runs: Vec<Option<BattleSummary>> = (0..6)
            .map(|i| Some(run_battle("sword", "poison", 40 + i, &short()).unwrap()))
            .collect();
        let sequential = BatchReport::from_summaries("sword", "poison", 40, 6, runs);
        assert_eq!(report, sequential);
    }

    #[test]
    fn test_cancelled_batch_skips_everything() {
        let cancel = AtomicBool::new(true);
        let report = run_batch("sword", "dagger", 1, 8, &short(), 3, &cancel).unwrap();
        assert_eq!(report.battles, 0);
        assert_eq!(report.cancelled, 8);
        assert_eq!(report.avg_ticks, 0.0);
        assert_eq!(report.left_win_rate(), 0.0);
    }

    #[test]
    fn test_matrix_covers_every_pair() {
        let cancel = AtomicBool::new(false);
        let settings = Settings {
            max_ticks: 120,
            ..Default::default()
        };
        let cells = matrix(&["sword", "bow"], 9, 2, &settings, &cancel).unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[1].left, "sword");
        assert_eq!(cells[1].right, "bow");
        for cell in &cells {
            let total = cell.left_win_rate + cell.right_win_rate + cell.draw_rate;
            assert!((total - 1.0).abs() < 1e-9);
        }
    }
}
