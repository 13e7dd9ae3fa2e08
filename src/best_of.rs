//! "Best of" battle table
//!
//! Keeps the most exciting battles of a batch, ranked by excitement score.
//! An entry holds everything needed to replay the battle: seed and weapons.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::Side;

/// Default number of battles to keep
pub const DEFAULT_BEST_OF: usize = 10;

/// A single ranked battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOfEntry {
    /// Excitement score (0-115)
    pub score: f32,
    pub seed: u64,
    pub left_weapon: String,
    pub right_weapon: String,
    pub winner_side: Option<Side>,
    pub ticks: u64,
}

/// Top-K table sorted descending by score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOf {
    pub capacity: usize,
    pub entries: Vec<BestOfEntry>,
}

impl Default for BestOf {
    fn default() -> Self {
        Self::new(DEFAULT_BEST_OF)
    }
}

impl BestOf {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Check if a score would make the table
    pub fn qualifies(&self, score: f32) -> bool {
        if self.capacity == 0 || !score.is_finite() {
            return false;
        }
        if self.entries.len() < self.capacity {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed), if it qualifies
    pub fn potential_rank(&self, score: f32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a battle if it qualifies. Returns the rank achieved.
    ///
    /// Ties keep insertion order, so earlier battles rank first.
    pub fn add(&mut self, entry: BestOfEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }
        let rank = match self.entries.iter().position(|e| entry.score > e.score) {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(self.capacity);
        Some(rank)
    }

    /// Fold another table into this one
    pub fn merge(&mut self, other: BestOf) {
        for entry in other.entries {
            self.add(entry);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Highest score, if any
    pub fn top_score(&self) -> Option<f32> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = fs::read_to_string(path.as_ref())?;
        let table: BestOf = serde_json::from_str(&json)?;
        log::info!("Loaded {} best-of battles", table.entries.len());
        Ok(table)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Best-of table saved ({} entries)", self.entries.len());
        Ok(())
    }
}
