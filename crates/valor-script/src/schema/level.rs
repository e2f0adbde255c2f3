//! Level requirement table

use serde::{Deserialize, Serialize};
use valor_core::LevelRequirements;

/// Minimum lifetime experience for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRequirement {
    pub level: u32,
    pub cumulative_xp: u64,
}

/// Levels ordered ascending, with strictly increasing requirements
#[derive(Debug, Clone, Default)]
pub struct LevelTable {
    rows: Vec<LevelRequirement>,
}

impl LevelTable {
    /// Build a table, rejecting unordered or repeated rows
    pub fn new(mut rows: Vec<LevelRequirement>) -> Result<Self, String> {
        rows.sort_by_key(|r| r.level);
        for pair in rows.windows(2) {
            if pair[0].level == pair[1].level {
                return Err(format!("level {} defined twice", pair[0].level));
            }
            if pair[0].cumulative_xp >= pair[1].cumulative_xp {
                return Err(format!(
                    "level {} requires {} xp, not more than level {} ({})",
                    pair[1].level, pair[1].cumulative_xp, pair[0].level, pair[0].cumulative_xp
                ));
            }
        }
        Ok(Self { rows })
    }

    /// Highest level in the table
    pub fn max_level(&self) -> Option<u32> {
        self.rows.last().map(|r| r.level)
    }

    pub fn requirement(&self, level: u32) -> Option<u64> {
        self.rows
            .binary_search_by_key(&level, |r| r.level)
            .ok()
            .map(|i| self.rows[i].cumulative_xp)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl LevelRequirements for LevelTable {
    fn highest_level_for(&self, experience_total: u64) -> Option<u32> {
        // Requirements grow with level, so reached levels form a prefix.
        let reached = self.rows.partition_point(|r| r.cumulative_xp <= experience_total);
        reached.checked_sub(1).map(|i| self.rows[i].level)
    }
}
