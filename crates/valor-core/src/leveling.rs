//! Level derivation from lifetime experience
//!
//! A hero's level is a function of `experience_total` alone. Spending or
//! refunding experience never changes it, and no path ever lowers it.

use crate::hero::Hero;
use serde::{Deserialize, Serialize};

/// Read-only level requirement table
pub trait LevelRequirements {
    /// Highest level whose cumulative requirement is at most `experience_total`
    fn highest_level_for(&self, experience_total: u64) -> Option<u32>;
}

impl<T: LevelRequirements + ?Sized> LevelRequirements for &T {
    fn highest_level_for(&self, experience_total: u64) -> Option<u32> {
        (**self).highest_level_for(experience_total)
    }
}

/// A level advance applied to a hero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
}

impl LevelUp {
    pub fn levels_gained(&self) -> u32 {
        self.to - self.from
    }
}

/// Advance `hero` to the highest level its lifetime experience reaches
///
/// The jump is direct, possibly across several levels. Returns `None` and
/// leaves the hero untouched when no higher level is reached.
pub fn advance(hero: &mut Hero, table: impl LevelRequirements) -> Option<LevelUp> {
    let target = table.highest_level_for(hero.experience_total)?;
    if target <= hero.current_level {
        return None;
    }
    let from = hero.current_level;
    hero.current_level = target;
    Some(LevelUp { from, to: target })
}
