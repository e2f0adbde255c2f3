//! Auto level
//!
//! Runs inside every experience-changing transaction. The rule itself lives
//! in [`valor_core::leveling`]; this module applies it to the hero being
//! committed and folds the results of one transaction into a single
//! [`LevelUp`].

use crate::ledger::HeroLedger;
use crate::txn::HeroTxn;
use valor_core::{leveling, HeroId, LevelUp, Result};

impl HeroTxn<'_> {
    /// Promote the hero to the highest level its lifetime experience reaches
    pub(crate) fn auto_level(&mut self) -> Option<LevelUp> {
        let step = leveling::advance(&mut self.hero, &self.defs.levels)?;
        self.level_up = Some(match self.level_up {
            Some(earlier) => LevelUp {
                from: earlier.from,
                to: step.to,
            },
            None => step,
        });
        Some(step)
    }
}

impl HeroLedger {
    /// Re-derive the hero's level from its lifetime experience
    ///
    /// Needed only after the level table changed. A hero already at the
    /// right level is left untouched and nothing is committed.
    pub fn check_level(&self, hero_id: HeroId) -> Result<Option<LevelUp>> {
        let receipt = self.transact(hero_id, "check_level", |txn| {
            txn.auto_level();
            Ok(())
        })?;
        Ok(receipt.level_up)
    }
}
