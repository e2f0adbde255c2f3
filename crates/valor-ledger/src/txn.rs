//! Per-hero transactions
//!
//! Every mutating ledger call runs as a [`HeroTxn`]: the hero row is read
//! first, the operation reads whatever else it needs and records its
//! mutations, and the resulting write set is committed only if the hero's
//! version is unchanged. A lost race re-runs the whole closure against
//! fresh state, so two operations on one hero behave as if serialized.

use crate::error::store_error;
use crate::ledger::{HeroLedger, Receipt};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use valor_core::{
    time, Error, Hero, HeroId, HeroSkillId, LevelUp, OperationId, Result, Reversible,
    RollbackStack,
};
use valor_db::{PendingWrite, Store, WriteSet};
use valor_script::ProgressionDefs;

/// An in-flight operation on one hero
pub(crate) struct HeroTxn<'a> {
    pub(crate) store: &'a Store,
    pub(crate) defs: &'a ProgressionDefs,
    /// The hero as it will be committed
    pub(crate) hero: Hero,
    /// Transaction time, truncated to storage precision
    pub(crate) now: DateTime<Utc>,
    window: Duration,
    writes: WriteSet,
    pub(crate) level_up: Option<LevelUp>,
    reversed: Option<OperationId>,
    hero_skill: Option<HeroSkillId>,
}

impl<'a> HeroTxn<'a> {
    fn begin(ledger: &'a HeroLedger, hero: Hero) -> Self {
        Self {
            store: ledger.store(),
            defs: ledger.defs(),
            writes: WriteSet::for_hero(&hero),
            hero,
            now: time::truncate(ledger.clock().now()),
            window: ledger.config().rollback_window(),
            level_up: None,
            reversed: None,
            hero_skill: None,
        }
    }

    pub(crate) fn push(&mut self, write: PendingWrite) {
        self.writes.push(write);
    }

    /// Deadline for an operation recorded in this transaction
    pub(crate) fn rollback_deadline(&self) -> DateTime<Utc> {
        self.now + self.window
    }

    /// Record the skill row this operation is about
    pub(crate) fn touch_skill(&mut self, id: HeroSkillId) {
        self.hero_skill = Some(id);
    }

    /// Claim the top of `log` for rollback and refund its cost to the hero
    ///
    /// The caller restores the target and marks the entry rolled back.
    pub(crate) fn reverse<T: Reversible + Clone>(&mut self, log: Vec<T>) -> Result<T> {
        let stack = RollbackStack::from_log(log);
        let op = stack.claim(self.now)?.clone();
        self.hero.credit(op.cost())?;
        self.reversed = Some(op.id());
        Ok(op)
    }
}

impl HeroLedger {
    /// Run `body` as one serialized operation on `hero_id`
    ///
    /// `body` may run several times; it must only record its effects through
    /// the transaction. A run that changes nothing is not committed.
    pub(crate) fn transact<F>(&self, hero_id: HeroId, op: &'static str, mut body: F) -> Result<Receipt>
    where
        F: FnMut(&mut HeroTxn<'_>) -> Result<()>,
    {
        let attempts = self.config().max_commit_attempts().max(1);
        for attempt in 1..=attempts {
            let hero = self
                .store()
                .hero(hero_id)
                .map_err(store_error)?
                .ok_or(Error::HeroNotFound(hero_id))?;
            let read = hero.clone();

            let mut txn = HeroTxn::begin(self, hero);
            body(&mut txn)?;

            if txn.writes.is_empty() && txn.hero == read {
                return Ok(Receipt {
                    hero: read,
                    operation_id: txn.reversed,
                    hero_skill_id: txn.hero_skill,
                    level_up: None,
                });
            }

            let HeroTxn {
                mut hero,
                mut writes,
                now,
                level_up,
                reversed,
                hero_skill,
                ..
            } = txn;
            hero.updated_at = now;
            writes.push(PendingWrite::PutHero(hero));

            match self.store().commit(writes) {
                Ok(result) => {
                    if let Some(level_up) = level_up {
                        info!(
                            hero_id = %hero_id,
                            from = level_up.from,
                            to = level_up.to,
                            "hero leveled up"
                        );
                    }
                    return Ok(Receipt {
                        hero: result.hero,
                        operation_id: result.operations.last().copied().or(reversed),
                        hero_skill_id: result.hero_skills.last().copied().or(hero_skill),
                        level_up,
                    });
                }
                Err(valor_db::Error::Conflict { expected, found, .. }) => {
                    debug!(
                        hero_id = %hero_id,
                        op,
                        attempt,
                        expected,
                        found,
                        "commit lost a race, retrying"
                    );
                }
                Err(err) => return Err(store_error(err)),
            }
        }

        warn!(hero_id = %hero_id, op, attempts, "giving up after repeated commit conflicts");
        Err(Error::Internal(format!(
            "{} on {}: no commit after {} conflicting attempts",
            op, hero_id, attempts
        )))
    }
}
