//! Skill progression engine
//!
//! Learning and upgrading skills from the hero's class pool, one level per
//! call, and rollback of the most recent learn or upgrade of a skill row.

use crate::error::store_error;
use crate::ledger::{HeroLedger, Receipt};
use crate::txn::HeroTxn;
use tracing::info;
use valor_core::{
    Error, HeroId, HeroSkillId, LearnedMethod, Result, RollbackStack, SkillId, SkillOperation,
};
use valor_db::{NewHeroSkill, NewSkillOperation, PendingWrite, SkillRowRef};
use valor_script::{SkillCostRow, SkillDef};

/// Skill spending on behalf of a [`HeroLedger`]
pub struct SkillProgression<'a> {
    ledger: &'a HeroLedger,
}

impl<'a> SkillProgression<'a> {
    pub(crate) fn new(ledger: &'a HeroLedger) -> Self {
        Self { ledger }
    }

    /// Learn `skill_id` at level 1
    pub fn learn(&self, hero_id: HeroId, skill_id: &SkillId) -> Result<Receipt> {
        let receipt = self.ledger.transact(hero_id, "learn_skill", |txn| {
            let skill = skill_def(txn, skill_id)?;
            class_cap(txn, skill)?;

            if txn
                .store
                .hero_skill_by_skill(hero_id, skill_id)
                .map_err(store_error)?
                .is_some()
            {
                return Err(Error::DuplicateResource(format!(
                    "{} already knows {}",
                    hero_id, skill_id
                )));
            }

            let row = cost_row(txn, skill_id, 1)?;
            txn.hero.debit(row.cost())?;

            txn.push(PendingWrite::InsertHeroSkill(NewHeroSkill {
                skill_id: skill_id.clone(),
                level: 1,
                learned_method: LearnedMethod::Manual,
                learned_at: txn.now,
            }));
            let op = new_operation(txn, SkillRowRef::Inserted, skill_id, &row, 0);
            txn.push(PendingWrite::AppendSkillOperation(op));

            txn.auto_level();
            Ok(())
        })?;

        info!(hero_id = %hero_id, skill = %skill_id, "skill learned");
        Ok(receipt)
    }

    /// Raise a known skill by exactly one level
    pub fn upgrade(&self, hero_id: HeroId, skill_id: &SkillId) -> Result<Receipt> {
        let mut level = 0;
        let receipt = self.ledger.transact(hero_id, "upgrade_skill", |txn| {
            let skill = skill_def(txn, skill_id)?;
            let mut hero_skill = txn
                .store
                .hero_skill_by_skill(hero_id, skill_id)
                .map_err(store_error)?
                .ok_or_else(|| Error::SkillNotFound(format!("{} does not know {}", hero_id, skill_id)))?;
            let cap = class_cap(txn, skill)?;
            if hero_skill.level >= cap {
                return Err(Error::InvalidParams(format!(
                    "{} is already at its maximum level {}",
                    skill_id, cap
                )));
            }

            let next = hero_skill.level + 1;
            let row = cost_row(txn, skill_id, next)?;
            txn.hero.debit(row.cost())?;

            let op = new_operation(
                txn,
                SkillRowRef::Existing(hero_skill.id),
                skill_id,
                &row,
                hero_skill.level,
            );
            hero_skill.level = next;
            hero_skill.updated_at = txn.now;
            txn.touch_skill(hero_skill.id);
            txn.push(PendingWrite::PutHeroSkill(hero_skill));
            txn.push(PendingWrite::AppendSkillOperation(op));
            level = next;

            txn.auto_level();
            Ok(())
        })?;

        info!(hero_id = %hero_id, skill = %skill_id, level, "skill upgraded");
        Ok(receipt)
    }

    /// Undo the most recent live learn or upgrade of a skill row
    ///
    /// Undoing the learn itself forgets the skill. The hero's level is left
    /// as it is.
    pub fn rollback(&self, hero_skill_id: HeroSkillId) -> Result<Receipt> {
        let log = self
            .ledger
            .store()
            .skill_operations(hero_skill_id)
            .map_err(store_error)?;
        let hero_id = RollbackStack::from_log(log)
            .top()
            .map(|op| op.hero_id)
            .ok_or_else(|| Error::ResourceNotFound(format!("no operation to roll back on {}", hero_skill_id)))?;

        let mut forgotten = false;
        let receipt = self.ledger.transact(hero_id, "rollback_skill", |txn| {
            let log = txn
                .store
                .skill_operations(hero_skill_id)
                .map_err(store_error)?;
            let op: SkillOperation = txn.reverse(log)?;

            let mut hero_skill = txn
                .store
                .hero_skill(hero_skill_id)
                .map_err(store_error)?
                .ok_or_else(|| Error::SkillNotFound(hero_skill_id.to_string()))?;
            txn.touch_skill(hero_skill_id);

            forgotten = op.is_learn();
            if forgotten {
                txn.push(PendingWrite::DeleteHeroSkill(hero_skill_id));
            } else {
                hero_skill.level = op.level_before;
                hero_skill.updated_at = txn.now;
                txn.push(PendingWrite::PutHeroSkill(hero_skill));
            }
            txn.push(PendingWrite::MarkSkillOperationRolledBack {
                id: op.id,
                at: txn.now,
            });
            Ok(())
        })?;

        info!(
            hero_id = %hero_id,
            hero_skill = %hero_skill_id,
            forgotten,
            operation = ?receipt.operation_id,
            "skill operation rolled back"
        );
        Ok(receipt)
    }
}

fn skill_def<'t>(txn: &HeroTxn<'t>, skill_id: &SkillId) -> Result<&'t SkillDef> {
    txn.defs
        .get_skill(skill_id)
        .ok_or_else(|| Error::SkillNotFound(skill_id.to_string()))
}

/// Highest level the hero's class lets it reach in `skill`
fn class_cap(txn: &HeroTxn<'_>, skill: &SkillDef) -> Result<u32> {
    let class = txn
        .defs
        .get_class(&txn.hero.class_id)
        .ok_or_else(|| Error::ResourceNotFound(format!("class {}", txn.hero.class_id)))?;
    let entry = class.pool_entry(&skill.id).ok_or_else(|| {
        Error::PermissionDenied(format!("{} cannot learn {}", class.id, skill.id))
    })?;
    Ok(entry.max_learnable_level.min(skill.max_level))
}

fn cost_row(txn: &HeroTxn<'_>, skill_id: &SkillId, level: u32) -> Result<SkillCostRow> {
    txn.defs
        .skill_costs
        .cost_for_level(level)
        .cloned()
        .ok_or_else(|| {
            Error::ResourceNotFound(format!("no cost for level {} of {}", level, skill_id))
        })
}

fn new_operation(
    txn: &HeroTxn<'_>,
    hero_skill: SkillRowRef,
    skill_id: &SkillId,
    row: &SkillCostRow,
    level_before: u32,
) -> NewSkillOperation {
    NewSkillOperation {
        hero_skill,
        skill_id: skill_id.clone(),
        xp_spent: row.xp,
        gold_spent: row.gold,
        materials: row.materials.clone(),
        level_before,
        level_after: level_before + 1,
        created_at: txn.now,
        rollback_deadline: txn.rollback_deadline(),
    }
}
