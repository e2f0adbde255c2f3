//! Hero records and the three-way experience account

use crate::error::{Error, Result};
use crate::identity::{AttributeCode, ClassId, HeroId, HeroSkillId, SkillId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price of a reversible operation in spendable currencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    pub xp: u64,
    pub gold: u64,
}

impl Cost {
    pub fn xp(xp: u64) -> Self {
        Self { xp, gold: 0 }
    }
}

/// A hero and its experience ledger
///
/// `experience_total == experience_available + experience_spent` holds for
/// every committed state. `experience_total` only grows, through grants.
/// `version` is bumped by every commit that touches a row owned by this hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    pub class_id: ClassId,
    pub name: String,
    pub current_level: u32,
    pub experience_total: u64,
    pub experience_available: u64,
    pub experience_spent: u64,
    pub gold: u64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hero {
    /// A fresh level 1 hero with an empty ledger
    pub fn new(id: HeroId, class_id: ClassId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            class_id,
            name: name.into(),
            current_level: 1,
            experience_total: 0,
            experience_available: 0,
            experience_spent: 0,
            gold: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the three-way account balances
    pub fn is_balanced(&self) -> bool {
        self.experience_available.checked_add(self.experience_spent) == Some(self.experience_total)
    }

    /// Add lifetime experience; it becomes immediately spendable
    pub fn grant_experience(&mut self, amount: u64) -> Result<()> {
        let total = self.experience_total.checked_add(amount);
        let available = self.experience_available.checked_add(amount);
        match (total, available) {
            (Some(total), Some(available)) => {
                self.experience_total = total;
                self.experience_available = available;
                Ok(())
            }
            _ => Err(Error::InvalidParams(format!(
                "experience grant of {} overflows {}",
                amount, self.id
            ))),
        }
    }

    pub fn grant_gold(&mut self, amount: u64) -> Result<()> {
        self.gold = self
            .gold
            .checked_add(amount)
            .ok_or_else(|| Error::InvalidParams(format!("gold grant of {} overflows {}", amount, self.id)))?;
        Ok(())
    }

    /// Move `cost` from available to spent; nothing changes on failure
    pub fn debit(&mut self, cost: Cost) -> Result<()> {
        if self.experience_available < cost.xp {
            return Err(Error::InsufficientExperience {
                required: cost.xp,
                available: self.experience_available,
            });
        }
        if self.gold < cost.gold {
            return Err(Error::InsufficientGold {
                required: cost.gold,
                available: self.gold,
            });
        }
        let spent = self
            .experience_spent
            .checked_add(cost.xp)
            .ok_or_else(|| Error::internal(format!("experience_spent overflow on {}", self.id)))?;
        self.experience_available -= cost.xp;
        self.experience_spent = spent;
        self.gold -= cost.gold;
        Ok(())
    }

    /// Move `cost` back from spent to available
    pub fn credit(&mut self, cost: Cost) -> Result<()> {
        if self.experience_spent < cost.xp {
            return Err(Error::internal(format!(
                "refund of {} xp exceeds {} spent on {}",
                cost.xp, self.experience_spent, self.id
            )));
        }
        let gold = self
            .gold
            .checked_add(cost.gold)
            .ok_or_else(|| Error::internal(format!("gold overflow on {}", self.id)))?;
        self.experience_spent -= cost.xp;
        self.experience_available += cost.xp;
        self.gold = gold;
        Ok(())
    }
}

/// Points a hero has permanently invested in one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedAttribute {
    pub hero_id: HeroId,
    pub code: AttributeCode,
    pub value: u32,
    pub spent_xp: u64,
}

impl AllocatedAttribute {
    /// Starting value of every recognized attribute
    pub const INITIAL_VALUE: u32 = 1;

    pub fn initial(hero_id: HeroId, code: AttributeCode) -> Self {
        Self {
            hero_id,
            code,
            value: Self::INITIAL_VALUE,
            spent_xp: 0,
        }
    }
}

/// How a hero came to know a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearnedMethod {
    /// Bought with experience; the learn is rollback-eligible
    Manual,
    /// Granted with the class at hero creation
    ClassUnlock,
}

/// A skill known by a hero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSkill {
    pub id: HeroSkillId,
    pub hero_id: HeroId,
    pub skill_id: SkillId,
    pub level: u32,
    pub learned_method: LearnedMethod,
    pub learned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
