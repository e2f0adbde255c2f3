//! Append-only operation logs
//!
//! Each allocate/learn/upgrade appends one entry. Entries are never removed;
//! a rollback only stamps `rolled_back_at`.

use crate::hero::Cost;
use crate::identity::{AttributeCode, HeroId, HeroSkillId, OperationId, SkillId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-boxed operation that can be undone once
pub trait Reversible {
    fn id(&self) -> OperationId;
    fn created_at(&self) -> DateTime<Utc>;
    fn rollback_deadline(&self) -> DateTime<Utc>;
    fn rolled_back_at(&self) -> Option<DateTime<Utc>>;

    /// What the operation debited, and a rollback credits back
    fn cost(&self) -> Cost;

    fn is_rolled_back(&self) -> bool {
        self.rolled_back_at().is_some()
    }

    /// Rollback is allowed up to and including the deadline instant
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.rollback_deadline()
    }
}

/// One attribute allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOperation {
    pub id: OperationId,
    pub hero_id: HeroId,
    pub code: AttributeCode,
    pub points_added: u32,
    pub xp_spent: u64,
    pub value_before: u32,
    pub value_after: u32,
    pub created_at: DateTime<Utc>,
    pub rollback_deadline: DateTime<Utc>,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl Reversible for AttributeOperation {
    fn id(&self) -> OperationId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn rollback_deadline(&self) -> DateTime<Utc> {
        self.rollback_deadline
    }

    fn rolled_back_at(&self) -> Option<DateTime<Utc>> {
        self.rolled_back_at
    }

    fn cost(&self) -> Cost {
        Cost::xp(self.xp_spent)
    }
}

/// Items consumed by a skill operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCost {
    pub item_id: String,
    pub quantity: u32,
}

/// One skill learn (`level_before == 0`) or single-level upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillOperation {
    pub id: OperationId,
    pub hero_id: HeroId,
    pub hero_skill_id: HeroSkillId,
    pub skill_id: SkillId,
    pub xp_spent: u64,
    pub gold_spent: u64,
    pub materials: Vec<MaterialCost>,
    pub level_before: u32,
    pub level_after: u32,
    pub created_at: DateTime<Utc>,
    pub rollback_deadline: DateTime<Utc>,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl SkillOperation {
    /// Whether undoing this operation forgets the skill
    pub fn is_learn(&self) -> bool {
        self.level_before == 0
    }
}

impl Reversible for SkillOperation {
    fn id(&self) -> OperationId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn rollback_deadline(&self) -> DateTime<Utc> {
        self.rollback_deadline
    }

    fn rolled_back_at(&self) -> Option<DateTime<Utc>> {
        self.rolled_back_at
    }

    fn cost(&self) -> Cost {
        Cost {
            xp: self.xp_spent,
            gold: self.gold_spent,
        }
    }
}
