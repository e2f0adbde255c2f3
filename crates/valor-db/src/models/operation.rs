//! Operation log models for database storage.

use crate::error::{Error, Result};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use valor_core::time::{from_micros, to_micros};
use valor_core::{
    AttributeCode, AttributeOperation, HeroId, HeroSkillId, MaterialCost, OperationId, SkillId,
    SkillOperation,
};

/// Stored attribute allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredAttributeOperation {
    /// Primary key - operation ID.
    #[primary_key]
    pub id: u64,
    /// Owning hero.
    #[secondary_key]
    pub hero_id: u64,
    pub code: String,
    pub points_added: u32,
    pub xp_spent: u64,
    pub value_before: u32,
    pub value_after: u32,
    pub created_at_us: i64,
    pub rollback_deadline_us: i64,
    pub rolled_back_at_us: Option<i64>,
}

impl StoredAttributeOperation {
    pub fn from_operation(op: &AttributeOperation) -> Self {
        Self {
            id: op.id.raw(),
            hero_id: op.hero_id.raw(),
            code: op.code.as_str().to_string(),
            points_added: op.points_added,
            xp_spent: op.xp_spent,
            value_before: op.value_before,
            value_after: op.value_after,
            created_at_us: to_micros(op.created_at),
            rollback_deadline_us: to_micros(op.rollback_deadline),
            rolled_back_at_us: op.rolled_back_at.map(to_micros),
        }
    }

    pub fn to_operation(&self) -> AttributeOperation {
        AttributeOperation {
            id: OperationId::new(self.id),
            hero_id: HeroId::new(self.hero_id),
            code: AttributeCode::new(self.code.clone()),
            points_added: self.points_added,
            xp_spent: self.xp_spent,
            value_before: self.value_before,
            value_after: self.value_after,
            created_at: from_micros(self.created_at_us),
            rollback_deadline: from_micros(self.rollback_deadline_us),
            rolled_back_at: self.rolled_back_at_us.map(from_micros),
        }
    }
}

/// Stored skill learn or upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 5, version = 1)]
#[native_db]
pub struct StoredSkillOperation {
    /// Primary key - operation ID.
    #[primary_key]
    pub id: u64,
    /// The learned skill row this operation applies to.
    #[secondary_key]
    pub hero_skill_id: u64,
    pub hero_id: u64,
    pub skill_id: String,
    pub xp_spent: u64,
    pub gold_spent: u64,
    /// Serialized material costs.
    pub materials: Vec<u8>,
    pub level_before: u32,
    pub level_after: u32,
    pub created_at_us: i64,
    pub rollback_deadline_us: i64,
    pub rolled_back_at_us: Option<i64>,
}

impl StoredSkillOperation {
    pub fn from_operation(op: &SkillOperation) -> Result<Self> {
        let materials =
            bincode::serialize(&op.materials).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            id: op.id.raw(),
            hero_skill_id: op.hero_skill_id.raw(),
            hero_id: op.hero_id.raw(),
            skill_id: op.skill_id.as_str().to_string(),
            xp_spent: op.xp_spent,
            gold_spent: op.gold_spent,
            materials,
            level_before: op.level_before,
            level_after: op.level_after,
            created_at_us: to_micros(op.created_at),
            rollback_deadline_us: to_micros(op.rollback_deadline),
            rolled_back_at_us: op.rolled_back_at.map(to_micros),
        })
    }

    pub fn to_operation(&self) -> Result<SkillOperation> {
        let materials: Vec<MaterialCost> = bincode::deserialize(&self.materials)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(SkillOperation {
            id: OperationId::new(self.id),
            hero_id: HeroId::new(self.hero_id),
            hero_skill_id: HeroSkillId::new(self.hero_skill_id),
            skill_id: SkillId::new(self.skill_id.clone()),
            xp_spent: self.xp_spent,
            gold_spent: self.gold_spent,
            materials,
            level_before: self.level_before,
            level_after: self.level_after,
            created_at: from_micros(self.created_at_us),
            rollback_deadline: from_micros(self.rollback_deadline_us),
            rolled_back_at: self.rolled_back_at_us.map(from_micros),
        })
    }
}
