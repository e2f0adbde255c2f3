//! Common query patterns for the database.
//!
//! Reads here run in their own read transaction. Callers that need a
//! consistent view across several reads rely on the hero version check at
//! commit time: read the hero first, then anything else, and any change in
//! between shows up as a conflict.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use valor_core::{
    AllocatedAttribute, AttributeCode, AttributeOperation, HeroId, HeroSkill, HeroSkillId, SkillId,
    SkillOperation,
};

impl Store {
    /// Get one allocated attribute.
    pub fn attribute(&self, hero_id: HeroId, code: &AttributeCode) -> Result<Option<AllocatedAttribute>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredAttribute> = r.get().primary(StoredAttribute::key(hero_id, code))?;
        Ok(stored.map(|s| s.to_attribute()))
    }

    /// Get every allocated attribute of a hero.
    pub fn attributes(&self, hero_id: HeroId) -> Result<Vec<AllocatedAttribute>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredAttribute>(StoredAttributeKey::hero_id)?;
        let iter = scan.start_with(hero_id.raw())?;
        let rows: std::result::Result<Vec<StoredAttribute>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|s| s.to_attribute()).collect())
    }

    /// Get the full allocation log of one (hero, attribute) pair, unordered.
    pub fn attribute_operations(
        &self,
        hero_id: HeroId,
        code: &AttributeCode,
    ) -> Result<Vec<AttributeOperation>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredAttributeOperation>(StoredAttributeOperationKey::hero_id)?;
        let iter = scan.start_with(hero_id.raw())?;
        let rows: std::result::Result<Vec<StoredAttributeOperation>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows
            .into_iter()
            .filter(|s| s.code == code.as_str())
            .map(|s| s.to_operation())
            .collect())
    }

    /// Get a learned skill row by ID.
    pub fn hero_skill(&self, id: HeroSkillId) -> Result<Option<HeroSkill>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredHeroSkill> = r.get().primary(id.raw())?;
        Ok(stored.map(|s| s.to_hero_skill()))
    }

    /// Get every skill a hero knows.
    pub fn hero_skills(&self, hero_id: HeroId) -> Result<Vec<HeroSkill>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredHeroSkill>(StoredHeroSkillKey::hero_id)?;
        let iter = scan.start_with(hero_id.raw())?;
        let rows: std::result::Result<Vec<StoredHeroSkill>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|s| s.to_hero_skill()).collect())
    }

    /// Find the row for a skill a hero knows.
    pub fn hero_skill_by_skill(&self, hero_id: HeroId, skill_id: &SkillId) -> Result<Option<HeroSkill>> {
        Ok(self
            .hero_skills(hero_id)?
            .into_iter()
            .find(|s| &s.skill_id == skill_id))
    }

    /// Get the full operation log of one learned skill row, unordered.
    pub fn skill_operations(&self, hero_skill_id: HeroSkillId) -> Result<Vec<SkillOperation>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredSkillOperation>(StoredSkillOperationKey::hero_skill_id)?;
        let iter = scan.start_with(hero_skill_id.raw())?;
        let rows: std::result::Result<Vec<StoredSkillOperation>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(|s| s.to_operation()).collect()
    }
}
