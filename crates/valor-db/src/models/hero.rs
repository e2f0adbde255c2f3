//! Hero-owned rows for database storage.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use valor_core::time::{from_micros, to_micros};
use valor_core::{
    AllocatedAttribute, AttributeCode, ClassId, Hero, HeroId, HeroSkill, HeroSkillId,
    LearnedMethod, SkillId,
};

/// Stored hero row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredHero {
    /// Primary key - hero ID.
    #[primary_key]
    pub id: u64,
    pub class_id: String,
    pub name: String,
    pub current_level: u32,
    pub experience_total: u64,
    pub experience_available: u64,
    pub experience_spent: u64,
    pub gold: u64,
    /// Bumped by every commit touching a row owned by this hero.
    pub version: u64,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl StoredHero {
    /// Create from a domain hero.
    pub fn from_hero(hero: &Hero) -> Self {
        Self {
            id: hero.id.raw(),
            class_id: hero.class_id.as_str().to_string(),
            name: hero.name.clone(),
            current_level: hero.current_level,
            experience_total: hero.experience_total,
            experience_available: hero.experience_available,
            experience_spent: hero.experience_spent,
            gold: hero.gold,
            version: hero.version,
            created_at_us: to_micros(hero.created_at),
            updated_at_us: to_micros(hero.updated_at),
        }
    }

    /// Convert to a domain hero.
    pub fn to_hero(&self) -> Hero {
        Hero {
            id: HeroId::new(self.id),
            class_id: ClassId::new(self.class_id.clone()),
            name: self.name.clone(),
            current_level: self.current_level,
            experience_total: self.experience_total,
            experience_available: self.experience_available,
            experience_spent: self.experience_spent,
            gold: self.gold,
            version: self.version,
            created_at: from_micros(self.created_at_us),
            updated_at: from_micros(self.updated_at_us),
        }
    }
}

/// Stored allocated attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredAttribute {
    /// Primary key - see [`StoredAttribute::key`].
    #[primary_key]
    pub key: String,
    /// Owning hero.
    #[secondary_key]
    pub hero_id: u64,
    pub code: String,
    pub value: u32,
    pub spent_xp: u64,
}

impl StoredAttribute {
    /// Primary key of the (hero, attribute) pair.
    pub fn key(hero_id: HeroId, code: &AttributeCode) -> String {
        format!("{:020}/{}", hero_id.raw(), code.as_str())
    }

    pub fn from_attribute(attribute: &AllocatedAttribute) -> Self {
        Self {
            key: Self::key(attribute.hero_id, &attribute.code),
            hero_id: attribute.hero_id.raw(),
            code: attribute.code.as_str().to_string(),
            value: attribute.value,
            spent_xp: attribute.spent_xp,
        }
    }

    pub fn to_attribute(&self) -> AllocatedAttribute {
        AllocatedAttribute {
            hero_id: HeroId::new(self.hero_id),
            code: AttributeCode::new(self.code.clone()),
            value: self.value,
            spent_xp: self.spent_xp,
        }
    }
}

/// Stored learned skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredHeroSkill {
    /// Primary key - hero skill ID.
    #[primary_key]
    pub id: u64,
    /// Owning hero.
    #[secondary_key]
    pub hero_id: u64,
    pub skill_id: String,
    pub level: u32,
    /// Learned method (serialized).
    pub learned_method: u8,
    pub learned_at_us: i64,
    pub updated_at_us: i64,
}

impl StoredHeroSkill {
    pub fn from_hero_skill(skill: &HeroSkill) -> Self {
        let learned_method = match skill.learned_method {
            LearnedMethod::Manual => 0,
            LearnedMethod::ClassUnlock => 1,
        };
        Self {
            id: skill.id.raw(),
            hero_id: skill.hero_id.raw(),
            skill_id: skill.skill_id.as_str().to_string(),
            level: skill.level,
            learned_method,
            learned_at_us: to_micros(skill.learned_at),
            updated_at_us: to_micros(skill.updated_at),
        }
    }

    pub fn to_hero_skill(&self) -> HeroSkill {
        let learned_method = match self.learned_method {
            0 => LearnedMethod::Manual,
            _ => LearnedMethod::ClassUnlock,
        };
        HeroSkill {
            id: HeroSkillId::new(self.id),
            hero_id: HeroId::new(self.hero_id),
            skill_id: SkillId::new(self.skill_id.clone()),
            level: self.level,
            learned_method,
            learned_at: from_micros(self.learned_at_us),
            updated_at: from_micros(self.updated_at_us),
        }
    }
}

/// Stored id sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 6, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Sequence name, one row per id space.
    #[primary_key]
    pub name: String,
    /// Next id to hand out.
    pub next: u64,
}
