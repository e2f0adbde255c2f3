//! Versioned write sets
//!
//! A ledger operation reads the hero row and whatever else it needs,
//! decides, and records its mutations as [`PendingWrite`]s. The resulting
//! [`WriteSet`] is committed in a single read-write transaction which first
//! checks that the hero's version is still the one the decision was based
//! on. Every commit bumps that version, so two write sets prepared against
//! the same hero state can never both land.
//!
//! Ids for appended operations and inserted skill rows are assigned at
//! commit time from the store's sequences.

use chrono::{DateTime, Utc};
use valor_core::{
    AllocatedAttribute, AttributeCode, Hero, HeroId, HeroSkill, HeroSkillId, LearnedMethod,
    MaterialCost, OperationId, SkillId,
};

/// An attribute allocation awaiting its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttributeOperation {
    pub code: AttributeCode,
    pub points_added: u32,
    pub xp_spent: u64,
    pub value_before: u32,
    pub value_after: u32,
    pub created_at: DateTime<Utc>,
    pub rollback_deadline: DateTime<Utc>,
}

/// A skill row awaiting its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHeroSkill {
    pub skill_id: SkillId,
    pub level: u32,
    pub learned_method: LearnedMethod,
    pub learned_at: DateTime<Utc>,
}

/// Which skill row a new skill operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillRowRef {
    Existing(HeroSkillId),
    /// The row inserted earlier in the same write set
    Inserted,
}

/// A skill learn or upgrade awaiting its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkillOperation {
    pub hero_skill: SkillRowRef,
    pub skill_id: SkillId,
    pub xp_spent: u64,
    pub gold_spent: u64,
    pub materials: Vec<MaterialCost>,
    pub level_before: u32,
    pub level_after: u32,
    pub created_at: DateTime<Utc>,
    pub rollback_deadline: DateTime<Utc>,
}

/// A pending write scoped to one hero
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    /// Replace the hero row; its version is set by the commit
    PutHero(Hero),
    PutAttribute(AllocatedAttribute),
    AppendAttributeOperation(NewAttributeOperation),
    MarkAttributeOperationRolledBack {
        id: OperationId,
        at: DateTime<Utc>,
    },
    InsertHeroSkill(NewHeroSkill),
    PutHeroSkill(HeroSkill),
    DeleteHeroSkill(HeroSkillId),
    AppendSkillOperation(NewSkillOperation),
    MarkSkillOperationRolledBack {
        id: OperationId,
        at: DateTime<Utc>,
    },
}

/// Writes to be applied atomically against one version of one hero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSet {
    hero_id: HeroId,
    expected_version: u64,
    writes: Vec<PendingWrite>,
}

impl WriteSet {
    /// Start a write set based on `hero` as read
    pub fn for_hero(hero: &Hero) -> Self {
        Self {
            hero_id: hero.id,
            expected_version: hero.version,
            writes: Vec::new(),
        }
    }

    pub fn hero_id(&self) -> HeroId {
        self.hero_id
    }

    pub fn expected_version(&self) -> u64 {
        self.expected_version
    }

    /// Add a pending write to the set
    pub fn push(&mut self, write: PendingWrite) {
        self.writes.push(write);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.writes.iter()
    }
}

/// What a commit produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    /// The hero row as committed
    pub hero: Hero,
    /// Ids given to appended operations, in write order
    pub operations: Vec<OperationId>,
    /// Ids given to inserted skill rows, in write order
    pub hero_skills: Vec<HeroSkillId>,
}
