//! Class skill pools

use serde::{Deserialize, Serialize};
use valor_core::{ClassId, SkillId};

/// A skill a class may learn, and how far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub skill: SkillId,
    pub max_learnable_level: u32,
    /// Granted at level 1 when a hero of this class is created
    #[serde(default)]
    pub initial: bool,
}

/// Definition of a hero class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<PoolEntry>,
}

impl ClassDef {
    /// The pool entry for `skill`, if this class can learn it
    pub fn pool_entry(&self, skill: &SkillId) -> Option<&PoolEntry> {
        self.skills.iter().find(|entry| &entry.skill == skill)
    }

    pub fn initial_skills(&self) -> impl Iterator<Item = &PoolEntry> {
        self.skills.iter().filter(|entry| entry.initial)
    }
}
