//! Skill catalog and per-level cost table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use valor_core::{Cost, MaterialCost, SkillId};

/// Definition of a skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: String,
    /// Absolute level ceiling, whatever the class allows
    #[serde(default = "default_max_level")]
    pub max_level: u32,
}

fn default_max_level() -> u32 {
    10
}

/// Price of reaching `level` (level 1 is the learn itself)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCostRow {
    pub level: u32,
    pub xp: u64,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub materials: Vec<MaterialCost>,
}

impl SkillCostRow {
    /// The spendable part of the price
    pub fn cost(&self) -> Cost {
        Cost {
            xp: self.xp,
            gold: self.gold,
        }
    }
}

/// Skill prices by target level, shared by every skill
#[derive(Debug, Clone, Default)]
pub struct SkillCostTable {
    levels: BTreeMap<u32, SkillCostRow>,
}

impl SkillCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, returning false if the level was already priced
    pub fn insert(&mut self, row: SkillCostRow) -> bool {
        if self.levels.contains_key(&row.level) {
            return false;
        }
        self.levels.insert(row.level, row);
        true
    }

    pub fn cost_for_level(&self, level: u32) -> Option<&SkillCostRow> {
        self.levels.get(&level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_cost_row_ron() {
        let ron_str = r#"
        (
            level: 2,
            xp: 120,
            gold: 15,
            materials: [(item_id: "tome_of_fire", quantity: 1)],
        )
        "#;
        let row: SkillCostRow = ron::from_str(ron_str).unwrap();
        assert_eq!(row.cost(), Cost { xp: 120, gold: 15 });
        assert_eq!(row.materials.len(), 1);
    }

    #[test]
    fn test_skill_def_defaults() {
        let def: SkillDef = ron::from_str(r#"(id: "slash", name: "Slash")"#).unwrap();
        assert_eq!(def.max_level, 10);
    }
}
