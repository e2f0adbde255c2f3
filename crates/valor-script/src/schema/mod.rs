//! Schema definitions for progression tables

pub mod attribute;
pub mod class;
pub mod level;
pub mod skill;

pub use attribute::{AttributeCostRow, AttributeCostTable, AttributeDef};
pub use class::{ClassDef, PoolEntry};
pub use level::{LevelRequirement, LevelTable};
pub use skill::{SkillCostRow, SkillCostTable, SkillDef};
