//! Valor Script - RON loader and schema for progression tables
//!
//! Loads the read-only configuration the ledger consumes:
//! - Attribute catalog and per-point attribute costs
//! - Skill catalog and per-level skill costs
//! - Class skill pools
//! - Level requirements

mod error;
mod loader;
pub mod schema;

pub use error::{Error, Result};
pub use loader::{Loader, ProgressionDefs};
pub use schema::{
    AttributeCostRow, AttributeCostTable, AttributeDef, ClassDef, LevelRequirement, LevelTable,
    PoolEntry, SkillCostRow, SkillCostTable, SkillDef,
};
