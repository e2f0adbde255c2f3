//! Valor Core - Domain model of the hero progression ledger
//!
//! This crate holds the storage-independent pieces of the ledger:
//! - Identifiers (`HeroId`, `AttributeCode`, `SkillId`, ...)
//! - Hero records and the three-way experience account
//! - Append-only operation records and the time-boxed [`RollbackStack`]
//! - The level rule deriving a hero's level from lifetime experience
//! - The error taxonomy shared by every crate in the workspace
//!
//! Nothing here performs I/O. `valor-db` persists these records and
//! `valor-ledger` runs them inside transactions.

mod error;
mod hero;
mod identity;
pub mod leveling;
mod operation;
mod rollback;
pub mod time;

pub use error::{Error, ErrorCode, Result};
pub use hero::{AllocatedAttribute, Cost, Hero, HeroSkill, LearnedMethod};
pub use identity::{AttributeCode, ClassId, HeroId, HeroSkillId, OperationId, SkillId};
pub use leveling::{LevelRequirements, LevelUp};
pub use operation::{AttributeOperation, MaterialCost, Reversible, SkillOperation};
pub use rollback::RollbackStack;
pub use time::{Clock, ManualClock, SystemClock};
