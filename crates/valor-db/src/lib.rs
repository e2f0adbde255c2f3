//! Valor DB - Database layer using native_db
//!
//! Provides persistent storage for:
//! - Heroes and their experience ledger
//! - Allocated attributes and learned skills
//! - The append-only attribute and skill operation logs
//!
//! Mutations go through versioned [`WriteSet`]s so that all changes for one
//! hero serialize on the hero row.

mod error;
mod models;
mod queries;
mod store;
mod write_set;

pub use error::{Error, Result};
pub use store::{NewHero, Store};
pub use write_set::{
    CommitResult, NewAttributeOperation, NewHeroSkill, NewSkillOperation, PendingWrite,
    SkillRowRef, WriteSet,
};
