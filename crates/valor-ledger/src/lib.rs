//! Valor Ledger - Transactional hero progression
//!
//! This crate runs the progression rules of `valor-core` against a
//! `valor-db` store and the tables loaded by `valor-script`:
//!
//! - [`HeroLedger`]: hero creation, experience and gold grants, reads
//! - [`AttributeAllocation`]: spend experience on attribute points
//! - [`SkillProgression`]: learn and upgrade class skills
//! - Auto level: every experience grant and spend re-derives the hero's
//!   level in the same commit
//!
//! Allocations, learns and upgrades can be rolled back, newest first, for
//! a configurable window after they were made.
//!
//! ## Concurrency
//!
//! Operations on one hero are serialized through an optimistic version on
//! the hero row. An operation that loses a commit race is re-run from a
//! fresh read, so it either applies against the latest state or fails the
//! way it would have if it had run second. Different heroes never contend.

mod attributes;
mod config;
mod error;
mod ledger;
mod leveling;
mod skills;
mod txn;

#[cfg(test)]
mod testing;

pub use attributes::AttributeAllocation;
pub use config::LedgerConfig;
pub use error::ConfigError;
pub use ledger::{HeroLedger, Receipt};
pub use skills::SkillProgression;
