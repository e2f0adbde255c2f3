//! Time-boxed LIFO rollback over an operation log
//!
//! The stack is never kept in memory between calls. It is rebuilt from the
//! persisted log of one (hero, target) pair every time a rollback is
//! requested, ordered by creation time with the operation id as tie-break.
//!
//! Only the top of the stack (the newest entry not yet rolled back) is ever
//! inspected. Once the top has expired, nothing beneath it can be undone.

use crate::error::{Error, Result};
use crate::operation::Reversible;
use chrono::{DateTime, Utc};

/// The reversible history of a single target
#[derive(Debug, Clone)]
pub struct RollbackStack<T> {
    /// Oldest first
    entries: Vec<T>,
}

impl<T: Reversible> RollbackStack<T> {
    /// Rebuild the stack from an unordered log
    pub fn from_log(log: impl IntoIterator<Item = T>) -> Self {
        let mut entries: Vec<T> = log.into_iter().collect();
        entries.sort_by_key(|op| (op.created_at(), op.id()));
        Self { entries }
    }

    /// The newest entry that has not been rolled back
    pub fn top(&self) -> Option<&T> {
        self.entries.iter().rev().find(|op| !op.is_rolled_back())
    }

    /// Number of entries that have not been rolled back
    pub fn depth(&self) -> usize {
        self.entries.iter().filter(|op| !op.is_rolled_back()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry a rollback at `now` would undo
    ///
    /// Fails `ResourceNotFound` when nothing is left to undo and
    /// `OperationExpired` when the top's deadline has passed.
    pub fn claim(&self, now: DateTime<Utc>) -> Result<&T> {
        let top = self
            .top()
            .ok_or_else(|| Error::ResourceNotFound("no operation to roll back".to_string()))?;
        if top.is_expired_at(now) {
            return Err(Error::OperationExpired {
                deadline: top.rollback_deadline(),
                now,
            });
        }
        Ok(top)
    }
}
