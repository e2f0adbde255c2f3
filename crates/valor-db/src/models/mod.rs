//! Database models for persistent storage.

mod hero;
mod operation;

pub use hero::*;
pub use operation::*;
