//! Database instructions.
//!
//! Each operation is a small value implementing [`DatabaseInstruction`]. Instructions borrow the
//! [`Database`] mutably for the duration of one call, so several can be executed in sequence on
//! the same handle.

use rusqlite::{params, params_from_iter, OptionalExtension};

use super::*;

pub mod add;
pub mod notes;
pub mod query;
pub mod remove;
pub mod user;

pub use self::{
  add::Add,
  notes::UpdateNotes,
  query::{Query, QueryCriteria},
  remove::{Remove, RemoveOptions},
  user::{CreateUser, GetUser, UpdateUser},
};

/// A single database operation.
#[async_trait]
pub trait DatabaseInstruction {
  /// What the operation produces.
  type Output;

  /// Runs the operation.
  async fn execute(&self, db: &mut Database) -> Result<Self::Output>;
}
