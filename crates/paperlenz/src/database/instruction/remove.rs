//! Deleting papers.
//!
//! Removal goes through a [`Query`], so anything that can be listed can be removed. A dry run
//! returns what would be deleted without touching the database.
//!
//! # Examples
//!
//! ```no_run
//! use paperlenz::{
//!   database::{Database, Remove},
//!   prelude::*,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut db = Database::open("papers.db").await?;
//!
//! // Preview deletion with dry run
//! let papers = Remove::paper("user-id", "paper-id").dry_run().execute(&mut db).await?;
//! println!("Would remove {} papers", papers.len());
//! # Ok(())
//! # }
//! ```

use super::*;

/// Configuration options for paper removal operations.
#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
  /// When true, reports the matching papers without deleting them.
  pub dry_run: bool,
}

/// Instruction for removing papers from the database.
#[derive(Debug, Clone)]
pub struct Remove {
  /// The query identifying papers to remove
  query:   Query,
  /// Configuration options for the removal
  options: RemoveOptions,
}

impl Remove {
  /// Removes whatever `query` selects.
  pub fn from_query(query: Query) -> Self { Self { query, options: RemoveOptions::default() } }

  /// Removes one paper owned by `user_id`.
  pub fn paper(user_id: impl Into<String>, paper_id: impl Into<String>) -> Self {
    Self::from_query(Query::by_id(user_id, paper_id))
  }

  /// Only reports what would be removed.
  pub fn dry_run(mut self) -> Self {
    self.options.dry_run = true;
    self
  }
}

#[async_trait]
impl DatabaseInstruction for Remove {
  type Output = Vec<Paper>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let papers = self.query.execute(db).await?;
    if self.options.dry_run || papers.is_empty() {
      return Ok(papers);
    }

    let ids: Vec<String> = papers.iter().map(|paper| paper.id.clone()).collect();
    db.conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached("DELETE FROM papers WHERE id = ?1")?;
          for id in &ids {
            stmt.execute([id])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!("Removed {} papers", papers.len());
    Ok(papers)
  }
}
