//! Editing the notes of a stored paper.

use super::*;

/// Replaces the notes of a paper owned by a user. Blank notes clear the column.
#[derive(Debug, Clone)]
pub struct UpdateNotes {
  /// Owner of the paper
  user_id:  String,
  /// The paper
  paper_id: String,
  /// New notes
  notes:    Option<String>,
}

impl UpdateNotes {
  /// Creates an instruction setting the notes of `paper_id`.
  pub fn new(
    user_id: impl Into<String>,
    paper_id: impl Into<String>,
    notes: Option<String>,
  ) -> Self {
    Self {
      user_id:  user_id.into(),
      paper_id: paper_id.into(),
      notes:    notes.filter(|notes| !notes.trim().is_empty()),
    }
  }
}

#[async_trait]
impl DatabaseInstruction for UpdateNotes {
  type Output = Paper;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let (user_id, paper_id, notes) =
      (self.user_id.clone(), self.paper_id.clone(), self.notes.clone());

    let updated = db
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE papers SET notes = ?1 WHERE id = ?2 AND user_id = ?3",
          params![notes, paper_id, user_id],
        )?;
        Ok(updated)
      })
      .await?;

    if updated == 0 {
      return Err(PaperLenzError::NotFound);
    }
    debug!("Updated notes of paper {}", self.paper_id);
    Query::by_id(&self.user_id, &self.paper_id).fetch_one(db).await
  }
}
