//! Storing newly analyzed papers.

use super::*;

/// Inserts a paper, assigning its id and creation time.
#[derive(Debug, Clone)]
pub struct Add {
  /// The paper to store
  paper: NewPaper,
}

impl Add {
  /// Creates an instruction storing `paper`.
  pub fn paper(paper: NewPaper) -> Self { Self { paper } }
}

#[async_trait]
impl DatabaseInstruction for Add {
  type Output = Paper;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let NewPaper { user_id, title, doi, abstract_text, input_type, academic_level, analysis } =
      self.paper.clone();
    let paper = Paper {
      id: uuid::Uuid::new_v4().to_string(),
      user_id,
      title,
      doi,
      abstract_text,
      input_type,
      academic_level,
      analysis,
      notes: None,
      created_at: Utc::now(),
    };

    let analysis_json = serde_json::to_string(&paper.analysis)?;
    let row = paper.clone();
    db.conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "INSERT INTO papers (
              id, user_id, title, doi, abstract,
              input_type, academic_level, analysis, notes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
        )?;
        stmt.execute(params![
          row.id,
          row.user_id,
          row.title,
          row.doi,
          row.abstract_text,
          row.input_type.as_str(),
          row.academic_level.as_str(),
          analysis_json,
          format_timestamp(&row.created_at),
        ])?;
        Ok(())
      })
      .await?;

    debug!("Stored paper {} for user {}", paper.id, paper.user_id);
    Ok(paper)
  }
}
