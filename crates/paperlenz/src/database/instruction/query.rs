//! Listing and fetching papers.
//!
//! Every query is scoped to one user. Results are always ordered newest first.

use super::*;

/// Which papers a [`Query`] selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCriteria {
  /// All papers of the user
  All,
  /// The paper with this id
  ById(String),
}

/// A query for a user's papers.
#[derive(Debug, Clone)]
pub struct Query {
  /// Owner of the papers
  user_id:    String,
  /// Selection
  criteria:   QueryCriteria,
  /// Restrict to one input type
  input_type: Option<InputType>,
  /// Maximum number of rows
  limit:      Option<usize>,
}

impl Query {
  /// Selects all papers of `user_id`.
  pub fn for_user(user_id: impl Into<String>) -> Self {
    Self { user_id: user_id.into(), criteria: QueryCriteria::All, input_type: None, limit: None }
  }

  /// Selects the paper `paper_id` if `user_id` owns it.
  pub fn by_id(user_id: impl Into<String>, paper_id: impl Into<String>) -> Self {
    Self { criteria: QueryCriteria::ById(paper_id.into()), ..Self::for_user(user_id) }
  }

  /// Keeps only papers submitted as `input_type`.
  pub fn with_input_type(mut self, input_type: InputType) -> Self {
    self.input_type = Some(input_type);
    self
  }

  /// Returns at most `limit` papers.
  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  /// Builds the statement and its parameters.
  fn build_sql(&self) -> (String, Vec<String>) {
    let mut sql = format!("SELECT {PAPER_COLUMNS} FROM papers WHERE user_id = ?1");
    let mut values = vec![self.user_id.clone()];

    if let QueryCriteria::ById(id) = &self.criteria {
      values.push(id.clone());
      sql.push_str(&format!(" AND id = ?{}", values.len()));
    }
    if let Some(input_type) = self.input_type {
      values.push(input_type.to_string());
      sql.push_str(&format!(" AND input_type = ?{}", values.len()));
    }

    sql.push_str(" ORDER BY created_at DESC, rowid DESC");
    if let Some(limit) = self.limit {
      sql.push_str(&format!(" LIMIT {limit}"));
    }
    (sql, values)
  }
}

#[async_trait]
impl DatabaseInstruction for Query {
  type Output = Vec<Paper>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let (sql, values) = self.build_sql();
    trace!("Running query: {sql}");

    let papers = db
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&sql)?;
        let papers = stmt
          .query_map(params_from_iter(values), paper_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(papers)
      })
      .await?;

    Ok(papers)
  }
}

impl Query {
  /// Runs a [`Query::by_id`] query and unwraps its single result.
  ///
  /// # Errors
  ///
  /// Returns [`PaperLenzError::NotFound`] when the user owns no paper with that id.
  pub async fn fetch_one(&self, db: &mut Database) -> Result<Paper> {
    self.execute(db).await?.into_iter().next().ok_or(PaperLenzError::NotFound)
  }
}
