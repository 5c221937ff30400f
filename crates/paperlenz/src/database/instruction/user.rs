//! Profile rows.

use super::*;

/// Fetches a profile by id.
#[derive(Debug, Clone)]
pub struct GetUser {
  /// Profile id
  id: String,
}

impl GetUser {
  /// Creates an instruction fetching profile `id`.
  pub fn by_id(id: impl Into<String>) -> Self { Self { id: id.into() } }
}

#[async_trait]
impl DatabaseInstruction for GetUser {
  type Output = Option<User>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let id = self.id.clone();
    let user = db
      .conn
      .call(move |conn| {
        let user = conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            user_from_row,
          )
          .optional()?;
        Ok(user)
      })
      .await?;
    Ok(user)
  }
}

/// Inserts a profile.
#[derive(Debug, Clone)]
pub struct CreateUser {
  /// Profile to insert
  user: User,
}

impl CreateUser {
  /// Creates an instruction inserting `user`.
  pub fn new(user: User) -> Self { Self { user } }
}

#[async_trait]
impl DatabaseInstruction for CreateUser {
  type Output = User;

  /// # Errors
  ///
  /// Returns [`PaperLenzError::DuplicateUser`] when a profile with the same id exists.
  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let user = self.user.clone();
    let inserted = db
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO users (id, email, username, academic_level, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            user.id,
            user.email,
            user.username,
            user.academic_level.as_str(),
            format_timestamp(&user.created_at),
          ],
        ))
      })
      .await?;

    match inserted {
      Ok(_) => {
        debug!("Created profile {}", self.user.username);
        Ok(self.user.clone())
      },
      Err(rusqlite::Error::SqliteFailure(e, _))
        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        Err(PaperLenzError::DuplicateUser(self.user.id.clone())),
      Err(e) => Err(e.into()),
    }
  }
}

/// Changes the username or academic level of a profile. Fields left unset keep their value.
#[derive(Debug, Clone)]
pub struct UpdateUser {
  /// Profile id
  id:             String,
  /// New display name
  username:       Option<String>,
  /// New preferred analysis level
  academic_level: Option<AcademicLevel>,
}

impl UpdateUser {
  /// Creates an instruction updating profile `id`.
  pub fn new(id: impl Into<String>) -> Self {
    Self { id: id.into(), username: None, academic_level: None }
  }

  /// Sets the username. Blank names are ignored.
  pub fn with_username(mut self, username: Option<String>) -> Self {
    self.username = username.map(|name| name.trim().to_string()).filter(|name| !name.is_empty());
    self
  }

  /// Sets the academic level.
  pub fn with_academic_level(mut self, academic_level: Option<AcademicLevel>) -> Self {
    self.academic_level = academic_level;
    self
  }
}

#[async_trait]
impl DatabaseInstruction for UpdateUser {
  /// The updated profile, `None` when there is no profile with this id.
  type Output = Option<User>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let (id, username) = (self.id.clone(), self.username.clone());
    let level = self.academic_level.map(|level| level.as_str());
    let user = db
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE users
           SET username = COALESCE(?2, username), academic_level = COALESCE(?3, academic_level)
           WHERE id = ?1",
          params![id, username, level],
        )?;
        let user = tx
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [&id],
            user_from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(user)
      })
      .await?;

    if let Some(user) = &user {
      debug!("Updated profile {} ({})", user.username, user.academic_level);
    }
    Ok(user)
  }
}
