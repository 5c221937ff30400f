//! Local SQLite storage of user profiles and analyzed papers.
//!
//! The schema is created on [`Database::open`] from a single bootstrap migration. Papers carry
//! their [`AnalysisRecord`] as JSON text; only the notes column changes after a paper is stored.
//!
//! Operations are expressed as [`DatabaseInstruction`]s:
//!
//! - [`Add`]: store a new paper
//! - [`Query`]: list a user's papers, newest first, or fetch one by id
//! - [`UpdateNotes`]: replace a paper's notes
//! - [`Remove`]: delete papers matched by a query
//! - [`GetUser`] and [`CreateUser`]: profile rows
//!
//! # Examples
//!
//! ```no_run
//! use paperlenz::{
//!   database::{Database, Query},
//!   prelude::*,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut db = Database::open("paperlenz.db").await?;
//! for paper in Query::for_user("user-id").execute(&mut db).await? {
//!   println!("{}: {}", paper.id, paper.title);
//! }
//! # Ok(())
//! # }
//! ```

use chrono::SecondsFormat;
use rusqlite::{types::Type, Row};
use tokio_rusqlite::Connection;

use super::*;
use crate::{
  auth::User,
  paper::{NewPaper, Paper},
};

pub mod instruction;

pub use self::instruction::*;

/// Columns of the papers table in the order [`paper_from_row`] reads them.
pub(crate) const PAPER_COLUMNS: &str =
  "id, user_id, title, doi, abstract, input_type, academic_level, analysis, notes, created_at";

/// Columns of the users table in the order [`user_from_row`] reads them.
pub(crate) const USER_COLUMNS: &str = "id, email, username, academic_level, created_at";

/// Handle for interacting with the paper database.
///
/// Wraps an async connection; clones share the same underlying connection.
#[derive(Debug, Clone)]
pub struct Database {
  /// Async SQLite connection handle
  pub(crate) conn: Connection,
}

impl Database {
  /// Opens an existing database or creates a new one at the specified path.
  ///
  /// This method will:
  /// 1. Create the parent directory and the database file if they don't exist
  /// 2. Initialize the schema using migrations
  ///
  /// # Examples
  ///
  /// ```no_run
  /// # use paperlenz::database::Database;
  /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
  /// // Open in a specific location
  /// let db = Database::open("papers.db").await?;
  ///
  /// // Or use the default location
  /// let db = Database::open(Database::default_path()).await?;
  /// # Ok(())
  /// # }
  /// ```
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }

    debug!("Opening database at {}", path.display());
    let conn = Connection::open(path).await?;
    conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/migrations/init.sql"
        )))?;
        Ok(())
      })
      .await?;

    Ok(Self { conn })
  }

  /// Returns the default path for the database file.
  ///
  /// The path is constructed as follows:
  /// - On Unix: `~/.local/share/paperlenz/paperlenz.db`
  /// - On macOS: `~/Library/Application Support/paperlenz/paperlenz.db`
  /// - On Windows: `%APPDATA%\paperlenz\paperlenz.db`
  /// - Fallback: `./paperlenz/paperlenz.db` in the current directory
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("paperlenz").join("paperlenz.db")
  }
}

/// Where the orchestrator persists finished analyses.
#[async_trait]
pub trait PaperStore: Send + Sync {
  /// Stores a new paper and returns the stored row.
  async fn save_paper(&self, paper: NewPaper) -> Result<Paper>;
}

#[async_trait]
impl PaperStore for Database {
  async fn save_paper(&self, paper: NewPaper) -> Result<Paper> {
    Add::paper(paper).execute(&mut self.clone()).await
  }
}

/// Formats a timestamp so that text order equals time order.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
  timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Wraps a column decoding failure the way rusqlite reports its own.
fn conversion_error(
  idx: usize,
  e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Reads a text column and parses it with [`FromStr`].
fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static, {
  row.get::<_, String>(idx)?.parse().map_err(|e| conversion_error(idx, e))
}

/// Reads an RFC 3339 timestamp column.
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(&row.get::<_, String>(idx)?)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| conversion_error(idx, e))
}

/// Builds a [`Paper`] from a row selected with [`PAPER_COLUMNS`].
pub(crate) fn paper_from_row(row: &Row<'_>) -> rusqlite::Result<Paper> {
  Ok(Paper {
    id:             row.get(0)?,
    user_id:        row.get(1)?,
    title:          row.get(2)?,
    doi:            row.get(3)?,
    abstract_text:  row.get(4)?,
    input_type:     parse_column(row, 5)?,
    academic_level: parse_column(row, 6)?,
    analysis:       serde_json::from_str(&row.get::<_, String>(7)?)
      .map_err(|e| conversion_error(7, e))?,
    notes:          row.get(8)?,
    created_at:     timestamp_column(row, 9)?,
  })
}

/// Builds a [`User`] from a row selected with [`USER_COLUMNS`].
pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
  Ok(User {
    id:             row.get(0)?,
    email:          row.get(1)?,
    username:       row.get(2)?,
    academic_level: parse_column(row, 3)?,
    created_at:     timestamp_column(row, 4)?,
  })
}
