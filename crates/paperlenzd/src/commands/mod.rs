use super::*;

pub mod analyze;
pub mod chat;
pub mod export;
pub mod init;
pub mod list;
pub mod notes;
pub mod remove;
pub mod serve;
pub mod show;

pub use analyze::{analyze, AnalyzeArgs};
pub use chat::{chat, ChatArgs};
pub use export::{export, ExportArgs};
pub use init::{init, InitArgs};
pub use list::{list, stats, ListArgs};
pub use notes::{notes, NotesArgs};
pub use remove::{remove, RemoveArgs};
pub use serve::{serve, ServeArgs};
pub use show::{show, ShowArgs};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Create the configuration, database and user profile
  Init(InitArgs),

  /// Analyze a paper given as a DOI, abstract text or PDF file
  Analyze(AnalyzeArgs),

  /// List analyzed papers, newest first
  List(ListArgs),

  /// Print the full report of a paper
  Show(ShowArgs),

  /// Write the report of a paper as Markdown or JSON
  Export(ExportArgs),

  /// Show, set or clear the notes of a paper
  Notes(NotesArgs),

  /// Remove a paper after confirmation
  Remove(RemoveArgs),

  /// Show dashboard statistics
  Stats,

  /// Talk to the research assistant
  Chat(ChatArgs),

  /// Serve the analysis and chat endpoints over HTTP
  Serve(ServeArgs),
}

/// Configuration, database and signed-in user of a command.
pub struct Session {
  /// Loaded configuration
  pub config: Config,
  /// Open database
  pub db:     Database,
  /// Signed-in profile
  pub user:   User,
}

impl Session {
  /// Loads the configuration at `path`, opens the database and signs the configured user in.
  pub async fn open(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Err(PaperLenzdError::NotInitialized(path.to_path_buf()));
    }
    let config = Config::load(path)?;
    let identity = Identity::from_config(&config.user)?;
    let db = Database::open(&config.database_path).await?;

    let auth = AuthContext::new();
    auth.sign_in(&db, Some(&identity)).await;
    let user = auth.user().unwrap_or_else(|| User::default_for(&identity));
    debug!("Signed in as {}", user.username);

    Ok(Self { config, db, user })
  }

  /// Fetches a paper of the signed-in user.
  pub async fn paper(&mut self, id: &str) -> Result<Paper> {
    Ok(Query::by_id(&self.user.id, id).fetch_one(&mut self.db).await?)
  }
}

/// Parses an academic level argument.
fn parse_level(s: &str) -> std::result::Result<AcademicLevel, String> {
  s.parse().map_err(|e: PaperLenzError| e.to_string())
}

/// Parses an input type argument.
fn parse_input_type(s: &str) -> std::result::Result<InputType, String> {
  s.parse().map_err(|e: PaperLenzError| e.to_string())
}
