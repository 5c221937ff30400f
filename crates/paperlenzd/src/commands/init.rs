//! Module for setting up a PaperLenz configuration, database and profile.

use paperlenz::{
  auth::{sign_up, SignUp},
  config::{API_KEY_VAR, ENDPOINT_URL_VAR},
};
use url::Url;

use super::*;

/// Arguments of [`Commands::Init`]
#[derive(Args, Clone)]
pub struct InitArgs {
  /// Where to create the database
  #[arg(long)]
  pub db_path:      Option<PathBuf>,
  /// Email address of the profile
  #[arg(long)]
  pub email:        Option<String>,
  /// Display name of the profile; generated from the email when absent
  #[arg(long)]
  pub username:     Option<String>,
  /// Preferred academic level: high_school, undergraduate, graduate or professor
  #[arg(long, value_parser = parse_level)]
  pub level:        Option<AcademicLevel>,
  /// Groq API key to store in the configuration
  #[arg(long)]
  pub api_key:      Option<String>,
  /// Base URL of a remote analysis service
  #[arg(long)]
  pub endpoint_url: Option<Url>,
}

/// Function for the [`Commands::Init`] in the CLI.
pub async fn init<I: UserInteraction>(
  interaction: &I,
  config_path: &Path,
  args: InitArgs,
) -> Result<()> {
  let InitArgs { db_path, email, username, level, api_key, endpoint_url } = args;

  // Keep the user id of an existing configuration so stored papers stay reachable.
  let existing = if config_path.exists() {
    if !interaction.confirm(&format!(
      "A configuration already exists at {}. Overwrite it?",
      config_path.display()
    ))? {
      interaction.reply(ResponseContent::Info("Keeping the existing configuration"))?;
      return Ok(());
    }
    Config::load_file(config_path).ok()
  } else {
    None
  };

  let mut config = existing.clone().unwrap_or_default();
  if let Some(db_path) = db_path {
    config.database_path = db_path;
  }
  if api_key.is_some() {
    config.llm.api_key = api_key;
  }
  if endpoint_url.is_some() {
    config.endpoint.url = endpoint_url;
  }

  let email = match email {
    Some(email) => email,
    None => {
      let current = existing.as_ref().and_then(|config| config.user.email.as_deref());
      interaction.prompt("Email address", current.unwrap_or_default())?
    },
  };
  config.user.email = Some(email.trim().to_string()).filter(|email| !email.is_empty());
  if config.user.id.is_none() {
    config.user.id = Some(uuid::Uuid::new_v4().to_string());
  }

  config.save(config_path)?;
  let db = Database::open(&config.database_path).await?;
  let identity = Identity::from_config(&config.user)?;
  let user = sign_up(&db, &identity, &SignUp { username, academic_level: level }).await;

  interaction.reply(ResponseContent::Success(&format!(
    "PaperLenz initialized\nConfig path: {}\nDatabase path: {}\nUsername: {}\nAcademic level: {}",
    config_path.display(),
    config.database_path.display(),
    user.username,
    user.academic_level,
  )))?;

  if config.llm.api_key.is_none() && std::env::var(API_KEY_VAR).is_err() {
    interaction.reply(ResponseContent::Warning(&format!(
      "No API key configured; set {API_KEY_VAR} or pass --api-key before analyzing"
    )))?;
  }
  if config.endpoint.url.is_none() {
    debug!("No analysis endpoint configured, {ENDPOINT_URL_VAR} can set one");
  }
  Ok(())
}
