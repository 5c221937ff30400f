//! Module for the "serve" command.

use std::net::SocketAddr;

use paperlenz::{analyzer::Analyzer, server};

use super::*;

/// Arguments of [`Commands::Serve`]
#[derive(Args, Clone)]
pub struct ServeArgs {
  /// Address to listen on
  #[arg(long, short, default_value = "127.0.0.1:8787")]
  pub bind: SocketAddr,
}

/// Function for the [`Commands::Serve`] in the CLI.
///
/// Needs no user profile. Without a configuration file, defaults and the environment are used.
pub async fn serve<I: UserInteraction>(
  interaction: &I,
  config_path: &Path,
  args: ServeArgs,
) -> Result<()> {
  let config = if config_path.exists() {
    Config::load(config_path)?
  } else {
    debug!("No configuration at {}, using defaults", config_path.display());
    Config::default().with_environment()?
  };

  let analyzer = Analyzer::from_config(&config);
  if !analyzer.llm().has_api_key() {
    interaction.reply(ResponseContent::Warning(
      "No API key configured; analysis and chat requests will fail",
    ))?;
  }
  interaction.reply(ResponseContent::Info(&format!("Serving on http://{}", args.bind)))?;
  server::bind_and_serve(args.bind, analyzer).await?;
  Ok(())
}
