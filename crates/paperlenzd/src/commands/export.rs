//! Module for the "export" command.

use paperlenz::report::Report;

use super::*;

/// Output formats of [`Commands::Export`]
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
  /// Markdown report
  #[default]
  Markdown,
  /// The stored paper with its analysis as JSON
  Json,
}

/// Arguments of [`Commands::Export`]
#[derive(Args, Clone)]
pub struct ExportArgs {
  /// Id of the paper
  pub id:     String,
  /// Output format
  #[arg(long, short, value_enum, default_value_t)]
  pub format: ExportFormat,
  /// File to write; standard output when absent
  #[arg(long, short)]
  pub output: Option<PathBuf>,
}

/// Function for the [`Commands::Export`] in the CLI.
pub async fn export<I: UserInteraction>(
  interaction: &I,
  session: &mut Session,
  args: ExportArgs,
) -> Result<()> {
  let paper = session.paper(&args.id).await?;
  let rendered = match args.format {
    ExportFormat::Markdown => Report::for_paper(&paper).to_string(),
    ExportFormat::Json => serde_json::to_string_pretty(&paper)?,
  };

  match args.output {
    Some(path) => {
      if path.exists() && !interaction.confirm(&format!("Overwrite {}?", path.display()))? {
        interaction.reply(ResponseContent::Info("Export cancelled"))?;
        return Ok(());
      }
      std::fs::write(&path, rendered)?;
      interaction.reply(ResponseContent::Success(&format!(
        "Exported \"{}\" to {}",
        paper.title,
        path.display()
      )))
    },
    None => {
      println!("{rendered}");
      Ok(())
    },
  }
}
