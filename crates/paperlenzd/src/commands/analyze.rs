//! Module for the "analyze" command.

use std::sync::Arc;

use clap::ArgGroup;
use paperlenz::{
  orchestrator::{AnalysisState, Orchestrator},
  paper::Submission,
};

use super::*;

/// Arguments of [`Commands::Analyze`]
#[derive(Args, Clone)]
#[command(group(ArgGroup::new("input").required(true).args(["doi", "abstract_text", "pdf"])))]
pub struct AnalyzeArgs {
  /// DOI of the paper, bare or as a doi.org URL
  #[arg(long)]
  pub doi:           Option<String>,
  /// Abstract text
  #[arg(long = "abstract")]
  pub abstract_text: Option<String>,
  /// Path to a PDF file
  #[arg(long)]
  pub pdf:           Option<PathBuf>,
  /// Title to store the paper under (ignored for DOIs)
  #[arg(long)]
  pub title:         Option<String>,
  /// Academic level: high_school, undergraduate, graduate or professor. Defaults to the
  /// profile's level.
  #[arg(long, value_parser = parse_level)]
  pub level:         Option<AcademicLevel>,
  /// Print the analysis as JSON instead of a summary
  #[arg(long)]
  pub json:          bool,
}

impl AnalyzeArgs {
  /// Builds the submission, reading the PDF if one was given.
  fn submission(&self, level: AcademicLevel) -> Result<Submission> {
    let submission = if let Some(doi) = &self.doi {
      Submission::doi(doi.as_str(), level)
    } else if let Some(path) = &self.pdf {
      Submission::pdf(std::fs::read(path)?, level)
    } else {
      Submission::abstract_text(self.abstract_text.clone().unwrap_or_default(), level)
    };
    Ok(match &self.title {
      Some(title) => submission.with_title(title.as_str()),
      None => submission,
    })
  }
}

/// Function for the [`Commands::Analyze`] in the CLI.
pub async fn analyze<I: UserInteraction>(
  interaction: &I,
  session: &mut Session,
  args: AnalyzeArgs,
) -> Result<()> {
  let level = args.level.unwrap_or(session.user.academic_level);
  let submission = args.submission(level)?;

  let orchestrator = Orchestrator::from_config(&session.config, Arc::new(session.db.clone()))?;
  let mut states = orchestrator.subscribe();
  let quiet = args.json;
  let printer = tokio::spawn(async move {
    while let Ok(state) = states.recv().await {
      if let AnalysisState::Processing { progress, step } = state {
        if !quiet {
          println!("{} {progress:>3}% {step}", style(WORKING_PREFIX).cyan());
        }
      }
    }
  });

  let result = orchestrator.submit(&session.user.id, submission).await;
  // Closing the channel lets the printer drain and finish.
  drop(orchestrator);
  if let Err(e) = printer.await {
    trace!("Progress printer stopped: {e}");
  }
  let outcome = result?;

  if args.json {
    println!("{}", serde_json::to_string_pretty(&outcome.analysis)?);
  } else {
    interaction.reply(ResponseContent::Analysis(&outcome.title, &outcome.analysis))?;
  }

  match (&outcome.paper, &outcome.save_error) {
    (Some(paper), _) if !args.json =>
      interaction.reply(ResponseContent::Info(&format!("Saved as {}", paper.id)))?,
    (None, Some(e)) => interaction
      .reply(ResponseContent::Warning(&format!("Analysis completed but failed to save: {e}")))?,
    _ => {},
  }
  Ok(())
}
