//! Terminal output and prompts.

use dialoguer::{Confirm, Input};

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for progress messages
pub static WORKING_PREFIX: &str = "» ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "! ";
/// Prefix for user prompts
pub static PROMPT_PREFIX: &str = "❯ ";
/// Branch of a tree listing
pub static ITEM_PREFIX: &str = "├─";
/// Last branch of a tree listing
pub static LAST_ITEM_PREFIX: &str = "└─";
/// Continuation line of a tree listing
pub static CONTINUE_PREFIX: &str = "│  ";
/// List bullet
pub static BULLET: &str = "•";

/// Something to show the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// One paper in detail
  Paper(&'a Paper),
  /// A paper listing
  Papers(&'a [&'a Paper]),
  /// Dashboard statistics
  Stats(&'a DashboardStats),
  /// A fresh analysis
  Analysis(&'a str, &'a AnalysisRecord),
  /// Something worked
  Success(&'a str),
  /// Something to know
  Info(&'a str),
  /// Something went wrong without ending the command
  Warning(&'a str),
}

/// How commands talk to the user.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Asks for a line of text, offering `default`.
  fn prompt(&self, message: &str, default: &str) -> Result<String>;
  /// Shows something.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Interaction on the controlling terminal.
#[derive(Debug, Clone, Copy)]
pub struct Terminal {
  /// Answer every prompt with its default
  accept_defaults: bool,
}

impl Terminal {
  /// Creates a terminal interaction.
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults } }

  /// Prints an error that ended a command.
  pub fn error(&self, e: &PaperLenzdError) {
    eprintln!("{} {e}", style(ERROR_PREFIX).red());
  }
}

impl UserInteraction for Terminal {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{} {message}", style(PROMPT_PREFIX).cyan()))
        .default(false)
        .interact()?,
    )
  }

  fn prompt(&self, message: &str, default: &str) -> Result<String> {
    if self.accept_defaults {
      return Ok(default.to_string());
    }
    Ok(
      Input::<String>::new()
        .with_prompt(format!("{} {message}", style(PROMPT_PREFIX).cyan()))
        .default(default.to_string())
        .allow_empty(true)
        .interact_text()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Paper(paper) => print_paper(paper, true),
      ResponseContent::Papers(papers) => {
        if papers.is_empty() {
          println!("{} No papers found", style(INFO_PREFIX).blue());
        }
        for (index, paper) in papers.iter().enumerate() {
          print_paper(paper, index + 1 == papers.len());
        }
      },
      ResponseContent::Stats(stats) => {
        println!("{} Total papers: {}", style(INFO_PREFIX).blue(), style(stats.total_papers).bold());
        println!("{CONTINUE_PREFIX}Average credibility: {}/100", stats.average_credibility);
        println!("{CONTINUE_PREFIX}Papers with notes: {}", stats.papers_with_notes);
        println!("{CONTINUE_PREFIX}Days since last analysis: {}", stats.days_since_last_analysis);
      },
      ResponseContent::Analysis(title, analysis) => {
        println!("{} {}", style(SUCCESS_PREFIX).green(), style(title).bold());
        println!("{CONTINUE_PREFIX}{}", analysis.one_line_summary);
        println!(
          "{CONTINUE_PREFIX}Quality: {}/100  Credibility: {}/100 ({})",
          analysis.paper_quality_score.total,
          analysis.credibility_analysis.score,
          analysis.credibility_analysis.label()
        );
        for concept in &analysis.core_concepts {
          println!("{CONTINUE_PREFIX}{BULLET} {concept}");
        }
      },
      ResponseContent::Success(message) => println!("{} {message}", style(SUCCESS_PREFIX).green()),
      ResponseContent::Info(message) => println!("{} {message}", style(INFO_PREFIX).blue()),
      ResponseContent::Warning(message) =>
        eprintln!("{} {message}", style(WARNING_PREFIX).yellow()),
    }
    Ok(())
  }
}

/// Prints one paper as a tree entry.
fn print_paper(paper: &Paper, last: bool) {
  let branch = if last { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
  let indent = if last { "   " } else { CONTINUE_PREFIX };
  println!("{} {}", style(branch).dim(), style(&paper.title).bold());
  println!("{indent}{}", style(&paper.id).dim());
  println!(
    "{indent}{} · {} · credibility {}/100 · {}",
    paper.input_type,
    paper.academic_level,
    paper.analysis.credibility_analysis.score,
    paper.created_at.format("%Y-%m-%d %H:%M")
  );
  if let Some(doi) = &paper.doi {
    println!("{indent}DOI {doi}");
  }
  if let Some(notes) = paper.notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
    println!("{indent}Notes: {notes}");
  }
}
