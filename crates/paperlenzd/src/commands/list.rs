//! Module for the "list" and "stats" commands.

use chrono::Utc;
use paperlenz::dashboard::PaperFilter;

use super::*;

/// Arguments of [`Commands::List`]
#[derive(Args, Clone)]
pub struct ListArgs {
  /// Only papers whose title contains this text, ignoring case
  #[arg(long, short)]
  pub search:     Option<String>,
  /// Only papers submitted as doi, abstract or pdf
  #[arg(long = "type", value_parser = parse_input_type)]
  pub input_type: Option<InputType>,
  /// Print the papers as JSON
  #[arg(long)]
  pub json:       bool,
}

/// Function for the [`Commands::List`] in the CLI.
pub async fn list<I: UserInteraction>(
  interaction: &I,
  session: &mut Session,
  args: ListArgs,
) -> Result<()> {
  let papers = Query::for_user(&session.user.id).execute(&mut session.db).await?;
  let filter = PaperFilter::new()
    .with_search(args.search.as_deref().unwrap_or_default())
    .with_input_type(args.input_type);
  let shown = filter.apply(&papers);
  debug!("Showing {} of {} papers", shown.len(), papers.len());

  if args.json {
    println!("{}", serde_json::to_string_pretty(&shown)?);
  } else {
    interaction.reply(ResponseContent::Papers(&shown))?;
  }
  Ok(())
}

/// Function for the [`Commands::Stats`] in the CLI.
pub async fn stats<I: UserInteraction>(interaction: &I, session: &mut Session) -> Result<()> {
  let papers = Query::for_user(&session.user.id).execute(&mut session.db).await?;
  interaction.reply(ResponseContent::Stats(&DashboardStats::compute(&papers, Utc::now())))
}
