//! Module for the "show" command.

use paperlenz::report::Report;

use super::*;

/// Arguments of [`Commands::Show`]
#[derive(Args, Clone)]
pub struct ShowArgs {
  /// Id of the paper
  pub id: String,
}

/// Function for the [`Commands::Show`] in the CLI.
pub async fn show<I: UserInteraction>(
  interaction: &I,
  session: &mut Session,
  args: ShowArgs,
) -> Result<()> {
  let paper = session.paper(&args.id).await?;
  interaction.reply(ResponseContent::Paper(&paper))?;
  println!("\n{}", Report::for_paper(&paper));
  Ok(())
}
