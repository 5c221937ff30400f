//! Module for the "remove" command.

use paperlenz::database::Remove;

use super::*;

/// Arguments of [`Commands::Remove`]
#[derive(Args, Clone)]
pub struct RemoveArgs {
  /// Id of the paper
  pub id: String,
}

/// Function for the [`Commands::Remove`] in the CLI.
pub async fn remove<I: UserInteraction>(
  interaction: &I,
  session: &mut Session,
  args: RemoveArgs,
) -> Result<()> {
  let paper = session.paper(&args.id).await?;
  interaction.reply(ResponseContent::Paper(&paper))?;

  if !interaction.confirm("Remove this paper and its analysis?")? {
    interaction.reply(ResponseContent::Info("Operation cancelled"))?;
    return Ok(());
  }

  let removed = Remove::paper(&session.user.id, &paper.id).execute(&mut session.db).await?;
  interaction.reply(ResponseContent::Success(&format!("Removed {} paper(s)", removed.len())))
}
