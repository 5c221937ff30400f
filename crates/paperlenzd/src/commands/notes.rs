//! Module for the "notes" command.

use paperlenz::database::UpdateNotes;

use super::*;

/// Arguments of [`Commands::Notes`]
#[derive(Args, Clone)]
pub struct NotesArgs {
  /// Id of the paper
  pub id:    String,
  /// New notes; the current notes are shown when absent
  #[arg(conflicts_with = "clear")]
  pub text:  Option<String>,
  /// Remove the notes
  #[arg(long)]
  pub clear: bool,
}

/// Function for the [`Commands::Notes`] in the CLI.
pub async fn notes<I: UserInteraction>(
  interaction: &I,
  session: &mut Session,
  args: NotesArgs,
) -> Result<()> {
  let NotesArgs { id, text, clear } = args;

  if text.is_none() && !clear {
    let paper = session.paper(&id).await?;
    return match paper.notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
      Some(notes) => {
        println!("{notes}");
        Ok(())
      },
      None => interaction.reply(ResponseContent::Info("No notes yet")),
    };
  }

  let paper = UpdateNotes::new(&session.user.id, &id, text).execute(&mut session.db).await?;
  let message = if paper.has_notes() { "Notes saved" } else { "Notes cleared" };
  interaction.reply(ResponseContent::Success(message))
}
