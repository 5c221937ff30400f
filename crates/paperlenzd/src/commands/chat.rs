//! Module for the "chat" command.

use std::io::{BufRead, Write};

use paperlenz::{
  chat::{ChatAssistant, APOLOGY, GREETING},
  llm::LlmClient,
};

use super::*;

/// Inputs that end an interactive conversation.
const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

/// Arguments of [`Commands::Chat`]
#[derive(Args, Clone)]
pub struct ChatArgs {
  /// Ask a single question and exit
  #[arg(long, short)]
  pub message: Option<String>,
}

/// Function for the [`Commands::Chat`] in the CLI.
///
/// Without `--message`, lines are read from standard input until end of input or `exit`.
pub async fn chat<I: UserInteraction>(
  interaction: &I,
  session: &Session,
  args: ChatArgs,
) -> Result<()> {
  let mut assistant = ChatAssistant::new(LlmClient::new(&session.config.llm));

  if let Some(message) = args.message {
    return ask(&mut assistant, &message).await;
  }

  println!("{GREETING}\n");
  interaction.reply(ResponseContent::Info("Type `exit` or press Ctrl-D to leave"))?;

  let stdin = std::io::stdin();
  loop {
    print!("{} ", style(PROMPT_PREFIX).cyan());
    std::io::stdout().flush()?;

    let mut line = String::new();
    if stdin.lock().read_line(&mut line)? == 0 {
      break;
    }
    let line = line.trim();
    if EXIT_WORDS.contains(&line.to_lowercase().as_str()) {
      break;
    }
    if let Err(e) = ask(&mut assistant, line).await {
      interaction.reply(ResponseContent::Warning(&e.to_string()))?;
    }
  }
  Ok(())
}

/// Sends one question and prints the answer, or the apology when it fails.
async fn ask(assistant: &mut ChatAssistant, question: &str) -> Result<()> {
  match assistant.send(question).await {
    Ok(Some(reply)) => println!("{reply}\n"),
    Ok(None) => {},
    Err(e) => {
      println!("{APOLOGY}\n");
      return Err(e.into());
    },
  }
  Ok(())
}
