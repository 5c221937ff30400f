//! Conversational assistant for questions about the platform and research in general.
//!
//! The whole conversation, starting with the assistant's greeting, is sent along with every
//! question so the model keeps context.
//!
//! # Examples
//!
//! ```no_run
//! use paperlenz::{chat::ChatAssistant, config::LlmConfig, llm::LlmClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut assistant = ChatAssistant::new(LlmClient::new(&LlmConfig::default()));
//! if let Some(reply) = assistant.send("What does the credibility score mean?").await? {
//!   println!("{reply}");
//! }
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::{
  llm::{LlmClient, Message, Role},
  prompt::CHAT_SYSTEM_PROMPT,
};

/// Sampling temperature of chat requests.
pub const CHAT_TEMPERATURE: f64 = 0.7;
/// Completion length limit of chat requests.
pub const CHAT_MAX_TOKENS: u32 = 1000;

/// First message of every conversation.
pub const GREETING: &str = "Hi! I'm your PaperLenz assistant. I can help you understand how to \
use the platform, explain research concepts, or answer questions about scientific papers. How \
can I help you today?";

/// Appended in place of a reply when the model cannot be reached.
pub const APOLOGY: &str =
  "I apologize, but I'm having trouble responding right now. Please try again in a moment.";

/// Sends a conversation to the model with the assistant's system prompt.
///
/// `messages` must not contain system messages; the assistant's own is prepended.
pub async fn complete_chat(llm: &LlmClient, messages: &[Message]) -> Result<String> {
  let request = llm
    .request()
    .with_system(CHAT_SYSTEM_PROMPT)
    .with_messages(messages.iter().filter(|message| message.role != Role::System).cloned())
    .with_temperature(CHAT_TEMPERATURE)
    .with_max_tokens(CHAT_MAX_TOKENS);
  llm.complete(request).await
}

/// A conversation with the assistant.
#[derive(Debug, Clone)]
pub struct ChatAssistant {
  /// Model client
  llm:      LlmClient,
  /// Turns so far, starting with the greeting
  messages: Vec<Message>,
}

impl ChatAssistant {
  /// Starts a conversation with the greeting.
  pub fn new(llm: LlmClient) -> Self {
    Self { llm, messages: vec![Message::new(Role::Assistant, GREETING)] }
  }

  /// All turns so far.
  pub fn messages(&self) -> &[Message] { &self.messages }

  /// Asks a question and returns the reply.
  ///
  /// Blank input is ignored and yields `Ok(None)`. On failure the apology is appended as the
  /// assistant's turn and the error is returned.
  pub async fn send(&mut self, text: &str) -> Result<Option<String>> {
    let text = text.trim();
    if text.is_empty() {
      return Ok(None);
    }

    self.messages.push(Message::new(Role::User, text));
    match complete_chat(&self.llm, &self.messages).await {
      Ok(reply) => {
        self.messages.push(Message::new(Role::Assistant, reply.clone()));
        Ok(Some(reply))
      },
      Err(e) => {
        warn!("Chat request failed: {e}");
        self.messages.push(Message::new(Role::Assistant, APOLOGY));
        Err(e)
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::LlmConfig;

  #[tokio::test]
  async fn test_blank_input_is_ignored() {
    let mut assistant = ChatAssistant::new(LlmClient::new(&LlmConfig::default()));
    assert_eq!(assistant.send("   ").await.unwrap(), None);
    assert_eq!(assistant.messages().len(), 1);
    assert_eq!(assistant.messages()[0].content, GREETING);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_failure_appends_apology() {
    let mut assistant = ChatAssistant::new(LlmClient::new(&LlmConfig::default()));
    let err = assistant.send("What is a DOI?").await.unwrap_err();
    assert!(matches!(err, PaperLenzError::MissingApiKey));

    let roles: Vec<_> = assistant.messages().iter().map(|message| message.role).collect();
    assert_eq!(roles, [Role::Assistant, Role::User, Role::Assistant]);
    assert_eq!(assistant.messages()[2].content, APOLOGY);
    assert!(logs_contain("Chat request failed"));
  }
}
