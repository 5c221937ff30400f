//! Client for OpenAI-compatible chat-completions APIs.
//!
//! Groq is the default provider, but any service exposing `POST <host>/chat/completions` with the
//! OpenAI request and response shapes works, including the stub servers used in tests.
//!
//! Requests are assembled with a builder. The model, at least one message and an API key are
//! required; each missing piece is its own error and is detected before anything goes over the
//! wire.
//!
//! # Examples
//!
//! ```no_run
//! use paperlenz::llm::{ChatRequest, Role};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = ChatRequest::new()
//!   .with_host("https://api.groq.com/openai/v1/")
//!   .with_model("llama-3.3-70b-versatile")
//!   .with_system("You are a helpful assistant.")
//!   .with_message(Role::User, "What is a DOI?")
//!   .with_temperature(0.7)
//!   .with_max_tokens(1000);
//!
//! let response = request.send("gsk_...").await?;
//! println!("Response: {}", response.into_content()?);
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::config::LlmConfig;

/// Default API base URL.
pub const DEFAULT_HOST: &str = "https://api.groq.com/openai/v1/";
/// Default model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Path of the chat-completions endpoint relative to the host.
const COMPLETIONS_PATH: &str = "chat/completions";

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Instructions for the model
  System,
  /// The human side
  User,
  /// The model side
  Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  /// Who said it
  pub role:    Role,
  /// What was said
  pub content: String,
}

impl Message {
  /// Creates a message.
  pub fn new(role: Role, content: impl Into<String>) -> Self {
    Self { role, content: content.into() }
  }
}

/// Request builder for chat completions.
///
/// # Examples
///
/// ```
/// # use paperlenz::llm::{ChatRequest, Role};
/// let request = ChatRequest::new()
///   .with_host("http://127.0.0.1:8080/v1")
///   .with_model("test-model")
///   .with_message(Role::User, "Hello");
/// assert_eq!(request.completions_url().as_str(), "http://127.0.0.1:8080/v1/chat/completions");
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatRequest {
  /// Model to use. Sending without one is an error.
  pub model: Option<String>,

  /// Conversation so far, in order. Sending without any is an error.
  pub messages: Vec<Message>,

  /// Sampling temperature; the provider default applies when unset.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f64>,

  /// Completion length limit; the provider default applies when unset.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,

  /// API base URL. Defaults to Groq with a warning.
  #[serde(skip)]
  pub host: Option<Url>,

  /// HTTP client, shared when the request comes from an [`LlmClient`].
  #[serde(skip)]
  client: reqwest::Client,
}

/// Chat-completions response. Only the fields this crate reads are decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
  /// Provider-assigned id
  #[serde(default)]
  pub id:      Option<String>,
  /// Model that answered
  #[serde(default)]
  pub model:   Option<String>,
  /// Candidate completions, usually exactly one
  #[serde(default)]
  pub choices: Vec<Choice>,
  /// Token accounting
  #[serde(default)]
  pub usage:   Option<Usage>,
}

/// One candidate completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
  /// Position among the choices
  #[serde(default)]
  pub index:         u32,
  /// The generated message
  pub message:       ChoiceMessage,
  /// Why generation stopped
  #[serde(default)]
  pub finish_reason: Option<String>,
}

/// The generated message of a [`Choice`]. Providers may send `null` content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
  /// Usually [`Role::Assistant`]
  #[serde(default)]
  pub role:    Option<Role>,
  /// Generated text
  #[serde(default)]
  pub content: Option<String>,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
  /// Tokens in the prompt
  pub prompt_tokens:     u64,
  /// Tokens generated
  pub completion_tokens: u64,
  /// Sum of both
  pub total_tokens:      u64,
}

impl ChatResponse {
  /// Text of the first choice, if it is not blank.
  pub fn first_content(&self) -> Option<&str> {
    self
      .choices
      .first()
      .and_then(|choice| choice.message.content.as_deref())
      .filter(|content| !content.trim().is_empty())
  }

  /// Takes the text of the first choice.
  ///
  /// # Errors
  ///
  /// Returns [`PaperLenzError::EmptyResponse`] when there is no choice or its content is blank.
  pub fn into_content(self) -> Result<String> {
    self.first_content().map(str::to_string).ok_or(PaperLenzError::EmptyResponse)
  }
}

impl ChatRequest {
  /// Creates a new request with builder-style API with default settings.
  pub fn new() -> Self { Self::default() }

  /// Sets the API base URL, e.g. `https://api.groq.com/openai/v1/`.
  ///
  /// An unparsable host is dropped with a warning and the default host is used instead.
  pub fn with_host(mut self, host: &str) -> Self {
    match Url::parse(host) {
      Ok(url) => self.host = Some(url),
      Err(e) => warn!("Invalid host {host:?} ({e}), keeping the default"),
    }
    self
  }

  /// Sets the API base URL from an already parsed [`Url`].
  pub fn with_host_url(mut self, host: Url) -> Self {
    self.host = Some(host);
    self
  }

  /// Sets the model.
  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model.replace(model.into());
    self
  }

  /// Appends a system message.
  pub fn with_system(self, content: impl Into<String>) -> Self {
    self.with_message(Role::System, content)
  }

  /// Appends a message to the conversation.
  pub fn with_message(mut self, role: Role, content: impl Into<String>) -> Self {
    self.messages.push(Message::new(role, content));
    self
  }

  /// Appends several messages.
  pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
    self.messages.extend(messages);
    self
  }

  /// Sets the sampling temperature.
  pub fn with_temperature(mut self, temperature: f64) -> Self {
    self.temperature = Some(temperature);
    self
  }

  /// Sets the completion length limit.
  pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
    self.max_tokens = Some(max_tokens);
    self
  }

  /// Reuses an existing HTTP client.
  pub fn with_client(mut self, client: reqwest::Client) -> Self {
    self.client = client;
    self
  }

  /// The full chat-completions URL the request is sent to.
  pub fn completions_url(&self) -> Url {
    let mut base = self.host.clone().unwrap_or_else(|| {
      warn!("No host set, using {DEFAULT_HOST}");
      Url::parse(DEFAULT_HOST).unwrap()
    });
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    base.join(COMPLETIONS_PATH).unwrap_or(base)
  }

  /// Sends the request with `api_key` as the bearer token.
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - No model is specified
  /// - No messages are provided
  /// - The API key is blank
  /// - The network request fails
  /// - The provider answers with a non-success status
  /// - The response cannot be decoded
  pub async fn send(&self, api_key: &str) -> Result<ChatResponse> {
    if self.model.is_none() {
      return Err(PaperLenzError::LLMMissingModel);
    }
    if self.messages.is_empty() {
      return Err(PaperLenzError::LLMMissingMessage);
    }
    if api_key.trim().is_empty() {
      return Err(PaperLenzError::MissingApiKey);
    }

    let url = self.completions_url();
    debug!("Sending {} messages to {url}", self.messages.len());

    let response = self.client.post(url).bearer_auth(api_key).json(&self).send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      error!("Language model API answered {status}: {body}");
      return Err(PaperLenzError::LlmStatus(status.as_u16()));
    }

    let response: ChatResponse = response.json().await?;
    if let Some(usage) = response.usage {
      trace!("Token usage: {usage:?}");
    }
    Ok(response)
  }
}

/// A configured connection to the language model provider.
///
/// Holds one HTTP client for all requests along with the host, model and key from [`LlmConfig`].
#[derive(Debug, Clone)]
pub struct LlmClient {
  /// Shared HTTP client
  http:    reqwest::Client,
  /// API base URL
  host:    Url,
  /// Model name
  model:   String,
  /// API key, checked when sending
  api_key: Option<String>,
}

impl LlmClient {
  /// Creates a client from configuration.
  pub fn new(config: &LlmConfig) -> Self {
    Self {
      http:    reqwest::Client::new(),
      host:    config.api_url.clone(),
      model:   config.model.clone(),
      api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
    }
  }

  /// Whether an API key is available.
  pub fn has_api_key(&self) -> bool { self.api_key.is_some() }

  /// Starts a request with this client's host and model.
  pub fn request(&self) -> ChatRequest {
    ChatRequest::new()
      .with_client(self.http.clone())
      .with_host_url(self.host.clone())
      .with_model(self.model.clone())
  }

  /// Sends `request` and returns the text of the first choice.
  ///
  /// # Errors
  ///
  /// Returns [`PaperLenzError::MissingApiKey`] when no key is configured, any error of
  /// [`ChatRequest::send`], and [`PaperLenzError::EmptyResponse`] for a blank completion.
  pub async fn complete(&self, request: ChatRequest) -> Result<String> {
    let api_key = self.api_key.as_deref().ok_or(PaperLenzError::MissingApiKey)?;
    request.send(api_key).await?.into_content()
  }
}
