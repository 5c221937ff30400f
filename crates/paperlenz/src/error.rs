//! Error types for the paperlenz library.
//!
//! A single error enum covers every failure mode of the library:
//! - Missing or invalid configuration
//! - Network and language model API failures
//! - Unusable model replies
//! - Database operations
//! - Document handling
//!
//! # Examples
//!
//! ```
//! use paperlenz::{analysis::AnalysisRecord, error::PaperLenzError, sanitize::SanitizeStrategy};
//!
//! match AnalysisRecord::from_llm_response("no json here", SanitizeStrategy::Heuristic) {
//!   Err(PaperLenzError::InvalidResponseFormat(details)) => println!("Bad reply: {details}"),
//!   Err(e) => println!("Other error: {e}"),
//!   Ok(_) => println!("Success!"),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`paperlenz`](crate) crate.
pub type Result<T> = core::result::Result<T, PaperLenzError>;

/// Errors that can occur when working with the paperlenz library.
#[derive(Error, Debug)]
pub enum PaperLenzError {
  /// No API key is available for the language model provider.
  ///
  /// Raised before any request is made, either from the configuration file or the
  /// `GROQ_API_KEY` environment variable.
  #[error("Groq API key not configured")]
  MissingApiKey,

  /// Configuration is missing, incomplete or inconsistent.
  #[error("{0}")]
  Config(String),

  /// A network request failed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - TLS errors occur
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A remote API answered with a non-success status.
  ///
  /// The string carries the status text or the message the API returned.
  #[error("API error: {0}")]
  Api(String),

  /// The language model provider answered with a non-success status code.
  #[error("Groq API error: {0}")]
  LlmStatus(u16),

  /// The analysis service answered but reported that the analysis failed.
  #[error("{0}")]
  Analysis(String),

  /// The model answered, but not with anything.
  #[error("No response from Groq API")]
  EmptyResponse,

  /// The model reply could not be turned into an analysis record.
  ///
  /// Carries the decoder message. No partial record is salvaged.
  #[error("Invalid response format from AI service: {0}")]
  InvalidResponseFormat(String),

  /// A submission did not carry what its input type requires.
  #[error("Invalid submission: {0}")]
  InvalidSubmission(String),

  /// The provided DOI could not be recognized.
  #[error("Invalid DOI: {0}")]
  InvalidDoi(String),

  /// An academic level string did not match any known level.
  #[error("Invalid academic level \"{0}\", see `paperlenz::paper::AcademicLevel`")]
  InvalidAcademicLevel(String),

  /// An input type string did not match any known type.
  #[error("Invalid input type \"{0}\", see `paperlenz::paper::InputType`")]
  InvalidInputType(String),

  /// No model was specified for the LLM request.
  #[error("No model was chosen for the LLM.")]
  LLMMissingModel,

  /// No messages were provided in the LLM request.
  #[error("No messages were supplied to send to the LLM.")]
  LLMMissingMessage,

  /// The requested paper does not exist or is not owned by the requesting user.
  #[error("Paper not found")]
  NotFound,

  /// A profile with the same id already exists.
  #[error("A user profile with id \"{0}\" already exists")]
  DuplicateUser(String),

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// JSON encoding or decoding failed outside of model reply parsing.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The configuration could not be written.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// A URL could not be parsed or joined.
  #[error(transparent)]
  Url(#[from] url::ParseError),

  /// PDF parsing errors from the lopdf library.
  ///
  /// Common cases are malformed files, missing objects and encrypted documents.
  #[error(transparent)]
  Lopdf(#[from] lopdf::Error),

  /// An uploaded document was not valid base64.
  #[error(transparent)]
  Base64(#[from] base64::DecodeError),
}
