//! The analysis service: prompt, model call, sanitizing and reconciliation in one place.
//!
//! [`Analyzer`] is what sits behind the remote analysis endpoint. The HTTP layer in
//! [`server`](crate::server) only decodes the body and encodes whatever [`Analyzer::handle`]
//! returns, and [`DirectBackend`](crate::backend::DirectBackend) calls [`Analyzer::analyze`]
//! in-process.
//!
//! Error bodies are plain `{"error": ...}` objects, with `details` and a truncated
//! `raw_response` added when the model reply could not be decoded.

use axum::http::StatusCode;

use super::*;
use crate::{
  config::Config,
  llm::{LlmClient, Role},
  pdf::{decode_data_url, PdfDocument},
  prompt::{AnalysisPrompt, ANALYSIS_SYSTEM_PROMPT},
  sanitize::SanitizeStrategy,
};

/// Sampling temperature of analysis requests.
pub const ANALYSIS_TEMPERATURE: f64 = 0.1;
/// Completion length limit of analysis requests.
pub const ANALYSIS_MAX_TOKENS: u32 = 6000;
/// Characters of an undecodable reply echoed back in `raw_response`.
const RAW_RESPONSE_PREVIEW: usize = 500;

/// Message returned when content or level is missing.
pub const MISSING_FIELDS: &str = "Missing required fields: content and academic_level";
/// Message returned when the model reply could not be decoded.
pub const INVALID_FORMAT: &str = "Invalid response format from AI service";

/// Body of an analysis request.
///
/// `academic_level` stays a string on the wire; unknown values fall back to undergraduate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
  /// Paper text, abstract, `DOI: ...` reference, or a PDF data URL
  #[serde(default)]
  pub content:        String,
  /// Academic level name
  #[serde(default)]
  pub academic_level: String,
  /// Optional paper title
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:          Option<String>,
  /// How the paper was submitted
  #[serde(default)]
  pub input_type:     InputType,
}

impl AnalyzeRequest {
  /// Creates a request without a title.
  pub fn new(content: impl Into<String>, level: AcademicLevel, input_type: InputType) -> Self {
    Self {
      content: content.into(),
      academic_level: level.to_string(),
      title: None,
      input_type,
    }
  }

  /// Sets the title.
  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  /// The requested level, falling back to undergraduate for unknown names.
  pub fn level(&self) -> AcademicLevel { AcademicLevel::parse_or_default(&self.academic_level) }
}

/// Body of an analysis response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
  /// Whether `analysis` is present
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub success:      bool,
  /// The reconciled record
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub analysis:     Option<AnalysisRecord>,
  /// Failure message
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:        Option<String>,
  /// Decoder message for unusable replies
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details:      Option<String>,
  /// Start of an unusable reply
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub raw_response: Option<String>,
  /// Echo of the request parameters
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata:     Option<ResponseMetadata>,
}

/// Request parameters echoed in a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
  /// Input type of the request
  pub input_type:     InputType,
  /// Level the analysis was written for
  pub academic_level: AcademicLevel,
  /// Title of the request
  pub title:          Option<String>,
  /// When the analysis finished
  pub processed_at:   DateTime<Utc>,
}

impl AnalyzeResponse {
  /// A failure carrying only a message.
  pub fn failure(error: impl Into<String>) -> Self {
    Self { error: Some(error.into()), ..Default::default() }
  }

  /// Converts the response into the analysis or an error carrying the service's message.
  pub fn into_result(self) -> Result<AnalysisRecord> {
    match (self.success, self.analysis) {
      (true, Some(analysis)) => Ok(analysis),
      _ => Err(PaperLenzError::Analysis(self.error.unwrap_or_else(|| "Analysis failed".into()))),
    }
  }
}

/// Runs analyses against the language model.
#[derive(Debug, Clone)]
pub struct Analyzer {
  /// Model client
  llm:      LlmClient,
  /// How replies are reduced to JSON
  strategy: SanitizeStrategy,
}

impl Analyzer {
  /// Creates an analyzer.
  pub fn new(llm: LlmClient, strategy: SanitizeStrategy) -> Self { Self { llm, strategy } }

  /// Creates an analyzer from the `[llm]` section and the sanitizer setting.
  pub fn from_config(config: &Config) -> Self {
    Self::new(LlmClient::new(&config.llm), config.sanitizer)
  }

  /// The chat client this analyzer uses.
  pub fn llm(&self) -> &LlmClient { &self.llm }

  /// Analyzes a request and returns the reconciled record.
  ///
  /// # Errors
  ///
  /// - [`PaperLenzError::InvalidSubmission`] for missing fields or an unreadable PDF
  /// - [`PaperLenzError::MissingApiKey`] when no key is configured
  /// - Model call errors, see [`LlmClient::complete`]
  /// - [`PaperLenzError::InvalidResponseFormat`] when the reply does not decode
  pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisRecord> {
    let raw = self.generate(request).await?;
    AnalysisRecord::from_llm_response(&raw, self.strategy)
  }

  /// Analyzes a request and renders the outcome as a status code and response body.
  pub async fn handle(&self, request: &AnalyzeRequest) -> (StatusCode, AnalyzeResponse) {
    let raw = match self.generate(request).await {
      Ok(raw) => raw,
      Err(e) => return failure_response(e),
    };

    match AnalysisRecord::from_llm_response(&raw, self.strategy) {
      Ok(analysis) => {
        info!("Analysis complete for {:?}", request.title.as_deref().unwrap_or("untitled paper"));
        let metadata = ResponseMetadata {
          input_type:     request.input_type,
          academic_level: request.level(),
          title:          request.title.clone(),
          processed_at:   Utc::now(),
        };
        (StatusCode::OK, AnalyzeResponse {
          success: true,
          analysis: Some(analysis),
          metadata: Some(metadata),
          ..Default::default()
        })
      },
      Err(e) => {
        error!("Could not decode model reply: {e}");
        let details = match e {
          PaperLenzError::InvalidResponseFormat(details) => details,
          other => other.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, AnalyzeResponse {
          error: Some(INVALID_FORMAT.into()),
          details: Some(details),
          raw_response: Some(preview(&raw)),
          ..Default::default()
        })
      },
    }
  }

  /// Validates the request, builds the prompt and returns the raw model reply.
  async fn generate(&self, request: &AnalyzeRequest) -> Result<String> {
    if request.content.trim().is_empty() || request.academic_level.trim().is_empty() {
      return Err(PaperLenzError::InvalidSubmission(MISSING_FIELDS.into()));
    }
    if !self.llm.has_api_key() {
      return Err(PaperLenzError::MissingApiKey);
    }

    let level = request.level();
    let content = match request.input_type {
      InputType::Pdf => pdf_content(&request.content)?,
      _ => request.content.clone(),
    };

    let prompt = AnalysisPrompt::new(&content, level)
      .with_optional_title(request.title.as_deref())
      .with_input_type(request.input_type)
      .build();
    debug!("Requesting {level} analysis of {} input ({} prompt bytes)", request.input_type, prompt.len());

    let chat = self
      .llm
      .request()
      .with_system(ANALYSIS_SYSTEM_PROMPT)
      .with_message(Role::User, prompt)
      .with_temperature(ANALYSIS_TEMPERATURE)
      .with_max_tokens(ANALYSIS_MAX_TOKENS);
    self.llm.complete(chat).await
  }
}

/// Extracts the text of a PDF data URL, passing any other content through unchanged.
fn pdf_content(content: &str) -> Result<String> {
  let Some(bytes) = decode_data_url(content)? else {
    return Ok(content.to_string());
  };
  let text = PdfDocument::from_bytes(&bytes)?.text();
  if text.trim().is_empty() {
    return Err(PaperLenzError::InvalidSubmission("No text could be extracted from the PDF".into()));
  }
  Ok(text)
}

/// Maps an error to its response. Submission problems are the caller's fault, everything else is
/// the service's.
fn failure_response(e: PaperLenzError) -> (StatusCode, AnalyzeResponse) {
  match e {
    PaperLenzError::InvalidSubmission(message) => {
      debug!("Rejected analysis request: {message}");
      (StatusCode::BAD_REQUEST, AnalyzeResponse::failure(message))
    },
    e => {
      error!("Analysis failed: {e}");
      (StatusCode::INTERNAL_SERVER_ERROR, AnalyzeResponse::failure(e.to_string()))
    },
  }
}

/// First characters of an unusable reply, with an ellipsis.
fn preview(raw: &str) -> String {
  format!("{}...", raw.chars().take(RAW_RESPONSE_PREVIEW).collect::<String>())
}
