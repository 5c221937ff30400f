//! Ways for a client to reach the analysis service.
//!
//! The orchestrator only knows the [`AnalysisBackend`] trait. Two implementations exist:
//!
//! - [`EndpointBackend`] posts the request to a remote analysis service over HTTP.
//! - [`DirectBackend`] runs the [`Analyzer`] in-process and talks to the model provider itself.
//!
//! [`from_config`] picks a primary backend and, when both are configured, uses the direct path as
//! the fallback for the remote one.

use super::*;
use crate::{
  analyzer::{AnalyzeRequest, AnalyzeResponse, Analyzer},
  config::Config,
};

/// Path of the analysis service relative to its base URL.
pub const ANALYZE_PATH: &str = "functions/v1/analyze-paper";

/// Something that turns an analysis request into an analysis record.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
  /// Short name used in logs.
  fn name(&self) -> &str;

  /// Runs the analysis.
  async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisRecord>;
}

/// Calls a remote analysis service.
#[derive(Debug, Clone)]
pub struct EndpointBackend {
  /// Shared HTTP client
  http:     reqwest::Client,
  /// Full URL of the analysis route
  url:      Url,
  /// Bearer token
  anon_key: Option<String>,
}

impl EndpointBackend {
  /// Creates a backend for the service at `base`; the analysis route is appended to it.
  pub fn new(base: &Url, anon_key: Option<String>) -> Result<Self> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    Ok(Self { http: reqwest::Client::new(), url: base.join(ANALYZE_PATH)?, anon_key })
  }

  /// The URL requests are posted to.
  pub fn url(&self) -> &Url { &self.url }
}

#[async_trait]
impl AnalysisBackend for EndpointBackend {
  fn name(&self) -> &str { "endpoint" }

  async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisRecord> {
    debug!("Posting analysis request to {}", self.url);
    let mut builder = self.http.post(self.url.clone()).json(request);
    if let Some(key) = &self.anon_key {
      builder = builder.bearer_auth(key);
    }

    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
      // The service explains itself in the body when it can.
      let message = response
        .json::<AnalyzeResponse>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_string());
      return Err(PaperLenzError::Api(message));
    }

    response.json::<AnalyzeResponse>().await?.into_result()
  }
}

/// Runs the analysis in-process.
#[derive(Debug, Clone)]
pub struct DirectBackend {
  /// The analysis service
  analyzer: Analyzer,
}

impl DirectBackend {
  /// Wraps an analyzer.
  pub fn new(analyzer: Analyzer) -> Self { Self { analyzer } }
}

#[async_trait]
impl AnalysisBackend for DirectBackend {
  fn name(&self) -> &str { "direct" }

  async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisRecord> {
    self.analyzer.analyze(request).await
  }
}

/// Primary and optional fallback backend chosen from configuration.
pub struct Backends {
  /// Tried first
  pub primary:  Arc<dyn AnalysisBackend>,
  /// Tried once with the identical request when the primary fails
  pub fallback: Option<Arc<dyn AnalysisBackend>>,
}

/// Chooses backends from configuration.
///
/// With an endpoint URL the remote service is primary, and the direct path is the fallback if an
/// API key is also available. Without one, the direct path is primary and there is no fallback.
pub fn from_config(config: &Config) -> Result<Backends> {
  let direct = || {
    Arc::new(DirectBackend::new(Analyzer::from_config(config))) as Arc<dyn AnalysisBackend>
  };

  match &config.endpoint.url {
    Some(url) => {
      let primary = Arc::new(EndpointBackend::new(url, config.endpoint.anon_key.clone())?);
      let has_key = config.llm.api_key.as_deref().is_some_and(|key| !key.trim().is_empty());
      Ok(Backends { primary, fallback: has_key.then(direct) })
    },
    None => Ok(Backends { primary: direct(), fallback: None }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_url() {
    let base = Url::parse("http://127.0.0.1:54321").unwrap();
    let backend = EndpointBackend::new(&base, None).unwrap();
    assert_eq!(backend.url().as_str(), "http://127.0.0.1:54321/functions/v1/analyze-paper");

    let base = Url::parse("https://project.example.co/api").unwrap();
    let backend = EndpointBackend::new(&base, None).unwrap();
    assert_eq!(backend.url().as_str(), "https://project.example.co/api/functions/v1/analyze-paper");
  }

  #[test]
  fn test_backend_selection() {
    let mut config = Config::default();
    let backends = from_config(&config).unwrap();
    assert_eq!(backends.primary.name(), "direct");
    assert!(backends.fallback.is_none());

    config.endpoint.url = Some(Url::parse("http://localhost:54321").unwrap());
    let backends = from_config(&config).unwrap();
    assert_eq!(backends.primary.name(), "endpoint");
    assert!(backends.fallback.is_none());

    config.llm.api_key = Some("gsk_test".into());
    let backends = from_config(&config).unwrap();
    assert_eq!(backends.fallback.map(|b| b.name().to_string()).as_deref(), Some("direct"));
  }
}
