use paperlenz::{
  analyzer::{AnalyzeRequest, Analyzer, INVALID_FORMAT},
  backend::EndpointBackend,
  chat::{ChatAssistant, GREETING},
  llm::{LlmClient, Role},
  prompt::{ANALYSIS_SYSTEM_PROMPT, CHAT_SYSTEM_PROMPT},
  sanitize::SanitizeStrategy,
  server,
};
use tokio_test::{assert_err, assert_ok};

use super::*;

fn analyzer(stub: &LlmStub, api_key: Option<&str>) -> Analyzer {
  Analyzer::new(LlmClient::new(&stub.llm_config(api_key)), SanitizeStrategy::Heuristic)
}

/// Runs the HTTP service in front of `analyzer` and returns its base URL.
async fn spawn_service(analyzer: Analyzer) -> Url {
  let addr = spawn_router(server::router(analyzer)).await;
  Url::parse(&format!("http://{addr}")).unwrap()
}

#[traced_test]
#[tokio::test]
async fn test_analysis_against_provider() -> TestResult {
  let stub = LlmStub::replying(analysis_reply()).await;
  let request = AnalyzeRequest::new(
    "We randomized 240 students into spaced and massed practice.",
    AcademicLevel::Professor,
    InputType::Abstract,
  )
  .with_title("Spacing in Physics");

  let record = analyzer(&stub, Some("gsk-test")).analyze(&request).await?;
  assert_eq!(record.paper_quality_score.total, 18 + 17 + 15 + 16 + 12);
  assert_eq!(record.credibility_analysis.score, 84);
  assert_eq!(record.credibility_analysis.citation_count, None);

  let requests = stub.requests();
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].authorization.as_deref(), Some("Bearer gsk-test"));
  let body = &requests[0].body;
  assert_eq!(body["model"], "llama-3.3-70b-versatile");
  assert_eq!(body["temperature"], 0.1);
  assert_eq!(body["max_tokens"], 6000);
  assert_eq!(body["messages"][0]["role"], "system");
  assert_eq!(body["messages"][0]["content"], ANALYSIS_SYSTEM_PROMPT);
  let prompt = body["messages"][1]["content"].as_str().unwrap();
  assert!(prompt.contains("Paper title: Spacing in Physics"));
  assert!(prompt.contains("We randomized 240 students"));
  Ok(())
}

#[tokio::test]
async fn test_undecodable_reply() {
  let reply = "I'm sorry, I cannot analyze this paper without its full text.";
  let stub = LlmStub::replying(reply).await;
  let request = AnalyzeRequest::new("Some text", AcademicLevel::Graduate, InputType::Abstract);

  let (status, response) = analyzer(&stub, Some("key")).handle(&request).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(response.error.as_deref(), Some(INVALID_FORMAT));
  assert!(response.details.is_some());
  assert_eq!(response.raw_response, Some(format!("{reply}...")));

  let err = assert_err!(analyzer(&stub, Some("key")).analyze(&request).await);
  assert!(matches!(err, PaperLenzError::InvalidResponseFormat(_)));
}

#[tokio::test]
async fn test_provider_error_status() {
  let stub = LlmStub::failing(StatusCode::TOO_MANY_REQUESTS).await;
  let request = AnalyzeRequest::new("Some text", AcademicLevel::Graduate, InputType::Abstract);

  let err = assert_err!(analyzer(&stub, Some("key")).analyze(&request).await);
  assert!(matches!(err, PaperLenzError::LlmStatus(429)));
  assert_eq!(err.to_string(), "Groq API error: 429");
}

#[tokio::test]
async fn test_endpoint_backend_against_service() -> TestResult {
  let stub = LlmStub::replying(analysis_reply()).await;
  let base = spawn_service(analyzer(&stub, Some("key"))).await;
  let backend = EndpointBackend::new(&base, Some("anon-key".into()))?;

  let request =
    AnalyzeRequest::new("DOI: 10.1000/xyz123", AcademicLevel::HighSchool, InputType::Doi)
      .with_title("Paper from DOI: 10.1000/xyz123");
  let record = assert_ok!(backend.analyze(&request).await);
  assert_eq!(record, analysis_record());

  let prompt = stub.requests()[0].body["messages"][1]["content"].as_str().unwrap().to_string();
  assert!(prompt.contains("Input type: doi"));
  Ok(())
}

#[tokio::test]
async fn test_endpoint_backend_surfaces_service_errors() -> TestResult {
  let stub = LlmStub::replying(analysis_reply()).await;
  let base = spawn_service(analyzer(&stub, None)).await;
  let backend = EndpointBackend::new(&base, None)?;

  let request = AnalyzeRequest::new("Text", AcademicLevel::Graduate, InputType::Abstract);
  let err = assert_err!(backend.analyze(&request).await);
  assert_eq!(err.to_string(), "API error: Groq API key not configured");
  assert!(stub.requests().is_empty());
  Ok(())
}

#[tokio::test]
async fn test_chat_endpoint() -> TestResult {
  let stub = LlmStub::replying("A DOI is a persistent identifier for a publication.").await;
  let base = spawn_service(analyzer(&stub, Some("key"))).await;

  let reply: server::ChatReply = reqwest::Client::new()
    .post(base.join("chat")?)
    .json(&json!({ "messages": [
      { "role": "assistant", "content": GREETING },
      { "role": "user", "content": "What is a DOI?" }
    ]}))
    .send()
    .await?
    .json()
    .await?;
  assert_eq!(reply.content, "A DOI is a persistent identifier for a publication.");

  let body = &stub.requests()[0].body;
  assert_eq!(body["temperature"], 0.7);
  assert_eq!(body["max_tokens"], 1000);
  assert_eq!(body["messages"][0]["content"], CHAT_SYSTEM_PROMPT);
  assert_eq!(body["messages"][2]["content"], "What is a DOI?");
  Ok(())
}

#[tokio::test]
async fn test_chat_assistant_keeps_history() -> TestResult {
  let stub = LlmStub::replying("Upload a PDF from the dashboard.").await;
  let mut assistant = ChatAssistant::new(LlmClient::new(&stub.llm_config(Some("key"))));

  let reply = assistant.send("How do I analyze a PDF?").await?;
  assert_eq!(reply.as_deref(), Some("Upload a PDF from the dashboard."));
  assistant.send("Thanks!").await?;

  let roles: Vec<_> = assistant.messages().iter().map(|message| message.role).collect();
  assert_eq!(roles, [Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]);

  let requests = stub.requests();
  assert_eq!(requests.len(), 2);
  let messages = requests[1].body["messages"].as_array().unwrap().clone();
  assert_eq!(messages.len(), 5);
  assert_eq!(messages[1]["content"], GREETING);
  assert_eq!(messages[4]["content"], "Thanks!");
  Ok(())
}
