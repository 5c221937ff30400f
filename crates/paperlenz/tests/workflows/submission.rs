use std::sync::Arc;

use paperlenz::{
  analyzer::Analyzer,
  database::{Database, Query},
  llm::LlmClient,
  orchestrator::{AnalysisState, Orchestrator, PROGRESS_STEPS},
  paper::Submission,
  server,
};
use tokio_test::assert_ok;

use super::*;

#[tokio::test]
async fn test_direct_submission_is_stored() -> TestResult {
  let stub = LlmStub::replying(analysis_reply()).await;
  let dir = tempdir()?;
  let config = test_config(&dir, &stub, Some("key"));
  let mut db = Database::open(&config.database_path).await?;

  let orchestrator = Orchestrator::from_config(&config, Arc::new(db.clone()))?;
  let mut states = orchestrator.subscribe();

  let submission = Submission::abstract_text(
    "We randomized 240 students into spaced and massed practice.",
    AcademicLevel::Undergraduate,
  )
  .with_title("Spacing in Physics");
  let outcome = orchestrator.submit("user-1", submission).await?;

  assert_eq!(outcome.title, "Spacing in Physics");
  assert!(outcome.save_error.is_none());
  assert_eq!(outcome.analysis, analysis_record());

  let mut seen = Vec::new();
  while let Ok(state) = states.try_recv() {
    seen.push(state);
  }
  assert_eq!(seen.len(), PROGRESS_STEPS.len() + 1);
  assert!(matches!(seen.last(), Some(AnalysisState::Success(_))));

  let papers = Query::for_user("user-1").execute(&mut db).await?;
  assert_eq!(papers.len(), 1);
  assert_eq!(papers[0].id, outcome.paper.unwrap().id);
  assert_eq!(papers[0].title, "Spacing in Physics");
  assert_eq!(papers[0].input_type, InputType::Abstract);
  assert_eq!(
    papers[0].abstract_text.as_deref(),
    Some("We randomized 240 students into spaced and massed practice.")
  );
  assert_eq!(papers[0].doi, None);
  assert_eq!(papers[0].analysis, analysis_record());
  Ok(())
}

#[tokio::test]
async fn test_endpoint_failure_falls_back_to_direct() -> TestResult {
  let stub = LlmStub::replying(analysis_reply()).await;

  // A service without an API key always fails.
  let broken = Analyzer::new(LlmClient::new(&stub.llm_config(None)), Default::default());
  let addr = spawn_router(server::router(broken)).await;

  let dir = tempdir()?;
  let mut config = test_config(&dir, &stub, Some("key"));
  config.endpoint.url = Some(Url::parse(&format!("http://{addr}"))?);
  let mut db = Database::open(&config.database_path).await?;

  let orchestrator = Orchestrator::from_config(&config, Arc::new(db.clone()))?;
  let outcome = assert_ok!(
    orchestrator
      .submit("user-1", Submission::doi("doi:10.1000/XYZ123", AcademicLevel::Graduate))
      .await
  );

  assert_eq!(outcome.title, "Paper from DOI: 10.1000/XYZ123");

  let requests = stub.requests();
  assert_eq!(requests.len(), 1);
  let prompt = requests[0].body["messages"][1]["content"].as_str().unwrap().to_string();
  assert!(prompt.contains("DOI: 10.1000/XYZ123"));

  let stored = Query::for_user("user-1").execute(&mut db).await?;
  assert_eq!(stored[0].doi.as_deref(), Some("10.1000/XYZ123"));
  Ok(())
}

#[tokio::test]
async fn test_provider_failure_ends_in_error_state() -> TestResult {
  let stub = LlmStub::failing(StatusCode::SERVICE_UNAVAILABLE).await;
  let dir = tempdir()?;
  let config = test_config(&dir, &stub, Some("key"));
  let mut db = Database::open(&config.database_path).await?;

  let orchestrator = Orchestrator::from_config(&config, Arc::new(db.clone()))?;
  let result = orchestrator
    .submit("user-1", Submission::abstract_text("Text", AcademicLevel::Graduate))
    .await;

  assert!(matches!(result, Err(PaperLenzError::LlmStatus(503))));
  assert_eq!(orchestrator.state(), AnalysisState::Error("Groq API error: 503".into()));
  assert!(Query::for_user("user-1").execute(&mut db).await?.is_empty());
  Ok(())
}

#[tokio::test]
async fn test_missing_api_key_is_reported() -> TestResult {
  let stub = LlmStub::replying(analysis_reply()).await;
  let dir = tempdir()?;
  let config = test_config(&dir, &stub, None);
  let db = Database::open(&config.database_path).await?;

  let orchestrator = Orchestrator::from_config(&config, Arc::new(db))?;
  let result = orchestrator
    .submit("user-1", Submission::abstract_text("Text", AcademicLevel::Graduate))
    .await;
  assert!(matches!(result, Err(PaperLenzError::MissingApiKey)));
  assert!(stub.requests().is_empty());
  Ok(())
}
