//! The submission workflow and its state machine.
//!
//! ```text
//! Idle -> Processing { progress, step } -> Success(record)
//!                                        -> Error(message)
//! ```
//!
//! [`Orchestrator::submit`] walks through the progress steps, prepares the content for its input
//! type, asks the primary [`AnalysisBackend`] (and the fallback once, with the identical request,
//! if the primary fails), stores the result and finishes in [`AnalysisState::Success`]. Every
//! transition is broadcast to subscribers. A failed save does not fail the submission; it is
//! reported in [`AnalysisOutcome::save_error`].
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use paperlenz::{
//!   config::Config,
//!   database::Database,
//!   orchestrator::{AnalysisState, Orchestrator},
//!   paper::{AcademicLevel, Submission},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(Config::default_path())?;
//! let db = Database::open(&config.database_path).await?;
//! let orchestrator = Orchestrator::from_config(&config, Arc::new(db))?;
//!
//! let mut states = orchestrator.subscribe();
//! tokio::spawn(async move {
//!   while let Ok(AnalysisState::Processing { progress, step }) = states.recv().await {
//!     println!("{progress}% {step}");
//!   }
//! });
//!
//! let submission = Submission::doi("10.1145/1327452.1327492", AcademicLevel::Graduate);
//! let outcome = orchestrator.submit("user-id", submission).await?;
//! println!("{}", outcome.analysis.one_line_summary);
//! # Ok(())
//! # }
//! ```

use std::{
  sync::{PoisonError, RwLock},
  time::Duration,
};

use tokio::sync::broadcast;

use super::*;
use crate::{
  analyzer::AnalyzeRequest,
  backend::{self, AnalysisBackend},
  config::Config,
  database::PaperStore,
  paper::{normalize_doi, NewPaper, Paper, Submission, SubmissionContent},
  pdf::PdfDocument,
};

/// Progress percentage and step label of every processing state, in order.
pub const PROGRESS_STEPS: [(u8, &str); 5] = [
  (10, "Parsing document"),
  (25, "Extracting content"),
  (50, "AI analysis in progress"),
  (75, "Generating insights"),
  (90, "Finalizing results"),
];

/// Title of abstract submissions without one.
pub const DEFAULT_ABSTRACT_TITLE: &str = "Scientific Paper Analysis";
/// Title of PDF submissions without one.
pub const DEFAULT_PDF_TITLE: &str = "Uploaded PDF Document";

/// Buffered transitions per subscriber.
const STATE_CHANNEL_CAPACITY: usize = 32;

/// Where a submission is in the workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnalysisState {
  /// Nothing submitted, or reset
  #[default]
  Idle,
  /// Working
  Processing {
    /// Percentage shown to the user
    progress: u8,
    /// Label of the current step
    step:     String,
  },
  /// Finished with a record
  Success(Box<AnalysisRecord>),
  /// Finished without one
  Error(String),
}

/// Result of a successful submission.
#[derive(Debug)]
pub struct AnalysisOutcome {
  /// Title the paper was analyzed and stored under
  pub title:      String,
  /// The analysis
  pub analysis:   AnalysisRecord,
  /// The stored row, absent if saving failed
  pub paper:      Option<Paper>,
  /// Why saving failed
  pub save_error: Option<PaperLenzError>,
}

/// Content and stored fields derived from a submission.
#[derive(Debug)]
struct PreparedSubmission {
  /// What the backend receives
  request:       AnalyzeRequest,
  /// Title to store
  title:         String,
  /// DOI to store
  doi:           Option<String>,
  /// Abstract to store
  abstract_text: Option<String>,
}

/// Drives submissions through analysis and storage.
pub struct Orchestrator {
  /// Tried first
  primary:           Arc<dyn AnalysisBackend>,
  /// Tried once when the primary fails
  fallback:          Option<Arc<dyn AnalysisBackend>>,
  /// Where results are saved
  store:             Arc<dyn PaperStore>,
  /// Pause after each intermediate progress step
  progress_interval: Duration,
  /// Latest state
  current:           RwLock<AnalysisState>,
  /// Transition feed
  events:            broadcast::Sender<AnalysisState>,
}

impl Orchestrator {
  /// Creates an orchestrator without fallback and with the default progress interval.
  pub fn new(primary: Arc<dyn AnalysisBackend>, store: Arc<dyn PaperStore>) -> Self {
    let (events, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
    Self {
      primary,
      fallback: None,
      store,
      progress_interval: Duration::from_millis(crate::config::DEFAULT_PROGRESS_INTERVAL_MS),
      current: RwLock::new(AnalysisState::Idle),
      events,
    }
  }

  /// Creates an orchestrator with the backends and interval from configuration.
  pub fn from_config(config: &Config, store: Arc<dyn PaperStore>) -> Result<Self> {
    let backends = backend::from_config(config)?;
    let orchestrator = Self::new(backends.primary, store)
      .with_progress_interval(config.progress_interval());
    Ok(match backends.fallback {
      Some(fallback) => orchestrator.with_fallback(fallback),
      None => orchestrator,
    })
  }

  /// Sets the backend used when the primary fails.
  pub fn with_fallback(mut self, fallback: Arc<dyn AnalysisBackend>) -> Self {
    self.fallback = Some(fallback);
    self
  }

  /// Sets the pause after each intermediate progress step.
  pub fn with_progress_interval(mut self, interval: Duration) -> Self {
    self.progress_interval = interval;
    self
  }

  /// Subscribes to state transitions.
  pub fn subscribe(&self) -> broadcast::Receiver<AnalysisState> { self.events.subscribe() }

  /// The latest state.
  pub fn state(&self) -> AnalysisState {
    self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Returns to [`AnalysisState::Idle`].
  pub fn reset(&self) { self.transition(AnalysisState::Idle); }

  /// Runs a submission for `user_id`.
  ///
  /// Submissions that fail validation are rejected before any state change. Everything after
  /// that ends in either [`AnalysisState::Success`] or [`AnalysisState::Error`].
  ///
  /// # Errors
  ///
  /// Validation errors, content preparation errors, and the error of the last backend tried.
  /// Storage errors are not returned; see [`AnalysisOutcome::save_error`].
  pub async fn submit(&self, user_id: &str, submission: Submission) -> Result<AnalysisOutcome> {
    submission.validate()?;

    for (index, (progress, step)) in PROGRESS_STEPS.iter().enumerate() {
      self.transition(AnalysisState::Processing { progress: *progress, step: (*step).to_string() });
      if index > 0 && !self.progress_interval.is_zero() {
        tokio::time::sleep(self.progress_interval).await;
      }
    }

    let prepared = match prepare(&submission) {
      Ok(prepared) => prepared,
      Err(e) => return Err(self.fail(e)),
    };

    let analysis = match self.analyze(&prepared.request).await {
      Ok(analysis) => analysis,
      Err(e) => return Err(self.fail(e)),
    };

    let new_paper = NewPaper {
      user_id:        user_id.to_string(),
      title:          prepared.title.clone(),
      doi:            prepared.doi,
      abstract_text:  prepared.abstract_text,
      input_type:     submission.input_type(),
      academic_level: submission.academic_level,
      analysis:       analysis.clone(),
    };
    let (paper, save_error) = match self.store.save_paper(new_paper).await {
      Ok(paper) => {
        info!("Paper analyzed and saved as {}", paper.id);
        (Some(paper), None)
      },
      Err(e) => {
        warn!("Analysis completed but failed to save: {e}");
        (None, Some(e))
      },
    };

    self.transition(AnalysisState::Success(Box::new(analysis.clone())));
    Ok(AnalysisOutcome { title: prepared.title, analysis, paper, save_error })
  }

  /// Asks the primary backend, then the fallback once with the same request.
  async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisRecord> {
    let primary_error = match self.primary.analyze(request).await {
      Ok(analysis) => return Ok(analysis),
      Err(e) => e,
    };

    let Some(fallback) = &self.fallback else {
      return Err(primary_error);
    };
    warn!(
      "{} backend failed, trying {} backend: {primary_error}",
      self.primary.name(),
      fallback.name()
    );
    fallback.analyze(request).await
  }

  /// Records an error state and hands the error back.
  fn fail(&self, e: PaperLenzError) -> PaperLenzError {
    error!("Analysis error: {e}");
    self.transition(AnalysisState::Error(e.to_string()));
    e
  }

  /// Stores and broadcasts a new state.
  fn transition(&self, state: AnalysisState) {
    trace!("Analysis state: {state:?}");
    *self.current.write().unwrap_or_else(PoisonError::into_inner) = state.clone();
    if self.events.send(state).is_err() {
      trace!("No state subscribers");
    }
  }
}

/// Derives the backend request and the stored fields from a submission.
fn prepare(submission: &Submission) -> Result<PreparedSubmission> {
  let level = submission.academic_level;
  let input_type = submission.input_type();
  let given_title = submission.title.clone();

  let (content, title, doi, abstract_text) = match &submission.content {
    SubmissionContent::Doi(raw) => {
      let doi = normalize_doi(raw)?;
      (format!("DOI: {doi}"), format!("Paper from DOI: {doi}"), Some(doi), None)
    },
    SubmissionContent::Abstract(text) => {
      let text = text.trim().to_string();
      let title = given_title.unwrap_or_else(|| DEFAULT_ABSTRACT_TITLE.to_string());
      (text.clone(), title, None, Some(text))
    },
    SubmissionContent::Pdf(bytes) => {
      let text = PdfDocument::from_bytes(bytes)?.text();
      if text.trim().is_empty() {
        return Err(PaperLenzError::InvalidSubmission(
          "No text could be extracted from the PDF".into(),
        ));
      }
      (text, given_title.unwrap_or_else(|| DEFAULT_PDF_TITLE.to_string()), None, None)
    },
  };

  let request = AnalyzeRequest::new(content, level, input_type).with_title(title.clone());
  Ok(PreparedSubmission { request, title, doi, abstract_text })
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::analysis::tests::sample_record;

  /// Backend recording every request and answering with a fixed result.
  #[derive(Default)]
  struct RecordingBackend {
    requests: Mutex<Vec<AnalyzeRequest>>,
    fail:     bool,
  }

  impl RecordingBackend {
    fn failing() -> Self { Self { fail: true, ..Default::default() } }

    fn requests(&self) -> Vec<AnalyzeRequest> { self.requests.lock().unwrap().clone() }
  }

  #[async_trait]
  impl AnalysisBackend for RecordingBackend {
    fn name(&self) -> &str { if self.fail { "failing" } else { "recording" } }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisRecord> {
      self.requests.lock().unwrap().push(request.clone());
      if self.fail {
        Err(PaperLenzError::Api("Service Unavailable".into()))
      } else {
        Ok(sample_record())
      }
    }
  }

  /// Store keeping papers in memory, or refusing to.
  #[derive(Default)]
  struct MemoryStore {
    papers: Mutex<Vec<Paper>>,
    fail:   bool,
  }

  #[async_trait]
  impl PaperStore for MemoryStore {
    async fn save_paper(&self, paper: NewPaper) -> Result<Paper> {
      if self.fail {
        return Err(PaperLenzError::Config("read-only store".into()));
      }
      let paper = Paper {
        id:             format!("paper-{}", self.papers.lock().unwrap().len() + 1),
        user_id:        paper.user_id,
        title:          paper.title,
        doi:            paper.doi,
        abstract_text:  paper.abstract_text,
        input_type:     paper.input_type,
        academic_level: paper.academic_level,
        analysis:       paper.analysis,
        notes:          None,
        created_at:     Utc::now(),
      };
      self.papers.lock().unwrap().push(paper.clone());
      Ok(paper)
    }
  }

  fn orchestrator(
    primary: Arc<dyn AnalysisBackend>,
    store: Arc<dyn PaperStore>,
  ) -> Orchestrator {
    Orchestrator::new(primary, store).with_progress_interval(Duration::ZERO)
  }

  fn drain(rx: &mut broadcast::Receiver<AnalysisState>) -> Vec<AnalysisState> {
    let mut states = Vec::new();
    while let Ok(state) = rx.try_recv() {
      states.push(state);
    }
    states
  }

  #[tokio::test]
  async fn test_state_sequence() {
    let backend = Arc::new(RecordingBackend::default());
    let store = Arc::new(MemoryStore::default());
    let orchestrator = orchestrator(backend.clone(), store.clone());
    assert_eq!(orchestrator.state(), AnalysisState::Idle);

    let mut rx = orchestrator.subscribe();
    let outcome = orchestrator
      .submit("u1", Submission::abstract_text("We study X.", AcademicLevel::Graduate))
      .await
      .unwrap();

    let states = drain(&mut rx);
    let progress: Vec<_> = states
      .iter()
      .filter_map(|state| match state {
        AnalysisState::Processing { progress, .. } => Some(*progress),
        _ => None,
      })
      .collect();
    assert_eq!(progress, [10, 25, 50, 75, 90]);
    assert_eq!(states[0], AnalysisState::Processing {
      progress: 10,
      step:     "Parsing document".into(),
    });
    assert_eq!(states.last(), Some(&AnalysisState::Success(Box::new(sample_record()))));
    assert_eq!(orchestrator.state(), AnalysisState::Success(Box::new(sample_record())));

    assert_eq!(outcome.title, DEFAULT_ABSTRACT_TITLE);
    assert!(outcome.save_error.is_none());
    let paper = outcome.paper.unwrap();
    assert_eq!(paper.abstract_text.as_deref(), Some("We study X."));
    assert_eq!(paper.input_type, InputType::Abstract);
    assert_eq!(store.papers.lock().unwrap().len(), 1);

    orchestrator.reset();
    assert_eq!(orchestrator.state(), AnalysisState::Idle);
    assert_eq!(drain(&mut rx), [AnalysisState::Idle]);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_fallback_receives_identical_request() {
    let primary = Arc::new(RecordingBackend::failing());
    let fallback = Arc::new(RecordingBackend::default());
    let orchestrator =
      orchestrator(primary.clone(), Arc::new(MemoryStore::default())).with_fallback(fallback.clone());

    let submission = Submission::doi("https://doi.org/10.1000/xyz123", AcademicLevel::Professor);
    let outcome = orchestrator.submit("u1", submission).await.unwrap();

    assert_eq!(primary.requests().len(), 1);
    assert_eq!(primary.requests(), fallback.requests());
    let request = &fallback.requests()[0];
    assert_eq!(request.content, "DOI: 10.1000/xyz123");
    assert_eq!(request.title.as_deref(), Some("Paper from DOI: 10.1000/xyz123"));
    assert_eq!(request.academic_level, "professor");
    assert_eq!(request.input_type, InputType::Doi);

    assert_eq!(outcome.paper.unwrap().doi.as_deref(), Some("10.1000/xyz123"));
    assert!(logs_contain("failing backend failed, trying recording backend"));
  }

  #[tokio::test]
  async fn test_doi_title_ignores_given_title() {
    let backend = Arc::new(RecordingBackend::default());
    let orchestrator = orchestrator(backend.clone(), Arc::new(MemoryStore::default()));
    let submission =
      Submission::doi("10.1000/xyz123", AcademicLevel::Undergraduate).with_title("Mine");
    let outcome = orchestrator.submit("u1", submission).await.unwrap();
    assert_eq!(outcome.title, "Paper from DOI: 10.1000/xyz123");
  }

  #[tokio::test]
  async fn test_all_backends_fail() {
    let primary = Arc::new(RecordingBackend::failing());
    let fallback = Arc::new(RecordingBackend::failing());
    let store = Arc::new(MemoryStore::default());
    let orchestrator = orchestrator(primary, store.clone()).with_fallback(fallback.clone());
    let mut rx = orchestrator.subscribe();

    let err = orchestrator
      .submit("u1", Submission::abstract_text("Text", AcademicLevel::Graduate))
      .await
      .unwrap_err();
    assert!(matches!(err, PaperLenzError::Api(_)));
    assert_eq!(fallback.requests().len(), 1);
    assert_eq!(
      drain(&mut rx).last(),
      Some(&AnalysisState::Error("API error: Service Unavailable".into()))
    );
    assert!(store.papers.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_no_fallback() {
    let orchestrator =
      orchestrator(Arc::new(RecordingBackend::failing()), Arc::new(MemoryStore::default()));
    assert!(orchestrator
      .submit("u1", Submission::abstract_text("Text", AcademicLevel::Graduate))
      .await
      .is_err());
    assert!(matches!(orchestrator.state(), AnalysisState::Error(_)));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_save_failure_still_succeeds() {
    let store = Arc::new(MemoryStore { fail: true, ..Default::default() });
    let orchestrator = orchestrator(Arc::new(RecordingBackend::default()), store);

    let submission =
      Submission::abstract_text("Text", AcademicLevel::HighSchool).with_title("Titled");
    let outcome = orchestrator.submit("u1", submission).await.unwrap();

    assert_eq!(outcome.title, "Titled");
    assert!(outcome.paper.is_none());
    assert!(matches!(outcome.save_error, Some(PaperLenzError::Config(_))));
    assert!(matches!(orchestrator.state(), AnalysisState::Success(_)));
    assert!(logs_contain("failed to save"));
  }

  #[tokio::test]
  async fn test_invalid_submission_leaves_state_alone() {
    let backend = Arc::new(RecordingBackend::default());
    let orchestrator = orchestrator(backend.clone(), Arc::new(MemoryStore::default()));
    let mut rx = orchestrator.subscribe();

    let err = orchestrator
      .submit("u1", Submission::abstract_text("  ", AcademicLevel::Graduate))
      .await
      .unwrap_err();
    assert!(matches!(err, PaperLenzError::InvalidSubmission(_)));
    assert!(drain(&mut rx).is_empty());
    assert!(backend.requests().is_empty());
  }

  #[tokio::test]
  async fn test_pdf_submission() {
    let backend = Arc::new(RecordingBackend::default());
    let orchestrator = orchestrator(backend.clone(), Arc::new(MemoryStore::default()));

    let bytes = crate::pdf::tests::sample_pdf("Quantum error correction", None);
    let outcome = orchestrator
      .submit("u1", Submission::pdf(bytes, AcademicLevel::Graduate))
      .await
      .unwrap();

    assert_eq!(outcome.title, DEFAULT_PDF_TITLE);
    let request = &backend.requests()[0];
    assert!(request.content.contains("Quantum error correction"));
    assert_eq!(request.input_type, InputType::Pdf);

    let err = orchestrator
      .submit("u1", Submission::pdf(b"garbage".to_vec(), AcademicLevel::Graduate))
      .await
      .unwrap_err();
    assert!(matches!(err, PaperLenzError::Lopdf(_)));
    assert!(matches!(orchestrator.state(), AnalysisState::Error(_)));
  }
}
