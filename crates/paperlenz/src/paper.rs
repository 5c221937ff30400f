//! Paper submissions and stored paper records.
//!
//! A [`Submission`] is what a user hands in: a DOI, a pasted abstract, or the bytes of a PDF,
//! together with the [`AcademicLevel`] the analysis should be written for. Once analyzed, the
//! submission is persisted as a [`Paper`] owning exactly one [`AnalysisRecord`].
//!
//! # Examples
//!
//! ```
//! use paperlenz::paper::{normalize_doi, AcademicLevel, InputType};
//!
//! let level: AcademicLevel = "graduate".parse().unwrap();
//! assert_eq!(level.to_string(), "graduate");
//!
//! let kind: InputType = "pdf".parse().unwrap();
//! assert_eq!(kind, InputType::Pdf);
//!
//! assert_eq!(normalize_doi("https://doi.org/10.1145/1327452.1327492").unwrap(), "10.1145/1327452.1327492");
//! ```

use super::*;

lazy_static! {
  /// Matches a DOI, optionally behind a resolver URL or a `doi:` prefix.
  static ref DOI_PATTERN: Regex =
    Regex::new(r"^(?i:(?:https?://(?:dx\.)?doi\.org/)|(?:doi:\s*))?(10\.\d{4,9}/\S+)$").unwrap();
}

/// The audience an analysis is written for.
///
/// The level controls the verbosity and technical depth demanded by the prompt, from short,
/// plain-language sections for high school readers to multi-paragraph expert assessment for
/// professors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
  /// Simple explanations
  HighSchool,
  /// Balanced detail
  #[default]
  Undergraduate,
  /// Technical depth
  Graduate,
  /// Expert analysis
  Professor,
}

impl AcademicLevel {
  /// All levels, from least to most demanding.
  pub const ALL: [AcademicLevel; 4] =
    [Self::HighSchool, Self::Undergraduate, Self::Graduate, Self::Professor];

  /// The wire name of the level.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::HighSchool => "high_school",
      Self::Undergraduate => "undergraduate",
      Self::Graduate => "graduate",
      Self::Professor => "professor",
    }
  }

  /// Upper-case label used in report headers, e.g. `HIGH SCHOOL`.
  pub fn display_name(&self) -> String { self.as_str().replace('_', " ").to_uppercase() }

  /// Parses a level leniently, falling back to [`AcademicLevel::Undergraduate`].
  pub fn parse_or_default(level: &str) -> Self {
    level.parse().unwrap_or_else(|_| {
      warn!("Unknown academic level {level:?}, using undergraduate");
      Self::default()
    })
  }
}

impl Display for AcademicLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for AcademicLevel {
  type Err = PaperLenzError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
      "high_school" => Ok(Self::HighSchool),
      "undergraduate" => Ok(Self::Undergraduate),
      "graduate" => Ok(Self::Graduate),
      "professor" => Ok(Self::Professor),
      _ => Err(PaperLenzError::InvalidAcademicLevel(s.to_string())),
    }
  }
}

/// How a paper was handed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
  /// A Digital Object Identifier
  Doi,
  /// Pasted abstract text
  #[default]
  Abstract,
  /// An uploaded PDF document
  Pdf,
}

impl InputType {
  /// The wire name of the input type.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Doi => "doi",
      Self::Abstract => "abstract",
      Self::Pdf => "pdf",
    }
  }
}

impl Display for InputType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for InputType {
  type Err = PaperLenzError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "doi" => Ok(Self::Doi),
      "abstract" => Ok(Self::Abstract),
      "pdf" => Ok(Self::Pdf),
      _ => Err(PaperLenzError::InvalidInputType(s.to_string())),
    }
  }
}

/// Reduces a DOI, a DOI resolver URL, or a `doi:` reference to the bare `10.xxxx/...` form.
pub fn normalize_doi(input: &str) -> Result<String> {
  DOI_PATTERN
    .captures(input.trim())
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str().to_string())
    .ok_or_else(|| PaperLenzError::InvalidDoi(input.to_string()))
}

/// The material a user submits for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionContent {
  /// A DOI as typed by the user
  Doi(String),
  /// Abstract text
  Abstract(String),
  /// Raw bytes of a PDF upload
  Pdf(Vec<u8>),
}

/// A paper handed in for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
  /// What was submitted
  pub content:        SubmissionContent,
  /// Optional user-supplied title
  pub title:          Option<String>,
  /// Audience of the analysis
  pub academic_level: AcademicLevel,
}

impl Submission {
  /// Submits a DOI.
  pub fn doi(doi: impl Into<String>, academic_level: AcademicLevel) -> Self {
    Self { content: SubmissionContent::Doi(doi.into()), title: None, academic_level }
  }

  /// Submits pasted abstract text.
  pub fn abstract_text(text: impl Into<String>, academic_level: AcademicLevel) -> Self {
    Self { content: SubmissionContent::Abstract(text.into()), title: None, academic_level }
  }

  /// Submits the bytes of a PDF document.
  pub fn pdf(bytes: Vec<u8>, academic_level: AcademicLevel) -> Self {
    Self { content: SubmissionContent::Pdf(bytes), title: None, academic_level }
  }

  /// Attaches a title. Blank titles are ignored.
  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    let title = title.into();
    self.title = (!title.trim().is_empty()).then(|| title.trim().to_string());
    self
  }

  /// The input type this submission maps to.
  pub fn input_type(&self) -> InputType {
    match self.content {
      SubmissionContent::Doi(_) => InputType::Doi,
      SubmissionContent::Abstract(_) => InputType::Abstract,
      SubmissionContent::Pdf(_) => InputType::Pdf,
    }
  }

  /// Checks that the submission carries usable content.
  ///
  /// DOIs must be recognizable, abstracts must not be blank and PDFs must not be empty.
  pub fn validate(&self) -> Result<()> {
    match &self.content {
      SubmissionContent::Doi(doi) if doi.trim().is_empty() =>
        Err(PaperLenzError::InvalidSubmission("Please enter a DOI".into())),
      SubmissionContent::Doi(doi) => normalize_doi(doi).map(|_| ()),
      SubmissionContent::Abstract(text) if text.trim().is_empty() =>
        Err(PaperLenzError::InvalidSubmission("Please enter an abstract".into())),
      SubmissionContent::Pdf(bytes) if bytes.is_empty() =>
        Err(PaperLenzError::InvalidSubmission("Please upload a PDF file".into())),
      _ => Ok(()),
    }
  }
}

/// A paper row that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaper {
  /// Owner of the paper
  pub user_id:        String,
  /// Title shown in the dashboard
  pub title:          String,
  /// DOI for DOI submissions
  pub doi:            Option<String>,
  /// Abstract text for abstract submissions
  #[serde(rename = "abstract")]
  pub abstract_text:  Option<String>,
  /// How the paper was submitted
  pub input_type:     InputType,
  /// Level the analysis was written for
  pub academic_level: AcademicLevel,
  /// The model's analysis
  pub analysis:       AnalysisRecord,
}

/// A stored paper submission with its analysis.
///
/// Only [`Paper::notes`] changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
  /// Unique identifier
  pub id:             String,
  /// Owner of the paper
  pub user_id:        String,
  /// Title shown in the dashboard
  pub title:          String,
  /// DOI for DOI submissions
  pub doi:            Option<String>,
  /// Abstract text for abstract submissions
  #[serde(rename = "abstract")]
  pub abstract_text:  Option<String>,
  /// How the paper was submitted
  pub input_type:     InputType,
  /// Level the analysis was written for
  pub academic_level: AcademicLevel,
  /// The model's analysis
  pub analysis:       AnalysisRecord,
  /// Free-text annotation by the owner
  pub notes:          Option<String>,
  /// Creation timestamp
  pub created_at:     DateTime<Utc>,
}

impl Paper {
  /// Whether the owner attached non-empty notes.
  pub fn has_notes(&self) -> bool { self.notes.as_deref().is_some_and(|n| !n.trim().is_empty()) }
}
