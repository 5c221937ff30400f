//! Filtering and summary statistics over a user's papers.
//!
//! Both operate on an already loaded list, newest first, as returned by
//! [`Query::for_user`](crate::database::Query::for_user).

use super::*;
use crate::paper::Paper;

/// Milliseconds per day.
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Dashboard filter: a case-insensitive title substring and an optional input type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperFilter {
  /// Lower-cased search term
  search:     Option<String>,
  /// Required input type
  input_type: Option<InputType>,
}

impl PaperFilter {
  /// A filter that keeps everything.
  pub fn new() -> Self { Self::default() }

  /// Keeps papers whose title contains `term`, ignoring case. Blank terms match everything.
  pub fn with_search(mut self, term: &str) -> Self {
    let term = term.trim();
    self.search = (!term.is_empty()).then(|| term.to_lowercase());
    self
  }

  /// Keeps papers of one input type.
  pub fn with_input_type(mut self, input_type: Option<InputType>) -> Self {
    self.input_type = input_type;
    self
  }

  /// Whether `paper` passes the filter.
  pub fn matches(&self, paper: &Paper) -> bool {
    let title_matches =
      self.search.as_deref().map_or(true, |term| paper.title.to_lowercase().contains(term));
    let type_matches = self.input_type.map_or(true, |input_type| paper.input_type == input_type);
    title_matches && type_matches
  }

  /// The papers passing the filter, order preserved.
  pub fn apply<'a>(&self, papers: &'a [Paper]) -> Vec<&'a Paper> {
    papers.iter().filter(|paper| self.matches(paper)).collect()
  }
}

/// Summary shown above the paper list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
  /// Number of papers
  pub total_papers:             usize,
  /// Mean credibility score, rounded; zero without papers
  pub average_credibility:      u32,
  /// Papers with non-empty notes
  pub papers_with_notes:        usize,
  /// Whole days since the newest paper, rounded up; zero without papers
  pub days_since_last_analysis: i64,
}

impl DashboardStats {
  /// Computes the statistics of `papers` as of `now`.
  pub fn compute(papers: &[Paper], now: DateTime<Utc>) -> Self {
    if papers.is_empty() {
      return Self::default();
    }

    let credibility_sum: u64 =
      papers.iter().map(|paper| u64::from(paper.analysis.credibility_analysis.score)).sum();
    let average_credibility = (credibility_sum as f64 / papers.len() as f64).round() as u32;

    let days_since_last_analysis = papers
      .iter()
      .map(|paper| paper.created_at)
      .max()
      .map(|latest| {
        let elapsed = (now - latest).num_milliseconds();
        if elapsed <= 0 {
          0
        } else {
          (elapsed + DAY_MS - 1) / DAY_MS
        }
      })
      .unwrap_or(0);

    Self {
      total_papers: papers.len(),
      average_credibility,
      papers_with_notes: papers.iter().filter(|paper| paper.has_notes()).count(),
      days_since_last_analysis,
    }
  }
}
