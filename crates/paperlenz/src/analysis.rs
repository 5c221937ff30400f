//! The fixed-schema analysis a language model produces for one paper.
//!
//! An [`AnalysisRecord`] is created once per submitted paper and never changes afterwards. The
//! model is asked for exactly this shape (see [`prompt`](crate::prompt)), its reply is cleaned
//! up by the [`sanitize`](crate::sanitize) module, decoded, and finally reconciled: the quality
//! score total is always recomputed from its five components rather than trusted.
//!
//! # Examples
//!
//! ```
//! use paperlenz::{analysis::AnalysisRecord, sanitize::SanitizeStrategy};
//!
//! # fn example(reply: &str) -> Result<(), paperlenz::error::PaperLenzError> {
//! let record = AnalysisRecord::from_llm_response(reply, SanitizeStrategy::Heuristic)?;
//! let score = &record.paper_quality_score;
//! assert_eq!(score.total, score.component_sum());
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::sanitize::SanitizeStrategy;

/// Structured analysis of a single paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
  /// Single-sentence summary shown at the top of the report
  pub one_line_summary:            String,
  /// Summary of the abstract and main findings
  pub abstract_summary:            String,
  /// Research objectives
  pub aim_of_paper:                String,
  /// Methods, technologies, tools and approaches used
  pub methodology_technology_used: String,
  /// Findings and outcomes
  pub results_obtained:            String,
  /// Patterns and insights
  pub observations:                String,
  /// Limitations of the work
  #[serde(default)]
  pub limitations_detailed:        Vec<String>,
  /// Suggested methodological improvements
  #[serde(default)]
  pub methodology_improvements:    Vec<String>,
  /// Completeness score of each standard section
  pub section_completeness:        SectionCompleteness,
  /// Writing quality sub-scores and their total
  pub paper_quality_score:         PaperQualityScore,
  /// Key concepts of the paper
  #[serde(default)]
  pub core_concepts:               Vec<String>,
  /// Technical terms with definitions
  #[serde(default)]
  pub glossary:                    Vec<GlossaryEntry>,
  /// Credibility assessment
  pub credibility_analysis:        CredibilityAnalysis,
  /// Ready-made citations
  pub citations:                   Citations,
}

/// A technical term and its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
  /// The term as used in the paper
  pub term:       String,
  /// Its definition in context
  pub definition: String,
}

/// Completeness of the seven standard sections, each scored 1-10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionCompleteness {
  /// Abstract, serialized as `abstract`
  #[serde(rename = "abstract", deserialize_with = "lenient::score")]
  pub abstract_section:  u32,
  /// Background and problem statement
  #[serde(deserialize_with = "lenient::score")]
  pub introduction:      u32,
  /// Coverage of related work
  #[serde(deserialize_with = "lenient::score")]
  pub literature_review: u32,
  /// Detail of the described methods
  #[serde(deserialize_with = "lenient::score")]
  pub methodology:       u32,
  /// Presentation of findings
  #[serde(deserialize_with = "lenient::score")]
  pub results:           u32,
  /// Interpretation and implications
  #[serde(deserialize_with = "lenient::score")]
  pub discussion:        u32,
  /// Support for conclusions and future work
  #[serde(deserialize_with = "lenient::score")]
  pub conclusion:        u32,
}

impl SectionCompleteness {
  /// Lowest valid section score.
  pub const MIN: u32 = 1;
  /// Highest valid section score.
  pub const MAX: u32 = 10;

  /// The sections in report order, keyed by their schema names.
  pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> {
    [
      ("abstract", self.abstract_section),
      ("introduction", self.introduction),
      ("literature_review", self.literature_review),
      ("methodology", self.methodology),
      ("results", self.results),
      ("discussion", self.discussion),
      ("conclusion", self.conclusion),
    ]
    .into_iter()
  }
}

/// Writing quality sub-scores, each 1-20, and their total.
///
/// Every sub-score is optional because models occasionally drop one; a missing sub-score counts
/// as zero towards [`PaperQualityScore::total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaperQualityScore {
  /// Always the sum of the present sub-scores once reconciled
  #[serde(default, deserialize_with = "lenient::score")]
  pub total:            u32,
  /// Language quality
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::optional_score"
  )]
  pub grammar:          Option<u32>,
  /// Logical flow and organization
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::optional_score"
  )]
  pub structure:        Option<u32>,
  /// Ease of understanding for the audience
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::optional_score"
  )]
  pub readability:      Option<u32>,
  /// Clarity of questions, hypotheses and conclusions
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::optional_score"
  )]
  pub argument_clarity: Option<u32>,
  /// Citation quality and completeness
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::optional_score"
  )]
  pub referencing:      Option<u32>,
}

impl PaperQualityScore {
  /// Lowest valid sub-score.
  pub const MIN: u32 = 1;
  /// Highest valid sub-score.
  pub const MAX: u32 = 20;

  /// The five sub-scores keyed by their schema names.
  pub fn components(&self) -> [(&'static str, Option<u32>); 5] {
    [
      ("grammar", self.grammar),
      ("structure", self.structure),
      ("readability", self.readability),
      ("argument_clarity", self.argument_clarity),
      ("referencing", self.referencing),
    ]
  }

  /// Sum of the sub-scores, absent ones counting as zero. Saturates at `u32::MAX`.
  pub fn component_sum(&self) -> u32 {
    self.components().iter().fold(0u32, |sum, (_, score)| sum.saturating_add(score.unwrap_or(0)))
  }

  /// Overwrites the total with the sum of the sub-scores.
  pub fn reconcile(&mut self) {
    let total = self.component_sum();
    if total != self.total {
      debug!("Replacing model quality total {} with component sum {}", self.total, total);
    }
    self.total = total;
  }
}

/// Credibility assessment of the paper.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CredibilityAnalysis {
  /// Overall credibility, 1-100
  #[serde(deserialize_with = "lenient::score")]
  pub score:          u32,
  /// Factors the score was based on
  #[serde(default)]
  pub factors:        Vec<String>,
  /// Journal impact assessment, typically High, Medium or Low
  #[serde(default)]
  pub journal_impact: String,
  /// Citation count when the paper states one
  #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::count")]
  pub citation_count: Option<u64>,
}

impl CredibilityAnalysis {
  /// Lowest valid credibility score.
  pub const MIN: u32 = 1;
  /// Highest valid credibility score.
  pub const MAX: u32 = 100;

  /// Human-readable verdict for the score.
  pub fn label(&self) -> &'static str {
    match self.score {
      90.. => "Excellent",
      80..=89 => "Very Good",
      70..=79 => "Good",
      60..=69 => "Fair",
      _ => "Needs Review",
    }
  }
}

/// Citations of the paper in three styles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Citations {
  /// APA style
  pub apa:  String,
  /// MLA style
  pub mla:  String,
  /// IEEE style
  pub ieee: String,
}

/// Coarse rating used to colour scores in reports.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
  High,
  Medium,
  Low,
}

impl ScoreBand {
  /// Band of a score out of 100.
  pub fn of_percentage(score: u32) -> Self { Self::banded(score, 80, 60) }

  /// Band of a quality sub-score out of 20.
  pub fn of_quality_component(score: u32) -> Self { Self::banded(score, 16, 12) }

  /// Band of a section completeness score out of 10.
  pub fn of_section(score: u32) -> Self { Self::banded(score, 8, 6) }

  /// Bands `score` against the inclusive lower bounds of the high and medium bands.
  fn banded(score: u32, high: u32, medium: u32) -> Self {
    if score >= high {
      Self::High
    } else if score >= medium {
      Self::Medium
    } else {
      Self::Low
    }
  }
}

impl AnalysisRecord {
  /// Turns a raw model reply into a reconciled analysis record.
  ///
  /// The reply is sanitized with `strategy`, decoded against the fixed schema, and the quality
  /// total is recomputed. Scores outside their documented ranges are logged but kept.
  ///
  /// # Errors
  ///
  /// Returns [`PaperLenzError::InvalidResponseFormat`] with the decoder message when the
  /// sanitized text does not decode into the schema.
  pub fn from_llm_response(raw: &str, strategy: SanitizeStrategy) -> Result<Self> {
    let cleaned = strategy.apply(raw);
    trace!("Sanitized model reply: {}", cleaned.chars().take(200).collect::<String>());

    let mut record: AnalysisRecord = serde_json::from_str(&cleaned)
      .map_err(|e| PaperLenzError::InvalidResponseFormat(format!("Parse error: {e}")))?;
    record.reconcile_scores();

    for problem in record.out_of_range() {
      warn!("Model returned an out-of-range score: {problem}");
    }
    Ok(record)
  }

  /// Recomputes every derived field. Currently only the quality score total is derived.
  pub fn reconcile_scores(&mut self) { self.paper_quality_score.reconcile(); }

  /// Describes every score lying outside its documented range.
  pub fn out_of_range(&self) -> Vec<String> {
    let mut problems = Vec::new();

    for (section, score) in self.section_completeness.iter() {
      if !(SectionCompleteness::MIN..=SectionCompleteness::MAX).contains(&score) {
        problems.push(format!("section_completeness.{section} = {score}"));
      }
    }
    for (name, score) in self.paper_quality_score.components() {
      if let Some(score) = score {
        if !(PaperQualityScore::MIN..=PaperQualityScore::MAX).contains(&score) {
          problems.push(format!("paper_quality_score.{name} = {score}"));
        }
      }
    }
    let credibility = self.credibility_analysis.score;
    if !(CredibilityAnalysis::MIN..=CredibilityAnalysis::MAX).contains(&credibility) {
      problems.push(format!("credibility_analysis.score = {credibility}"));
    }
    problems
  }
}

/// Decoders for numeric fields that models fill in loosely.
///
/// Scores arrive as integers, fractions, numeric strings or prose like `"N/A"`. Numbers are
/// rounded and clamped into `u32` so the range check can report them; anything else is logged
/// and treated as absent (or zero for required scores).
mod lenient {
  use serde::{Deserialize, Deserializer};
  use serde_json::Value;
  use tracing::warn;

  /// Reads a JSON number or numeric string as a rounded, clamped `u32`.
  fn as_score(value: &Value) -> Option<u32> {
    let number = match value {
      Value::Number(number) => number.as_f64()?,
      Value::String(text) => text.trim().parse::<f64>().ok()?,
      _ => return None,
    };
    number.is_finite().then(|| number.round().clamp(0.0, f64::from(u32::MAX)) as u32)
  }

  /// A required score. Non-numeric values become zero.
  pub(super) fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_score(&value).unwrap_or_else(|| {
      warn!("Model returned a non-numeric score {value}, using 0");
      0
    }))
  }

  /// An optional score. Null and non-numeric values become `None`.
  pub(super) fn optional_score<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
      return Ok(None);
    }
    let score = as_score(&value);
    if score.is_none() {
      warn!("Model returned a non-numeric score {value}, ignoring it");
    }
    Ok(score)
  }

  /// A citation count such as `40`, `40.0` or `"1,234"`. Anything else becomes `None`.
  pub(super) fn count<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let count = match &value {
      Value::Null => return Ok(None),
      Value::Number(number) => number.as_u64().or_else(|| {
        number.as_f64().filter(|n| n.is_finite() && *n >= 0.0).map(|n| n.round() as u64)
      }),
      Value::String(text) => text.trim().replace(',', "").parse::<u64>().ok(),
      _ => None,
    };
    if count.is_none() {
      warn!("Model returned an unusable citation count {value}, ignoring it");
    }
    Ok(count)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// A complete model reply body used across the crate's tests.
  pub(crate) fn sample_json() -> serde_json::Value {
    serde_json::json!({
      "one_line_summary": "This paper studies X and finds Y.",
      "abstract_summary": "Summary of the abstract.",
      "aim_of_paper": "To study X.",
      "methodology_technology_used": "Randomized trial.",
      "results_obtained": "Y improved by 12%.",
      "observations": "Effect holds across cohorts.",
      "limitations_detailed": ["Small sample", "Single site"],
      "methodology_improvements": ["Multi-site replication"],
      "section_completeness": {
        "abstract": 8, "introduction": 7, "literature_review": 6, "methodology": 9,
        "results": 8, "discussion": 7, "conclusion": 6
      },
      "paper_quality_score": {
        "total": 99, "grammar": 16, "structure": 15, "readability": 14,
        "argument_clarity": 17, "referencing": 13
      },
      "core_concepts": ["X", "Y"],
      "glossary": [{"term": "RCT", "definition": "Randomized controlled trial"}],
      "credibility_analysis": {
        "score": 82, "factors": ["Peer reviewed"], "journal_impact": "High", "citation_count": 40
      },
      "citations": {"apa": "A (2020).", "mla": "A. 2020.", "ieee": "[1] A, 2020."}
    })
  }

  /// A decoded and reconciled [`AnalysisRecord`] built from [`sample_json`].
  pub(crate) fn sample_record() -> AnalysisRecord {
    AnalysisRecord::from_llm_response(&sample_json().to_string(), SanitizeStrategy::Heuristic)
      .unwrap()
  }

  #[test]
  fn test_total_is_recomputed() {
    let record = sample_record();
    assert_eq!(record.paper_quality_score.total, 16 + 15 + 14 + 17 + 13);
  }

  #[test]
  fn test_missing_components_count_as_zero() {
    let mut json = sample_json();
    json["paper_quality_score"] = serde_json::json!({ "total": 100, "grammar": 10, "referencing": 5 });
    let record =
      AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic).unwrap();
    assert_eq!(record.paper_quality_score.total, 15);
    assert_eq!(record.paper_quality_score.structure, None);
  }

  #[test]
  fn test_missing_total_is_filled_in() {
    let mut json = sample_json();
    json["paper_quality_score"] = serde_json::json!({
      "grammar": 1, "structure": 2, "readability": 3, "argument_clarity": 4, "referencing": 5
    });
    let record =
      AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic).unwrap();
    assert_eq!(record.paper_quality_score.total, 15);
  }

  #[test]
  fn test_reconcile_all_missing() {
    let mut score = PaperQualityScore { total: 42, ..Default::default() };
    score.reconcile();
    assert_eq!(score.total, 0);
  }

  #[test]
  fn test_section_completeness_uses_schema_names() {
    let record = sample_record();
    let value = serde_json::to_value(record.section_completeness).unwrap();
    assert_eq!(value["abstract"], 8);
    assert!(value.get("abstract_section").is_none());
    let names: Vec<_> = record.section_completeness.iter().map(|(name, _)| name).collect();
    assert_eq!(names.len(), 7);
    assert_eq!(names[0], "abstract");
  }

  #[test]
  fn test_missing_lists_default_to_empty() {
    let mut json = sample_json();
    json.as_object_mut().unwrap().remove("glossary");
    json.as_object_mut().unwrap().remove("core_concepts");
    let record =
      AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic).unwrap();
    assert!(record.glossary.is_empty());
    assert!(record.core_concepts.is_empty());
  }

  #[test]
  fn test_missing_required_field_is_invalid_format() {
    let mut json = sample_json();
    json.as_object_mut().unwrap().remove("citations");
    let err = AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic)
      .unwrap_err();
    assert!(matches!(err, PaperLenzError::InvalidResponseFormat(_)));
  }

  #[traced_test]
  #[test]
  fn test_out_of_range_scores_are_reported() {
    let mut json = sample_json();
    json["section_completeness"]["results"] = serde_json::json!(11);
    json["paper_quality_score"]["grammar"] = serde_json::json!(25);
    json["credibility_analysis"]["score"] = serde_json::json!(0);
    let record =
      AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic).unwrap();

    let problems = record.out_of_range();
    assert_eq!(problems.len(), 3);
    assert!(problems.contains(&"section_completeness.results = 11".to_string()));
    assert!(logs_contain("out-of-range score"));
    assert_eq!(record.paper_quality_score.total, 25 + 15 + 14 + 17 + 13);
  }

  #[test]
  fn test_huge_components_saturate_total() {
    let mut json = sample_json();
    json["paper_quality_score"]["grammar"] = serde_json::json!(4_000_000_000u64);
    json["paper_quality_score"]["structure"] = serde_json::json!(4_000_000_000u64);
    let record =
      AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic).unwrap();

    assert_eq!(record.paper_quality_score.total, u32::MAX);
    assert!(record
      .out_of_range()
      .contains(&"paper_quality_score.grammar = 4000000000".to_string()));
  }

  #[traced_test]
  #[test]
  fn test_loose_numbers_are_normalized() {
    let mut json = sample_json();
    json["section_completeness"]["results"] = serde_json::json!(7.5);
    json["section_completeness"]["discussion"] = serde_json::json!("9");
    json["section_completeness"]["conclusion"] = serde_json::json!(-3);
    json["paper_quality_score"]["referencing"] = serde_json::json!("N/A");
    json["credibility_analysis"]["score"] = serde_json::json!(84.4);
    let record =
      AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic).unwrap();

    assert_eq!(record.section_completeness.results, 8);
    assert_eq!(record.section_completeness.discussion, 9);
    assert_eq!(record.section_completeness.conclusion, 0);
    assert_eq!(record.paper_quality_score.referencing, None);
    assert_eq!(record.paper_quality_score.total, 16 + 15 + 14 + 17);
    assert_eq!(record.credibility_analysis.score, 84);
    assert_eq!(record.out_of_range(), vec!["section_completeness.conclusion = 0".to_string()]);
    assert!(logs_contain("non-numeric score"));
  }

  #[traced_test]
  #[test]
  fn test_citation_count_is_lenient() {
    let count = |value: serde_json::Value| {
      let mut json = sample_json();
      json["credibility_analysis"]["citation_count"] = value;
      AnalysisRecord::from_llm_response(&json.to_string(), SanitizeStrategy::Heuristic)
        .unwrap()
        .credibility_analysis
        .citation_count
    };

    assert_eq!(count(serde_json::json!("Not available")), None);
    assert_eq!(count(serde_json::json!(null)), None);
    assert_eq!(count(serde_json::json!("1,234")), Some(1234));
    assert_eq!(count(serde_json::json!(57.0)), Some(57));
    assert_eq!(count(serde_json::json!(40)), Some(40));
    assert!(logs_contain("unusable citation count"));
  }

  #[test]
  fn test_credibility_labels() {
    let label = |score| CredibilityAnalysis { score, ..Default::default() }.label();
    assert_eq!(label(95), "Excellent");
    assert_eq!(label(90), "Excellent");
    assert_eq!(label(85), "Very Good");
    assert_eq!(label(70), "Good");
    assert_eq!(label(60), "Fair");
    assert_eq!(label(12), "Needs Review");
  }

  #[test]
  fn test_score_bands() {
    assert_eq!(ScoreBand::of_percentage(80), ScoreBand::High);
    assert_eq!(ScoreBand::of_percentage(79), ScoreBand::Medium);
    assert_eq!(ScoreBand::of_quality_component(11), ScoreBand::Low);
    assert_eq!(ScoreBand::of_section(6), ScoreBand::Medium);
  }
}
