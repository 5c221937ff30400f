//! Markdown rendering of an analysis.
//!
//! [`Report`] implements [`Display`], so a report is produced with `to_string()` or written
//! straight into any formatter.
//!
//! # Examples
//!
//! ```no_run
//! use paperlenz::{paper::Paper, report::Report};
//!
//! # fn example(paper: &Paper) {
//! let markdown = Report::for_paper(paper).to_string();
//! std::fs::write("report.md", markdown).unwrap();
//! # }
//! ```

use std::fmt;

use super::*;
use crate::{analysis::ScoreBand, paper::Paper};

/// A printable analysis report.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
  /// Paper title
  pub title:    &'a str,
  /// Level the analysis was written for
  pub level:    AcademicLevel,
  /// DOI, if the paper has one
  pub doi:      Option<&'a str>,
  /// The analysis
  pub analysis: &'a AnalysisRecord,
}

impl<'a> Report<'a> {
  /// Creates a report for a stored paper.
  pub fn for_paper(paper: &'a Paper) -> Self {
    Self {
      title:    &paper.title,
      level:    paper.academic_level,
      doi:      paper.doi.as_deref(),
      analysis: &paper.analysis,
    }
  }
}

/// Text marker of a score band.
fn band_marker(band: ScoreBand) -> &'static str {
  match band {
    ScoreBand::High => "high",
    ScoreBand::Medium => "medium",
    ScoreBand::Low => "low",
  }
}

/// `literature_review` becomes `Literature Review`.
fn heading_case(name: &str) -> String {
  name
    .split('_')
    .map(|word| {
      let mut chars = word.chars();
      chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
        .unwrap_or_default()
    })
    .collect::<Vec<String>>()
    .join(" ")
}

/// Writes a titled bullet list, or nothing when the list is empty.
fn bullet_section(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
  if items.is_empty() {
    return Ok(());
  }
  writeln!(f, "## {title}\n")?;
  for item in items {
    writeln!(f, "- {item}")?;
  }
  writeln!(f)
}

impl Display for Report<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let analysis = self.analysis;

    writeln!(f, "# {}\n", self.title)?;
    writeln!(f, "**Academic level:** {}  ", self.level.display_name())?;
    if let Some(doi) = self.doi {
      writeln!(f, "**DOI:** {doi}  ")?;
    }
    writeln!(f)?;

    for (heading, body) in [
      ("One-Line Summary", &analysis.one_line_summary),
      ("Abstract Summary", &analysis.abstract_summary),
      ("Aim of Paper", &analysis.aim_of_paper),
      ("Methodology/Technology Used", &analysis.methodology_technology_used),
      ("Results Obtained", &analysis.results_obtained),
      ("Observations", &analysis.observations),
    ] {
      writeln!(f, "## {heading}\n\n{}\n", body.trim())?;
    }

    bullet_section(f, "Limitations", &analysis.limitations_detailed)?;
    bullet_section(f, "Methodology Improvements", &analysis.methodology_improvements)?;
    bullet_section(f, "Core Concepts", &analysis.core_concepts)?;

    if !analysis.glossary.is_empty() {
      writeln!(f, "## Glossary\n")?;
      for entry in &analysis.glossary {
        writeln!(f, "- **{}**: {}", entry.term, entry.definition)?;
      }
      writeln!(f)?;
    }

    let quality = &analysis.paper_quality_score;
    writeln!(f, "## Paper Quality Score\n")?;
    writeln!(f, "**Total:** {}/100\n", quality.total)?;
    writeln!(f, "| Metric | Score | Rating |\n|---|---|---|")?;
    for (name, score) in quality.components() {
      match score {
        Some(score) => writeln!(
          f,
          "| {} | {score}/20 | {} |",
          heading_case(name),
          band_marker(ScoreBand::of_quality_component(score))
        )?,
        None => writeln!(f, "| {} | n/a | |", heading_case(name))?,
      }
    }
    writeln!(f)?;

    writeln!(f, "## Section Completeness\n")?;
    writeln!(f, "| Section | Score | Rating |\n|---|---|---|")?;
    for (name, score) in analysis.section_completeness.iter() {
      writeln!(
        f,
        "| {} | {score}/10 | {} |",
        heading_case(name),
        band_marker(ScoreBand::of_section(score))
      )?;
    }
    writeln!(f)?;

    let credibility = &analysis.credibility_analysis;
    writeln!(f, "## Credibility Analysis\n")?;
    writeln!(
      f,
      "**Score:** {}/100 ({}, {})  ",
      credibility.score,
      credibility.label(),
      band_marker(ScoreBand::of_percentage(credibility.score))
    )?;
    if !credibility.journal_impact.is_empty() {
      writeln!(f, "**Journal impact:** {}  ", credibility.journal_impact)?;
    }
    if let Some(count) = credibility.citation_count {
      writeln!(f, "**Citations:** {count}  ")?;
    }
    writeln!(f)?;
    bullet_section(f, "Key Factors", &credibility.factors)?;

    let citations = &analysis.citations;
    writeln!(f, "## Citations\n")?;
    writeln!(f, "**APA:** {}\n", citations.apa)?;
    writeln!(f, "**MLA:** {}\n", citations.mla)?;
    writeln!(f, "**IEEE:** {}", citations.ieee)
  }
}
