//! Prompt templates for paper analysis and the chat assistant.
//!
//! [`build_analysis_prompt`] is a pure function of the paper content, the [`AcademicLevel`] and an
//! optional title. The prompt embeds the literal field list and score ranges of the
//! [`AnalysisRecord`] schema, and its instructions grow in verbosity and technical depth from
//! [`AcademicLevel::HighSchool`] to [`AcademicLevel::Professor`].
//!
//! # Examples
//!
//! ```
//! use paperlenz::{paper::AcademicLevel, prompt::AnalysisPrompt};
//!
//! let prompt = AnalysisPrompt::new("Abstract text", AcademicLevel::Professor)
//!   .with_title("On Things")
//!   .build();
//! assert!(prompt.contains("Paper title: On Things"));
//! assert!(prompt.contains("\"paper_quality_score\""));
//! ```

use super::*;

/// System message sent with every analysis request.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert scientific paper analyzer. You must \
provide personalized, accurate analysis based on the actual content provided. Never use template \
or generic scores. Always respond with ONLY valid JSON format - no explanatory text, no markdown \
code blocks, no prefacing comments. Analyze each paper individually and provide unique scores \
based on its specific quality, completeness, and credibility. Start your response directly with \
the opening brace { and end with the closing brace }.

CRITICAL: Adjust the depth and detail of your analysis based on the academic level:
- HIGH SCHOOL: Simple language, basic explanations, concise summaries
- UNDERGRADUATE: Moderate technical detail, clear explanations with context
- GRADUATE: Comprehensive technical analysis, detailed methodology discussion
- PROFESSOR: Extensive expert-level analysis, critical evaluation, detailed technical assessment

The verbosity and technical depth should increase significantly from high school to professor \
level.";

/// System message of the chat assistant.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for PaperLenz, a platform \
that helps users understand scientific papers. You can:

1. Answer questions about PaperLenz features and how to use the platform
2. Provide general guidance about scientific research and papers
3. Help users understand research concepts and terminology
4. Explain how to interpret analysis results from PaperLenz
5. Suggest best practices for academic research

Keep your responses concise, helpful, and friendly. If users ask about specific papers, remind \
them that you can provide general guidance but they should use the main analysis feature for \
detailed paper analysis.

Platform features include:
- AI-powered paper analysis with multiple input methods (DOI, abstract, PDF)
- Academic level adaptation (high school to professor level)
- Comprehensive analysis including credibility scores, key insights, and improvement suggestions
- Report generation
- Paper history and note-taking
- Dashboard for managing analyzed papers";

/// Opening paragraph of the analysis prompt for each level.
pub fn level_instructions(level: AcademicLevel) -> &'static str {
  match level {
    AcademicLevel::HighSchool =>
      "Explain this scientific paper in simple terms suitable for high school students. Use \
       basic vocabulary and clear examples. Keep explanations concise but comprehensive. Focus \
       on making complex concepts accessible through analogies and everyday language.",
    AcademicLevel::Undergraduate =>
      "Analyze this paper for undergraduate students. Use appropriate scientific terminology \
       with clear explanations. Provide moderate detail in each section, explaining \
       methodologies and results with sufficient context. Include background information that \
       helps understand the research significance. Each analysis section should be 2-3 detailed \
       paragraphs.",
    AcademicLevel::Graduate =>
      "Provide a comprehensive analysis suitable for graduate students. Include detailed \
       technical explanations, research methodology insights, and critical evaluation of \
       approaches. Discuss limitations and improvements with specific technical reasoning. Each \
       analysis section should be 3-4 detailed paragraphs with in-depth explanations of \
       methodologies, statistical approaches, and research implications. Include discussion of \
       how this work fits into the broader research landscape.",
    AcademicLevel::Professor =>
      "Deliver a thorough academic analysis for professors and researchers. Include extensive \
       critical evaluation, detailed methodological assessment, comprehensive discussion of \
       research implications, and expert-level insights. Provide detailed analysis of \
       experimental design, statistical validity, and theoretical contributions. Each analysis \
       section should be 4-5 comprehensive paragraphs with expert-level technical detail, \
       critical assessment of methodology rigor, discussion of potential confounding factors, \
       and detailed evaluation of the research's contribution to the field. Include suggestions \
       for future research directions and potential collaborations.",
  }
}

/// Paragraphs per section demanded at each level, as stated in the depth table.
fn depth_table() -> &'static str {
  "IMPORTANT: Adjust the depth and detail of ALL analysis sections based on the academic level:
- For HIGH SCHOOL: Keep explanations simple and concise (1-2 paragraphs per section)
- For UNDERGRADUATE: Provide moderate detail with clear explanations (2-3 paragraphs per section)
- For GRADUATE: Include comprehensive technical details and critical analysis (3-4 paragraphs per section)
- For PROFESSOR: Deliver extensive expert-level analysis with thorough evaluation (4-5 paragraphs per section)"
}

/// The JSON skeleton the model must fill in, with per-level hints on the free-text fields.
fn schema_skeleton(level: AcademicLevel) -> String {
  format!(
    r#"{{
  "one_line_summary": "This paper studies how X affects Y using Z method and finds that A improves B by C%.",
  "abstract_summary": "Detailed summary of the paper's abstract and main findings based on the actual content - adjust detail level for {level} level",
  "aim_of_paper": "The specific research objectives and goals of THIS study - provide {level}-appropriate detail",
  "methodology_technology_used": "Detailed description of the ACTUAL research methods, technologies, tools, and approaches used in THIS paper - expand detail significantly for higher academic levels",
  "results_obtained": "Comprehensive summary of the ACTUAL findings, data, and outcomes from THIS paper - include statistical details and significance for higher levels",
  "observations": "Key observations, patterns, and insights discovered in THIS specific research - provide deeper analysis for graduate/professor levels",
  "limitations_detailed": ["Specific limitation 1 from THIS paper", "Specific limitation 2 from THIS paper", "Specific limitation 3 from THIS paper"],
  "methodology_improvements": ["Specific improvement suggestion 1 for THIS paper", "Specific improvement suggestion 2 for THIS paper", "Specific improvement suggestion 3 for THIS paper"],
  "section_completeness": {{
    "abstract": [ANALYZE ACTUAL ABSTRACT QUALITY: Rate 1-10 based on how complete and informative the abstract is],
    "introduction": [ANALYZE ACTUAL INTRODUCTION: Rate 1-10 based on background provided and problem statement clarity],
    "literature_review": [ANALYZE ACTUAL LITERATURE REVIEW: Rate 1-10 based on comprehensiveness of related work coverage],
    "methodology": [ANALYZE ACTUAL METHODOLOGY: Rate 1-10 based on detail and clarity of methods described],
    "results": [ANALYZE ACTUAL RESULTS: Rate 1-10 based on completeness and clarity of findings presentation],
    "discussion": [ANALYZE ACTUAL DISCUSSION: Rate 1-10 based on interpretation and implications provided],
    "conclusion": [ANALYZE ACTUAL CONCLUSION: Rate 1-10 based on how well conclusions are supported and future work is outlined]
  }},
  "paper_quality_score": {{
    "total": [CALCULATE ACTUAL TOTAL: Sum of all components below],
    "grammar": [ANALYZE ACTUAL GRAMMAR: Rate 1-20 based on language quality, sentence structure, and clarity],
    "structure": [ANALYZE ACTUAL STRUCTURE: Rate 1-20 based on logical flow, organization, and section coherence],
    "readability": [ANALYZE ACTUAL READABILITY: Rate 1-20 based on how easy it is to understand for the target audience],
    "argument_clarity": [ANALYZE ACTUAL ARGUMENTS: Rate 1-20 based on how clearly the research questions, hypotheses, and conclusions are presented],
    "referencing": [ANALYZE ACTUAL REFERENCES: Rate 1-20 based on citation quality, relevance, and completeness]
  }},
  "core_concepts": ["Extract 4-6 ACTUAL key concepts/terms from THIS specific paper"],
  "glossary": [{{"term": "ACTUAL technical term from the paper", "definition": "clear definition based on context"}}],
  "credibility_analysis": {{
    "score": [ANALYZE ACTUAL CREDIBILITY: Rate 1-100 based on methodology rigor, data quality, author credentials, journal quality if available],
    "factors": ["ACTUAL credibility factor 1 from THIS paper", "ACTUAL credibility factor 2 from THIS paper"],
    "journal_impact": "Assess journal quality if mentioned, otherwise rate based on research quality: High/Medium/Low",
    "citation_count": [If available in the paper, otherwise omit this field]
  }},
  "citations": {{
    "apa": "Generate ACTUAL APA format citation for THIS specific paper",
    "mla": "Generate ACTUAL MLA format citation for THIS specific paper",
    "ieee": "Generate ACTUAL IEEE format citation for THIS specific paper"
  }}
}}"#
  )
}

/// Builder for the analysis prompt.
#[derive(Debug, Clone)]
pub struct AnalysisPrompt<'a> {
  /// Paper text, abstract, or DOI reference
  content:    &'a str,
  /// Audience of the analysis
  level:      AcademicLevel,
  /// Optional paper title
  title:      Option<&'a str>,
  /// Optional input type, echoed to the model
  input_type: Option<InputType>,
}

impl<'a> AnalysisPrompt<'a> {
  /// Starts a prompt for `content` written for `level`.
  pub fn new(content: &'a str, level: AcademicLevel) -> Self {
    Self { content, level, title: None, input_type: None }
  }

  /// Names the paper in the prompt.
  pub fn with_title(mut self, title: &'a str) -> Self {
    self.title = Some(title);
    self
  }

  /// Optionally names the paper in the prompt.
  pub fn with_optional_title(mut self, title: Option<&'a str>) -> Self {
    self.title = title;
    self
  }

  /// Tells the model how the paper was submitted.
  pub fn with_input_type(mut self, input_type: InputType) -> Self {
    self.input_type = Some(input_type);
    self
  }

  /// Renders the prompt.
  pub fn build(&self) -> String {
    let level = self.level;
    let mut prompt = String::with_capacity(6 * 1024 + self.content.len());

    prompt.push_str(level_instructions(level));
    prompt.push_str(
      "\n\nCRITICAL INSTRUCTIONS:
1. You must analyze the ACTUAL content provided and generate PERSONALIZED scores based on the specific paper
2. Do NOT use generic or template scores - each paper should have unique scores based on its actual quality, completeness, and credibility
3. RESPOND ONLY WITH VALID JSON - no explanatory text, no markdown, no code blocks
4. Do not start your response with any explanatory text\n\n",
    );
    prompt.push_str(depth_table());
    prompt.push_str(&format!(
      "\n\nPlease analyze the following scientific paper and provide a structured response in \
       JSON format with these exact fields. IMPORTANT: All scores must be based on the actual \
       analysis of THIS specific paper, and the detail level must match the academic level \
       ({level}):\n\n"
    ));
    prompt.push_str(&schema_skeleton(level));
    prompt.push_str(&format!(
      "\n\nREMEMBER: Every score, rating, and analysis point must be based on the ACTUAL content \
       of this specific paper. Adjust the verbosity and technical depth of explanations to match \
       the {level} academic level.\n\nPaper content:\n{}\n",
      self.content
    ));

    if let Some(title) = self.title {
      prompt.push_str(&format!("\nPaper title: {title}\n"));
    }
    if let Some(input_type) = self.input_type {
      prompt.push_str(&format!("\nInput type: {input_type}\n"));
    }

    prompt.push_str("\nREMEMBER: Respond ONLY with the JSON object. No explanatory text before or after.");
    prompt
  }
}

/// Builds the analysis prompt for `content` at `level`, naming the paper when a title is given.
pub fn build_analysis_prompt(content: &str, level: AcademicLevel, title: Option<&str>) -> String {
  AnalysisPrompt::new(content, level).with_optional_title(title).build()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_levels_produce_different_prompts() {
    let high_school = build_analysis_prompt("Abstract X", AcademicLevel::HighSchool, None);
    let professor = build_analysis_prompt("Abstract X", AcademicLevel::Professor, None);
    assert_ne!(high_school, professor);
    assert!(high_school.contains("high school students"));
    assert!(professor.contains("professors and researchers"));
  }

  #[test]
  fn test_every_level_has_distinct_instructions() {
    let mut seen = std::collections::HashSet::new();
    for level in AcademicLevel::ALL {
      assert!(seen.insert(level_instructions(level)));
    }
  }

  #[test]
  fn test_prompt_embeds_schema_and_ranges() {
    let prompt = build_analysis_prompt("content", AcademicLevel::Graduate, None);
    for field in [
      "one_line_summary",
      "abstract_summary",
      "aim_of_paper",
      "methodology_technology_used",
      "results_obtained",
      "observations",
      "limitations_detailed",
      "methodology_improvements",
      "section_completeness",
      "literature_review",
      "paper_quality_score",
      "argument_clarity",
      "referencing",
      "core_concepts",
      "glossary",
      "credibility_analysis",
      "journal_impact",
      "citation_count",
      "citations",
      "ieee",
    ] {
      assert!(prompt.contains(&format!("\"{field}\"")), "missing field {field}");
    }
    assert!(prompt.contains("Rate 1-10"));
    assert!(prompt.contains("Rate 1-20"));
    assert!(prompt.contains("Rate 1-100"));
    assert!(prompt.contains("(graduate)"));
  }

  #[test]
  fn test_title_and_input_type_are_optional() {
    let without = build_analysis_prompt("Abstract X", AcademicLevel::Undergraduate, None);
    assert!(!without.contains("Paper title:"));
    assert!(!without.contains("Input type:"));

    let with = AnalysisPrompt::new("Abstract X", AcademicLevel::Undergraduate)
      .with_title("A Study")
      .with_input_type(InputType::Abstract)
      .build();
    assert!(with.contains("Paper content:\nAbstract X\n"));
    assert!(with.contains("Paper title: A Study"));
    assert!(with.contains("Input type: abstract"));
  }

  #[test]
  fn test_prompt_is_deterministic() {
    let a = build_analysis_prompt("same", AcademicLevel::Professor, Some("T"));
    let b = build_analysis_prompt("same", AcademicLevel::Professor, Some("T"));
    assert_eq!(a, b);
  }
}
