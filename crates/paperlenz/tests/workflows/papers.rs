use chrono::Utc;
use paperlenz::{
  dashboard::{DashboardStats, PaperFilter},
  database::{Add, Database, Query, Remove, UpdateNotes},
  paper::{NewPaper, Paper},
  report::Report,
};

use super::*;

fn new_paper(user_id: &str, title: &str, input_type: InputType, credibility: u32) -> NewPaper {
  let mut analysis = analysis_record();
  analysis.credibility_analysis.score = credibility;
  NewPaper {
    user_id: user_id.into(),
    title: title.into(),
    doi: (input_type == InputType::Doi).then(|| "10.1000/xyz123".to_string()),
    abstract_text: (input_type == InputType::Abstract).then(|| "An abstract.".to_string()),
    input_type,
    academic_level: AcademicLevel::Graduate,
    analysis,
  }
}

async fn seeded_database(dir: &TempDir) -> TestResult<(Database, Vec<Paper>)> {
  let mut db = Database::open(dir.path().join("papers.db")).await?;
  let mut papers = Vec::new();
  for paper in [
    new_paper("ada", "Spaced repetition in physics", InputType::Abstract, 84),
    new_paper("ada", "Retrieval practice at scale", InputType::Doi, 71),
    new_paper("ada", "Interleaving in mathematics", InputType::Pdf, 90),
    new_paper("grace", "Compilers for the masses", InputType::Doi, 65),
  ] {
    papers.push(Add::paper(paper).execute(&mut db).await?);
  }
  Ok((db, papers))
}

#[tokio::test]
async fn test_dashboard_over_stored_papers() -> TestResult {
  let dir = tempdir()?;
  let (mut db, _) = seeded_database(&dir).await?;

  let papers = Query::for_user("ada").execute(&mut db).await?;
  let titles: Vec<_> = papers.iter().map(|paper| paper.title.as_str()).collect();
  assert_eq!(titles, [
    "Interleaving in mathematics",
    "Retrieval practice at scale",
    "Spaced repetition in physics"
  ]);

  let hits = PaperFilter::new().with_search("IN").apply(&papers);
  assert_eq!(hits.len(), 2);
  let hits =
    PaperFilter::new().with_search("in").with_input_type(Some(InputType::Pdf)).apply(&papers);
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].title, "Interleaving in mathematics");

  let stats = DashboardStats::compute(&papers, Utc::now());
  assert_eq!(stats.total_papers, 3);
  assert_eq!(stats.average_credibility, 82);
  assert_eq!(stats.papers_with_notes, 0);
  assert!(stats.days_since_last_analysis <= 1);

  let doi_only = Query::for_user("ada").with_input_type(InputType::Doi).execute(&mut db).await?;
  assert_eq!(doi_only.len(), 1);
  Ok(())
}

#[tokio::test]
async fn test_notes_and_removal_are_owner_scoped() -> TestResult {
  let dir = tempdir()?;
  let (mut db, papers) = seeded_database(&dir).await?;
  let graces = &papers[3];

  let err = UpdateNotes::new("ada", &graces.id, Some("mine now".into()))
    .execute(&mut db)
    .await
    .unwrap_err();
  assert!(matches!(err, PaperLenzError::NotFound));

  let updated =
    UpdateNotes::new("ada", &papers[0].id, Some("Cite in chapter 2".into())).execute(&mut db).await?;
  assert_eq!(updated.notes.as_deref(), Some("Cite in chapter 2"));
  let stats =
    DashboardStats::compute(&Query::for_user("ada").execute(&mut db).await?, Utc::now());
  assert_eq!(stats.papers_with_notes, 1);

  assert!(Remove::paper("ada", &graces.id).execute(&mut db).await?.is_empty());
  let removed = Remove::paper("grace", &graces.id).execute(&mut db).await?;
  assert_eq!(removed.len(), 1);
  assert!(Query::for_user("grace").execute(&mut db).await?.is_empty());
  assert_eq!(Query::for_user("ada").execute(&mut db).await?.len(), 3);
  Ok(())
}

#[tokio::test]
async fn test_report_of_stored_paper() -> TestResult {
  let dir = tempdir()?;
  let (mut db, papers) = seeded_database(&dir).await?;

  let paper = Query::by_id("ada", &papers[1].id).fetch_one(&mut db).await?;
  let report = Report::for_paper(&paper).to_string();

  assert!(report.starts_with("# Retrieval practice at scale\n"));
  assert!(report.contains("**Academic level:** GRADUATE"));
  assert!(report.contains("**DOI:** 10.1000/xyz123"));
  assert!(report.contains("## Limitations\n\n- Single institution\n- One semester of follow-up"));
  assert!(report.contains("**Total:** 78/100"));
  assert!(report.contains("**Score:** 71/100"));
  assert!(report.contains("**APA:** Doe, J. (2024). Spacing."));
  Ok(())
}
