//! Structured language-model analysis of scientific papers.
//!
//! `paperlenz` takes a paper submission (a DOI, a pasted abstract, or an uploaded PDF), asks a
//! chat-completions language model for a fixed-schema analysis tuned to the reader's academic
//! level, and turns the model's loosely formatted reply into a validated [`AnalysisRecord`].
//!
//! - Prompt construction per academic level
//! - Response sanitizing and JSON extraction
//! - Quality score reconciliation
//! - An analysis workflow with progress states and a fallback backend
//! - Local storage of analyzed papers with notes
//! - Dashboard statistics, Markdown reports and a chat assistant
//!
//! # Getting Started
//!
//! ```no_run
//! use paperlenz::{
//!   analysis::AnalysisRecord,
//!   prompt::build_analysis_prompt,
//!   paper::AcademicLevel,
//!   sanitize::SanitizeStrategy,
//! };
//!
//! let prompt = build_analysis_prompt("Abstract text", AcademicLevel::Graduate, Some("A Title"));
//! // ... send `prompt` to a model, then:
//! let reply = "```json\n{ ... }\n```";
//! let record = AnalysisRecord::from_llm_response(reply, SanitizeStrategy::Heuristic);
//! ```
//!
//! # Module Organization
//!
//! - [`analysis`]: The analysis record schema and score reconciliation
//! - [`prompt`]: Academic-level prompt templates
//! - [`sanitize`]: Extraction of JSON from model replies
//! - [`llm`]: Chat-completions client
//! - [`analyzer`]: The analysis service behind the remote endpoint
//! - [`backend`]: Client-side ways of reaching the analysis service
//! - [`orchestrator`]: Submission workflow and its state machine
//! - [`database`]: SQLite storage of users and papers
//! - [`auth`]: Session state container and profile resolution
//! - [`dashboard`]: Filtering and statistics over a user's papers
//! - [`chat`]: Conversational assistant
//! - [`pdf`]: PDF text extraction
//! - [`report`]: Markdown report rendering
//! - [`server`]: HTTP service exposing the analysis and chat endpoints
//! - [`config`]: File and environment configuration

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};
use url::Url;
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod analysis;
pub mod analyzer;
pub mod auth;
pub mod backend;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod paper;
pub mod pdf;
pub mod prompt;
pub mod report;
pub mod sanitize;
pub mod server;

use crate::{
  analysis::AnalysisRecord,
  error::*,
  paper::{AcademicLevel, InputType},
};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use paperlenz::{
///   database::{Database, Query},
///   prelude::*,
/// };
///
/// async fn example() -> Result<(), PaperLenzError> {
///   let mut db = Database::open(Database::default_path()).await?;
///   let papers = Query::for_user("user-id").execute(&mut db).await?;
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    backend::AnalysisBackend,
    database::{DatabaseInstruction, PaperStore},
    error::PaperLenzError,
  };
}
