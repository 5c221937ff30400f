//! Command line front end and analysis service for PaperLenz.
//!
//! This crate provides the `paperlenz` binary on top of the [`paperlenz`] library. It supports:
//! - Setting up a configuration, a local database and a user profile
//! - Analyzing papers by DOI, abstract text or PDF, with live progress
//! - Browsing, annotating, exporting and removing analyzed papers
//! - Chatting with the research assistant
//! - Serving the analysis and chat endpoints over HTTP
//!
//! # Usage
//!
//! ```bash
//! # Create a configuration and database
//! paperlenz init --email me@example.org
//!
//! # Analyze a paper
//! paperlenz analyze --doi 10.1145/1327452.1327492 --level graduate
//! paperlenz analyze --pdf paper.pdf --title "MapReduce"
//!
//! # Browse what was analyzed
//! paperlenz list --search mapreduce
//! paperlenz show 3f1c...
//! paperlenz export 3f1c... --output mapreduce.md
//!
//! # Run the analysis service
//! paperlenz serve --bind 0.0.0.0:8787
//! ```
//!
//! Destructive operations ask for confirmation unless `--accept-defaults` is given. Logging
//! verbosity rises with each `-v`, and `RUST_LOG` overrides it.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use clap::{builder::ArgAction, Args, Parser, Subcommand, ValueEnum};
use console::style;
use paperlenz::{
  analysis::AnalysisRecord,
  auth::{AuthContext, Identity, User},
  config::Config,
  dashboard::DashboardStats,
  database::{Database, Query},
  error::PaperLenzError,
  paper::{AcademicLevel, InputType, Paper},
  prelude::*,
};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Structured LLM analysis of scientific papers")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses the default platform-specific
  /// configuration directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

impl Cli {
  /// The configuration file in use.
  fn config_path(&self) -> PathBuf { self.config.clone().unwrap_or_else(Config::default_path) }
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Dispatches the parsed command.
async fn run(cli: &Cli, interaction: &Terminal) -> Result<()> {
  let config_path = cli.config_path();
  trace!("Using configuration at {}", config_path.display());

  match &cli.command {
    Commands::Init(args) => init(interaction, &config_path, args.clone()).await,
    Commands::Serve(args) => serve(interaction, &config_path, args.clone()).await,
    command => {
      let mut session = Session::open(&config_path).await?;
      match command {
        Commands::Analyze(args) => analyze(interaction, &mut session, args.clone()).await,
        Commands::List(args) => list(interaction, &mut session, args.clone()).await,
        Commands::Show(args) => show(interaction, &mut session, args.clone()).await,
        Commands::Export(args) => export(interaction, &mut session, args.clone()).await,
        Commands::Notes(args) => notes(interaction, &mut session, args.clone()).await,
        Commands::Remove(args) => remove(interaction, &mut session, args.clone()).await,
        Commands::Stats => stats(interaction, &mut session).await,
        Commands::Chat(args) => chat(interaction, &session, args.clone()).await,
        Commands::Init(_) | Commands::Serve(_) => Ok(()),
      }
    },
  }
}

/// Entry point for the `paperlenz` binary
///
/// Parses arguments, sets up logging and runs the requested command. Errors are printed with the
/// error prefix and turn into a failing exit code.
#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let interaction = Terminal::new(cli.accept_defaults);
  match run(&cli, &interaction).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      debug!("Command failed: {e:?}");
      interaction.error(&e);
      ExitCode::FAILURE
    },
  }
}
