//! Error types of the `paperlenz` binary.

use thiserror::Error;

use super::*;

/// Errors that end a command.
#[derive(Error, Debug)]
pub enum PaperLenzdError {
  /// Anything the library reports.
  #[error(transparent)]
  PaperLenz(#[from] PaperLenzError),

  /// A prompt could not be shown or answered.
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),

  /// Reading input or writing output failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// Serializing output failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// No configuration file at the given path.
  #[error("Configuration not found at {}, run `paperlenz init` first", .0.display())]
  NotInitialized(PathBuf),
}

/// Result alias of the binary.
pub type Result<T> = std::result::Result<T, PaperLenzdError>;
