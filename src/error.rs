//! Error taxonomy for the pipeline.
//!
//! Per-entity failures (a single file that failed to hash, move, or have its
//! EXIF rewritten) are *not* represented here — they are recovered locally by
//! the stage that hit them and pushed onto that stage's [`crate::pipeline::StepResult`]
//! as a [`crate::pipeline::Failure`]. This enum is only for conditions that stop a
//! stage (or the whole pipeline) outright.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("{0}: directory does not exist")]
  InputNotFound(PathBuf),

  #[error("{0}: not enough free disk space (need {needed} bytes, have {available} bytes)", needed = .needed, available = .available)]
  InsufficientDiskSpace { path: PathBuf, needed: u64, available: u64 },

  #[error("{0}: failed to create output directory: {1}")]
  OutputDirCreate(PathBuf, std::io::Error),

  #[error("exiftool is not available and no native fallback applies: {0}")]
  ExifToolUnavailable(String),

  #[error("pipeline cancelled")]
  Cancelled,

  #[error("progress document at {0} is corrupt: {1}")]
  ProgressDocumentCorrupt(PathBuf, serde_json::Error),

  #[error("invariant violated: {0}")]
  Invariant(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
