// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Resumable-run support (spec §2 "supplemented features"): a small JSON
//! snapshot of which stages have completed, plus a cooperative cancellation
//! flag checked between stages. Modeled on the checkpoint/cancel-token split
//! in the sibling Rust Takeout port (`jl1nie-gpth-rs`'s `Checkpoint` /
//! `CancellationToken`), adapted to this pipeline's numbered stages.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Which of the eight stages have already run to completion. Stage numbers
/// match `pipeline::run_resumable`'s call sites (1..=8).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProgressDocument {
  completed_stages: Vec<u8>,
  completed: bool,
}

impl ProgressDocument {
  pub fn new() -> Self {
    Self::default()
  }

  /// Loads a progress document from `path`, or starts a fresh one if the
  /// file does not exist yet. A present-but-corrupt file is an error rather
  /// than silently discarded, so a damaged resume doesn't quietly restart.
  pub fn load_or_new(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Ok(Self::new());
    }
    let body = std::fs::read_to_string(path).map_err(|e| PipelineError::OutputDirCreate(path.to_path_buf(), e))?;
    serde_json::from_str(&body).map_err(|e| PipelineError::ProgressDocumentCorrupt(path.to_path_buf(), e))
  }

  pub fn is_stage_complete(&self, stage_number: u8) -> bool {
    self.completed_stages.contains(&stage_number)
  }

  pub fn mark_stage_complete(&mut self, stage_number: u8) {
    if !self.is_stage_complete(stage_number) {
      self.completed_stages.push(stage_number);
    }
  }

  pub fn mark_completed(&mut self) {
    self.completed = true;
  }

  /// Writes the document to `path`, via a sibling temp file renamed into
  /// place so a crash mid-save never leaves a half-written snapshot.
  pub fn save(&self, path: &Path) -> Result<()> {
    let body = serde_json::to_vec_pretty(self).expect("ProgressDocument serializes");
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &body).map_err(|e| PipelineError::OutputDirCreate(path.to_path_buf(), e))?;
    std::fs::rename(&tmp, path).map_err(|e| PipelineError::OutputDirCreate(path.to_path_buf(), e))?;
    Ok(())
  }
}

/// A cooperative, cloneable cancel flag. A signal handler (or a UI "stop"
/// button) calls [`CancellationToken::cancel`]; `pipeline::run_resumable`
/// calls [`CancellationToken::check`] between stages.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
  flag: Arc<AtomicBool>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }

  pub fn check(&self) -> Result<()> {
    if self.is_cancelled() { Err(PipelineError::Cancelled) } else { Ok(()) }
  }
}

#[cfg(test)]
mod test_progress_document {
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn round_trips_completed_stages_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");

    let mut progress = ProgressDocument::new();
    progress.mark_stage_complete(1);
    progress.mark_stage_complete(2);
    progress.save(&path).unwrap();

    let reloaded = ProgressDocument::load_or_new(&path).unwrap();
    assert!(reloaded.is_stage_complete(1));
    assert!(reloaded.is_stage_complete(2));
    assert!(!reloaded.is_stage_complete(3));
    assert!(!reloaded.completed);
  }

  #[test]
  fn missing_file_starts_fresh() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.json");
    let progress = ProgressDocument::load_or_new(&path).unwrap();
    assert!(!progress.is_stage_complete(1));
  }

  #[test]
  fn corrupt_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, b"not json").unwrap();
    assert!(ProgressDocument::load_or_new(&path).is_err());
  }
}

#[cfg(test)]
mod test_cancellation_token {
  use super::*;

  #[test]
  fn check_fails_after_cancel() {
    let token = CancellationToken::new();
    assert!(token.check().is_ok());
    token.cancel();
    assert!(token.check().is_err());
  }

  #[test]
  fn clones_share_the_same_flag() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
  }
}
