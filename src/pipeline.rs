// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Pipeline driver (spec §2, §5): runs the eight stages in order over one
//! `MediaCollection`, threading a `ProcessingContext`, and honoring an
//! external cancellation flag between stages. Generalizes the teacher's
//! `commands::run` (a numbered, logged sequence of steps over an
//! `Organizer`) to the Takeout domain's collection-of-entities model.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::exiftool::ExifTool;
use crate::model::{MediaCollection, ProcessingContext};
use crate::progress::{CancellationToken, ProgressDocument};
use crate::{stages, strategies};

/// One per-item failure recovered locally by a stage (spec §7): never
/// propagated as a `Result::Err`, always counted and reported.
#[derive(Debug)]
pub struct Failure {
  pub path: PathBuf,
  pub category: FailureCategory,
  pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
  Discovery,
  Hashing,
  DateExtraction,
  ExtensionFix,
  Move,
  Copy,
  Shortcut,
  ExifTool,
  Timestamp,
}

impl FailureCategory {
  fn is_shortcut(self) -> bool {
    matches!(self, FailureCategory::Shortcut)
  }
}

/// Counters and failures a single stage produced (spec §2's `StepResult`).
#[derive(Debug, Default)]
pub struct StepResult {
  pub stage: &'static str,
  pub updated: usize,
  pub physical: usize,
  pub shortcuts: usize,
  pub failed: Vec<Failure>,
  pub duration: Duration,
}

impl StepResult {
  fn new(stage: &'static str) -> Self {
    Self { stage, ..Self::default_for(stage) }
  }

  fn default_for(stage: &'static str) -> Self {
    Self { stage, updated: 0, physical: 0, shortcuts: 0, failed: Vec::new(), duration: Duration::default() }
  }

  /// Renders the stage-end summary line (spec §7): `updated: N
  /// (physical=X, shortcuts=Y), failed: M (physical=…, shortcuts=…)`.
  pub fn summary_line(&self) -> String {
    let failed_shortcuts = self.failed.iter().filter(|f| f.category.is_shortcut()).count();
    let failed_physical = self.failed.len() - failed_shortcuts;
    format!(
      "{}: updated: {} (physical={}, shortcuts={}), failed: {} (physical={}, shortcuts={})",
      self.stage, self.updated, self.physical, self.shortcuts, self.failed.len(), failed_physical, failed_shortcuts
    )
  }
}

/// Runs stages 1–8 against `collection`, using `ctx` for configuration and
/// the optional ExifTool adapter. Returns one `StepResult` per stage that
/// actually ran.
pub fn run(ctx: &mut ProcessingContext, collection: &mut MediaCollection) -> Result<Vec<StepResult>> {
  run_resumable(ctx, collection, None, None)
}

/// Like [`run`], but persists a [`ProgressDocument`] after each stage (when
/// `progress_path` is given) and checks `cancel` between stages (spec §2
/// "supplemented features").
pub fn run_resumable(
  ctx: &mut ProcessingContext,
  collection: &mut MediaCollection,
  progress_path: Option<&std::path::Path>,
  cancel: Option<&CancellationToken>,
) -> Result<Vec<StepResult>> {
  verify_input_dir(&ctx.config)?;

  let mut progress = match progress_path {
    Some(path) => ProgressDocument::load_or_new(path)?,
    None => ProgressDocument::new(),
  };

  let mut results = Vec::new();

  stages::normalize_supplemental_metadata(ctx.input_dir());

  // Stage 1 renames files in place on the input tree before anything reads
  // it into a MediaCollection, so it runs ahead of discovery despite the
  // numbering (spec 4.1 operates on the filesystem directly, not on
  // entities).
  run_stage(&mut results, "extension-fix", 1, &progress, cancel, || Ok(stages::stage1_extension_fix::run(ctx)))?;
  persist(&mut progress, progress_path, 1)?;

  run_stage(&mut results, "discovery", 2, &progress, cancel, || {
    let (discovered, result) = stages::stage2_discovery::run(ctx)?;
    *collection = discovered;
    Ok(result)
  })?;
  persist(&mut progress, progress_path, 2)?;

  run_stage(&mut results, "dedup", 3, &progress, cancel, || Ok(stages::stage3_dedup::run(collection)))?;
  persist(&mut progress, progress_path, 3)?;

  run_stage(&mut results, "dates", 4, &progress, cancel, || Ok(stages::stage4_dates::run(ctx, collection)))?;
  persist(&mut progress, progress_path, 4)?;

  run_stage(&mut results, "albums", 5, &progress, cancel, || Ok(stages::stage5_albums::run(collection)))?;
  persist(&mut progress, progress_path, 5)?;

  let mut strategy = strategies::for_config(&ctx.config);
  strategy.validate_context(ctx)?;
  run_stage(&mut results, "materialize", 6, &progress, cancel, || stages::stage6_materialize::run(ctx, collection, strategy.as_mut()))?;
  persist(&mut progress, progress_path, 6)?;

  if ctx.config.write_exif {
    run_stage(&mut results, "exif-writeback", 7, &progress, cancel, || Ok(stages::stage7_exif_writeback::run(ctx, collection)))?;
  }
  persist(&mut progress, progress_path, 7)?;

  if ctx.config.update_creation_time {
    run_stage(&mut results, "timestamps", 8, &progress, cancel, || Ok(stages::stage8_timestamps::run(ctx, collection)))?;
  }
  persist(&mut progress, progress_path, 8)?;

  if let Some(path) = progress_path {
    progress.mark_completed();
    progress.save(path)?;
  }

  Ok(results)
}

fn run_stage(
  results: &mut Vec<StepResult>,
  name: &'static str,
  stage_number: u8,
  progress: &ProgressDocument,
  cancel: Option<&CancellationToken>,
  f: impl FnOnce() -> Result<StepResult>,
) -> Result<()> {
  if progress.is_stage_complete(stage_number) {
    log::info!("stage {name} already complete, skipping (resume)");
    return Ok(());
  }

  if let Some(token) = cancel {
    token.check()?;
  }

  let start = Instant::now();
  let mut result = f()?;
  result.duration = start.elapsed();
  log::info!("{}", result.summary_line());
  results.push(result);
  Ok(())
}

fn persist(progress: &mut ProgressDocument, path: Option<&std::path::Path>, stage_number: u8) -> Result<()> {
  progress.mark_stage_complete(stage_number);
  if let Some(path) = path {
    progress.save(path)?;
  }
  Ok(())
}

fn verify_input_dir(config: &PipelineConfig) -> Result<()> {
  if !config.input_dir.is_dir() {
    return Err(PipelineError::InputNotFound(config.input_dir.clone()));
  }
  Ok(())
}

/// Constructs the `ExifTool` adapter named by `config`, if the binary is
/// discoverable; `None` means stage 7 falls back to the native writer.
pub fn discover_exiftool(config: &PipelineConfig) -> Option<Box<dyn ExifTool>> {
  use crate::exiftool::adapter::PersistentExifTool;

  let binary = PersistentExifTool::discover_binary(config.exiftool_path.as_deref(), config.exiftool_path.as_deref())?;
  match PersistentExifTool::spawn(&binary) {
    Ok(tool) => Some(Box::new(tool)),
    Err(e) => {
      log::warn!("exiftool unavailable, falling back to native writer: {e}");
      None
    }
  }
}
