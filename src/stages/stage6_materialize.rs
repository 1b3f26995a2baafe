// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Output materialization (spec 4.6): a disk-space preflight, the
//! special-folder pre-pass that special-folder-4.6.4 describes as applying
//! uniformly to every strategy, then per-entity dispatch into whichever
//! `MovingStrategy` the config selected, and a final `finalize` pass.

use std::path::{Path, PathBuf};

use crate::config::constants;
use crate::error::{PipelineError, Result};
use crate::file_ops::FileOpsService;
use crate::model::{MediaCollection, MediaEntity, ProcessingContext};
use crate::pipeline::{Failure, FailureCategory, StepResult};
use crate::platform::{self, Platform};
use crate::strategies::{FailureKind, MoveOutcome, MoveResult, MovingStrategy};

pub fn run(ctx: &mut ProcessingContext, collection: &mut MediaCollection, strategy: &mut dyn MovingStrategy) -> Result<StepResult> {
  let mut result = StepResult { stage: "materialize", ..Default::default() };

  let platform = platform::current();
  verify_disk_space(ctx, collection, &*platform)?;

  let mut file_ops = FileOpsService::new();
  extract_special_folders(ctx, collection, &mut file_ops, &mut result);

  for entity in collection.iter_mut() {
    let outcomes = strategy.process_entity(entity, ctx, &mut file_ops, &*platform);
    apply_outcomes(outcomes, &mut result);
  }

  let outcomes = strategy.finalize(ctx, collection);
  apply_outcomes(outcomes, &mut result);

  Ok(result)
}

/// Sums the size of every not-yet-settled file and compares it against free
/// space at the output root, aborting the pipeline (rather than counting a
/// per-file failure) since a mid-run out-of-space condition can't be
/// recovered from per-entity.
fn verify_disk_space(ctx: &ProcessingContext, collection: &MediaCollection, platform: &dyn Platform) -> Result<()> {
  let needed: u64 = collection
    .iter()
    .flat_map(MediaEntity::all_files)
    .filter(|f| !f.is_moved() && !f.is_deleted())
    .filter_map(|f| std::fs::metadata(f.source_path()).ok())
    .map(|meta| meta.len())
    .sum();

  let available = platform.free_space(ctx.output_dir()).unwrap_or(u64::MAX);
  if needed > available {
    return Err(PipelineError::InsufficientDiskSpace { path: ctx.output_dir().to_path_buf(), needed, available });
  }
  Ok(())
}

/// Moves every not-yet-settled file whose path (relative to the input root)
/// has a segment matching a special-folder name into `Special Folders/<Name>`
/// (spec 4.6.4), so strategy dispatch below never sees it.
fn extract_special_folders(ctx: &ProcessingContext, collection: &mut MediaCollection, file_ops: &mut FileOpsService, result: &mut StepResult) {
  let input_dir = ctx.input_dir().to_path_buf();
  for entity in collection.iter_mut() {
    for file in entity.all_files_mut() {
      if file.is_moved() || file.is_deleted() {
        continue;
      }
      let Some(special) = special_folder_name(&input_dir, file.source_path()) else { continue };

      let dst_dir = ctx.output_for(Path::new("Special Folders").join(special));
      match file_ops.move_file(file.source_path(), &dst_dir, None) {
        Ok(target) => {
          file.mark_moved(target);
          result.updated += 1;
          result.physical += 1;
        }
        Err(e) => {
          result.failed.push(Failure { path: file.source_path().to_path_buf(), category: FailureCategory::Move, message: e.to_string() });
        }
      }
    }
  }
}

fn special_folder_name(input_dir: &Path, path: &Path) -> Option<&'static str> {
  let relative = path.strip_prefix(input_dir).unwrap_or(path);
  relative.components().find_map(|c| {
    let segment = c.as_os_str().to_str()?;
    constants::SPECIAL_FOLDER_NAMES.iter().find(|name| name.eq_ignore_ascii_case(segment)).copied()
  })
}

fn apply_outcomes(outcomes: Vec<MoveResult>, result: &mut StepResult) {
  for move_result in outcomes {
    // `MoveResult` carries no source path, only the role it was playing;
    // that's all a failure record can anchor to here.
    let path = PathBuf::from(move_result.role);
    match move_result.outcome {
      MoveOutcome::Moved(_) | MoveOutcome::Copied(_) | MoveOutcome::DuplicateCopyCreated(_) => {
        result.updated += 1;
        result.physical += 1;
      }
      MoveOutcome::ShortcutCreated(_) => {
        result.updated += 1;
        result.shortcuts += 1;
      }
      MoveOutcome::Deleted => {
        result.updated += 1;
      }
      MoveOutcome::Failed { kind, message } => {
        let category = match kind {
          FailureKind::Move | FailureKind::Delete => FailureCategory::Move,
          FailureKind::Copy => FailureCategory::Copy,
          FailureKind::Shortcut => FailureCategory::Shortcut,
        };
        result.failed.push(Failure { path, category, message });
      }
    }
  }
}
