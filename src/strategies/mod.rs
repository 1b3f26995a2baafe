// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Album-handling strategies (spec 4.6.5): five mutually exclusive policies
//! dispatched from a tagged `AlbumBehavior` variant (spec §9), each
//! implementing the same `MovingStrategy` capability set.

pub mod duplicate_copy;
pub mod ignore_albums;
pub mod json_strategy;
pub mod nothing;
pub mod reverse_shortcut;
pub mod shortcut;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::{AlbumBehavior, PipelineConfig};
use crate::file_ops::FileOpsService;
use crate::model::{AlbumEntity, FileEntity, MediaCollection, MediaEntity, ProcessingContext};
use crate::platform::Platform;

/// Outcome of one file's handling within a strategy's `process_entity` or
/// `finalize` pass. Failures are recovered locally (spec §7) and reported
/// as part of the outcome rather than propagated.
pub enum MoveOutcome {
  Moved(PathBuf),
  Copied(PathBuf),
  ShortcutCreated(PathBuf),
  DuplicateCopyCreated(PathBuf),
  Deleted,
  Failed { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  Move,
  Copy,
  Shortcut,
  Delete,
}

/// One record in the lazy stream spec §9 describes `process_entity` as
/// yielding; `role` names what the file was doing (`"primary"`,
/// `"secondary:AlbumName"`, `"anchor"`, …) for the stage-end summary line.
pub struct MoveResult {
  pub role: &'static str,
  pub outcome: MoveOutcome,
}

impl MoveResult {
  pub fn is_failure(&self) -> bool {
    matches!(self.outcome, MoveOutcome::Failed { .. })
  }
}

/// The five strategies' shared capability set (spec §9).
pub trait MovingStrategy {
  fn name(&self) -> &'static str;
  fn creates_shortcuts(&self) -> bool;
  fn creates_duplicates(&self) -> bool;

  /// Processes one entity's files, returning every move/copy/shortcut/delete
  /// outcome it produced.
  fn process_entity(
    &mut self,
    entity: &mut MediaEntity,
    ctx: &ProcessingContext,
    file_ops: &mut FileOpsService,
    platform: &dyn Platform,
  ) -> Vec<MoveResult>;

  /// Called once after every entity has been processed. Only the JSON
  /// strategy uses this, to write `albums-info.json`.
  fn finalize(&mut self, _ctx: &ProcessingContext, _entities: &MediaCollection) -> Vec<MoveResult> {
    Vec::new()
  }

  /// Pre-flight check; e.g. the JSON strategy could reject a read-only
  /// output root. The default accepts any context.
  fn validate_context(&self, _ctx: &ProcessingContext) -> crate::error::Result<()> {
    Ok(())
  }
}

/// Builds the strategy named by `config.album_behavior`.
pub fn for_config(config: &PipelineConfig) -> Box<dyn MovingStrategy> {
  match config.album_behavior {
    AlbumBehavior::Shortcut => Box::new(shortcut::ShortcutStrategy),
    AlbumBehavior::DuplicateCopy => Box::new(duplicate_copy::DuplicateCopyStrategy),
    AlbumBehavior::ReverseShortcut => Box::new(reverse_shortcut::ReverseShortcutStrategy),
    AlbumBehavior::Json => Box::new(json_strategy::JsonStrategy::default()),
    AlbumBehavior::Nothing => Box::new(nothing::NothingStrategy),
    AlbumBehavior::IgnoreAlbums => Box::new(ignore_albums::IgnoreAlbumsStrategy),
  }
}

/// A `MediaEntity`'s files addressed by a 0-based index over "primary, then
/// secondaries in order" — the combined numbering every strategy in this
/// module uses to pick a best file without holding two `&mut` borrows at
/// once.
pub(crate) fn file_at(entity: &MediaEntity, index: usize) -> &FileEntity {
  if index == 0 { entity.primary_file() } else { &entity.secondary_files()[index - 1] }
}

pub(crate) fn file_at_mut(entity: &mut MediaEntity, index: usize) -> &mut FileEntity {
  if index == 0 { entity.primary_file_mut() } else { &mut entity.secondary_files_mut()[index - 1] }
}

pub(crate) fn file_count(entity: &MediaEntity) -> usize {
  1 + entity.secondary_files().len()
}

/// Every combined index into `entity`'s files not yet moved or deleted
/// (i.e. still eligible for this strategy to act on — spec 4.6.4 special
/// folders are pulled out before strategies run).
pub(crate) fn available_indices(entity: &MediaEntity) -> Vec<usize> {
  (0..file_count(entity)).filter(|&i| !is_settled(file_at(entity, i))).collect()
}

fn is_settled(file: &FileEntity) -> bool {
  file.is_moved() || file.is_deleted()
}

/// Best-ranked (spec 4.6.5) index among `indices`, or `None` if empty.
pub(crate) fn best_ranked(entity: &MediaEntity, indices: &[usize]) -> Option<usize> {
  indices.iter().copied().min_by_key(|&i| file_at(entity, i).ranking())
}

/// The `AlbumEntity` whose `source_directories` contains this file's parent
/// directory, i.e. the album this physical copy was discovered under.
pub(crate) fn owning_album<'a>(entity: &'a MediaEntity, file: &FileEntity) -> Option<&'a AlbumEntity> {
  let parent = file.source_path().parent()?;
  entity.albums_map().values().find(|album| album.source_directories().contains(parent))
}

/// Where a file ended up after [`place`]: under `copy_mode` the source
/// survives, otherwise it's relocated. Every strategy reports whichever
/// actually happened rather than assuming "move".
pub(crate) enum Placement {
  Moved(PathBuf),
  Copied(PathBuf),
}

impl Placement {
  pub(crate) fn into_outcome(self) -> MoveOutcome {
    match self {
      Placement::Moved(p) => MoveOutcome::Moved(p),
      Placement::Copied(p) => MoveOutcome::Copied(p),
    }
  }
}

/// Moves (or, under `config.copy_mode`, copies) `src` into `dst_dir`,
/// applying the file-operation service's collision policy.
pub(crate) fn place(
  file_ops: &mut FileOpsService,
  ctx: &ProcessingContext,
  src: &Path,
  dst_dir: &Path,
  date: Option<NaiveDateTime>,
) -> std::io::Result<Placement> {
  if ctx.config.copy_mode {
    file_ops.copy_file(src, dst_dir, date).map(Placement::Copied)
  } else {
    file_ops.move_file(src, dst_dir, date).map(Placement::Moved)
  }
}

/// Deletes `src` from the input tree, unless `config.copy_mode` says the
/// input must be left untouched.
pub(crate) fn remove_source(ctx: &ProcessingContext, src: &Path) -> std::io::Result<()> {
  if ctx.config.copy_mode { Ok(()) } else { std::fs::remove_file(src) }
}

#[cfg(test)]
mod test_file_indexing {
  use super::*;

  #[test]
  fn combined_index_zero_is_primary() {
    let mut entity = MediaEntity::new(FileEntity::new("/in/a.jpg", true));
    entity.push_secondary(FileEntity::new("/in/b.jpg", false));

    assert_eq!(file_at(&entity, 0).source_path(), std::path::Path::new("/in/a.jpg"));
    assert_eq!(file_at(&entity, 1).source_path(), std::path::Path::new("/in/b.jpg"));
    assert_eq!(file_count(&entity), 2);
  }

  #[test]
  fn available_indices_excludes_settled_files() {
    let mut entity = MediaEntity::new(FileEntity::new("/in/a.jpg", true));
    entity.push_secondary(FileEntity::new("/in/b.jpg", false));
    file_at_mut(&mut entity, 1).mark_deleted();

    assert_eq!(available_indices(&entity), vec![0]);
  }
}
