// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! **Duplicate-Copy** strategy (spec 4.6.5): every canonical file moves to
//! ALL_PHOTOS; every non-canonical file moves into the first album it
//! belonged to and is physically copied into any further album. When an
//! entity has no canonical file at all, the best-ranked non-canonical copy
//! is itself duplicated into ALL_PHOTOS (marked as a manufactured copy)
//! before the originals are distributed into their albums. No shortcuts are
//! ever created.

use super::{FailureKind, MoveOutcome, MoveResult, MovingStrategy, available_indices, best_ranked, file_at, file_at_mut, owning_album, place};
use crate::file_ops::FileOpsService;
use crate::model::{MediaCollection, MediaEntity, ProcessingContext};
use crate::path_gen;
use crate::platform::Platform;

pub struct DuplicateCopyStrategy;

impl MovingStrategy for DuplicateCopyStrategy {
  fn name(&self) -> &'static str {
    "duplicate-copy"
  }

  fn creates_shortcuts(&self) -> bool {
    false
  }

  fn creates_duplicates(&self) -> bool {
    true
  }

  fn process_entity(
    &mut self,
    entity: &mut MediaEntity,
    ctx: &ProcessingContext,
    file_ops: &mut FileOpsService,
    _platform: &dyn Platform,
  ) -> Vec<MoveResult> {
    let mut results = Vec::new();
    let indices = available_indices(entity);
    if indices.is_empty() {
      return results;
    }

    let date = entity.date_taken();
    let canonical: Vec<usize> = indices.iter().copied().filter(|&i| file_at(entity, i).is_canonical()).collect();
    let non_canonical: Vec<usize> = indices.iter().copied().filter(|&i| !file_at(entity, i).is_canonical()).collect();

    if canonical.is_empty() {
      if let Some(best) = best_ranked(entity, &non_canonical) {
        let dst_dir = ctx.output_for(path_gen::target_dir(None, date, ctx.config.date_division, entity.partner_shared()));
        let src = file_at(entity, best).source_path().to_path_buf();
        let role = if best == 0 { "primary" } else { "secondary" };

        match file_ops.copy_file(&src, &dst_dir, date) {
          Ok(path) => results.push(MoveResult { role: "duplicate", outcome: MoveOutcome::DuplicateCopyCreated(path) }),
          Err(e) => results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Copy, message: e.to_string() } }),
        }
      }
    } else {
      let dst_dir = ctx.output_for(path_gen::target_dir(None, date, ctx.config.date_division, entity.partner_shared()));
      for idx in canonical {
        let role = if idx == 0 { "primary" } else { "secondary" };
        let src = file_at(entity, idx).source_path().to_path_buf();
        match place(file_ops, ctx, &src, &dst_dir, date) {
          Ok(placement) => {
            let path = match &placement {
              super::Placement::Moved(p) | super::Placement::Copied(p) => p.clone(),
            };
            file_at_mut(entity, idx).mark_moved(path);
            results.push(MoveResult { role, outcome: placement.into_outcome() });
          }
          Err(e) => results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } }),
        }
      }
    }

    let mut seen_albums: std::collections::HashSet<String> = std::collections::HashSet::new();
    for idx in non_canonical {
      let role = if idx == 0 { "primary" } else { "secondary" };
      let (src, album_name) = {
        let file = file_at(entity, idx);
        (file.source_path().to_path_buf(), owning_album(entity, file).map(|a| a.name().to_string()))
      };

      let Some(album_name) = album_name else {
        results.push(MoveResult {
          role,
          outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: "non-canonical file has no owning album".to_string() },
        });
        continue;
      };

      let dst_dir = ctx.output_for(path_gen::target_dir(Some(&album_name), date, ctx.config.date_division, false));
      let first_for_this_album = seen_albums.insert(album_name);

      if first_for_this_album {
        match place(file_ops, ctx, &src, &dst_dir, date) {
          Ok(placement) => {
            let path = match &placement {
              super::Placement::Moved(p) | super::Placement::Copied(p) => p.clone(),
            };
            file_at_mut(entity, idx).mark_moved(path);
            results.push(MoveResult { role, outcome: placement.into_outcome() });
          }
          Err(e) => results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } }),
        }
      } else {
        match file_ops.copy_file(&src, &dst_dir, date) {
          Ok(path) => {
            file_at_mut(entity, idx).mark_moved(path.clone());
            results.push(MoveResult { role, outcome: MoveOutcome::Copied(path) });
          }
          Err(e) => results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Copy, message: e.to_string() } }),
        }
      }
    }

    results
  }
}

#[cfg(test)]
mod test_process_entity {
  use tempfile::tempdir;

  use super::*;
  use crate::config::PipelineConfig;
  use crate::model::{AlbumEntity, FileEntity};

  #[test]
  fn moves_canonical_and_distributes_non_canonical_into_albums() {
    let dir = tempdir().unwrap();
    let album_a = dir.path().join("A");
    let album_b = dir.path().join("B");
    std::fs::create_dir_all(&album_a).unwrap();
    std::fs::create_dir_all(&album_b).unwrap();

    let canonical_src = dir.path().join("a.jpg");
    let copy_a = album_a.join("a.jpg");
    let copy_b = album_b.join("a.jpg");
    std::fs::write(&canonical_src, b"x").unwrap();
    std::fs::write(&copy_a, b"x").unwrap();
    std::fs::write(&copy_b, b"x").unwrap();

    let mut entity = MediaEntity::new(FileEntity::new(&canonical_src, true));
    entity.push_secondary(FileEntity::new(&copy_a, false));
    entity.push_secondary(FileEntity::new(&copy_b, false));
    entity.add_album(AlbumEntity::new("A", &album_a));
    entity.add_album(AlbumEntity::new("B", &album_b));

    let mut config = PipelineConfig::default();
    config.output_dir = dir.path().join("out");
    let ctx = ProcessingContext::new(config, None);
    let mut file_ops = FileOpsService::new();
    let mut strategy = DuplicateCopyStrategy;

    let results = strategy.process_entity(&mut entity, &ctx, &mut file_ops, &*crate::platform::current());

    assert_eq!(results.len(), 3);
    assert!(!canonical_src.exists());
    assert!(!copy_a.exists());
    assert!(!copy_b.exists());
  }

  #[test]
  fn manufactures_a_duplicate_when_no_canonical_exists() {
    let dir = tempdir().unwrap();
    let album_a = dir.path().join("A");
    std::fs::create_dir_all(&album_a).unwrap();

    let only_copy = album_a.join("a.jpg");
    std::fs::write(&only_copy, b"x").unwrap();

    let mut entity = MediaEntity::new(FileEntity::new(&only_copy, false));
    entity.add_album(AlbumEntity::new("A", &album_a));

    let mut config = PipelineConfig::default();
    config.output_dir = dir.path().join("out");
    let ctx = ProcessingContext::new(config, None);
    let mut file_ops = FileOpsService::new();
    let mut strategy = DuplicateCopyStrategy;

    let results = strategy.process_entity(&mut entity, &ctx, &mut file_ops, &*crate::platform::current());

    assert!(results.iter().any(|r| matches!(r.outcome, MoveOutcome::DuplicateCopyCreated(_))));
    assert!(only_copy.exists());
  }
}
