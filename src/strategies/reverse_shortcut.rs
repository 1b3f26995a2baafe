// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! **Reverse-Shortcut** strategy (spec 4.6.5): every non-canonical copy
//! moves physically into the album it belonged to; the best-ranked of those
//! becomes the anchor that ALL_PHOTOS links back to. Falls back to an
//! ordinary move when an entity has no album copies at all.

use super::{
  FailureKind, MoveOutcome, MoveResult, MovingStrategy, available_indices, best_ranked, file_at, file_at_mut, owning_album, place, remove_source,
};
use crate::config::DateDivision;
use crate::file_ops::FileOpsService;
use crate::model::{MediaCollection, MediaEntity, ProcessingContext};
use crate::path_gen;
use crate::platform::{self, Platform};

pub struct ReverseShortcutStrategy;

impl MovingStrategy for ReverseShortcutStrategy {
  fn name(&self) -> &'static str {
    "reverse-shortcut"
  }

  fn creates_shortcuts(&self) -> bool {
    true
  }

  fn creates_duplicates(&self) -> bool {
    false
  }

  fn process_entity(
    &mut self,
    entity: &mut MediaEntity,
    ctx: &ProcessingContext,
    file_ops: &mut FileOpsService,
    platform: &dyn Platform,
  ) -> Vec<MoveResult> {
    let mut results = Vec::new();
    let indices = available_indices(entity);
    if indices.is_empty() {
      return results;
    }

    let date = entity.date_taken();
    let non_canonical: Vec<usize> = indices.iter().copied().filter(|&i| !file_at(entity, i).is_canonical()).collect();

    if non_canonical.is_empty() {
      // No album copy to anchor against: behave like an ordinary move of the primary.
      let dst_dir = ctx.output_for(path_gen::target_dir(None, date, ctx.config.date_division, entity.partner_shared()));
      let src = file_at(entity, 0).source_path().to_path_buf();
      match place(file_ops, ctx, &src, &dst_dir, date) {
        Ok(placement) => {
          let path = match &placement {
            super::Placement::Moved(p) | super::Placement::Copied(p) => p.clone(),
          };
          file_at_mut(entity, 0).mark_moved(path);
          results.push(MoveResult { role: "primary", outcome: placement.into_outcome() });
        }
        Err(e) => {
          results.push(MoveResult { role: "primary", outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } });
        }
      }
      return results;
    }

    let mut anchor: Option<(usize, std::path::PathBuf)> = None;
    for idx in &non_canonical {
      let idx = *idx;
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
      match place(file_ops, ctx, &src, &dst_dir, date) {
        Ok(placement) => {
          let path = match &placement {
            super::Placement::Moved(p) | super::Placement::Copied(p) => p.clone(),
          };
          file_at_mut(entity, idx).mark_moved(path.clone());
          results.push(MoveResult { role, outcome: placement.into_outcome() });
          let replace = match &anchor {
            Some((a, _)) => file_at(entity, idx).ranking() < file_at(entity, *a).ranking(),
            None => true,
          };
          if replace {
            anchor = Some((idx, path));
          }
        }
        Err(e) => {
          results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } });
        }
      }
    }

    let Some((anchor_idx, anchor_path)) = best_anchor(entity, &non_canonical, anchor) else {
      return results;
    };
    let _ = anchor_idx;

    let canonical: Vec<usize> = indices.iter().copied().filter(|&i| file_at(entity, i).is_canonical()).collect();
    let all_photos_dir = ctx.output_for(path_gen::target_dir(None, None, DateDivision::None, false));

    for idx in canonical {
      let role = if idx == 0 { "primary" } else { "secondary" };
      let (src, basename) = {
        let file = file_at(entity, idx);
        (file.source_path().to_path_buf(), file.source_path().file_name().map(|n| n.to_string_lossy().into_owned()))
      };

      match platform::create_link(platform, &all_photos_dir, &anchor_path, basename.as_deref()) {
        Ok(link_path) => {
          match remove_source(ctx, &src) {
            Ok(()) => {
              file_at_mut(entity, idx).mark_shortcut(link_path.clone());
              results.push(MoveResult { role, outcome: MoveOutcome::ShortcutCreated(link_path) });
            }
            Err(e) => results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Delete, message: e.to_string() } }),
          }
        }
        Err(e) => {
          results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Shortcut, message: e.to_string() } });
        }
      }
    }

    results
  }
}

/// `anchor` tracks the best-ranked successfully-moved non-canonical file as
/// we go; falls back to recomputing from `ranking()` directly if something
/// raced it (kept simple since `process_entity` runs single-threaded per
/// entity).
fn best_anchor(entity: &MediaEntity, non_canonical: &[usize], anchor: Option<(usize, std::path::PathBuf)>) -> Option<(usize, std::path::PathBuf)> {
  anchor.or_else(|| best_ranked(entity, non_canonical).map(|idx| (idx, file_at(entity, idx).source_path().to_path_buf())))
}

#[cfg(test)]
mod test_process_entity {
  use tempfile::tempdir;

  use super::*;
  use crate::config::PipelineConfig;
  use crate::model::{AlbumEntity, FileEntity};

  #[test]
  fn anchors_album_copy_and_links_canonical_into_all_photos() {
    let dir = tempdir().unwrap();
    let album_dir = dir.path().join("Vacation");
    std::fs::create_dir_all(&album_dir).unwrap();

    let canonical_src = dir.path().join("a.jpg");
    let album_src = album_dir.join("a.jpg");
    std::fs::write(&canonical_src, b"x").unwrap();
    std::fs::write(&album_src, b"x").unwrap();

    let mut entity = MediaEntity::new(FileEntity::new(&canonical_src, true));
    entity.push_secondary(FileEntity::new(&album_src, false));
    entity.add_album(AlbumEntity::new("Vacation", &album_dir));

    let mut config = PipelineConfig::default();
    config.output_dir = dir.path().join("out");
    let ctx = ProcessingContext::new(config, None);
    let mut file_ops = FileOpsService::new();
    let mut strategy = ReverseShortcutStrategy;

    let results = strategy.process_entity(&mut entity, &ctx, &mut file_ops, &*crate::platform::current());

    assert!(!album_src.exists());
    assert!(!canonical_src.exists());
    assert!(results.iter().any(|r| matches!(r.outcome, MoveOutcome::ShortcutCreated(_))));
  }

  #[test]
  fn falls_back_to_ordinary_move_without_album_copies() {
    let dir = tempdir().unwrap();
    let primary_src = dir.path().join("a.jpg");
    std::fs::write(&primary_src, b"x").unwrap();

    let mut entity = MediaEntity::new(FileEntity::new(&primary_src, true));
    let mut config = PipelineConfig::default();
    config.output_dir = dir.path().join("out");
    let ctx = ProcessingContext::new(config, None);
    let mut file_ops = FileOpsService::new();
    let mut strategy = ReverseShortcutStrategy;

    let results = strategy.process_entity(&mut entity, &ctx, &mut file_ops, &*crate::platform::current());

    assert_eq!(results.len(), 1);
    assert!(!primary_src.exists());
  }
}
