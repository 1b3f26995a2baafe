// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! **Shortcut** strategy (spec 4.6.5): the best-ranked canonical copy (or,
//! failing that, the primary) moves to ALL_PHOTOS; every other copy becomes
//! a shortcut in the album(s) it belonged to, then its source is dropped.

use super::{
  FailureKind, MoveOutcome, MoveResult, MovingStrategy, available_indices, best_ranked, file_at, file_at_mut, owning_album, place, remove_source,
};
use crate::file_ops::FileOpsService;
use crate::model::{MediaCollection, MediaEntity, ProcessingContext};
use crate::path_gen;
use crate::platform::{self, Platform};

pub struct ShortcutStrategy;

impl MovingStrategy for ShortcutStrategy {
  fn name(&self) -> &'static str {
    "shortcut"
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

    let canonical: Vec<usize> = indices.iter().copied().filter(|&i| file_at(entity, i).is_canonical()).collect();
    let chosen = if canonical.is_empty() { indices[0] } else { best_ranked(entity, &canonical).unwrap_or(indices[0]) };

    let dst_dir = ctx.output_for(path_gen::target_dir(None, entity.date_taken(), ctx.config.date_division, entity.partner_shared()));
    let date = entity.date_taken();

    let chosen_src = file_at(entity, chosen).source_path().to_path_buf();
    let chosen_role = if chosen == 0 { "primary" } else { "secondary" };

    let moved_target = match place(file_ops, ctx, &chosen_src, &dst_dir, date) {
      Ok(placement) => {
        let path = match &placement {
          super::Placement::Moved(p) | super::Placement::Copied(p) => p.clone(),
        };
        file_at_mut(entity, chosen).mark_moved(path.clone());
        results.push(MoveResult { role: chosen_role, outcome: placement.into_outcome() });
        Some(path)
      }
      Err(e) => {
        results.push(MoveResult { role: chosen_role, outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } });
        None
      }
    };

    let Some(target) = moved_target else {
      return results;
    };

    for idx in indices {
      if idx == chosen {
        continue;
      }
      let role = if idx == 0 { "primary" } else { "secondary" };
      let (src, basename, album_dir) = {
        let file = file_at(entity, idx);
        let album = owning_album(entity, file);
        let basename = file.source_path().file_name().map(|n| n.to_string_lossy().into_owned());
        (file.source_path().to_path_buf(), basename, album.map(|a| a.name().to_string()))
      };

      let Some(album_name) = album_dir else {
        // Not traced to any album directory: nothing to link from, drop it.
        match remove_source(ctx, &src) {
          Ok(()) => {
            file_at_mut(entity, idx).mark_deleted();
            results.push(MoveResult { role, outcome: MoveOutcome::Deleted });
          }
          Err(e) => results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Delete, message: e.to_string() } }),
        }
        continue;
      };

      let link_dir = ctx.output_for(path_gen::target_dir(Some(&album_name), None, crate::config::DateDivision::None, false));
      match platform::create_link(platform, &link_dir, &target, basename.as_deref()) {
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

#[cfg(test)]
mod test_process_entity {
  use tempfile::tempdir;

  use super::*;
  use crate::config::PipelineConfig;
  use crate::model::{AlbumEntity, FileEntity};

  #[test]
  fn moves_canonical_and_links_album_copy() {
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
    let mut strategy = ShortcutStrategy;

    let results = strategy.process_entity(&mut entity, &ctx, &mut file_ops, &*crate::platform::current());

    assert_eq!(results.len(), 2);
    assert!(!canonical_src.exists());
    assert!(!album_src.exists());
    assert!(matches!(results[1].outcome, MoveOutcome::ShortcutCreated(_)));
  }
}
