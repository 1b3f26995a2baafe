// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! **Ignore-Albums** strategy (spec 4.6.5): every canonical file goes to
//! ALL_PHOTOS; every non-canonical file is dropped; albums never appear in
//! the output tree.

use super::{FailureKind, MoveOutcome, MoveResult, MovingStrategy, available_indices, file_at, file_at_mut, place, remove_source};
use crate::file_ops::FileOpsService;
use crate::model::{MediaCollection, MediaEntity, ProcessingContext};
use crate::path_gen;
use crate::platform::Platform;

pub struct IgnoreAlbumsStrategy;

impl MovingStrategy for IgnoreAlbumsStrategy {
  fn name(&self) -> &'static str {
    "ignore-albums"
  }

  fn creates_shortcuts(&self) -> bool {
    false
  }

  fn creates_duplicates(&self) -> bool {
    false
  }

  fn process_entity(
    &mut self,
    entity: &mut MediaEntity,
    ctx: &ProcessingContext,
    file_ops: &mut FileOpsService,
    _platform: &dyn Platform,
  ) -> Vec<MoveResult> {
    let mut results = Vec::new();
    let dst_dir = ctx.output_for(path_gen::target_dir(None, entity.date_taken(), ctx.config.date_division, entity.partner_shared()));
    let date = entity.date_taken();

    for idx in available_indices(entity) {
      let canonical = file_at(entity, idx).is_canonical();
      let src = file_at_mut(entity, idx).source_path().to_path_buf();
      let role = if idx == 0 { "primary" } else { "secondary" };

      if canonical {
        match place(file_ops, ctx, &src, &dst_dir, date) {
          Ok(placement) => {
            let path = placement_path(&placement);
            file_at_mut(entity, idx).mark_moved(path);
            results.push(MoveResult { role, outcome: placement.into_outcome() });
          }
          Err(e) => {
            results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } });
          }
        }
      } else {
        match remove_source(ctx, &src) {
          Ok(()) => {
            file_at_mut(entity, idx).mark_deleted();
            results.push(MoveResult { role, outcome: MoveOutcome::Deleted });
          }
          Err(e) => {
            results.push(MoveResult { role, outcome: MoveOutcome::Failed { kind: FailureKind::Delete, message: e.to_string() } });
          }
        }
      }
    }

    results
  }
}

fn placement_path(placement: &super::Placement) -> std::path::PathBuf {
  match placement {
    super::Placement::Moved(p) | super::Placement::Copied(p) => p.clone(),
  }
}
