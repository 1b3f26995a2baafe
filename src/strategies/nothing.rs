// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! **Nothing** strategy (spec 4.6.5): move the primary to ALL_PHOTOS, drop
//! every secondary, ignore album membership entirely.

use super::{FailureKind, MoveOutcome, MoveResult, MovingStrategy, available_indices, file_at_mut, place, remove_source};
use crate::file_ops::FileOpsService;
use crate::model::{MediaCollection, MediaEntity, ProcessingContext};
use crate::path_gen;
use crate::platform::Platform;

pub struct NothingStrategy;

impl MovingStrategy for NothingStrategy {
  fn name(&self) -> &'static str {
    "nothing"
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
      if idx == 0 {
        let src = file_at_mut(entity, 0).source_path().to_path_buf();
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
      } else {
        let src = file_at_mut(entity, idx).source_path().to_path_buf();
        match remove_source(ctx, &src) {
          Ok(()) => {
            file_at_mut(entity, idx).mark_deleted();
            results.push(MoveResult { role: "secondary", outcome: MoveOutcome::Deleted });
          }
          Err(e) => {
            results.push(MoveResult { role: "secondary", outcome: MoveOutcome::Failed { kind: FailureKind::Delete, message: e.to_string() } });
          }
        }
      }
    }

    results
  }
}
