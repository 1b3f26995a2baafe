// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Filesystem timestamp sync (spec 4.8): stamps every materialized
//! destination file — primary, secondaries, and shortcuts alike — with its
//! entity's resolved capture date.

use crate::model::{MediaCollection, ProcessingContext};
use crate::pipeline::{Failure, FailureCategory, StepResult};

pub fn run(ctx: &mut ProcessingContext, collection: &mut MediaCollection) -> StepResult {
  let mut result = StepResult { stage: "timestamps", ..Default::default() };
  let platform = crate::platform::current();

  for entity in collection.iter_mut() {
    let Some(date) = entity.date_taken() else { continue };

    for file in entity.all_files_mut() {
      if file.is_deleted() {
        continue;
      }
      let Some(target) = file.target_path() else { continue };

      match platform.set_timestamps(target, date, file.is_shortcut()) {
        Ok(()) => {
          result.updated += 1;
          if file.is_shortcut() {
            result.shortcuts += 1;
          } else {
            result.physical += 1;
          }
        }
        Err(e) => {
          let category = if file.is_shortcut() { FailureCategory::Shortcut } else { FailureCategory::Timestamp };
          result.failed.push(Failure { path: target.to_path_buf(), category, message: e.to_string() });
        }
      }
    }
  }

  let _ = ctx;
  result
}
