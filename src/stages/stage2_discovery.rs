// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Discovery & classification (spec 4.2): walks the input tree once,
//! telling year folders from album folders by basename, and seeds one
//! `MediaEntity` per media file found.

use walkdir::WalkDir;

use crate::dates::folder_year;
use crate::model::{AlbumEntity, FileEntity, MediaCollection, MediaEntity, ProcessingContext};
use crate::paths::is_media_path;
use crate::pipeline::{Failure, FailureCategory, StepResult};

/// Walks `ctx.input_dir()` and returns every discovered media file as a
/// fresh `MediaEntity`, plus a `StepResult` counting files found and
/// directories that couldn't be read.
pub fn run(ctx: &ProcessingContext) -> crate::error::Result<(MediaCollection, StepResult)> {
  let mut collection = MediaCollection::new();
  let mut result = StepResult { stage: "discovery", ..Default::default() };

  let walker = WalkDir::new(ctx.input_dir()).into_iter();
  for entry in walker {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        let path = e.path().map_or_else(|| ctx.input_dir().to_path_buf(), |p| p.to_path_buf());
        result.failed.push(Failure { path, category: FailureCategory::Discovery, message: e.to_string() });
        continue;
      }
    };

    if !entry.file_type().is_file() {
      continue;
    }
    let path = entry.path();
    if !is_media_path(path, &ctx.mime_table) {
      continue;
    }

    let Some(parent) = path.parent() else { continue };
    let Some(parent_name) = parent.file_name().and_then(|n| n.to_str()) else { continue };

    let is_canonical = folder_year::extract(parent_name).is_some();
    let file = FileEntity::new(path, is_canonical);

    let mut entity = MediaEntity::new(file);
    if !is_canonical {
      entity.add_album(AlbumEntity::new(parent_name.trim(), parent));
    }

    collection.push(entity);
    result.updated += 1;
  }

  Ok((collection, result))
}
