// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Album consolidation (spec 4.5): re-trims `albums_map` keys, merging any
//! that collapse to the same trimmed form, and backfills albums with no
//! recorded source directory.

use crate::model::{AlbumEntity, MediaCollection};
use crate::pipeline::StepResult;

pub fn run(collection: &mut MediaCollection) -> StepResult {
  let mut result = StepResult { stage: "albums", ..Default::default() };

  for entity in collection.iter_mut() {
    let effective_parent = entity.primary_file().effective_path().parent().map(std::path::Path::to_path_buf);

    let stale: Vec<String> = entity.albums_map().keys().cloned().collect();
    let mut trimmed: std::collections::HashMap<String, AlbumEntity> = std::collections::HashMap::new();
    for key in stale {
      let Some(mut album) = entity.albums_map_mut().remove(&key) else { continue };
      if album.source_directories().is_empty() {
        if let Some(parent) = &effective_parent {
          album.add_source_directory(parent.clone());
        }
      }
      let trimmed_name = album.name().trim().to_string();
      album.rename(trimmed_name.clone());
      match trimmed.remove(&trimmed_name) {
        Some(mut existing) => {
          existing.merge(album);
          trimmed.insert(trimmed_name, existing);
        }
        None => {
          trimmed.insert(trimmed_name, album);
        }
      }
    }

    for (_, album) in trimmed {
      result.updated += 1;
      entity.add_album(album);
    }
  }

  result
}
