// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! **JSON** strategy (spec 4.6.5): move the primary to ALL_PHOTOS, record
//! non-canonical album membership as manifest entries instead of creating
//! shortcuts, then drop every secondary. `finalize` writes
//! `<output>/albums-info.json`.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use super::{FailureKind, MoveOutcome, MoveResult, MovingStrategy, file_at, file_at_mut, owning_album, place, remove_source};
use crate::file_ops::FileOpsService;
use crate::model::{MediaCollection, MediaEntity, ProcessingContext};
use crate::path_gen;
use crate::platform::Platform;

#[derive(Serialize)]
struct AlbumEntry {
  #[serde(rename = "albumName")]
  album_name: String,
  #[serde(rename = "albumPath")]
  album_path: String,
  #[serde(rename = "fileName")]
  file_name: String,
  #[serde(rename = "filePath")]
  file_path: String,
  #[serde(rename = "targetPath")]
  target_path: String,
}

#[derive(Default)]
pub struct JsonStrategy {
  albums: HashMap<String, Vec<AlbumEntry>>,
  total_entities: usize,
}

impl JsonStrategy {
  fn record(&mut self, album_name: &str, original_src: &Path, moved_target_rel: &str) {
    let file_name = original_src.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    let album_path = format!("Albums/{album_name}");
    let entry = AlbumEntry {
      album_name: album_name.to_string(),
      album_path: album_path.clone(),
      file_path: format!("{album_path}/{file_name}"),
      file_name,
      target_path: moved_target_rel.to_string(),
    };
    self.albums.entry(album_name.to_string()).or_default().push(entry);
  }
}

impl MovingStrategy for JsonStrategy {
  fn name(&self) -> &'static str {
    "json"
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
    self.total_entities += 1;
    let mut results = Vec::new();

    let dst_dir = ctx.output_for(path_gen::target_dir(None, entity.date_taken(), ctx.config.date_division, entity.partner_shared()));
    let date = entity.date_taken();

    let primary_src = file_at(entity, 0).source_path().to_path_buf();
    let primary_was_non_canonical = !file_at(entity, 0).is_canonical();
    let primary_album = if primary_was_non_canonical { owning_album(entity, file_at(entity, 0)).map(|a| a.name().to_string()) } else { None };

    let moved_target_rel = match place(file_ops, ctx, &primary_src, &dst_dir, date) {
      Ok(placement) => {
        let path = match &placement {
          super::Placement::Moved(p) | super::Placement::Copied(p) => p.clone(),
        };
        let rel = ctx.relative_to_output(&path).to_string_lossy().replace('\\', "/");
        file_at_mut(entity, 0).mark_moved(path);
        results.push(MoveResult { role: "primary", outcome: placement.into_outcome() });
        Some(rel)
      }
      Err(e) => {
        results.push(MoveResult { role: "primary", outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } });
        None
      }
    };

    if let (Some(rel), Some(album_name)) = (&moved_target_rel, &primary_album) {
      self.record(album_name, &primary_src, rel);
    }

    let secondary_count = entity.secondary_files().len();
    for i in 0..secondary_count {
      let idx = i + 1;
      let (src, is_canonical) = {
        let file = file_at(entity, idx);
        (file.source_path().to_path_buf(), file.is_canonical())
      };
      let album_name = if is_canonical { None } else { owning_album(entity, file_at(entity, idx)).map(|a| a.name().to_string()) };

      if let (Some(rel), Some(album_name)) = (&moved_target_rel, &album_name) {
        self.record(album_name, &src, rel);
      }

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

    results
  }

  fn finalize(&mut self, ctx: &ProcessingContext, _entities: &MediaCollection) -> Vec<MoveResult> {
    let manifest = serde_json::json!({
      "albums": self.albums,
      "metadata": {
        "generated": chrono::Local::now().to_rfc3339(),
        "total_albums": self.albums.len(),
        "total_entities": self.total_entities,
        "strategy": "json",
      }
    });

    let path = ctx.output_for("albums-info.json");
    let body = match serde_json::to_vec_pretty(&manifest) {
      Ok(body) => body,
      Err(e) => return vec![MoveResult { role: "manifest", outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } }],
    };

    match std::fs::write(&path, body) {
      Ok(()) => vec![MoveResult { role: "manifest", outcome: MoveOutcome::Moved(path) }],
      Err(e) => vec![MoveResult { role: "manifest", outcome: MoveOutcome::Failed { kind: FailureKind::Move, message: e.to_string() } }],
    }
  }
}
