// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Step-specific orchestration for the eight pipeline stages (spec §4),
//! plus the Takeout pre-step that normalizes sidecar filenames before
//! discovery ever runs.

pub mod stage1_extension_fix;
pub mod stage2_discovery;
pub mod stage3_dedup;
pub mod stage4_dates;
pub mod stage5_albums;
pub mod stage6_materialize;
pub mod stage7_exif_writeback;
pub mod stage8_timestamps;

use std::path::Path;

use regex::Regex;
use walkdir::WalkDir;

/// Renames `*.<ext>.supplemental-metadata.json` siblings to `*.<ext>.json`
/// (spec §6) before discovery walks the tree, so every later stage can
/// assume sidecars are named `<media>.json`. Collisions (both names
/// present) are skipped and logged rather than overwritten.
pub fn normalize_supplemental_metadata(input_dir: &Path) {
  let pattern = Regex::new(r"^(.*\.[a-z0-9]{3,5})\..+\.json$").unwrap();

  for entry in WalkDir::new(input_dir).into_iter().filter_map(Result::ok) {
    if !entry.file_type().is_file() {
      continue;
    }
    let Some(name) = entry.file_name().to_str() else { continue };
    let Some(caps) = pattern.captures(name) else { continue };
    let normalized_name = format!("{}.json", &caps[1]);
    let normalized_path = entry.path().with_file_name(&normalized_name);

    if normalized_path.exists() {
      log::warn!("{}: normalized sidecar name already exists, leaving both", entry.path().display());
      continue;
    }

    if let Err(e) = std::fs::rename(entry.path(), &normalized_path) {
      log::warn!("{}: failed to normalize supplemental-metadata sidecar: {e}", entry.path().display());
    }
  }
}

#[cfg(test)]
mod test_normalize_supplemental_metadata {
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn renames_supplemental_metadata_sidecar() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("photo.jpg.supplemental-metadata.json");
    std::fs::write(&original, b"{}").unwrap();

    normalize_supplemental_metadata(dir.path());

    assert!(!original.exists());
    assert!(dir.path().join("photo.jpg.json").exists());
  }

  #[test]
  fn skips_collision_with_existing_normalized_name() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("photo.jpg.supplemental-metadata.json");
    let normalized = dir.path().join("photo.jpg.json");
    std::fs::write(&original, b"{}").unwrap();
    std::fs::write(&normalized, b"{}").unwrap();

    normalize_supplemental_metadata(dir.path());

    assert!(original.exists());
    assert!(normalized.exists());
  }

  #[test]
  fn leaves_ordinary_sidecar_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo.jpg.json");
    std::fs::write(&path, b"{}").unwrap();

    normalize_supplemental_metadata(dir.path());

    assert!(path.exists());
  }
}
