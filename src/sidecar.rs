// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Maps a media file to its Takeout sidecar JSON (spec 4.1, 4.4).
//!
//! Takeout is inconsistent about exactly where the sidecar lives relative to
//! the media file (trailing whitespace in directory names, the edited-suffix
//! being present on one but not the other), so this is a small candidate
//! search rather than a single deterministic path.

use std::path::{Path, PathBuf};

use crate::edited::strip_edited_suffix;

/// Sidecar metadata, deserialized from a Takeout `<name>.json` document
/// (spec §6). Extra fields Takeout emits are ignored by `serde`'s default
/// (deny only what's named).
#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct SidecarJson {
  #[serde(rename = "photoTakenTime")]
  pub photo_taken_time: Option<TimestampField>,
  #[serde(rename = "geoData")]
  pub geo_data: Option<GeoData>,
  pub title: Option<String>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct TimestampField {
  #[serde(deserialize_with = "deserialize_timestamp")]
  pub timestamp: i64,
}

#[derive(serde::Deserialize, Debug, Clone, Copy, Default)]
pub struct GeoData {
  pub latitude: f64,
  pub longitude: f64,
}

/// Takeout emits `photoTakenTime.timestamp` as either a JSON string or a
/// JSON integer, both seconds since the epoch, UTC (spec §6).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: serde::Deserializer<'de>,
{
  use serde::Deserialize;

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum StringOrInt {
    String(String),
    Int(i64),
  }

  match StringOrInt::deserialize(deserializer)? {
    StringOrInt::String(s) => s.parse().map_err(serde::de::Error::custom),
    StringOrInt::Int(i) => Ok(i),
  }
}

/// Finds the on-disk sidecar path for `media_path`, trying candidates in the
/// order given by spec 4.1:
/// (a) `<media>.json`;
/// (b) same directory, case-insensitive, trailing-whitespace-tolerant match;
/// (c) same candidates under a trailing-whitespace-trimmed parent directory.
pub fn find_sidecar(media_path: &Path) -> Option<PathBuf> {
  let direct = append_json(media_path);
  if direct.exists() {
    return Some(direct);
  }

  let dir = media_path.parent()?;
  let media_name = media_path.file_name()?.to_str()?;

  if let Some(found) = search_dir_case_insensitive(dir, media_name) {
    return Some(found);
  }

  let dir_name = dir.file_name()?.to_str()?;
  let trimmed_dir_name = dir_name.trim_end();
  if trimmed_dir_name != dir_name {
    if let Some(parent) = dir.parent() {
      let trimmed_dir = parent.join(trimmed_dir_name);
      if let Some(found) = search_dir_case_insensitive(&trimmed_dir, media_name) {
        return Some(found);
      }
    }
  }

  // Also try the edited-suffix-stripped basename, since Takeout never writes
  // a sidecar for the "-edited" derivative itself.
  if let Some(stem) = media_path.file_stem().and_then(|s| s.to_str()) {
    if let Some(stripped) = strip_edited_suffix(stem) {
      let ext = media_path.extension().and_then(|e| e.to_str()).unwrap_or("");
      let candidate_name = if ext.is_empty() { stripped } else { format!("{stripped}.{ext}") };
      if let Some(found) = search_dir_case_insensitive(dir, &candidate_name) {
        return Some(found);
      }
    }
  }

  None
}

fn append_json(media_path: &Path) -> PathBuf {
  let mut s = media_path.as_os_str().to_owned();
  s.push(".json");
  PathBuf::from(s)
}

/// Scans `dir`'s entries for a sidecar matching `media_name` case-insensitively
/// and tolerant of trailing whitespace in the sidecar's own stem.
fn search_dir_case_insensitive(dir: &Path, media_name: &str) -> Option<PathBuf> {
  let wanted = format!("{media_name}.json").to_lowercase();

  let entries = std::fs::read_dir(dir).ok()?;
  for entry in entries.flatten() {
    let name = entry.file_name();
    let name = name.to_str()?.to_string();
    let candidate = name.trim_end().to_lowercase();
    if candidate == wanted {
      return Some(entry.path());
    }
  }

  None
}

#[cfg(test)]
mod test_find_sidecar {
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn finds_direct_sidecar() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.jpg");
    std::fs::write(&media, b"").unwrap();
    std::fs::write(dir.path().join("photo.jpg.json"), b"{}").unwrap();

    assert_eq!(find_sidecar(&media), Some(dir.path().join("photo.jpg.json")));
  }

  #[test]
  fn finds_case_insensitive_sidecar() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.jpg");
    std::fs::write(&media, b"").unwrap();
    std::fs::write(dir.path().join("Photo.JPG.JSON"), b"{}").unwrap();

    assert!(find_sidecar(&media).is_some());
  }

  #[test]
  fn returns_none_when_missing() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.jpg");
    std::fs::write(&media, b"").unwrap();

    assert_eq!(find_sidecar(&media), None);
  }
}
