// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Path and filename utilities: media/sidecar filtering and filesystem-safe
//! name sanitization (spec 4.6.1).

use std::path::Path;

use crate::config::constants;
use crate::config::MimeTable;

/// Whether `path`'s extension names a photo or video format this pipeline
/// handles (not whether the content actually matches).
pub fn is_media_path(path: &Path, mime_table: &MimeTable) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|ext| mime_table.mime_for_extension(ext).is_some())
}

/// Whether `path` names a Takeout sidecar JSON document (`<name>.json` or
/// `<name>.supplemental-metadata.json`, already normalized to `.json` by the
/// pre-step in spec §6).
pub fn is_sidecar_path(path: &Path) -> bool {
  path.extension().and_then(|e| e.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Sanitizes an album name for use as a filesystem directory name
/// (spec 4.6.1): strip Windows-invalid characters, collapse trailing dots and
/// spaces, and rename reserved device names. An empty result becomes "Unknown
/// Album" (spec §8 boundary behavior).
pub fn sanitize_album_name(name: &str) -> String {
  let trimmed = name.trim();

  let stripped: String =
    trimmed.chars().filter(|c| !constants::WINDOWS_INVALID_CHARS.contains(c)).collect();

  let collapsed = stripped.trim_end_matches(['.', ' ']).to_string();

  if collapsed.is_empty() {
    return "Unknown Album".to_string();
  }

  let upper = collapsed.to_ascii_uppercase();
  if constants::WINDOWS_RESERVED_NAMES.contains(&upper.as_str()) {
    format!("{collapsed}_file")
  } else {
    collapsed
  }
}

#[cfg(test)]
mod test_sanitize_album_name {
  use super::*;

  #[test]
  fn strips_invalid_characters() {
    assert_eq!(sanitize_album_name("Trip: Summer?"), "Trip Summer");
  }

  #[test]
  fn collapses_trailing_dots_and_spaces() {
    assert_eq!(sanitize_album_name("Vacation... "), "Vacation");
  }

  #[test]
  fn renames_windows_reserved_names() {
    assert_eq!(sanitize_album_name("con"), "con_file");
    assert_eq!(sanitize_album_name("COM3"), "COM3_file");
  }

  #[test]
  fn empty_after_sanitization_becomes_unknown_album() {
    assert_eq!(sanitize_album_name("???"), "Unknown Album");
    assert_eq!(sanitize_album_name("   "), "Unknown Album");
  }

  #[test]
  fn leaves_ordinary_names_untouched() {
    assert_eq!(sanitize_album_name("Summer Trip 2021"), "Summer Trip 2021");
  }
}
