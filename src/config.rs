// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Pipeline configuration.
//!
//! `PipelineConfig` is the boundary between the core (this crate) and
//! whatever external code built it — a CLI parser, a GUI, a test. The core
//! never reads environment variables or argv itself.

pub mod constants;

use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumBehavior {
  Shortcut,
  DuplicateCopy,
  ReverseShortcut,
  Json,
  Nothing,
  IgnoreAlbums,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDivision {
  None,
  Year,
  YearMonth,
  YearMonthDay,
}

impl DateDivision {
  pub fn level(self) -> u8 {
    match self {
      DateDivision::None => 0,
      DateDivision::Year => 1,
      DateDivision::YearMonth => 2,
      DateDivision::YearMonthDay => 3,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixExtensions {
  Off,
  Standard,
  NonJpeg,
  Solo,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
  pub input_dir: PathBuf,
  pub output_dir: PathBuf,
  pub album_behavior: AlbumBehavior,
  pub date_division: DateDivision,
  pub copy_mode: bool,
  pub write_exif: bool,
  pub update_creation_time: bool,
  pub transform_pixel_mp: bool,
  pub fix_extensions: FixExtensions,
  pub enforce_max_file_size: bool,
  pub max_file_size: u64,
  pub verbose: bool,
  pub exiftool_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      input_dir: PathBuf::new(),
      output_dir: PathBuf::new(),
      album_behavior: AlbumBehavior::Shortcut,
      date_division: DateDivision::YearMonth,
      copy_mode: false,
      write_exif: true,
      update_creation_time: true,
      transform_pixel_mp: false,
      fix_extensions: FixExtensions::Standard,
      enforce_max_file_size: false,
      max_file_size: 64 * 1024 * 1024,
      verbose: false,
      exiftool_path: None,
    }
  }
}

/// Lookup table from lowercase extension (no dot) to the MIME type implied by
/// that extension, built once from [`constants::EXTENSION_MIME`].
pub struct MimeTable(HashMap<&'static str, &'static str>);

impl MimeTable {
  pub fn new() -> Self {
    Self(constants::EXTENSION_MIME.iter().copied().collect())
  }

  /// MIME type implied by `extension` (case-insensitive), if known.
  pub fn mime_for_extension(&self, extension: &str) -> Option<&'static str> {
    self.0.get(extension.to_ascii_lowercase().as_str()).copied()
  }

  /// Whether `extension` names a known TIFF-like (including RAW) format.
  pub fn is_tiff_like(&self, extension: &str) -> bool {
    let lower = extension.to_ascii_lowercase();
    constants::TIFF_LIKE_EXTENSIONS.contains(&lower.as_str())
  }

  /// Whether `mime` names a photo or video type this pipeline handles.
  pub fn is_media_mime(mime: &str) -> bool {
    mime.starts_with("image/") || mime.starts_with("video/")
  }
}

impl Default for MimeTable {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod test_mime_table {
  use super::*;

  #[test]
  fn looks_up_known_extension_case_insensitively() {
    let table = MimeTable::new();
    assert_eq!(table.mime_for_extension("JPG"), Some("image/jpeg"));
    assert_eq!(table.mime_for_extension("jpg"), Some("image/jpeg"));
  }

  #[test]
  fn unknown_extension_returns_none() {
    let table = MimeTable::new();
    assert_eq!(table.mime_for_extension("docx"), None);
  }

  #[test]
  fn recognizes_tiff_like_extensions() {
    let table = MimeTable::new();
    assert!(table.is_tiff_like("CR2"));
    assert!(table.is_tiff_like("dng"));
    assert!(!table.is_tiff_like("jpg"));
  }
}
