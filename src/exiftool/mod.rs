// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Metadata read/write adapter fronting a persistent `exiftool` child
//! process (spec 4.7.1), generalized from the teacher's per-invocation
//! `Command`-based wrapper (`catalog/exiftool.rs`) into a long-lived,
//! request-multiplexed one.

pub mod adapter;
pub mod protocol;

use std::collections::HashMap;
use std::path::Path;

pub use adapter::PersistentExifTool;

use crate::error::Result;

/// A tag set as returned by a `-json` exiftool read: every value is the raw
/// string exiftool printed, left to extractors/writers to parse further.
pub type TagMap = HashMap<String, String>;

/// Behavior stage 4 (date extraction) and stage 7 (write-back) depend on.
/// A trait (rather than a concrete type) so tests can substitute a fake
/// in-memory implementation instead of shelling out (spec §3 test tooling).
pub trait ExifTool: Send {
  /// Reads `tags` from `path`, returning only the tags exiftool reported
  /// (absent tags are simply missing from the map, not an error).
  fn read_tags(&mut self, path: &Path, tags: &[&str]) -> Result<TagMap>;

  /// Writes `tags` onto `path` in place. `ExifToolError` per spec §7 is
  /// surfaced as `Err`; callers convert that into a counted failure rather
  /// than aborting the stage.
  fn write_tags(&mut self, path: &Path, tags: &TagMap) -> Result<()>;

  /// Copies the synchronized tag set (spec 4.7, `ARGS_SYNC`-equivalent)
  /// from `src` onto `dst`.
  fn copy_tags(&mut self, src: &Path, dst: &Path) -> Result<()>;
}
