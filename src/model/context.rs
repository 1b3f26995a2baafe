// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Shared, read-mostly state threaded through every stage (spec §3, §9).
//!
//! Replaces the teacher's ambient globals (an exiftool handle, a verbose
//! flag) with an explicit, injectable bag — no singletons, so tests can
//! build their own.

use std::path::{Path, PathBuf};

use crate::config::{MimeTable, PipelineConfig};
use crate::exiftool::ExifTool;

pub struct ProcessingContext {
  pub config: PipelineConfig,
  pub mime_table: MimeTable,
  exiftool: Option<Box<dyn ExifTool>>,
}

impl ProcessingContext {
  pub fn new(config: PipelineConfig, exiftool: Option<Box<dyn ExifTool>>) -> Self {
    Self { config, mime_table: MimeTable::new(), exiftool }
  }

  pub fn input_dir(&self) -> &Path {
    &self.config.input_dir
  }

  pub fn output_dir(&self) -> &Path {
    &self.config.output_dir
  }

  /// The exiftool adapter, if one was discovered/started. Absent means
  /// callers (stage 7) fall back to the native writer (spec 4.7).
  pub fn exiftool(&self) -> Option<&dyn ExifTool> {
    self.exiftool.as_deref()
  }

  pub fn exiftool_mut(&mut self) -> Option<&mut (dyn ExifTool + 'static)> {
    self.exiftool.as_deref_mut()
  }

  /// Where stage 6 moves files that are not (yet) dated, given `album` and
  /// `partner_shared` — delegates to `path_gen`, kept here only as a
  /// convenience so stages don't need to import both modules everywhere.
  pub fn output_for(&self, rel: impl AsRef<Path>) -> PathBuf {
    self.output_dir().join(rel)
  }

  /// `path` relative to the output root, forward-slash-normalized, for
  /// manifest entries (spec 4.6.5 JSON strategy). Falls back to `path`
  /// itself if it isn't under the output root.
  pub fn relative_to_output(&self, path: &Path) -> PathBuf {
    path.strip_prefix(self.output_dir()).map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
  }
}
