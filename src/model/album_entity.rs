// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! One album association of a [`super::MediaEntity`].

use std::collections::HashSet;
use std::path::PathBuf;

/// An album a `MediaEntity` belongs to, and the source folders that
/// contributed that membership (spec §3).
pub struct AlbumEntity {
  name: String,
  source_directories: HashSet<PathBuf>,
}

impl AlbumEntity {
  /// Creates a new album membership. `name` must already be trimmed and
  /// non-empty; callers (stage 2 discovery, stage 5 consolidation) enforce
  /// that.
  pub fn new(name: impl Into<String>, source_directory: impl Into<PathBuf>) -> Self {
    let mut source_directories = HashSet::new();
    source_directories.insert(source_directory.into());
    Self { name: name.into(), source_directories }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn source_directories(&self) -> &HashSet<PathBuf> {
    &self.source_directories
  }

  pub fn add_source_directory(&mut self, dir: PathBuf) {
    self.source_directories.insert(dir);
  }

  /// Overwrites `name` (spec 4.5's re-trim pass). Callers must re-derive
  /// `albums_map`'s key from the new name themselves before reinserting.
  pub fn rename(&mut self, name: String) {
    self.name = name;
  }

  /// Merges `other` into `self`, unioning `source_directories` (spec §3).
  pub fn merge(&mut self, other: AlbumEntity) {
    self.source_directories.extend(other.source_directories);
  }
}

#[cfg(test)]
mod test_merge {
  use super::*;

  #[test]
  fn unions_source_directories() {
    let mut a = AlbumEntity::new("Vacation", "/in/Albums/Vacation");
    let b = AlbumEntity::new("Vacation", "/in/Albums/vacation (1)");

    a.merge(b);

    assert_eq!(a.source_directories().len(), 2);
  }
}
