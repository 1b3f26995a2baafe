// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Collision-free move/copy with date-derived filenames (spec 4.6.2).
//!
//! `FileOpsService` owns the in-memory used-name cache; one instance is
//! shared for the duration of a stage 6 run so the `(n)` disambiguation
//! policy sees every name it has already handed out, not just what's on
//! disk at the moment a given call starts (spec §5's TOCTOU note).

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::{fs, io};

use chrono::NaiveDateTime;

#[derive(Default)]
pub struct FileOpsService {
  reserved: HashMap<PathBuf, HashSet<OsString>>,
}

impl FileOpsService {
  pub fn new() -> Self {
    Self::default()
  }

  /// Moves `src` into `dst_dir`, keeping `src`'s basename unless it
  /// collides, in which case ` (n)` is inserted before the extension.
  /// Implemented as a rename, falling back to copy+delete across devices.
  /// Never overwrites an existing destination.
  pub fn move_file(&mut self, src: &Path, dst_dir: &Path, date: Option<NaiveDateTime>) -> io::Result<PathBuf> {
    let dst = self.reserve_destination(src, dst_dir)?;

    match fs::rename(src, &dst) {
      Ok(()) => {}
      Err(_) => {
        fs::copy(src, &dst)?;
        fs::remove_file(src)?;
      }
    }

    if let Some(date) = date {
      set_mtime(&dst, date)?;
    }

    Ok(dst)
  }

  /// Copies `src` into `dst_dir` under the same collision policy as
  /// [`Self::move_file`], leaving `src` in place.
  pub fn copy_file(&mut self, src: &Path, dst_dir: &Path, date: Option<NaiveDateTime>) -> io::Result<PathBuf> {
    let dst = self.reserve_destination(src, dst_dir)?;

    fs::copy(src, &dst)?;

    if let Some(date) = date {
      set_mtime(&dst, date)?;
    }

    Ok(dst)
  }

  /// Picks and reserves a collision-free destination path for `src`'s
  /// basename under `dst_dir`, without touching the filesystem.
  fn reserve_destination(&mut self, src: &Path, dst_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dst_dir)?;

    let basename = src.file_name().ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "source has no filename"))?;
    let used = self.used_names_for(dst_dir)?;

    let name = unique_name(used, basename.to_string_lossy().as_ref());
    used.insert(OsString::from(&name));

    Ok(dst_dir.join(name))
  }

  fn used_names_for(&mut self, dst_dir: &Path) -> io::Result<&mut HashSet<OsString>> {
    if !self.reserved.contains_key(dst_dir) {
      let existing = match fs::read_dir(dst_dir) {
        Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.file_name())).collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
        Err(e) => return Err(e),
      };
      self.reserved.insert(dst_dir.to_path_buf(), existing);
    }

    Ok(self.reserved.get_mut(dst_dir).unwrap())
  }
}

/// Finds the smallest-`n` `name (n).ext` variant of `basename` not already
/// in `used`, or `basename` itself if it isn't already taken. Also used by
/// the platform shortcut service (spec 4.6.3) to settle a link's final name.
pub(crate) fn unique_name(used: &HashSet<OsString>, basename: &str) -> String {
  if !used.contains(OsString::from(basename).as_os_str()) {
    return basename.to_string();
  }

  let path = Path::new(basename);
  let stem = path.file_stem().map_or(basename, |s| s.to_str().unwrap_or(basename));
  let ext = path.extension().and_then(|e| e.to_str());

  for n in 1.. {
    let candidate = match ext {
      Some(ext) => format!("{stem} ({n}).{ext}"),
      None => format!("{stem} ({n})"),
    };
    if !used.contains(OsString::from(&candidate).as_os_str()) {
      return candidate;
    }
  }

  unreachable!("the non-negative integers are not exhausted")
}

fn set_mtime(path: &Path, date: NaiveDateTime) -> io::Result<()> {
  let ft = filetime::FileTime::from_unix_time(date.and_utc().timestamp(), 0);
  filetime::set_file_mtime(path, ft)
}

#[cfg(test)]
mod test_unique_name {
  use super::*;

  #[test]
  fn returns_basename_unchanged_when_free() {
    let used = HashSet::new();
    assert_eq!(unique_name(&used, "a.jpg"), "a.jpg");
  }

  #[test]
  fn appends_counter_on_collision() {
    let mut used = HashSet::new();
    used.insert(OsString::from("a.jpg"));
    assert_eq!(unique_name(&used, "a.jpg"), "a (1).jpg");
  }

  #[test]
  fn finds_smallest_free_counter() {
    let mut used = HashSet::new();
    for name in ["a.jpg", "a (1).jpg", "a (2).jpg"] {
      used.insert(OsString::from(name));
    }
    assert_eq!(unique_name(&used, "a.jpg"), "a (3).jpg");
  }

  #[test]
  fn handles_extensionless_names() {
    let mut used = HashSet::new();
    used.insert(OsString::from("README"));
    assert_eq!(unique_name(&used, "README"), "README (1)");
  }
}

#[cfg(test)]
mod test_file_ops_service {
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn move_file_relocates_and_sets_mtime() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.jpg");
    let dst_dir = dir.path().join("out");
    std::fs::write(&src, b"hello").unwrap();

    let mut service = FileOpsService::new();
    let date = NaiveDateTime::parse_from_str("2021-06-15 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    let dst = service.move_file(&src, &dst_dir, Some(date)).unwrap();

    assert!(!src.exists());
    assert!(dst.exists());
    assert_eq!(dst, dst_dir.join("a.jpg"));
  }

  #[test]
  fn repeated_moves_into_same_directory_get_disambiguated() {
    let dir = tempdir().unwrap();
    let dst_dir = dir.path().join("out");
    let mut service = FileOpsService::new();

    let first = dir.path().join("a.jpg");
    std::fs::write(&first, b"one").unwrap();
    let moved_first = service.move_file(&first, &dst_dir, None).unwrap();

    let second = dir.path().join("dup/a.jpg");
    std::fs::create_dir_all(second.parent().unwrap()).unwrap();
    std::fs::write(&second, b"two").unwrap();
    let moved_second = service.move_file(&second, &dst_dir, None).unwrap();

    assert_eq!(moved_first, dst_dir.join("a.jpg"));
    assert_eq!(moved_second, dst_dir.join("a (1).jpg"));
  }

  #[test]
  fn copy_file_leaves_source_in_place() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.jpg");
    let dst_dir = dir.path().join("out");
    std::fs::write(&src, b"hello").unwrap();

    let mut service = FileOpsService::new();
    let dst = service.copy_file(&src, &dst_dir, None).unwrap();

    assert!(src.exists());
    assert!(dst.exists());
  }
}
