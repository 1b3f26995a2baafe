// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! OS-specific services: free disk space, symlink/shortcut creation, and
//! timestamp synchronization (spec 4.6.3, 4.8). Everything platform-specific
//! lives behind the [`Platform`] trait so stages and strategies stay
//! OS-agnostic; tests can substitute a fake.

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

pub trait Platform: Send + Sync {
  /// Free bytes available on the filesystem holding `path`.
  fn free_space(&self, path: &Path) -> io::Result<u64>;

  /// Creates a link in `dir` pointing at `target` under a name of the
  /// implementation's choosing (the caller settles the final name via
  /// [`create_link`]).
  fn create_raw_link(&self, dir: &Path, target: &Path) -> io::Result<PathBuf>;

  /// Resolves an existing link's target, for the "reuse an identical link"
  /// check in [`create_link`].
  fn resolve_link(&self, link_path: &Path) -> io::Result<PathBuf>;

  /// Sets both creation-time and last-modified-time of `path` to `date`
  /// (spec 4.8). `is_shortcut` selects symlink-aware, non-following
  /// semantics where the platform supports it.
  fn set_timestamps(&self, path: &Path, date: NaiveDateTime, is_shortcut: bool) -> io::Result<()>;
}

#[cfg(unix)]
pub fn current() -> Box<dyn Platform> {
  Box::new(unix::UnixPlatform)
}

#[cfg(windows)]
pub fn current() -> Box<dyn Platform> {
  Box::new(windows::WindowsPlatform)
}

/// Creates a link in `dir` pointing at `target`, then settles on its final
/// name (spec 4.6.3):
/// - no `preferred_basename` → keep whatever name the platform chose;
/// - an entry named `preferred_basename` already exists and already points
///   at `target` → drop the just-created link, reuse the existing one;
/// - otherwise → rename the new link into place, applying the ` (n)`
///   collision policy against every other name already in `dir`.
pub fn create_link(
  platform: &dyn Platform,
  dir: &Path,
  target: &Path,
  preferred_basename: Option<&str>,
) -> io::Result<PathBuf> {
  std::fs::create_dir_all(dir)?;

  let Some(preferred) = preferred_basename else {
    return platform.create_raw_link(dir, target);
  };

  let preferred_path = dir.join(preferred);
  if preferred_path.exists() && points_at(platform, &preferred_path, target) {
    return Ok(preferred_path);
  }

  let raw = platform.create_raw_link(dir, target)?;

  let mut used: HashSet<OsString> = std::fs::read_dir(dir)
    .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.file_name())).collect())
    .unwrap_or_default();
  if let Some(raw_name) = raw.file_name() {
    used.remove(raw_name);
  }

  let name = crate::file_ops::unique_name(&used, preferred);
  let dst = dir.join(&name);
  if dst != raw {
    std::fs::rename(&raw, &dst)?;
  }
  Ok(dst)
}

fn points_at(platform: &dyn Platform, link_path: &Path, target: &Path) -> bool {
  match platform.resolve_link(link_path) {
    Ok(resolved) => paths_equal(&resolved, target),
    Err(_) => false,
  }
}

fn paths_equal(a: &Path, b: &Path) -> bool {
  if a == b {
    return true;
  }
  match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}
