// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! POSIX platform services: real symlinks, `df`-based free space, and
//! `utimensat`-equivalent timestamp sync via `filetime` (spec 4.6.3, 4.8).

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDateTime;
use filetime::{FileTime, set_file_times, set_symlink_file_times};

use super::Platform;

pub struct UnixPlatform;

impl Platform for UnixPlatform {
  fn free_space(&self, path: &Path) -> io::Result<u64> {
    let output = Command::new("df").args(["-Pk"]).arg(path).output()?;
    parse_df_available_kb(&String::from_utf8_lossy(&output.stdout))
      .map(|kb| kb * 1024)
      .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "could not parse `df` output"))
  }

  fn create_raw_link(&self, dir: &Path, target: &Path) -> io::Result<PathBuf> {
    let candidate = free_name(dir, target);
    std::os::unix::fs::symlink(target, &candidate)?;
    Ok(candidate)
  }

  fn resolve_link(&self, link_path: &Path) -> io::Result<PathBuf> {
    std::fs::read_link(link_path)
  }

  /// `utimensat(AT_FDCWD, path, [ts, ts], flags)` with `AT_SYMLINK_NOFOLLOW`
  /// iff `is_shortcut`; `filetime` picks the right syscall for us. Falls
  /// back to the non-symlink-aware setter if the symlink-aware one isn't
  /// supported on this platform.
  fn set_timestamps(&self, path: &Path, date: NaiveDateTime, is_shortcut: bool) -> io::Result<()> {
    let ts = FileTime::from_unix_time(date.and_utc().timestamp(), 0);
    if is_shortcut {
      set_symlink_file_times(path, ts, ts).or_else(|_| set_file_times(path, ts, ts))
    } else {
      set_file_times(path, ts, ts)
    }
  }
}

/// Picks a not-yet-existing basename for a raw link in `dir`, seeded from
/// `target`'s own basename (the caller settles the final name afterward).
fn free_name(dir: &Path, target: &Path) -> PathBuf {
  let base = target.file_name().map_or_else(|| "link".to_string(), |n| n.to_string_lossy().into_owned());
  let mut candidate = dir.join(&base);
  let mut n = 1;
  while candidate.exists() {
    candidate = dir.join(format!(".gpth-link-{n}-{base}"));
    n += 1;
  }
  candidate
}

/// Parses the second line of `df -Pk`'s POSIX-format output (`Filesystem
/// 1024-blocks Used Available Capacity Mounted-on`), taking the `Available`
/// column.
fn parse_df_available_kb(output: &str) -> Option<u64> {
  let data_line = output.lines().nth(1)?;
  data_line.split_whitespace().nth(3)?.parse().ok()
}
