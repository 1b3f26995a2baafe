// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Windows platform services: `.lnk` shell links via COM (with a PowerShell
//! fallback), `GetDiskFreeSpaceExW`, and `SetFileTime` (spec 4.6.3, 4.8).
//!
//! COM's apartment-threading requirement means link creation must run on a
//! dedicated worker thread (spec §9); `create_raw_link` spawns one per call
//! rather than assuming the caller already lives on one.

use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use chrono::NaiveDateTime;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Storage::FileSystem::{
  CreateFileW, FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OPEN_REPARSE_POINT, FILE_GENERIC_WRITE, FILE_SHARE_READ,
  FILE_SHARE_WRITE, FILETIME, GetDiskFreeSpaceExW, OPEN_EXISTING, SetFileTime,
};
use windows::Win32::System::Com::{
  CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx, CoUninitialize, IPersistFile,
};
use windows::Win32::UI::Shell::{IShellLinkW, ShellLink};
use windows::core::{Interface, PCWSTR};

use super::Platform;

pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
  fn free_space(&self, path: &Path) -> io::Result<u64> {
    let wide = to_wide(path);
    let mut free_bytes: u64 = 0;
    unsafe {
      GetDiskFreeSpaceExW(PCWSTR(wide.as_ptr()), Some(&mut free_bytes), None, None)
        .map_err(|e| io::Error::other(e.message()))?;
    }
    Ok(free_bytes)
  }

  fn create_raw_link(&self, dir: &Path, target: &Path) -> io::Result<PathBuf> {
    let candidate = free_lnk_name(dir, target);
    create_lnk(&candidate, target)?;
    Ok(candidate)
  }

  fn resolve_link(&self, link_path: &Path) -> io::Result<PathBuf> {
    resolve_lnk(link_path)
  }

  /// Opens the file (or, for a shortcut, the reparse point itself rather
  /// than following it) with `FILE_WRITE_ATTRIBUTES` and calls
  /// `SetFileTime(creation, null, write)` (spec 4.8). Always goes through
  /// an extended-length `\\?\` path to sidestep `MAX_PATH`.
  fn set_timestamps(&self, path: &Path, date: NaiveDateTime, is_shortcut: bool) -> io::Result<()> {
    let extended = extended_length_path(path);
    let wide = to_wide(Path::new(&extended));

    let mut flags = FILE_FLAG_BACKUP_SEMANTICS;
    if is_shortcut {
      flags |= FILE_FLAG_OPEN_REPARSE_POINT;
    }

    let handle: HANDLE = unsafe {
      CreateFileW(PCWSTR(wide.as_ptr()), FILE_GENERIC_WRITE.0, FILE_SHARE_READ | FILE_SHARE_WRITE, None, OPEN_EXISTING, flags, None)
    }
    .map_err(|e| io::Error::other(e.message()))?;

    let ft = to_filetime(date);
    let result = unsafe { SetFileTime(handle, Some(&ft), None, Some(&ft)) };
    unsafe {
      let _ = CloseHandle(handle);
    }
    result.map_err(|e| io::Error::other(e.message()))
  }
}

fn free_lnk_name(dir: &Path, target: &Path) -> PathBuf {
  let stem = target.file_stem().map_or_else(|| "link".to_string(), |n| n.to_string_lossy().into_owned());
  let mut candidate = dir.join(format!("{stem}.lnk"));
  let mut n = 1;
  while candidate.exists() {
    candidate = dir.join(format!("{stem} ({n}).lnk"));
    n += 1;
  }
  candidate
}

fn create_lnk(link_path: &Path, target: &Path) -> io::Result<()> {
  let link_path = link_path.to_path_buf();
  let target = target.to_path_buf();

  thread::spawn(move || create_lnk_via_com(&link_path, &target).or_else(|_| create_lnk_via_powershell(&link_path, &target)))
    .join()
    .map_err(|_| io::Error::other("shortcut worker thread panicked"))?
}

fn create_lnk_via_com(link_path: &Path, target: &Path) -> io::Result<()> {
  unsafe {
    CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok().map_err(|e| io::Error::other(e.message()))?;
    let result = (|| -> windows::core::Result<()> {
      let shell_link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)?;
      let target_wide = to_wide(target);
      shell_link.SetPath(PCWSTR(target_wide.as_ptr()))?;

      let persist_file: IPersistFile = shell_link.cast()?;
      let link_wide = to_wide(link_path);
      persist_file.Save(PCWSTR(link_wide.as_ptr()), true)?;
      Ok(())
    })();
    CoUninitialize();
    result.map_err(|e| io::Error::other(e.message()))
  }
}

/// Fallback when the COM path fails: shell out to `WScript.Shell`'s
/// `CreateShortcut`, escaping single quotes by doubling them (spec 4.6.3).
fn create_lnk_via_powershell(link_path: &Path, target: &Path) -> io::Result<()> {
  let escape = |p: &Path| p.to_string_lossy().replace('\'', "''");
  let script = format!(
    "$s = New-Object -ComObject WScript.Shell; $l = $s.CreateShortcut('{}'); $l.TargetPath = '{}'; $l.Save()",
    escape(link_path),
    escape(target)
  );

  let status = Command::new("powershell").args(["-NoProfile", "-NonInteractive", "-Command", &script]).status()?;
  if status.success() {
    Ok(())
  } else {
    Err(io::Error::other("powershell shortcut creation failed"))
  }
}

fn resolve_lnk(link_path: &Path) -> io::Result<PathBuf> {
  unsafe {
    CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok().map_err(|e| io::Error::other(e.message()))?;
    let result = (|| -> windows::core::Result<PathBuf> {
      let shell_link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)?;
      let persist_file: IPersistFile = shell_link.cast()?;
      let link_wide = to_wide(link_path);
      persist_file.Load(PCWSTR(link_wide.as_ptr()), 0)?;

      let mut buf = [0u16; 260];
      shell_link.GetPath(&mut buf, std::ptr::null_mut(), 0)?;
      let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
      Ok(PathBuf::from(String::from_utf16_lossy(&buf[..len])))
    })();
    CoUninitialize();
    result.map_err(|e| io::Error::other(e.message()))
  }
}

fn to_wide(path: &Path) -> Vec<u16> {
  path.as_os_str().encode_wide().chain(std::iter::once(0)).collect()
}

fn extended_length_path(path: &Path) -> String {
  let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
  let s = absolute.to_string_lossy();
  if s.starts_with(r"\\?\") { s.into_owned() } else { format!(r"\\?\{s}") }
}

/// `(ms_since_unix_epoch * 10000) + 116444736000000000` (spec 4.8): converts
/// a Unix-epoch timestamp to Windows' 100ns-tick, 1601-epoch `FILETIME`.
fn to_filetime(date: NaiveDateTime) -> FILETIME {
  let ms = date.and_utc().timestamp_millis();
  let ticks = (ms as u64).wrapping_mul(10_000).wrapping_add(116_444_736_000_000_000);
  FILETIME { dwLowDateTime: (ticks & 0xFFFF_FFFF) as u32, dwHighDateTime: (ticks >> 32) as u32 }
}

#[cfg(test)]
mod test_to_filetime {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn converts_unix_epoch_to_windows_epoch() {
    let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let ft = to_filetime(date);
    let ticks = (u64::from(ft.dwHighDateTime) << 32) | u64::from(ft.dwLowDateTime);
    assert_eq!(ticks, 116_444_736_000_000_000);
  }
}
