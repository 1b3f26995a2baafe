// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Extension corrector (spec 4.1): sniffs each media file's real content and
//! renames it (and its sidecar) when the extension disagrees. Runs directly
//! against the input tree, ahead of discovery, since discovery must see the
//! corrected names.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::FixExtensions;
use crate::edited::is_edited_basename;
use crate::model::ProcessingContext;
use crate::pipeline::{Failure, FailureCategory, StepResult};
use crate::sidecar::find_sidecar;
use crate::sniff::sniff_mime;

const SNIFF_WINDOW: usize = 128;

pub fn run(ctx: &ProcessingContext) -> StepResult {
  let mut result = StepResult { stage: "extension-fix", ..Default::default() };

  if ctx.config.fix_extensions == FixExtensions::Off {
    return result;
  }

  for entry in WalkDir::new(ctx.input_dir()).into_iter().filter_map(Result::ok) {
    if !entry.file_type().is_file() {
      continue;
    }
    let path = entry.path();
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else { continue };
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };

    if ctx.mime_table.mime_for_extension(ext).is_none() {
      continue; // not a media extension at all
    }
    if ctx.mime_table.is_tiff_like(ext) {
      continue; // sniffer commonly misclassifies TIFF-likes; never touched
    }
    if is_edited_basename(stem) {
      continue;
    }

    let Some(sniffed) = sniff_header(path) else { continue };
    let implied = ctx.mime_table.mime_for_extension(ext);
    if implied == Some(sniffed) {
      continue; // extension already matches content
    }
    if ctx.config.fix_extensions == FixExtensions::NonJpeg && sniffed == "image/jpeg" {
      continue; // conservative mode: never rename content that sniffs as JPEG
    }

    if sniffed == "video/x-msvideo" && ext.eq_ignore_ascii_case("mp4") {
      log::info!("{}: AVI content mislabeled with .mp4 extension", path.display());
    }

    let Some(new_ext) = extension_for_mime(sniffed) else { continue };
    let new_path = path.with_extension(new_ext);

    match rename_pair(path, &new_path, ctx.config.fix_extensions == FixExtensions::Solo) {
      Ok(()) => result.updated += 1,
      Err(message) => result.failed.push(Failure { path: path.to_path_buf(), category: FailureCategory::ExtensionFix, message }),
    }
  }

  result
}

fn sniff_header(path: &Path) -> Option<&'static str> {
  let mut file = File::open(path).ok()?;
  let mut buf = [0u8; SNIFF_WINDOW];
  let n = file.read(&mut buf).ok()?;
  sniff_mime(&buf[..n])
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
  crate::config::constants::EXTENSION_MIME.iter().find(|(_, m)| *m == mime).map(|(ext, _)| *ext)
}

/// Renames `old_media` to `new_media`, and (unless `solo`) its sidecar along
/// with it, atomically: if the sidecar rename fails, the media rename is
/// rolled back. A rollback that itself fails is reported rather than
/// silently swallowed (spec 4.1).
fn rename_pair(old_media: &Path, new_media: &Path, solo: bool) -> Result<(), String> {
  let sidecar = find_sidecar(old_media);

  std::fs::rename(old_media, new_media).map_err(|e| format!("failed to rename media file: {e}"))?;

  if solo {
    return Ok(());
  }

  let Some(old_sidecar) = sidecar else { return Ok(()) };
  let new_sidecar = sidecar_path_for(new_media);

  if let Err(e) = std::fs::rename(&old_sidecar, &new_sidecar) {
    return match std::fs::rename(new_media, old_media) {
      Ok(()) => Err(format!("sidecar rename failed, media rename rolled back: {e}")),
      Err(rollback_err) => Err(format!(
        "sidecar rename failed ({e}) and rollback of media rename also failed ({rollback_err}); \
         {old_media} and {new_media} may both be in an inconsistent state",
        old_media = old_media.display(),
        new_media = new_media.display(),
      )),
    };
  }

  Ok(())
}

fn sidecar_path_for(media_path: &Path) -> PathBuf {
  let mut s = media_path.as_os_str().to_owned();
  s.push(".json");
  PathBuf::from(s)
}

#[cfg(test)]
mod test_run {
  use tempfile::tempdir;

  use super::*;
  use crate::config::PipelineConfig;

  const JPEG_HEADER: &[u8] = b"\xFF\xD8\xFF\xE0rest of a jpeg";

  fn ctx_for(input_dir: std::path::PathBuf, fix_extensions: FixExtensions) -> ProcessingContext {
    let mut config = PipelineConfig::default();
    config.input_dir = input_dir;
    config.fix_extensions = fix_extensions;
    ProcessingContext::new(config, None)
  }

  #[test]
  fn renames_media_and_sidecar_when_content_disagrees() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.png");
    let sidecar = dir.path().join("photo.png.json");
    std::fs::write(&media, JPEG_HEADER).unwrap();
    std::fs::write(&sidecar, b"{}").unwrap();

    let ctx = ctx_for(dir.path().to_path_buf(), FixExtensions::Standard);
    let result = run(&ctx);

    assert_eq!(result.updated, 1);
    assert!(!media.exists());
    assert!(dir.path().join("photo.jpg").exists());
    assert!(dir.path().join("photo.jpg.json").exists());
  }

  #[test]
  fn leaves_tiff_like_extensions_untouched() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.cr2");
    std::fs::write(&media, JPEG_HEADER).unwrap();

    let ctx = ctx_for(dir.path().to_path_buf(), FixExtensions::Standard);
    let result = run(&ctx);

    assert_eq!(result.updated, 0);
    assert!(media.exists());
  }

  #[test]
  fn conservative_mode_skips_jpeg_content() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.png");
    std::fs::write(&media, JPEG_HEADER).unwrap();

    let ctx = ctx_for(dir.path().to_path_buf(), FixExtensions::NonJpeg);
    let result = run(&ctx);

    assert_eq!(result.updated, 0);
    assert!(media.exists());
  }

  #[test]
  fn off_mode_never_walks_the_tree() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.png");
    std::fs::write(&media, JPEG_HEADER).unwrap();

    let ctx = ctx_for(dir.path().to_path_buf(), FixExtensions::Off);
    let result = run(&ctx);

    assert_eq!(result.updated, 0);
    assert!(media.exists());
  }

  #[test]
  fn skips_edited_suffix_basenames() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo-edited.png");
    std::fs::write(&media, JPEG_HEADER).unwrap();

    let ctx = ctx_for(dir.path().to_path_buf(), FixExtensions::Standard);
    let result = run(&ctx);

    assert_eq!(result.updated, 0);
    assert!(media.exists());
  }

  #[test]
  fn solo_mode_renames_media_only() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("photo.png");
    let sidecar = dir.path().join("photo.png.json");
    std::fs::write(&media, JPEG_HEADER).unwrap();
    std::fs::write(&sidecar, b"{}").unwrap();

    let ctx = ctx_for(dir.path().to_path_buf(), FixExtensions::Solo);
    let result = run(&ctx);

    assert_eq!(result.updated, 1);
    assert!(dir.path().join("photo.jpg").exists());
    assert!(sidecar.exists());
    assert!(!dir.path().join("photo.jpg.json").exists());
  }
}
