// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! EXIF write-back (spec 4.7): writes a missing capture date and/or sidecar
//! GPS onto every materialized file, through the ExifTool adapter when one's
//! available, else a native JPEG-only writer.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::exif_native;
use crate::exiftool::TagMap;
use crate::model::{MediaCollection, ProcessingContext};
use crate::pipeline::{Failure, FailureCategory, StepResult};
use crate::sidecar::{find_sidecar, SidecarJson};
use crate::sniff::sniff_mime;

pub fn run(ctx: &mut ProcessingContext, collection: &mut MediaCollection) -> StepResult {
  let mut result = StepResult { stage: "exif-writeback", ..Default::default() };

  for entity in collection.iter_mut() {
    let date = entity.date_taken().filter(|_| entity.date_accuracy() != Some(1));
    let gps = sidecar_gps(entity.primary_file().source_path());
    if date.is_none() && gps.is_none() {
      continue;
    }

    for file in entity.all_files_mut() {
      if file.is_shortcut() || file.is_deleted() {
        continue;
      }
      let Some(target) = file.target_path() else { continue };
      let target = target.to_path_buf();

      if mime_mismatch(&ctx.mime_table, &target) {
        log::warn!("{}: extension/content MIME mismatch, skipping EXIF write-back", target.display());
        continue;
      }

      let outcome = match ctx.exiftool_mut() {
        Some(tool) => write_via_exiftool(tool, &target, date, gps),
        None => write_via_native(&target, date, gps, &ctx.mime_table),
      };

      match outcome {
        Ok(true) => result.updated += 1,
        Ok(false) => {}
        Err(message) => result.failed.push(Failure { path: target, category: FailureCategory::ExifTool, message }),
      }
    }
  }

  result
}

fn sidecar_gps(media_path: &Path) -> Option<(f64, f64)> {
  let sidecar_path = find_sidecar(media_path)?;
  let body = std::fs::read_to_string(sidecar_path).ok()?;
  let sidecar: SidecarJson = serde_json::from_str(&body).ok()?;
  let geo = sidecar.geo_data?;
  if geo.latitude == 0.0 && geo.longitude == 0.0 {
    return None;
  }
  Some((geo.latitude, geo.longitude))
}

/// `implied` vs. sniffed header MIME must agree, except the tiff/jpeg pair
/// RAW-as-jpeg and jpeg-as-tiff confusions that spec 4.7 exempts.
fn mime_mismatch(mime_table: &crate::config::MimeTable, path: &Path) -> bool {
  let Some(ext) = path.extension().and_then(|e| e.to_str()) else { return false };
  let Some(implied) = mime_table.mime_for_extension(ext) else { return false };

  let Ok(mut file) = std::fs::File::open(path) else { return false };
  let mut buf = [0u8; 128];
  let n = std::io::Read::read(&mut file, &mut buf).unwrap_or(0);
  let Some(sniffed) = sniff_mime(&buf[..n]) else { return false };

  if implied == sniffed {
    return false;
  }
  let tiff_jpeg_pair = (implied == "image/tiff" && sniffed == "image/jpeg") || (implied == "image/jpeg" && sniffed == "image/tiff");
  !tiff_jpeg_pair
}

fn write_via_exiftool(
  tool: &mut (dyn crate::exiftool::ExifTool + 'static),
  path: &Path,
  date: Option<NaiveDateTime>,
  gps: Option<(f64, f64)>,
) -> Result<bool, String> {
  let mut tags = TagMap::new();

  if let Some(date) = date {
    let formatted = date.format("%Y:%m:%d %H:%M:%S").to_string();
    tags.insert("DateTimeOriginal".to_string(), formatted.clone());
    tags.insert("DateTimeDigitized".to_string(), formatted.clone());
    tags.insert("DateTime".to_string(), formatted);
  }

  if let Some((lat, lon)) = gps {
    let existing = tool.read_tags(path, &["GPSLatitude", "GPSLongitude"]).map_err(|e| e.to_string())?;
    if !existing.contains_key("GPSLatitude") || !existing.contains_key("GPSLongitude") {
      tags.insert("GPSLatitude".to_string(), lat.abs().to_string());
      tags.insert("GPSLatitudeRef".to_string(), if lat >= 0.0 { "N".to_string() } else { "S".to_string() });
      tags.insert("GPSLongitude".to_string(), lon.abs().to_string());
      tags.insert("GPSLongitudeRef".to_string(), if lon >= 0.0 { "E".to_string() } else { "W".to_string() });
    }
  }

  if tags.is_empty() {
    return Ok(false);
  }

  tool.write_tags(path, &tags).map_err(|e| e.to_string())?;
  Ok(true)
}

fn write_via_native(path: &Path, date: Option<NaiveDateTime>, gps: Option<(f64, f64)>, mime_table: &crate::config::MimeTable) -> Result<bool, String> {
  let is_jpeg = path
    .extension()
    .and_then(|e| e.to_str())
    .and_then(|ext| mime_table.mime_for_extension(ext))
    .is_some_and(|mime| mime == "image/jpeg");

  if !is_jpeg {
    log::warn!("{}: no exiftool available and native writer only handles JPEG, skipping", path.display());
    return Ok(false);
  }

  exif_native::write_jpeg_tags(path, date, gps)?;
  Ok(true)
}

#[cfg(test)]
mod test_run {
  use tempfile::tempdir;

  use super::*;
  use crate::config::PipelineConfig;
  use crate::exif_native;
  use crate::model::{FileEntity, MediaEntity};

  struct FakeExifTool {
    written: Vec<(std::path::PathBuf, TagMap)>,
    existing_gps: bool,
  }

  impl crate::exiftool::ExifTool for FakeExifTool {
    fn read_tags(&mut self, _path: &Path, _tags: &[&str]) -> crate::error::Result<TagMap> {
      let mut map = TagMap::new();
      if self.existing_gps {
        map.insert("GPSLatitude".to_string(), "1".to_string());
        map.insert("GPSLongitude".to_string(), "1".to_string());
      }
      Ok(map)
    }

    fn write_tags(&mut self, path: &Path, tags: &TagMap) -> crate::error::Result<()> {
      self.written.push((path.to_path_buf(), tags.clone()));
      Ok(())
    }

    fn copy_tags(&mut self, _src: &Path, _dst: &Path) -> crate::error::Result<()> {
      Ok(())
    }
  }

  fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend(std::iter::repeat(0u8).take(128));
    bytes
  }

  #[test]
  fn writes_date_through_exiftool_when_available() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("out/a.jpg");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, jpeg_bytes()).unwrap();

    let mut collection = MediaCollection::new();
    let source = dir.path().join("a.jpg");
    std::fs::write(&source, jpeg_bytes()).unwrap();
    let mut file = FileEntity::new(&source, true);
    file.set_date_accuracy(Some(3));
    file.mark_moved(target.clone());
    let mut entity = MediaEntity::new(file);
    let date = NaiveDateTime::parse_from_str("2021-06-15 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    entity.set_date(date, 3, "filename");
    collection.push(entity);

    let mut ctx = ProcessingContext::new(
      PipelineConfig::default(),
      Some(Box::new(FakeExifTool { written: Vec::new(), existing_gps: false })),
    );

    let result = run(&mut ctx, &mut collection);
    assert_eq!(result.updated, 1);
  }

  #[test]
  fn skips_when_date_already_came_from_exif() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("out/a.jpg");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, jpeg_bytes()).unwrap();

    let mut collection = MediaCollection::new();
    let source = dir.path().join("a.jpg");
    std::fs::write(&source, jpeg_bytes()).unwrap();
    let mut file = FileEntity::new(&source, true);
    file.mark_moved(target.clone());
    let mut entity = MediaEntity::new(file);
    let date = NaiveDateTime::parse_from_str("2021-06-15 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    entity.set_date(date, 1, "exif");
    collection.push(entity);

    let mut ctx = ProcessingContext::new(
      PipelineConfig::default(),
      Some(Box::new(FakeExifTool { written: Vec::new(), existing_gps: false })),
    );

    let result = run(&mut ctx, &mut collection);
    assert_eq!(result.updated, 0);
  }

  #[test]
  fn falls_back_to_native_writer_without_exiftool() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("out/a.jpg");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, jpeg_bytes()).unwrap();

    let mut collection = MediaCollection::new();
    let source = dir.path().join("a.jpg");
    std::fs::write(&source, jpeg_bytes()).unwrap();
    let mut file = FileEntity::new(&source, true);
    file.mark_moved(target.clone());
    let mut entity = MediaEntity::new(file);
    let date = NaiveDateTime::parse_from_str("2021-06-15 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    entity.set_date(date, 3, "filename");
    collection.push(entity);

    let mut ctx = ProcessingContext::new(PipelineConfig::default(), None);

    let result = run(&mut ctx, &mut collection);
    assert_eq!(result.updated, 1);
    let _ = exif_native::write_jpeg_tags;
  }
}
