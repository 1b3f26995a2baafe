// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Date extraction (spec 4.4): runs the ranked extractor chain (EXIF,
//! sidecar JSON, filename pattern, folder year) over every entity still
//! missing a date, first success wins.

use crate::dates::{exif, filename, folder_year, sidecar_json};
use crate::model::{MediaCollection, ProcessingContext};
use crate::pipeline::{Failure, FailureCategory, StepResult};
use crate::sidecar::{find_sidecar, SidecarJson};

/// Tags requested from the ExifTool adapter; covers both the image and
/// video tag chains `dates::exif::extract` knows how to read.
const EXIF_TAGS: [&str; 4] = ["DateTimeOriginal", "DateTimeDigitized", "DateTime", "CreationTime"];

pub fn run(ctx: &mut ProcessingContext, collection: &mut MediaCollection) -> StepResult {
  let mut result = StepResult { stage: "dates", ..Default::default() };

  for entity in collection.iter_mut() {
    if entity.date_taken().is_some() {
      continue;
    }

    let primary_path = entity.primary_file().source_path().to_path_buf();
    let is_video = primary_path
      .extension()
      .and_then(|e| e.to_str())
      .and_then(|ext| ctx.mime_table.mime_for_extension(ext))
      .is_some_and(|mime| mime.starts_with("video/"));

    if over_size_cap(&ctx.config, &primary_path) {
      // Spec's resolved open question: a size-capped EXIF skip downgrades
      // straight to no-date rather than trying the remaining extractors.
      continue;
    }

    let found = read_exif_date(ctx, &primary_path, is_video, &mut result)
      .or_else(|| read_sidecar_date(&primary_path))
      .or_else(|| filename_stem(&primary_path).and_then(|stem| filename::extract(&stem)))
      .or_else(|| parent_folder_name(&primary_path).and_then(|name| folder_year::extract(&name)));

    if let Some(date) = found {
      entity.set_date(date.date, date.accuracy, date.method);
      result.updated += 1;
    }
  }

  result
}

fn over_size_cap(config: &crate::config::PipelineConfig, path: &std::path::Path) -> bool {
  config.enforce_max_file_size && std::fs::metadata(path).is_ok_and(|meta| meta.len() > config.max_file_size)
}

fn read_exif_date(
  ctx: &mut ProcessingContext,
  path: &std::path::Path,
  is_video: bool,
  result: &mut StepResult,
) -> Option<crate::dates::DateResult> {
  let tool = ctx.exiftool_mut()?;
  match tool.read_tags(path, &EXIF_TAGS) {
    Ok(tags) => exif::extract(&tags, is_video),
    Err(e) => {
      result.failed.push(Failure { path: path.to_path_buf(), category: FailureCategory::DateExtraction, message: e.to_string() });
      None
    }
  }
}

fn read_sidecar_date(media_path: &std::path::Path) -> Option<crate::dates::DateResult> {
  let sidecar_path = find_sidecar(media_path)?;
  let body = std::fs::read_to_string(sidecar_path).ok()?;
  let sidecar: SidecarJson = serde_json::from_str(&body).ok()?;
  sidecar_json::extract(&sidecar)
}

fn filename_stem(path: &std::path::Path) -> Option<String> {
  path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

fn parent_folder_name(path: &std::path::Path) -> Option<String> {
  path.parent()?.file_name()?.to_str().map(str::to_string)
}

#[cfg(test)]
mod test_run {
  use tempfile::tempdir;

  use super::*;
  use crate::config::PipelineConfig;
  use crate::model::{FileEntity, MediaEntity};

  fn ctx() -> ProcessingContext {
    ProcessingContext::new(PipelineConfig::default(), None)
  }

  #[test]
  fn falls_back_to_sidecar_json_when_no_exiftool() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("a.jpg");
    std::fs::write(&media, b"x").unwrap();
    std::fs::write(dir.path().join("a.jpg.json"), r#"{"photoTakenTime":{"timestamp":"1600000000"}}"#).unwrap();

    let mut collection = MediaCollection::new();
    collection.push(MediaEntity::new(FileEntity::new(&media, true)));

    let mut ctx = ctx();
    let result = run(&mut ctx, &mut collection);

    assert_eq!(result.updated, 1);
    let entity = collection.get(0).unwrap();
    assert_eq!(entity.date_accuracy(), Some(2));
  }

  #[test]
  fn falls_back_to_filename_pattern() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("IMG_20210615_101112.jpg");
    std::fs::write(&media, b"x").unwrap();

    let mut collection = MediaCollection::new();
    collection.push(MediaEntity::new(FileEntity::new(&media, true)));

    let mut ctx = ctx();
    run(&mut ctx, &mut collection);

    assert_eq!(collection.get(0).unwrap().date_accuracy(), Some(3));
  }

  #[test]
  fn falls_back_to_folder_year() {
    let dir = tempdir().unwrap();
    let year_dir = dir.path().join("Photos from 2019");
    std::fs::create_dir_all(&year_dir).unwrap();
    let media = year_dir.join("mystery.jpg");
    std::fs::write(&media, b"x").unwrap();

    let mut collection = MediaCollection::new();
    collection.push(MediaEntity::new(FileEntity::new(&media, true)));

    let mut ctx = ctx();
    run(&mut ctx, &mut collection);

    assert_eq!(collection.get(0).unwrap().date_accuracy(), Some(4));
  }

  #[test]
  fn leaves_entity_dateless_when_nothing_matches() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("mystery.jpg");
    std::fs::write(&media, b"x").unwrap();

    let mut collection = MediaCollection::new();
    collection.push(MediaEntity::new(FileEntity::new(&media, true)));

    let mut ctx = ctx();
    let result = run(&mut ctx, &mut collection);

    assert_eq!(result.updated, 0);
    assert!(collection.get(0).unwrap().date_taken().is_none());
  }

  #[test]
  fn skips_entities_that_already_have_a_date() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("IMG_20210615_101112.jpg");
    std::fs::write(&media, b"x").unwrap();

    let mut collection = MediaCollection::new();
    let mut entity = MediaEntity::new(FileEntity::new(&media, true));
    let preset = chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    entity.set_date(preset, 1, "exif");
    collection.push(entity);

    let mut ctx = ctx();
    let result = run(&mut ctx, &mut collection);

    assert_eq!(result.updated, 0);
    assert_eq!(collection.get(0).unwrap().date_accuracy(), Some(1));
  }

  #[test]
  fn oversized_file_under_enforced_cap_stays_dateless() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("IMG_20210615_101112.jpg");
    std::fs::write(&media, vec![0u8; 1024]).unwrap();

    let mut collection = MediaCollection::new();
    collection.push(MediaEntity::new(FileEntity::new(&media, true)));

    let mut config = PipelineConfig::default();
    config.enforce_max_file_size = true;
    config.max_file_size = 10;
    let mut ctx = ProcessingContext::new(config, None);

    let result = run(&mut ctx, &mut collection);

    assert_eq!(result.updated, 0);
    assert!(collection.get(0).unwrap().date_taken().is_none());
  }
}
