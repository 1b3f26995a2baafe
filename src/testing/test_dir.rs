// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Helper for setting up Takeout-shaped test directories: year folders,
//! album folders, media files, and sidecar JSON, without shelling out to a
//! real `exiftool` binary.

use std::{
  collections::HashSet,
  env, fs,
  path::{Path, PathBuf},
  sync::LazyLock,
};

static TEST_ROOT: LazyLock<PathBuf> = LazyLock::new(|| env::temp_dir().join(format!("{}_tests", env!("CARGO_PKG_NAME"))));

/// A scratch input/output tree for pipeline tests. Prefer the [`test_dir!`]
/// macro over calling [`TestDir::new`] directly.
pub struct TestDir {
  input:  PathBuf,
  output: PathBuf,
}

impl TestDir {
  /// Creates a fresh `<input>`/`<output>` pair under `TEST_ROOT/test_path`,
  /// clearing out anything left from a previous run.
  pub fn new(test_path: PathBuf) -> Self {
    let root = TEST_ROOT.join(test_path);
    if root.exists() {
      fs::remove_dir_all(&root).unwrap();
    }
    let input = root.join("input");
    let output = root.join("output");
    fs::create_dir_all(&input).unwrap();
    fs::create_dir_all(&output).unwrap();

    Self { input: input.canonicalize().unwrap(), output: output.canonicalize().unwrap() }
  }

  pub fn input(&self) -> &Path {
    &self.input
  }

  pub fn output(&self) -> &Path {
    &self.output
  }

  /// Writes `bytes` at `rel` under the input root, creating parent
  /// directories (e.g. `Photos from 2021/`, `Albums/Vacation/`) as needed.
  pub fn write_media(&self, rel: impl AsRef<Path>, bytes: &[u8]) -> PathBuf {
    let path = self.input.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
    path
  }

  /// Writes a Takeout `supplemental-metadata.json`-shaped sidecar for
  /// `media_rel`, with an optional capture timestamp (epoch seconds) and GPS
  /// coordinates (spec 4.2, 4.4, 4.7).
  pub fn write_sidecar(&self, media_rel: impl AsRef<Path>, photo_taken_time: Option<i64>, geo: Option<(f64, f64)>, title: Option<&str>) -> PathBuf {
    let media_path = self.input.join(media_rel);
    let sidecar_path = media_path.with_extension(format!("{}.json", media_path.extension().and_then(|e| e.to_str()).unwrap_or("")));

    let mut body = serde_json::json!({});
    if let Some(title) = title {
      body["title"] = serde_json::json!(title);
    }
    if let Some(ts) = photo_taken_time {
      body["photoTakenTime"] = serde_json::json!({ "timestamp": ts.to_string() });
    }
    if let Some((lat, lon)) = geo {
      body["geoData"] = serde_json::json!({ "latitude": lat, "longitude": lon });
    }

    fs::create_dir_all(sidecar_path.parent().unwrap()).unwrap();
    fs::write(&sidecar_path, serde_json::to_vec_pretty(&body).unwrap()).unwrap();
    sidecar_path
  }

  /// Every file under the output root, as paths relative to it, for
  /// `assert_output!`.
  pub fn output_files(&self) -> HashSet<PathBuf> {
    relative_files(&self.output, &self.output)
  }
}

fn relative_files(dir: &Path, root: &Path) -> HashSet<PathBuf> {
  let mut files = HashSet::new();
  for entry in fs::read_dir(dir).unwrap().map(Result::unwrap) {
    let file_type = entry.file_type().unwrap();
    if file_type.is_dir() {
      files.extend(relative_files(&entry.path(), root));
    } else {
      files.insert(entry.path().strip_prefix(root).unwrap().to_path_buf());
    }
  }
  files
}

/// Derives a unique, collision-free test path from the calling test
/// function's module path (e.g. `stages::stage4_dates::test_run::finds_exif_date`).
#[macro_export]
macro_rules! test_path {
  () => {{
    let mut function = $crate::testing::type_of(|| ()).rsplit("::");
    let case = function.nth(1).unwrap();
    let suite = function.next().unwrap();
    let module = function.next().unwrap();
    std::path::PathBuf::from(format!("{module}/{suite}/{case}"))
  }};
}

#[macro_export]
macro_rules! test_dir {
  () => {
    $crate::testing::TestDir::new($crate::test_path!())
  };
}

#[cfg(test)]
mod test_test_dir {
  use super::*;

  #[test]
  fn writes_media_and_matching_sidecar() {
    let dir = test_dir!();
    dir.write_media("Photos from 2021/a.jpg", b"x");
    dir.write_sidecar("Photos from 2021/a.jpg", Some(1_623_750_000), Some((37.7749, -122.4194)), Some("a.jpg"));

    assert!(dir.input().join("Photos from 2021/a.jpg").exists());
    assert!(dir.input().join("Photos from 2021/a.jpg.json").exists());
  }

  #[test]
  fn output_files_reports_paths_relative_to_output_root() {
    let dir = test_dir!();
    fs::create_dir_all(dir.output().join("ALL_PHOTOS")).unwrap();
    fs::write(dir.output().join("ALL_PHOTOS/a.jpg"), b"x").unwrap();

    assert_eq!(dir.output_files(), HashSet::from([PathBuf::from("ALL_PHOTOS/a.jpg")]));
  }
}
