// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! The real, process-backed `ExifTool` implementation (spec 4.7.1).
//!
//! One long-lived `exiftool -stay_open True -@ -` child is launched lazily by
//! the caller (see `discover_binary`); this type owns it for the lifetime of
//! the run and serializes requests through it via `protocol::ResponseRouter`.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use super::protocol::{self, ResponseRouter};
use super::{ExifTool, TagMap};
use crate::error::{PipelineError, Result};

pub struct PersistentExifTool {
  child: Child,
  stdin: ChildStdin,
  seq: AtomicU64,
  router: Arc<ResponseRouter>,
  reader_handle: Option<JoinHandle<()>>,
  stderr_handle: Option<JoinHandle<()>>,
}

impl PersistentExifTool {
  /// Launches `binary` in `-stay_open` batch mode and starts the background
  /// reader threads that service it.
  pub fn spawn(binary: &Path) -> Result<Self> {
    let mut child = Command::new(binary)
      .args(["-stay_open", "True", "-@", "-"])
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|e| PipelineError::ExifToolUnavailable(format!("failed to spawn {}: {e}", binary.display())))?;

    let stdin = child
      .stdin
      .take()
      .ok_or_else(|| PipelineError::ExifToolUnavailable("no stdin handle".to_string()))?;
    let stdout = child
      .stdout
      .take()
      .ok_or_else(|| PipelineError::ExifToolUnavailable("no stdout handle".to_string()))?;
    let stderr = child
      .stderr
      .take()
      .ok_or_else(|| PipelineError::ExifToolUnavailable("no stderr handle".to_string()))?;

    let router = Arc::new(ResponseRouter::new());
    let reader_router = Arc::clone(&router);
    let reader_handle = thread::spawn(move || Self::read_loop(stdout, &reader_router));
    let stderr_handle = thread::spawn(move || Self::drain_stderr(stderr));

    Ok(Self {
      child,
      stdin,
      seq: AtomicU64::new(0),
      router,
      reader_handle: Some(reader_handle),
      stderr_handle: Some(stderr_handle),
    })
  }

  /// Finds an exiftool binary by trying, in order: `explicit`, `configured`
  /// (the config file's `exiftool_path`), bare `exiftool` (resolved via
  /// `PATH` by the OS loader), then a short list of common install
  /// locations. Each candidate is probed with `-ver`.
  pub fn discover_binary(explicit: Option<&Path>, configured: Option<&Path>) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = explicit {
      candidates.push(p.to_path_buf());
    }
    if let Some(p) = configured {
      candidates.push(p.to_path_buf());
    }
    candidates.push(PathBuf::from("exiftool"));
    candidates.extend(common_install_locations());

    candidates.into_iter().find(|c| probe(c))
  }

  fn read_loop(stdout: ChildStdout, router: &Arc<ResponseRouter>) {
    let reader = BufReader::new(stdout);
    let mut body: Vec<String> = Vec::new();

    for line in reader.lines() {
      let Ok(line) = line else { break };
      if let Some(seq) = protocol::parse_ready_marker(&line) {
        router.dispatch(seq, body.join("\n"));
        body.clear();
      } else {
        body.push(line);
      }
    }
  }

  fn drain_stderr(stderr: ChildStderr) {
    let reader = BufReader::new(stderr);
    for line in reader.lines().map_while(std::result::Result::ok) {
      if !line.trim().is_empty() {
        log::warn!("exiftool: {line}");
      }
    }
  }

  fn send(&mut self, args: Vec<String>) -> Result<String> {
    let seq = self.seq.fetch_add(1, Ordering::SeqCst);
    let rx = self.router.register(seq);

    for line in protocol::request_lines(seq, &args) {
      writeln!(self.stdin, "{line}")
        .map_err(|e| PipelineError::ExifToolUnavailable(format!("write to exiftool failed: {e}")))?;
    }
    self
      .stdin
      .flush()
      .map_err(|e| PipelineError::ExifToolUnavailable(format!("flush to exiftool failed: {e}")))?;

    match rx.recv_timeout(protocol::REQUEST_TIMEOUT) {
      Ok(body) => Ok(body),
      Err(_) => {
        self.router.abandon(seq);
        Err(PipelineError::ExifToolUnavailable(format!("request {seq} timed out after 2 minutes")))
      }
    }
  }
}

impl ExifTool for PersistentExifTool {
  fn read_tags(&mut self, path: &Path, tags: &[&str]) -> Result<TagMap> {
    let mut args: Vec<String> = tags.iter().map(|t| format!("-{t}")).collect();
    args.push("-json".to_string());
    args.push(path.to_string_lossy().into_owned());

    let body = self.send(args)?;
    parse_json_tags(&body)
  }

  fn write_tags(&mut self, path: &Path, tags: &TagMap) -> Result<()> {
    let mut args: Vec<String> = tags.iter().map(|(k, v)| format!("-{k}={v}")).collect();
    args.push("-overwrite_original".to_string());
    args.push(path.to_string_lossy().into_owned());

    let body = self.send(args)?;
    reject_if_error(&body, path)
  }

  fn copy_tags(&mut self, src: &Path, dst: &Path) -> Result<()> {
    let args = vec![
      "-tagsFromFile".to_string(),
      src.to_string_lossy().into_owned(),
      "-overwrite_original".to_string(),
      dst.to_string_lossy().into_owned(),
    ];

    let body = self.send(args)?;
    reject_if_error(&body, dst)
  }
}

impl Drop for PersistentExifTool {
  fn drop(&mut self) {
    let _ = writeln!(self.stdin, "-stay_open");
    let _ = writeln!(self.stdin, "False");
    let _ = writeln!(self.stdin, "-execute");
    let _ = self.stdin.flush();
    let _ = self.child.wait();

    if let Some(handle) = self.reader_handle.take() {
      let _ = handle.join();
    }
    if let Some(handle) = self.stderr_handle.take() {
      let _ = handle.join();
    }
  }
}

fn reject_if_error(body: &str, path: &Path) -> Result<()> {
  if body.to_lowercase().contains("error") {
    return Err(PipelineError::ExifToolUnavailable(format!(
      "exiftool reported an error on {}: {body}",
      path.display()
    )));
  }
  Ok(())
}

/// Parses a `-json` response body (a one-element array of tag/value pairs)
/// into a flat `TagMap`, dropping the `SourceFile` bookkeeping field.
fn parse_json_tags(body: &str) -> Result<TagMap> {
  let value: serde_json::Value =
    serde_json::from_str(body.trim()).map_err(|_| PipelineError::ExifToolUnavailable("malformed exiftool response".to_string()))?;

  let obj = value
    .get(0)
    .and_then(serde_json::Value::as_object)
    .ok_or_else(|| PipelineError::ExifToolUnavailable("empty exiftool response".to_string()))?;

  let mut tags = TagMap::new();
  for (key, val) in obj {
    if key == "SourceFile" {
      continue;
    }
    let as_string = match val {
      serde_json::Value::String(s) => s.clone(),
      other => other.to_string(),
    };
    tags.insert(key.clone(), as_string);
  }

  Ok(tags)
}

#[cfg(not(windows))]
fn common_install_locations() -> Vec<PathBuf> {
  vec![
    PathBuf::from("/usr/bin/exiftool"),
    PathBuf::from("/usr/local/bin/exiftool"),
    PathBuf::from("/opt/homebrew/bin/exiftool"),
  ]
}

#[cfg(windows)]
fn common_install_locations() -> Vec<PathBuf> {
  vec![
    PathBuf::from(r"C:\Program Files\exiftool\exiftool.exe"),
    PathBuf::from(r"C:\exiftool\exiftool.exe"),
  ]
}

fn probe(path: &Path) -> bool {
  Command::new(path).arg("-ver").output().map(|o| o.status.success()).unwrap_or(false)
}

#[cfg(test)]
mod test_parse_json_tags {
  use super::*;

  #[test]
  fn parses_string_and_numeric_fields() {
    let body = r#"[{"SourceFile":"a.jpg","DateTimeOriginal":"2021:06:15 10:11:12","ImageWidth":4032}]"#;
    let tags = parse_json_tags(body).unwrap();
    assert_eq!(tags.get("DateTimeOriginal").unwrap(), "2021:06:15 10:11:12");
    assert_eq!(tags.get("ImageWidth").unwrap(), "4032");
    assert!(!tags.contains_key("SourceFile"));
  }

  #[test]
  fn rejects_malformed_body() {
    assert!(parse_json_tags("not json").is_err());
  }

  #[test]
  fn rejects_empty_array() {
    assert!(parse_json_tags("[]").is_err());
  }
}

#[cfg(test)]
mod test_discover_binary {
  use super::*;

  #[test]
  fn returns_none_when_nothing_probes_successfully() {
    let bogus = PathBuf::from("/definitely/not/a/real/exiftool/binary");
    assert_eq!(PersistentExifTool::discover_binary(Some(&bogus), None), None);
  }
}
