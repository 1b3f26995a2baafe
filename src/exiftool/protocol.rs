// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Wire protocol for exiftool's `-stay_open True -@ -` batch mode (spec
//! 4.7.1): argument framing on the way in, ready-marker-delimited response
//! collection on the way out.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// Requests are abandoned if no response arrives within this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const READY_PREFIX: &str = "----GPTH-READY-";
const READY_SUFFIX: &str = "----";

/// Builds the stdin lines for one request: the argument block (one token per
/// line, exiftool's `-@` batch-file convention), then the three framing
/// lines that make the response delimitable: `-echo3`, the ready marker
/// (echoed back on stdout once the preceding args have executed), and
/// `-execute`.
pub fn request_lines(seq: u64, args: &[String]) -> Vec<String> {
  let mut lines = Vec::with_capacity(args.len() + 3);
  lines.extend(args.iter().cloned());
  lines.push("-echo3".to_string());
  lines.push(ready_marker(seq));
  lines.push("-execute".to_string());
  lines
}

fn ready_marker(seq: u64) -> String {
  format!("{READY_PREFIX}{seq}{READY_SUFFIX}")
}

/// If `line` is a ready marker, returns the `seq` it closes out.
pub fn parse_ready_marker(line: &str) -> Option<u64> {
  let rest = line.strip_prefix(READY_PREFIX)?;
  let digits = rest.strip_suffix(READY_SUFFIX)?;
  digits.parse().ok()
}

/// Routes stdout accumulated between ready markers back to the caller that
/// issued the matching-`seq` request. The child process is single-threaded,
/// so responses arrive in FIFO order, but callers may enqueue overlapping
/// requests from different threads (spec §4.7.1, item 2) — this is what
/// lets them share one child process safely.
#[derive(Default)]
pub struct ResponseRouter {
  pending: Mutex<HashMap<u64, Sender<String>>>,
}

impl ResponseRouter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers interest in `seq`'s response, returning the receiving end.
  pub fn register(&self, seq: u64) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    self.pending.lock().unwrap().insert(seq, tx);
    rx
  }

  /// Delivers `body` (everything printed before the ready marker) to
  /// whoever registered for `seq`, if anyone still is.
  pub fn dispatch(&self, seq: u64, body: String) {
    if let Some(tx) = self.pending.lock().unwrap().remove(&seq) {
      let _ = tx.send(body);
    }
  }

  /// Drops a registration that timed out, so a late response doesn't leak.
  pub fn abandon(&self, seq: u64) {
    self.pending.lock().unwrap().remove(&seq);
  }
}

#[cfg(test)]
mod test_request_lines {
  use super::*;

  #[test]
  fn frames_args_with_ready_marker_and_execute() {
    let lines = request_lines(7, &["-json".to_string(), "photo.jpg".to_string()]);
    assert_eq!(
      lines,
      vec![
        "-json".to_string(),
        "photo.jpg".to_string(),
        "-echo3".to_string(),
        "----GPTH-READY-7----".to_string(),
        "-execute".to_string(),
      ]
    );
  }
}
