// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Streaming content hasher used by stage 3's duplicate coalescing.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

const BUF_SIZE: usize = 64 * 1024;

/// A hex-encoded SHA-256 digest, suitable as a `HashMap` key for grouping
/// same-content files (spec 4.3).
pub type ContentDigest = String;

/// Hashes `path`'s full content in fixed-size chunks, never loading the whole
/// file into memory.
pub fn hash_file(path: &Path) -> io::Result<ContentDigest> {
  let file = File::open(path)?;
  let mut reader = BufReader::with_capacity(BUF_SIZE, file);
  let mut hasher = Sha256::new();
  let mut buf = [0u8; BUF_SIZE];

  loop {
    let n = reader.read(&mut buf)?;
    if n == 0 {
      break;
    }
    hasher.update(&buf[..n]);
  }

  Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod test_hash_file {
  use std::io::Write;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn identical_content_hashes_equal() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.jpg");
    std::fs::write(&a, b"same bytes").unwrap();
    std::fs::write(&b, b"same bytes").unwrap();

    assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
  }

  #[test]
  fn different_content_hashes_differ() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.jpg");
    std::fs::write(&a, b"bytes one").unwrap();
    std::fs::write(&b, b"bytes two").unwrap();

    assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
  }

  #[test]
  fn hashes_content_larger_than_one_buffer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("big.bin");
    let mut file = std::fs::File::create(&path).unwrap();
    let chunk = vec![7u8; BUF_SIZE];
    for _ in 0..3 {
      file.write_all(&chunk).unwrap();
    }
    drop(file);

    assert!(hash_file(&path).is_ok());
  }
}
