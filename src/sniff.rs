// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Content sniffing for stage 1's extension correction (spec 4.1).
//!
//! Table-driven in the same spirit as `config::constants` — a small set of
//! magic-byte signatures is all stage 1 needs (it only cares whether the
//! sniffed MIME type *differs* from the one implied by the extension).

const SNIFF_WINDOW: usize = 128;

/// Sniffs the MIME type of `header`, the first up-to-128 bytes of a file's
/// content (spec 4.1). Returns `None` if no signature matches.
pub fn sniff_mime(header: &[u8]) -> Option<&'static str> {
  let header = &header[..header.len().min(SNIFF_WINDOW)];

  if header.starts_with(b"\xFF\xD8\xFF") {
    return Some("image/jpeg");
  }
  if header.starts_with(b"\x89PNG\r\n\x1a\n") {
    return Some("image/png");
  }
  if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
    return Some("image/gif");
  }
  if header.starts_with(b"BM") {
    return Some("image/bmp");
  }
  if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
    return Some("image/webp");
  }
  if header.len() >= 12 && &header[4..8] == b"ftyp" {
    let brand = &header[8..12];
    return Some(match brand {
      b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" | b"hevm" | b"hevs" => "image/heic",
      b"mif1" | b"msf1" => "image/heif",
      b"qt  " => "video/quicktime",
      _ => "video/mp4",
    });
  }
  if header.starts_with(b"II*\x00") || header.starts_with(b"MM\x00*") {
    return Some("image/tiff");
  }
  if header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"AVI " {
    return Some("video/x-msvideo");
  }
  if header.starts_with(b"\x1A\x45\xDF\xA3") {
    return Some("video/x-matroska");
  }

  None
}
