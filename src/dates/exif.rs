// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Rank-1 date extractor: EXIF tags (images) / container `creation_time`
//! (videos), read via the `exiftool` adapter (spec 4.4 table row 1).

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::DateResult;

const ACCURACY: u8 = 1;
const METHOD: &str = "exif";

/// Tags tried in order for images; the first present wins (spec 4.4).
const IMAGE_TAGS: [&str; 3] = ["DateTimeOriginal", "DateTimeDigitized", "DateTime"];
/// Tag tried for videos (a container-level creation time, not a per-frame one).
const VIDEO_TAG: &str = "CreationTime";

/// Extracts a date from a flat tag map as returned by the exiftool adapter.
/// `is_video` selects between the image tag chain and the video tag.
pub fn extract(tags: &HashMap<String, String>, is_video: bool) -> Option<DateResult> {
  let raw = if is_video {
    tags.get(VIDEO_TAG)
  } else {
    IMAGE_TAGS.iter().find_map(|tag| tags.get(*tag))
  }?;

  let normalized = normalize_exif_datetime(raw)?;
  let date = NaiveDateTime::parse_from_str(&normalized, "%Y:%m:%d %H:%M:%S").ok()?;

  Some(DateResult::new(date, ACCURACY, METHOD))
}

/// Normalizes an EXIF date string to `YYYY:MM:DD HH:MM:SS` (spec 4.4):
/// replace `-`, `/`, `.`, `\` between date parts with `:`; map `: ` (colon
/// followed by space, a common malformed-hour artifact) to `:0`; truncate to
/// 19 characters; then change the first two `:` (in the date portion) to `-`
/// to reach ISO form, before reversing that back for the final parse target.
///
/// Per spec, the "ISO form" transformation is an intermediate normalization
/// step; what matters for parsing is that the date portion's separators are
/// consistent. We normalize straight to `:` throughout since that's what we
/// parse with above.
fn normalize_exif_datetime(raw: &str) -> Option<String> {
  if raw.trim().is_empty() {
    return None;
  }

  let mut s = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '-' | '/' | '.' | '\\' => s.push(':'),
      other => s.push(other),
    }
  }

  let s = s.replace(": ", ":0");

  let truncated: String = s.chars().take(19).collect();

  Some(truncated)
}
