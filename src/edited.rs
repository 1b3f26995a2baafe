// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! "Edited version" detection (spec 4.4), consumed by stage 1 (skip rename)
//! and the sidecar matcher (strip suffix before looking for a `.json`).

use unicode_normalization::UnicodeNormalization;

use crate::config::constants::EDITED_SUFFIXES;

/// Whether `basename_no_ext` (already without its media extension) ends with
/// one of the known localized "edited" markers.
pub fn is_edited_basename(basename_no_ext: &str) -> bool {
  strip_edited_suffix(basename_no_ext).is_some()
}

/// Strips a trailing edited-suffix (full or partial, per spec 4.4) from
/// `basename_no_ext`, returning the base name without it. Returns `None` if no
/// suffix (full or partial) matches.
pub fn strip_edited_suffix(basename_no_ext: &str) -> Option<String> {
  let normalized: String = basename_no_ext.nfc().collect::<String>().to_lowercase();

  for suffix in EDITED_SUFFIXES {
    if let Some(stripped) = strip_full_or_partial(&normalized, basename_no_ext, suffix) {
      return Some(stripped);
    }
  }

  None
}

/// Tries `suffix` in full, then partial prefixes of length >= 2 (optionally
/// followed by a `(\d+)` disambiguator truncation artifact), against the
/// end of `normalized`. Returns the corresponding prefix of the
/// *original-cased* `original` string.
fn strip_full_or_partial(normalized: &str, original: &str, suffix: &str) -> Option<String> {
  // Full suffix, optionally followed by a disambiguator like "(1)" that
  // Google Photos appends when two edited copies would otherwise collide.
  if let Some(prefix_len) = match_with_optional_counter(normalized, suffix) {
    return Some(original[..prefix_len].to_string());
  }

  // Partial suffix: filesystem truncation (e.g. a 255-byte name limit) can
  // chop a localized suffix mid-way. Try decreasing prefixes of the suffix,
  // but never shorter than 2 characters (`-e` is too ambiguous to count).
  let suffix_chars: Vec<char> = suffix.chars().collect();
  for len in (2..suffix_chars.len()).rev() {
    let partial: String = suffix_chars[..len].iter().collect();
    if let Some(prefix_len) = match_with_optional_counter(normalized, &partial) {
      return Some(original[..prefix_len].to_string());
    }
  }

  None
}

/// Matches `normalized` ending with `suffix`, optionally followed by
/// `(\d+)`. Returns the byte length of the remaining prefix (in
/// `normalized`'s indexing, which is ASCII/NFC-stable length-wise for our
/// purposes since we only slice at suffix boundaries we just matched).
fn match_with_optional_counter(normalized: &str, suffix: &str) -> Option<usize> {
  if let Some(stripped) = normalized.strip_suffix(suffix) {
    return Some(stripped.len());
  }

  // `-edited(1)`.
  if let Some(open) = normalized.rfind('(') {
    if normalized.ends_with(')') {
      let digits = &normalized[open + 1..normalized.len() - 1];
      if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        if let Some(stripped) = normalized[..open].strip_suffix(suffix) {
          return Some(stripped.len());
        }
      }
    }
  }

  None
}


#[cfg(test)]
mod test_strip_edited_suffix {
  use super::*;

  #[test]
  fn strips_full_suffix_for_sidecar_matching() {
    assert_eq!(strip_edited_suffix("IMG_1234-edited"), Some("IMG_1234".to_string()));
  }

  #[test]
  fn strips_partial_suffix_but_is_distinct_from_renaming() {
    // "…-ed.jpg" strips to "….jpg" for sidecar matching, but the file itself
    // is never renamed by this module (spec §8 boundary behavior).
    assert_eq!(strip_edited_suffix("IMG_1234-ed"), Some("IMG_1234".to_string()));
  }
}
