// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Rank-3 date extractor: timestamps embedded in camera/Takeout filename
//! conventions (spec 4.4).

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use super::DateResult;

const ACCURACY: u8 = 3;
const METHOD: &str = "filename";

/// Tries each known filename convention in turn against `basename` (with
/// extension already stripped by the caller) and returns the first date that
/// parses into valid calendar components.
pub fn extract(basename: &str) -> Option<DateResult> {
  extract_camera_style(basename)
    .or_else(|| extract_dotted_style(basename))
    .or_else(|| extract_screenshot_style(basename))
    .or_else(|| extract_bare_digits(basename))
    .map(|date| DateResult::new(date, ACCURACY, METHOD))
}

/// `IMG_20210615_101112`, `VID_20210615_101112`, with an optional trailing
/// `(n)`/`-n` disambiguator that the regex simply ignores.
fn extract_camera_style(basename: &str) -> Option<NaiveDateTime> {
  let re = Regex::new(r"^(?:IMG|VID|PXL|MVIMG)_(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})").unwrap();
  let caps = re.captures(basename)?;
  build(&caps, 1)
}

/// `2021-06-15 10.11.12`, a pattern some exported screenshots and WhatsApp
/// media use in place of colons (which aren't valid in Windows filenames).
fn extract_dotted_style(basename: &str) -> Option<NaiveDateTime> {
  let re = Regex::new(r"(\d{4})-(\d{2})-(\d{2})[ _](\d{2})\.(\d{2})\.(\d{2})").unwrap();
  let caps = re.captures(basename)?;
  build(&caps, 1)
}

/// `Screenshot_20210615-101112`, `Screenshot_2021-06-15-10-11-12`.
fn extract_screenshot_style(basename: &str) -> Option<NaiveDateTime> {
  let re = Regex::new(
    r"^Screenshot_(\d{4})-?(\d{2})-?(\d{2})[-_](\d{2})-?(\d{2})-?(\d{2})",
  )
  .unwrap();
  let caps = re.captures(basename)?;
  build(&caps, 1)
}

/// A bare 14-digit run (`YYYYMMDDHHMMSS`), used by some third-party backup
/// tools as the entire filename stem.
fn extract_bare_digits(basename: &str) -> Option<NaiveDateTime> {
  let re = Regex::new(r"(?:^|[^0-9])(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})(?:[^0-9]|$)").unwrap();
  let caps = re.captures(basename)?;
  build(&caps, 1)
}

/// Builds a `NaiveDateTime` from six consecutive numeric capture groups
/// starting at `first`, rejecting out-of-range calendar components.
fn build(caps: &regex::Captures, first: usize) -> Option<NaiveDateTime> {
  let field = |i: usize| caps.get(first + i)?.as_str().parse::<u32>().ok();

  let year = field(0)? as i32;
  let month = field(1)?;
  let day = field(2)?;
  let hour = field(3)?;
  let minute = field(4)?;
  let second = field(5)?;

  let date = NaiveDate::from_ymd_opt(year, month, day)?;
  date.and_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod test_extract {
  use super::*;

  #[test]
  fn parses_camera_style_img_name() {
    let result = extract("IMG_20210615_101112").unwrap();
    assert_eq!(result.date.to_string(), "2021-06-15 10:11:12");
    assert_eq!(result.accuracy, 3);
  }

  #[test]
  fn parses_camera_style_vid_name_with_disambiguator() {
    let result = extract("VID_20210615_101112(1)").unwrap();
    assert_eq!(result.date.to_string(), "2021-06-15 10:11:12");
  }

  #[test]
  fn parses_dotted_style_name() {
    let result = extract("2021-06-15 10.11.12").unwrap();
    assert_eq!(result.date.to_string(), "2021-06-15 10:11:12");
  }

  #[test]
  fn parses_screenshot_style_name() {
    let result = extract("Screenshot_20210615-101112").unwrap();
    assert_eq!(result.date.to_string(), "2021-06-15 10:11:12");
  }

  #[test]
  fn parses_bare_fourteen_digit_name() {
    let result = extract("backup_20210615101112_export").unwrap();
    assert_eq!(result.date.to_string(), "2021-06-15 10:11:12");
  }

  #[test]
  fn rejects_invalid_calendar_component() {
    // month 13 doesn't exist; the camera-style regex matches the digits but
    // `NaiveDate::from_ymd_opt` rejects them, so we fall through to no match.
    assert!(extract("IMG_20211315_101112").is_none());
  }

  #[test]
  fn rejects_name_with_no_embedded_date() {
    assert!(extract("my_favorite_photo").is_none());
  }
}
