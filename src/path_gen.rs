// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Target directory generator for stage 6 (spec 4.6.1): bucket selection
//! plus date subdivision, independent of any particular file operation.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::config::DateDivision;
use crate::paths::sanitize_album_name;

pub const ALL_PHOTOS: &str = "ALL_PHOTOS";
pub const PARTNER_SHARED: &str = "PARTNER_SHARED";
pub const ALBUMS: &str = "Albums";
pub const DATE_UNKNOWN: &str = "date-unknown";

/// Computes the output-relative directory (not including the destination
/// filename) for an entity given its bucket selection and date.
///
/// `album_name`, when present, always wins over `partner_shared` (spec
/// 4.6.1: the album bucket replaces ALL_PHOTOS/PARTNER_SHARED, it doesn't
/// nest inside it).
pub fn target_dir(
  album_name: Option<&str>,
  date: Option<NaiveDateTime>,
  division: DateDivision,
  partner_shared: bool,
) -> PathBuf {
  let mut dir = match album_name {
    Some(name) => PathBuf::from(ALBUMS).join(sanitize_album_name(name)),
    None if partner_shared => PathBuf::from(PARTNER_SHARED),
    None => PathBuf::from(ALL_PHOTOS),
  };

  match date {
    Some(date) => dir.push(date_subdivision(date, division)),
    None if division.level() > 0 => dir.push(DATE_UNKNOWN),
    None => {}
  }

  dir
}

fn date_subdivision(date: NaiveDateTime, division: DateDivision) -> PathBuf {
  use chrono::Datelike;

  match division {
    DateDivision::None => PathBuf::new(),
    DateDivision::Year => PathBuf::from(format!("{:04}", date.year())),
    DateDivision::YearMonth => PathBuf::from(format!("{:04}/{:02}", date.year(), date.month())),
    DateDivision::YearMonthDay => {
      PathBuf::from(format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day()))
    }
  }
}

#[cfg(test)]
mod test_target_dir {
  use chrono::NaiveDate;

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(10, 0, 0).unwrap()
  }

  #[test]
  fn all_photos_with_year_month_division() {
    let dir = target_dir(None, Some(date(2021, 6, 15)), DateDivision::YearMonth, false);
    assert_eq!(dir, PathBuf::from("ALL_PHOTOS/2021/06"));
  }

  #[test]
  fn partner_shared_replaces_all_photos() {
    let dir = target_dir(None, Some(date(2021, 6, 15)), DateDivision::Year, true);
    assert_eq!(dir, PathBuf::from("PARTNER_SHARED/2021"));
  }

  #[test]
  fn album_name_overrides_partner_shared() {
    let dir = target_dir(Some("Vacation"), Some(date(2021, 6, 15)), DateDivision::None, true);
    assert_eq!(dir, PathBuf::from("Albums/Vacation"));
  }

  #[test]
  fn missing_date_with_nonzero_division_goes_to_date_unknown() {
    let dir = target_dir(None, None, DateDivision::YearMonthDay, false);
    assert_eq!(dir, PathBuf::from("ALL_PHOTOS/date-unknown"));
  }

  #[test]
  fn missing_date_with_no_division_has_no_subdirectory() {
    let dir = target_dir(None, None, DateDivision::None, false);
    assert_eq!(dir, PathBuf::from("ALL_PHOTOS"));
  }

  #[test]
  fn division_level_three_includes_day() {
    let dir = target_dir(None, Some(date(2021, 6, 15)), DateDivision::YearMonthDay, false);
    assert_eq!(dir, PathBuf::from("ALL_PHOTOS/2021/06/15"));
  }

  #[test]
  fn album_name_is_sanitized() {
    let dir = target_dir(Some("Trip: Summer?"), None, DateDivision::None, false);
    assert_eq!(dir, PathBuf::from("Albums/Trip Summer"));
  }
}
