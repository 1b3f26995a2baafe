// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Rank-4 date extractor: the year from a Takeout `Photos from YYYY` album
//! folder name (spec 4.4, the lowest-confidence source).

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

use super::DateResult;

const ACCURACY: u8 = 4;
const METHOD: &str = "folder_year";

/// Extracts January 1st, 00:00, of the year named by a `Photos from YYYY`
/// folder. `folder_name` is matched case-insensitively after normalizing
/// underscores to spaces (Takeout occasionally ships folder names with `_`
/// where a space belongs). Years outside `[1900, current_year]` are rejected
/// as implausible rather than trusted literally.
pub fn extract(folder_name: &str) -> Option<DateResult> {
  let normalized = folder_name.replace('_', " ");

  let re = Regex::new(r"(?i)^photos from ((?:18|19|20)\d{2})$").unwrap();
  let caps = re.captures(normalized.trim())?;
  let year: i32 = caps.get(1)?.as_str().parse().ok()?;

  let current_year = Local::now().year();
  if year < 1900 || year > current_year {
    return None;
  }

  let date = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
  Some(DateResult::new(date, ACCURACY, METHOD))
}

#[cfg(test)]
mod test_extract {
  use super::*;

  #[test]
  fn parses_standard_folder_name() {
    let result = extract("Photos from 2021").unwrap();
    assert_eq!(result.date.to_string(), "2021-01-01 00:00:00");
    assert_eq!(result.accuracy, 4);
  }

  #[test]
  fn is_case_insensitive() {
    assert!(extract("photos FROM 2021").is_some());
  }

  #[test]
  fn normalizes_underscores_to_spaces() {
    assert!(extract("Photos_from_2021").is_some());
  }

  #[test]
  fn rejects_year_before_1900() {
    assert!(extract("Photos from 1899").is_none());
  }

  #[test]
  fn rejects_year_in_the_future() {
    let next_year = Local::now().year() + 1;
    assert!(extract(&format!("Photos from {next_year}")).is_none());
  }

  #[test]
  fn rejects_unrelated_folder_name() {
    assert!(extract("Album").is_none());
    assert!(extract("Photos from Italy").is_none());
  }
}
