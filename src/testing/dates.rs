// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Small date-building helper for test fixtures.

use chrono::{NaiveDate, NaiveDateTime};

/// Builds a naive date/time, panicking on an invalid calendar date — tests
/// should never construct one deliberately, so a panic surfaces the typo.
pub fn naive_date(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
  NaiveDate::from_ymd_opt(year, month, day)
    .and_then(|d| d.and_hms_opt(hour, min, sec))
    .unwrap_or_else(|| panic!("invalid date & time: {year}-{month}-{day}T{hour}:{min}:{sec}"))
}
