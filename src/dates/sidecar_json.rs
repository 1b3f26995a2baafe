// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Rank-2 date extractor: `photoTakenTime.timestamp` from the matched
//! Takeout sidecar JSON (spec 4.1, 4.4).

use chrono::DateTime;

use super::DateResult;
use crate::sidecar::SidecarJson;

const ACCURACY: u8 = 2;
const METHOD: &str = "sidecar_json";

/// Converts a parsed sidecar's `photoTakenTime` (UTC epoch seconds) into a
/// local-naive `DateResult`. Returns `None` if the sidecar carries no
/// timestamp field at all.
pub fn extract(sidecar: &SidecarJson) -> Option<DateResult> {
  let timestamp = sidecar.photo_taken_time.as_ref()?.timestamp;
  let date = DateTime::from_timestamp(timestamp, 0)?.naive_utc();

  Some(DateResult::new(date, ACCURACY, METHOD))
}

#[cfg(test)]
mod test_extract {
  use super::*;
  use crate::sidecar::TimestampField;

  #[test]
  fn extracts_timestamp_as_accuracy_two() {
    let sidecar = SidecarJson {
      photo_taken_time: Some(TimestampField { timestamp: 1_600_000_000 }),
      geo_data: None,
      title: None,
    };

    let result = extract(&sidecar).unwrap();
    assert_eq!(result.accuracy, 2);
    assert_eq!(result.method, "sidecar_json");
    assert_eq!(result.date.to_string(), "2020-09-13 12:26:40");
  }

  #[test]
  fn missing_timestamp_returns_none() {
    let sidecar = SidecarJson::default();
    assert!(extract(&sidecar).is_none());
  }
}
