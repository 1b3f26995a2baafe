// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Native, dependency-free EXIF write-back for JPEG (spec 4.7): the fallback
//! stage 7 uses when no `exiftool` binary was discovered. Grounded on
//! `little_exif`, the same crate the other Takeout-shaped example in this
//! corpus (`JeppeKlitgaard-GoogleTakeoutPhotoFixer`) uses for in-place EXIF
//! injection.

use std::path::Path;

use chrono::NaiveDateTime;
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;

/// Writes `date` and/or `gps` (decimal degrees, positive north/east) onto
/// `path`'s EXIF block in place, skipping whichever of the two already has a
/// value present. `path` must be a JPEG file; this writer handles no other
/// format (spec 4.7).
pub fn write_jpeg_tags(path: &Path, date: Option<NaiveDateTime>, gps: Option<(f64, f64)>) -> Result<(), String> {
  let existing = std::fs::read(path).map_err(|e| e.to_string())?;
  let mut metadata = Metadata::new_from_vec(&existing, FileExtension::JPEG).unwrap_or_else(|_| Metadata::new());

  if let Some(date) = date {
    let formatted = date.format("%Y:%m:%d %H:%M:%S").to_string();
    metadata.set_tag(ExifTag::DateTimeOriginal(formatted.clone()));
    metadata.set_tag(ExifTag::DateTimeDigitized(formatted.clone()));
    metadata.set_tag(ExifTag::DateTime(formatted));
  }

  if let Some((lat, lon)) = gps {
    if !has_gps(&metadata) {
      let (lat_dms, lat_ref) = to_dms(lat, "N", "S");
      let (lon_dms, lon_ref) = to_dms(lon, "E", "W");
      metadata.set_tag(ExifTag::GPSLatitude(lat_dms));
      metadata.set_tag(ExifTag::GPSLatitudeRef(lat_ref.to_string()));
      metadata.set_tag(ExifTag::GPSLongitude(lon_dms));
      metadata.set_tag(ExifTag::GPSLongitudeRef(lon_ref.to_string()));
    }
  }

  metadata.write_to_file(path).map_err(|e| e.to_string())
}

fn has_gps(metadata: &Metadata) -> bool {
  metadata.get_tag(&ExifTag::GPSLatitude(Vec::new())).next().is_some()
    && metadata.get_tag(&ExifTag::GPSLongitude(Vec::new())).next().is_some()
}

/// Converts signed decimal degrees into an EXIF degrees/minutes/seconds
/// rational triple plus hemisphere reference letter.
fn to_dms(signed_degrees: f64, positive_ref: &'static str, negative_ref: &'static str) -> (Vec<uR64>, &'static str) {
  let degrees = signed_degrees.abs();
  let whole_degrees = degrees.floor();
  let minutes_full = (degrees - whole_degrees) * 60.0;
  let whole_minutes = minutes_full.floor();
  let seconds = (minutes_full - whole_minutes) * 60.0;

  let dms = vec![
    uR64 { nominator: whole_degrees as u32, denominator: 1 },
    uR64 { nominator: whole_minutes as u32, denominator: 1 },
    uR64 { nominator: (seconds * 1000.0).round() as u32, denominator: 1000 },
  ];
  (dms, if signed_degrees >= 0.0 { positive_ref } else { negative_ref })
}
