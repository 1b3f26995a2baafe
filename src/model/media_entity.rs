// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! One logical photo/video, the unit of work after stage 3's coalescing.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::{AlbumEntity, FileEntity};

pub struct MediaEntity {
  primary_file: FileEntity,
  secondary_files: Vec<FileEntity>,
  albums_map: HashMap<String, AlbumEntity>,
  date_taken: Option<NaiveDateTime>,
  date_accuracy: Option<u8>,
  date_time_extraction_method: Option<&'static str>,
  partner_shared: bool,
}

impl MediaEntity {
  pub fn new(primary_file: FileEntity) -> Self {
    Self {
      primary_file,
      secondary_files: Vec::new(),
      albums_map: HashMap::new(),
      date_taken: None,
      date_accuracy: None,
      date_time_extraction_method: None,
      partner_shared: false,
    }
  }

  pub fn primary_file(&self) -> &FileEntity {
    &self.primary_file
  }

  pub fn primary_file_mut(&mut self) -> &mut FileEntity {
    &mut self.primary_file
  }

  pub fn secondary_files(&self) -> &[FileEntity] {
    &self.secondary_files
  }

  pub fn secondary_files_mut(&mut self) -> &mut Vec<FileEntity> {
    &mut self.secondary_files
  }

  pub fn push_secondary(&mut self, file: FileEntity) {
    self.secondary_files.push(file);
  }

  /// Iterates over every `FileEntity` (primary then secondaries).
  pub fn all_files(&self) -> impl Iterator<Item = &FileEntity> {
    std::iter::once(&self.primary_file).chain(self.secondary_files.iter())
  }

  pub fn all_files_mut(&mut self) -> impl Iterator<Item = &mut FileEntity> {
    std::iter::once(&mut self.primary_file).chain(self.secondary_files.iter_mut())
  }

  pub fn albums_map(&self) -> &HashMap<String, AlbumEntity> {
    &self.albums_map
  }

  pub fn albums_map_mut(&mut self) -> &mut HashMap<String, AlbumEntity> {
    &mut self.albums_map
  }

  /// Inserts or merges an album membership, keeping the §3 invariant that
  /// `albums_map` keys are unique.
  pub fn add_album(&mut self, album: AlbumEntity) {
    match self.albums_map.remove(album.name()) {
      Some(mut existing) => {
        existing.merge(album);
        self.albums_map.insert(existing.name().to_string(), existing);
      }
      None => {
        self.albums_map.insert(album.name().to_string(), album);
      }
    }
  }

  pub fn date_taken(&self) -> Option<NaiveDateTime> {
    self.date_taken
  }

  pub fn date_accuracy(&self) -> Option<u8> {
    self.date_accuracy
  }

  pub fn date_time_extraction_method(&self) -> Option<&'static str> {
    self.date_time_extraction_method
  }

  /// Assigns a date with its rank and the extractor that produced it,
  /// maintaining the §3 invariant `date_accuracy.is_some() == date_taken.is_some()`.
  pub fn set_date(&mut self, date: NaiveDateTime, accuracy: u8, method: &'static str) {
    self.date_taken = Some(date);
    self.date_accuracy = Some(accuracy);
    self.date_time_extraction_method = Some(method);
    self.primary_file.set_date_accuracy(Some(accuracy));
  }

  pub fn partner_shared(&self) -> bool {
    self.partner_shared
  }

  pub fn set_partner_shared(&mut self, value: bool) {
    self.partner_shared = value;
  }

  /// Merges `other` into `self` per stage 3: albums union, files appended as
  /// secondaries, `other` consumed.
  pub fn merge_as_duplicate(&mut self, other: MediaEntity) {
    for (_, album) in other.albums_map {
      self.add_album(album);
    }
    self.secondary_files.push(other.primary_file);
    self.secondary_files.extend(other.secondary_files);
  }
}

#[cfg(test)]
mod test_add_album {
  use super::*;

  #[test]
  fn merges_duplicate_album_names() {
    let mut media = MediaEntity::new(FileEntity::new("/in/Photos from 2021/a.jpg", true));
    media.add_album(AlbumEntity::new("Vacation", "/in/Albums/Vacation"));
    media.add_album(AlbumEntity::new("Vacation", "/in/Albums/Vacation2"));

    assert_eq!(media.albums_map().len(), 1);
    assert_eq!(media.albums_map()["Vacation"].source_directories().len(), 2);
  }
}
