// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Duplicate coalescing (spec 4.3): a size pre-filter, then batched parallel
//! SHA-256 hashing within each size bucket, then a best-ranked survivor per
//! hash group absorbing the rest as secondary files.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::hash::hash_file;
use crate::model::{MediaCollection, MediaEntity};
use crate::pipeline::{Failure, FailureCategory, StepResult};

/// Hashing batch size (spec §5): tasks within a batch join before the next
/// one starts, bounding peak concurrency.
fn batch_size() -> usize {
  if cfg!(windows) { num_cpus::get() * 2 } else { num_cpus::get() + 1 }
}

pub fn run(collection: &mut MediaCollection) -> StepResult {
  let mut result = StepResult { stage: "dedup", ..Default::default() };

  let entities = std::mem::take(collection).into_vec();
  let mut slots: Vec<Option<MediaEntity>> = entities.into_iter().map(Some).collect();

  let mut size_buckets: HashMap<u64, Vec<usize>> = HashMap::new();
  for (i, slot) in slots.iter().enumerate() {
    let entity = slot.as_ref().expect("freshly built slots are all populated");
    match std::fs::metadata(entity.primary_file().source_path()) {
      Ok(meta) => size_buckets.entry(meta.len()).or_default().push(i),
      Err(e) => {
        result.failed.push(Failure {
          path: entity.primary_file().source_path().to_path_buf(),
          category: FailureCategory::Hashing,
          message: e.to_string(),
        });
      }
    }
  }

  for (_, indices) in size_buckets {
    if indices.len() < 2 {
      continue;
    }

    let mut hash_groups: HashMap<String, Vec<usize>> = HashMap::new();
    for chunk in indices.chunks(batch_size()) {
      let digests: Vec<(usize, std::io::Result<String>)> = chunk
        .par_iter()
        .map(|&i| {
          let path = slots[i].as_ref().unwrap().primary_file().source_path();
          (i, hash_file(path))
        })
        .collect();

      for (i, digest) in digests {
        match digest {
          Ok(d) => hash_groups.entry(d).or_default().push(i),
          Err(e) => {
            let path = slots[i].as_ref().unwrap().primary_file().source_path().to_path_buf();
            result.failed.push(Failure { path, category: FailureCategory::Hashing, message: e.to_string() });
          }
        }
      }
    }

    for (_, group) in hash_groups {
      if group.len() < 2 {
        continue;
      }
      coalesce(&mut slots, &group, &mut result);
    }
  }

  *collection = slots.into_iter().flatten().collect();
  result
}

/// Merges every entity in `group` except the best-ranked survivor into that
/// survivor (spec 4.3), counting each absorbed entity as `updated`.
fn coalesce(slots: &mut [Option<MediaEntity>], group: &[usize], result: &mut StepResult) {
  let survivor_idx = *group
    .iter()
    .min_by_key(|&&i| slots[i].as_ref().unwrap().primary_file().ranking())
    .expect("group is non-empty");

  let mut survivor = slots[survivor_idx].take().expect("survivor slot not yet taken");
  for &idx in group {
    if idx == survivor_idx {
      continue;
    }
    if let Some(duplicate) = slots[idx].take() {
      survivor.merge_as_duplicate(duplicate);
      result.updated += 1;
    }
  }
  slots[survivor_idx] = Some(survivor);
}

#[cfg(test)]
mod test_run {
  use tempfile::tempdir;

  use super::*;
  use crate::model::FileEntity;

  fn collection_from(paths: &[(std::path::PathBuf, &[u8])]) -> MediaCollection {
    let mut collection = MediaCollection::new();
    for (path, content) in paths {
      std::fs::write(path, content).unwrap();
      collection.push(MediaEntity::new(FileEntity::new(path, true)));
    }
    collection
  }

  #[test]
  fn coalesces_identical_content_into_one_survivor() {
    let dir = tempdir().unwrap();
    let mut collection = collection_from(&[
      (dir.path().join("a.jpg"), b"same bytes"),
      (dir.path().join("b.jpg"), b"same bytes"),
    ]);

    let result = run(&mut collection);

    assert_eq!(collection.len(), 1);
    assert_eq!(result.updated, 1);
    assert_eq!(collection.get(0).unwrap().secondary_files().len(), 1);
  }

  #[test]
  fn leaves_distinct_content_as_separate_entities() {
    let dir = tempdir().unwrap();
    let mut collection = collection_from(&[
      (dir.path().join("a.jpg"), b"bytes one"),
      (dir.path().join("b.jpg"), b"bytes two"),
    ]);

    let result = run(&mut collection);

    assert_eq!(collection.len(), 2);
    assert_eq!(result.updated, 0);
  }

  #[test]
  fn survivor_keeps_the_shorter_basename() {
    let dir = tempdir().unwrap();
    let mut collection = collection_from(&[
      (dir.path().join("a-long-name.jpg"), b"same bytes"),
      (dir.path().join("b.jpg"), b"same bytes"),
    ]);

    let result = run(&mut collection);

    assert_eq!(result.updated, 1);
    assert_eq!(collection.get(0).unwrap().primary_file().source_path(), dir.path().join("b.jpg"));
  }

  #[test]
  fn merges_album_membership_of_dropped_entity() {
    let dir = tempdir().unwrap();
    let album_dir = dir.path().join("Vacation");
    std::fs::create_dir_all(&album_dir).unwrap();
    let album_file = album_dir.join("a.jpg");
    let year_file = dir.path().join("a.jpg");
    std::fs::write(&album_file, b"same bytes").unwrap();
    std::fs::write(&year_file, b"same bytes").unwrap();

    let mut collection = MediaCollection::new();
    collection.push(MediaEntity::new(FileEntity::new(&year_file, true)));
    let mut album_entity = MediaEntity::new(FileEntity::new(&album_file, false));
    album_entity.add_album(crate::model::AlbumEntity::new("Vacation", &album_dir));
    collection.push(album_entity);

    run(&mut collection);

    assert_eq!(collection.len(), 1);
    assert!(collection.get(0).unwrap().albums_map().contains_key("Vacation"));
  }
}
