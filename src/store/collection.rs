//! A collection of records of one entity kind, backed by a JSON file.
//!
//! File: `<data_dir>/<COLLECTION>.json`. Every mutation rewrites the file
//! (temp file + rename); a failed write rolls the in-memory change back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::entity::{Entity, EntityId, Nearby, Record};
use super::index::SpatialIndex;
use super::StoreError;
use crate::geometry::Coordinate;

#[derive(Serialize, Deserialize)]
struct CollectionFile<R> {
    saved_at: DateTime<Utc>,
    next_id: EntityId,
    records: Vec<R>,
}

pub struct Collection<T> {
    path: Option<PathBuf>,
    next_id: EntityId,
    records: BTreeMap<EntityId, Record<T>>,
    index: SpatialIndex,
}

impl<T: Entity> Collection<T> {
    /// An empty collection that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            next_id: 1,
            records: BTreeMap::new(),
            index: SpatialIndex::new(),
        }
    }

    /// Open the collection file under `dir`. A missing file is an empty collection.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(format!("{}.json", T::COLLECTION));
        let mut collection = match fs::read_to_string(&path) {
            Ok(data) => Self::parse(&path, &data)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::in_memory(),
            Err(e) => {
                return Err(StoreError::Load {
                    path,
                    reason: e.to_string(),
                })
            }
        };
        info!(
            collection = T::COLLECTION,
            path = %path.display(),
            records = collection.len(),
            "opened collection"
        );
        collection.path = Some(path);
        Ok(collection)
    }

    fn parse(path: &Path, data: &str) -> Result<Self, StoreError> {
        let load_err = |reason: String| StoreError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let file: CollectionFile<Record<T>> =
            serde_json::from_str(data).map_err(|e| load_err(e.to_string()))?;

        let mut records = BTreeMap::new();
        for record in file.records {
            record
                .entity
                .validate()
                .map_err(|e| load_err(format!("record {}: {}", record.id, e)))?;
            if records.insert(record.id, record).is_some() {
                return Err(load_err("duplicate record id".into()));
            }
        }

        let max_id = records.keys().next_back().copied().unwrap_or(0);
        let index = SpatialIndex::bulk_load(records.values().map(|r| (r.id, r.location)));
        Ok(Self {
            path: None,
            next_id: file.next_id.max(max_id + 1),
            records,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in ascending id order.
    pub fn list(&self) -> impl Iterator<Item = &Record<T>> {
        self.records.values()
    }

    pub fn get(&self, id: EntityId) -> Result<&Record<T>, StoreError> {
        self.records.get(&id).ok_or(StoreError::NotFound(id))
    }

    pub fn create(&mut self, location: Coordinate, entity: T) -> Result<Record<T>, StoreError> {
        entity.validate()?;

        let id = self.next_id;
        let record = Record { id, location, entity };
        self.next_id += 1;
        self.records.insert(id, record.clone());
        self.index.insert(id, location);

        if let Err(e) = self.persist() {
            self.records.remove(&id);
            self.index.remove(id, location);
            self.next_id = id;
            return Err(e);
        }

        debug!(collection = T::COLLECTION, id, name = record.entity.name(), "created");
        Ok(record)
    }

    pub fn replace(
        &mut self,
        id: EntityId,
        location: Coordinate,
        entity: T,
    ) -> Result<Record<T>, StoreError> {
        entity.validate()?;

        let record = Record { id, location, entity };
        let previous = self.swap(record.clone()).ok_or(StoreError::NotFound(id))?;

        if let Err(e) = self.persist() {
            self.swap(previous);
            return Err(e);
        }

        debug!(collection = T::COLLECTION, id, "replaced");
        Ok(record)
    }

    pub fn delete(&mut self, id: EntityId) -> Result<Record<T>, StoreError> {
        let record = self.records.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.index.remove(id, record.location);

        if let Err(e) = self.persist() {
            self.index.insert(id, record.location);
            self.records.insert(id, record);
            return Err(e);
        }

        debug!(collection = T::COLLECTION, id, "deleted");
        Ok(record)
    }

    /// Records within `radius_m` of `center`, nearest first, ties by id.
    pub fn within(&self, center: Coordinate, radius_m: f64) -> Vec<Nearby<T>> {
        self.index
            .within(center, radius_m)
            .into_iter()
            .filter_map(|(id, distance)| {
                let record = self.records.get(&id)?.clone();
                Some(Nearby { record, distance })
            })
            .collect()
    }

    // Puts `record` in place of the one with the same id and returns the old
    // one. Missing ids are left untouched.
    fn swap(&mut self, record: Record<T>) -> Option<Record<T>> {
        let slot = self.records.get_mut(&record.id)?;
        let (id, location) = (record.id, record.location);
        let old = std::mem::replace(slot, record);
        self.index.remove(id, old.location);
        self.index.insert(id, location);
        Some(old)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let persist_err = |source: io::Error| StoreError::Persist {
            path: path.clone(),
            source,
        };

        let file = CollectionFile {
            saved_at: Utc::now(),
            next_id: self.next_id,
            records: self.records.values().collect::<Vec<_>>(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| persist_err(io::Error::other(e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(persist_err)?;
        fs::rename(&tmp, path).map_err(persist_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entity::{Restaurant, UserLocation};
    use tempfile::TempDir;

    fn c(lng: f64, lat: f64) -> Coordinate {
        Coordinate::new(lng, lat).unwrap()
    }

    fn restaurant(name: &str) -> Restaurant {
        Restaurant {
            name: name.into(),
            category: "Italian".into(),
            delivers: true,
        }
    }

    fn test_collection() -> (Collection<Restaurant>, TempDir) {
        let dir = TempDir::new().unwrap();
        (Collection::open(dir.path()).unwrap(), dir)
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let (mut col, _dir) = test_collection();
        let a = col.create(c(0.0, 0.0), restaurant("A")).unwrap();
        let b = col.create(c(1.0, 1.0), restaurant("B")).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(col.len(), 2);
        assert_eq!(col.get(2).unwrap().entity.name, "B");
    }

    #[test]
    fn test_get_missing() {
        let (col, _dir) = test_collection();
        assert!(matches!(col.get(42), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn test_create_rejects_invalid() {
        let (mut col, _dir) = test_collection();
        let err = col.create(c(0.0, 0.0), restaurant("")).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(col.is_empty());
    }

    #[test]
    fn test_replace_moves_index_entry() {
        let (mut col, _dir) = test_collection();
        let id = col.create(c(0.0, 0.0), restaurant("A")).unwrap().id;
        col.replace(id, c(10.0, 10.0), restaurant("A2")).unwrap();

        assert!(col.within(c(0.0, 0.0), 100.0).is_empty());
        let hits = col.within(c(10.0, 10.0), 100.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.entity.name, "A2");
    }

    #[test]
    fn test_replace_missing() {
        let (mut col, _dir) = test_collection();
        assert!(matches!(
            col.replace(5, c(0.0, 0.0), restaurant("A")),
            Err(StoreError::NotFound(5))
        ));
    }

    #[test]
    fn test_delete_and_ids_not_reused() {
        let (mut col, _dir) = test_collection();
        col.create(c(0.0, 0.0), restaurant("A")).unwrap();
        let b = col.create(c(0.0, 0.0), restaurant("B")).unwrap();
        col.delete(b.id).unwrap();
        assert!(matches!(col.delete(b.id), Err(StoreError::NotFound(_))));
        assert_eq!(col.within(c(0.0, 0.0), 1.0).len(), 1);

        let c3 = col.create(c(0.0, 0.0), restaurant("C")).unwrap();
        assert_eq!(c3.id, 3);
    }

    #[test]
    fn test_list_in_id_order() {
        let (mut col, _dir) = test_collection();
        for name in ["A", "B", "C"] {
            col.create(c(0.0, 0.0), restaurant(name)).unwrap();
        }
        let names: Vec<_> = col.list().map(|r| r.entity.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        {
            let mut col: Collection<Restaurant> = Collection::open(dir.path()).unwrap();
            col.create(c(-0.1278, 51.5074), restaurant("A")).unwrap();
            let b = col.create(c(-0.1, 51.51), restaurant("B")).unwrap();
            col.delete(b.id).unwrap();
        }
        assert!(dir.path().join("restaurants.json").exists());

        let mut col: Collection<Restaurant> = Collection::open(dir.path()).unwrap();
        assert_eq!(col.len(), 1);
        assert_eq!(col.get(1).unwrap().entity, restaurant("A"));
        assert_eq!(col.within(c(-0.1278, 51.5074), 10.0).len(), 1);
        // next_id survives the reload even though id 2 was deleted
        assert_eq!(col.create(c(0.0, 0.0), restaurant("C")).unwrap().id, 3);
    }

    #[test]
    fn test_collections_use_separate_files() {
        let dir = TempDir::new().unwrap();
        let mut places: Collection<UserLocation> = Collection::open(dir.path()).unwrap();
        places
            .create(c(0.0, 0.0), UserLocation { name: "Home".into() })
            .unwrap();
        assert!(dir.path().join("user_locations.json").exists());
        assert!(!dir.path().join("restaurants.json").exists());
    }

    #[test]
    fn test_open_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("restaurants.json");

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Collection::<Restaurant>::open(dir.path()),
            Err(StoreError::Load { .. })
        ));

        let out_of_range = r#"{
            "saved_at": "2026-01-01T00:00:00Z",
            "next_id": 2,
            "records": [{"id": 1, "location": [200.0, 0.0], "name": "A", "type": "B"}]
        }"#;
        fs::write(&path, out_of_range).unwrap();
        assert!(Collection::<Restaurant>::open(dir.path()).is_err());
    }

    #[test]
    fn test_open_repairs_stale_next_id() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "saved_at": "2026-01-01T00:00:00Z",
            "next_id": 1,
            "records": [{"id": 4, "location": [0.0, 0.0], "name": "A", "type": "B"}]
        }"#;
        fs::write(dir.path().join("restaurants.json"), json).unwrap();
        let mut col = Collection::<Restaurant>::open(dir.path()).unwrap();
        assert_eq!(col.create(c(0.0, 0.0), restaurant("C")).unwrap().id, 5);
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut col: Collection<Restaurant> = Collection::open(dir.path()).unwrap();
        col.create(c(0.0, 0.0), restaurant("A")).unwrap();

        // A directory where the temp file should go makes every write fail.
        fs::create_dir(dir.path().join("restaurants.json.tmp")).unwrap();

        assert!(matches!(
            col.create(c(1.0, 1.0), restaurant("B")),
            Err(StoreError::Persist { .. })
        ));
        assert_eq!(col.len(), 1);
        assert!(col.within(c(1.0, 1.0), 1.0).is_empty());

        assert!(col.replace(1, c(5.0, 5.0), restaurant("A2")).is_err());
        assert_eq!(col.get(1).unwrap().entity.name, "A");
        assert_eq!(col.within(c(0.0, 0.0), 1.0).len(), 1);

        assert!(col.delete(1).is_err());
        assert_eq!(col.len(), 1);

        fs::remove_dir(dir.path().join("restaurants.json.tmp")).unwrap();
        assert_eq!(col.create(c(1.0, 1.0), restaurant("B")).unwrap().id, 2);
    }

    #[test]
    fn test_in_memory_never_writes() {
        let mut col = Collection::<Restaurant>::in_memory();
        col.create(c(0.0, 0.0), restaurant("A")).unwrap();
        assert_eq!(col.len(), 1);
    }
}
