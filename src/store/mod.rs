//! Geographic entity store.
//!
//! Collections own the records, the R-tree index and the on-disk file.
//! [`SpatialStore`] is the read seam the proximity search depends on.

pub mod collection;
pub mod entity;
pub mod index;

pub use collection::Collection;
pub use entity::{Entity, EntityId, Nearby, Record, Restaurant, UserLocation, ValidationError};
pub use index::SpatialIndex;

use std::io;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::geometry::Coordinate;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record {0} not found")]
    NotFound(EntityId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("failed to write {}: {source}", path.display())]
    Persist { path: PathBuf, source: io::Error },
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
}

/// Radius queries over stored entities.
pub trait SpatialStore {
    type Entity: Entity;

    /// Entities within `radius_m` meters of `center`, nearest first, ties by id.
    fn within(
        &self,
        center: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Nearby<Self::Entity>>, StoreError>;
}

impl<T: Entity> SpatialStore for Collection<T> {
    type Entity = T;

    fn within(&self, center: Coordinate, radius_m: f64) -> Result<Vec<Nearby<T>>, StoreError> {
        Ok(Collection::within(self, center, radius_m))
    }
}

/// A collection shared between request handlers.
pub struct SharedCollection<T>(RwLock<Collection<T>>);

impl<T: Entity> SharedCollection<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self(RwLock::new(collection))
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Collection<T>>, StoreError> {
        self.0.read().map_err(|_| poisoned::<T>())
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Collection<T>>, StoreError> {
        self.0.write().map_err(|_| poisoned::<T>())
    }
}

fn poisoned<T: Entity>() -> StoreError {
    StoreError::Unavailable(format!("{} lock poisoned", T::COLLECTION))
}

impl<T: Entity> SpatialStore for SharedCollection<T> {
    type Entity = T;

    fn within(&self, center: Coordinate, radius_m: f64) -> Result<Vec<Nearby<T>>, StoreError> {
        Ok(self.read()?.within(center, radius_m))
    }
}
