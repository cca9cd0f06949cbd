//! Proximity search: validate raw query values, then ask the store for
//! everything within the radius, nearest first.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::geometry::{parse_max_distance, Coordinate, GeoError};
use crate::store::{Nearby, SpatialStore, StoreError};

/// Radius used when the caller does not pass `max_distance`.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 5000.0;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid coordinates")]
    InvalidCoordinate,
    #[error("Invalid max_distance")]
    InvalidDistance,
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl From<GeoError> for SearchError {
    fn from(e: GeoError) -> Self {
        match e {
            GeoError::InvalidCoordinate => Self::InvalidCoordinate,
            GeoError::InvalidDistance => Self::InvalidDistance,
        }
    }
}

/// Raw query-string values, kept as text so bad input is ours to report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub max_distance: Option<String>,
}

/// A validated search request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub center: Coordinate,
    pub max_distance: f64,
}

impl NearbyQuery {
    pub fn new(center: Coordinate, max_distance: f64) -> Result<Self, SearchError> {
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(SearchError::InvalidDistance);
        }
        Ok(Self { center, max_distance })
    }

    /// Coordinates are checked before the radius, so a request that is wrong on
    /// both counts reports the coordinates.
    pub fn parse(params: &NearbyParams, default_max_distance: f64) -> Result<Self, SearchError> {
        let center = Coordinate::parse(params.lat.as_deref(), params.lng.as_deref())?;
        let max_distance = parse_max_distance(params.max_distance.as_deref(), default_max_distance)?;
        Self::new(center, max_distance)
    }
}

/// Everything in `store` within `query.max_distance` of `query.center`.
///
/// Results are sorted by ascending distance; equal distances by ascending id.
pub fn find_nearby<S: SpatialStore>(
    store: &S,
    query: &NearbyQuery,
) -> Result<Vec<Nearby<S::Entity>>, SearchError> {
    let hits = store.within(query.center, query.max_distance)?;
    debug!(
        center = %query.center,
        max_distance = query.max_distance,
        hits = hits.len(),
        "nearby search"
    );
    Ok(hits)
}

/// Parse then search. Invalid input never reaches the store.
pub fn search<S: SpatialStore>(
    store: &S,
    params: &NearbyParams,
    default_max_distance: f64,
) -> Result<Vec<Nearby<S::Entity>>, SearchError> {
    let query = NearbyQuery::parse(params, default_max_distance)?;
    find_nearby(store, &query)
}
