//! The validated (longitude, latitude) point.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeoError;

/// A point on WGS84. Longitude in [-180, 180], latitude in [-90, 90].
///
/// Serialized as a `[lng, lat]` pair, the GeoJSON position order. Deserializing
/// runs the same range checks as [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    lng: f64,
    lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(GeoError::InvalidCoordinate);
        }
        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::InvalidCoordinate);
        }
        Ok(Self { lng, lat })
    }

    /// Parse raw query values. Either side missing, blank, non-numeric,
    /// non-finite or out of range is an `InvalidCoordinate`.
    pub fn parse(lat_raw: Option<&str>, lng_raw: Option<&str>) -> Result<Self, GeoError> {
        let lat = parse_finite(lat_raw).ok_or(GeoError::InvalidCoordinate)?;
        let lng = parse_finite(lng_raw).ok_or(GeoError::InvalidCoordinate)?;
        Self::new(lng, lat)
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

pub(crate) fn parse_finite(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = GeoError;

    fn try_from([lng, lat]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(lng, lat)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lng, c.lat]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}
