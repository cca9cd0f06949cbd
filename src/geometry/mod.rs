//! WGS84 coordinates and great-circle distance.
//!
//! Everything here works in (longitude, latitude) degrees on EPSG:4326 and
//! measures distance in meters on the mean Earth sphere.

pub mod distance;
pub mod point;

pub use distance::{envelope, haversine, parse_max_distance, Bounds, EARTH_RADIUS_M};
pub use point::Coordinate;

use thiserror::Error;

/// Input validation errors for coordinates and radii.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Invalid coordinates")]
    InvalidCoordinate,
    #[error("Invalid max_distance")]
    InvalidDistance,
}
