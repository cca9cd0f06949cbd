//! Haversine distance and the lon/lat envelope used to pre-filter the index.
//!
//! The envelope is conservative: every point whose haversine distance to the
//! centre is within the radius falls inside one of the returned boxes. Exact
//! filtering always goes through [`haversine`].

use geo::HaversineDistance;
use std::f64::consts::{FRAC_PI_2, PI};

use super::point::parse_finite;
use super::{Coordinate, GeoError};

/// Mean Earth radius used by `geo::HaversineDistance`.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

// ~6 mm at the surface; absorbs rounding between the envelope and haversine.
const MARGIN_RAD: f64 = 1e-9;

/// Great-circle distance in meters.
pub fn haversine(a: Coordinate, b: Coordinate) -> f64 {
    a.to_point().haversine_distance(&b.to_point())
}

/// Parse an optional raw radius. Absent means `default`; anything else must be
/// a finite, non-negative number of meters.
pub fn parse_max_distance(raw: Option<&str>, default: f64) -> Result<f64, GeoError> {
    match raw {
        None => Ok(default),
        Some(_) => parse_finite(raw)
            .filter(|d| *d >= 0.0)
            .ok_or(GeoError::InvalidDistance),
    }
}

/// An axis-aligned lon/lat box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Bounds {
    const WORLD: Bounds = Bounds {
        min_lng: -180.0,
        min_lat: -90.0,
        max_lng: 180.0,
        max_lat: 90.0,
    };

    #[cfg(test)]
    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min_lng..=self.max_lng).contains(&c.lng())
            && (self.min_lat..=self.max_lat).contains(&c.lat())
    }
}

/// Boxes covering the circle of `radius_m` around `center`.
///
/// One box in the common case, two when the circle crosses the antimeridian,
/// and a full-longitude band when it reaches a pole.
pub fn envelope(center: Coordinate, radius_m: f64) -> Vec<Bounds> {
    let angular = radius_m / EARTH_RADIUS_M + MARGIN_RAD;
    if angular >= PI {
        return vec![Bounds::WORLD];
    }

    let lat = center.lat().to_radians();
    let min_lat = lat - angular;
    let max_lat = lat + angular;

    if max_lat >= FRAC_PI_2 || min_lat <= -FRAC_PI_2 {
        return vec![Bounds {
            min_lng: -180.0,
            min_lat: min_lat.max(-FRAC_PI_2).to_degrees(),
            max_lng: 180.0,
            max_lat: max_lat.min(FRAC_PI_2).to_degrees(),
        }];
    }

    // Widest longitude offset reached by the circle. |lat| + angular < pi/2
    // here, so the asin argument stays below 1.
    let delta_lng = (angular.sin() / lat.cos()).asin().to_degrees();
    let min_lat = min_lat.to_degrees();
    let max_lat = max_lat.to_degrees();
    let min_lng = center.lng() - delta_lng;
    let max_lng = center.lng() + delta_lng;

    if min_lng < -180.0 {
        vec![
            Bounds { min_lng: min_lng + 360.0, min_lat, max_lng: 180.0, max_lat },
            Bounds { min_lng: -180.0, min_lat, max_lng, max_lat },
        ]
    } else if max_lng > 180.0 {
        vec![
            Bounds { min_lng, min_lat, max_lng: 180.0, max_lat },
            Bounds { min_lng: -180.0, min_lat, max_lng: max_lng - 360.0, max_lat },
        ]
    } else {
        vec![Bounds { min_lng, min_lat, max_lng, max_lat }]
    }
}
