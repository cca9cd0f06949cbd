//! GeoJSON Feature / FeatureCollection shapes for records.
//!
//! Output follows the usual feature layout: the id at feature level, the
//! location as a Point geometry and the entity's own fields as properties.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::geometry::Coordinate;
use crate::store::{Entity, EntityId, Nearby, Record};

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("expected a GeoJSON Feature, got '{0}'")]
    NotAFeature(String),
    #[error("'geometry' is required")]
    MissingGeometry,
    #[error("'geometry' must be a Point with [lng, lat] coordinates")]
    InvalidGeometry,
    #[error("invalid properties: {0}")]
    InvalidProperties(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    Point,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub coordinates: Coordinate,
}

impl From<Coordinate> for PointGeometry {
    fn from(coordinates: Coordinate) -> Self {
        Self {
            kind: GeometryKind::Point,
            coordinates,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum FeatureKind {
    Feature,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum CollectionKind {
    FeatureCollection,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature<P> {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub id: EntityId,
    pub geometry: PointGeometry,
    pub properties: P,
}

impl<T: Entity> From<Record<T>> for Feature<T> {
    fn from(record: Record<T>) -> Self {
        Self {
            kind: FeatureKind::Feature,
            id: record.id,
            geometry: record.location.into(),
            properties: record.entity,
        }
    }
}

/// Entity properties plus the distance to the search point in meters.
#[derive(Debug, Clone, Serialize)]
pub struct WithDistance<T> {
    #[serde(flatten)]
    pub entity: T,
    pub distance: f64,
}

impl<T: Entity> From<Nearby<T>> for Feature<WithDistance<T>> {
    fn from(hit: Nearby<T>) -> Self {
        let Nearby { record, distance } = hit;
        Self {
            kind: FeatureKind::Feature,
            id: record.id,
            geometry: record.location.into(),
            properties: WithDistance {
                entity: record.entity,
                distance,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection<P> {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub features: Vec<Feature<P>>,
}

impl<P> FromIterator<Feature<P>> for FeatureCollection<P> {
    fn from_iter<I: IntoIterator<Item = Feature<P>>>(iter: I) -> Self {
        Self {
            kind: CollectionKind::FeatureCollection,
            features: iter.into_iter().collect(),
        }
    }
}

// ─── Request bodies ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GeometryInput {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<f64>,
}

/// A Feature submitted by a client. Everything is optional here so that
/// full and partial updates can share one body shape.
#[derive(Debug, Default, Deserialize)]
pub struct FeatureInput {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    geometry: Option<GeometryInput>,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl FeatureInput {
    fn check_kind(&self) -> Result<(), FeatureError> {
        match self.kind.as_deref() {
            None | Some("Feature") => Ok(()),
            Some(other) => Err(FeatureError::NotAFeature(other.to_string())),
        }
    }

    fn location(&self) -> Result<Option<Coordinate>, FeatureError> {
        let Some(geometry) = &self.geometry else {
            return Ok(None);
        };
        match (geometry.kind.as_str(), geometry.coordinates.as_slice()) {
            ("Point", &[lng, lat]) => Coordinate::new(lng, lat)
                .map(Some)
                .map_err(|_| FeatureError::InvalidGeometry),
            _ => Err(FeatureError::InvalidGeometry),
        }
    }

    /// Location and entity for a create or full replacement.
    pub fn into_parts<T: Entity>(self) -> Result<(Coordinate, T), FeatureError> {
        self.check_kind()?;
        let location = self.location()?.ok_or(FeatureError::MissingGeometry)?;
        let entity = serde_json::from_value(Value::Object(self.properties))
            .map_err(|e| FeatureError::InvalidProperties(e.to_string()))?;
        Ok((location, entity))
    }

    /// Overlay the submitted geometry and property keys onto `current`.
    pub fn merge_into<T: Entity>(self, current: &Record<T>) -> Result<(Coordinate, T), FeatureError> {
        self.check_kind()?;
        let location = self.location()?.unwrap_or(current.location);

        let mut merged = match serde_json::to_value(&current.entity) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(FeatureError::InvalidProperties(e.to_string())),
        };
        merged.extend(self.properties);
        let entity = serde_json::from_value(Value::Object(merged))
            .map_err(|e| FeatureError::InvalidProperties(e.to_string()))?;
        Ok((location, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Restaurant, UserLocation};
    use serde_json::json;

    fn record() -> Record<Restaurant> {
        Record {
            id: 3,
            location: Coordinate::new(-6.2603, 53.3498).unwrap(),
            entity: Restaurant {
                name: "Chipper".into(),
                category: "Fast Food".into(),
                delivers: true,
            },
        }
    }

    fn input(value: Value) -> FeatureInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_feature_shape() {
        let value = serde_json::to_value(Feature::from(record())).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Feature",
                "id": 3,
                "geometry": {"type": "Point", "coordinates": [-6.2603, 53.3498]},
                "properties": {"name": "Chipper", "type": "Fast Food", "delivers": true},
            })
        );
    }

    #[test]
    fn test_nearby_feature_has_distance() {
        let hit = Nearby { record: record(), distance: 12.5 };
        let value = serde_json::to_value(Feature::from(hit)).unwrap();
        assert_eq!(value["properties"]["distance"], json!(12.5));
        assert_eq!(value["properties"]["type"], json!("Fast Food"));
    }

    #[test]
    fn test_empty_collection() {
        let fc: FeatureCollection<Restaurant> = std::iter::empty().collect();
        assert_eq!(
            serde_json::to_value(fc).unwrap(),
            json!({"type": "FeatureCollection", "features": []})
        );
    }

    #[test]
    fn test_into_parts() {
        let (location, entity): (Coordinate, UserLocation) = input(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [2.35, 48.85]},
            "properties": {"name": "Office"},
        }))
        .into_parts()
        .unwrap();
        assert_eq!(location, Coordinate::new(2.35, 48.85).unwrap());
        assert_eq!(entity.name, "Office");
    }

    #[test]
    fn test_into_parts_errors() {
        let missing = input(json!({"properties": {"name": "x"}})).into_parts::<UserLocation>();
        assert_eq!(missing.unwrap_err(), FeatureError::MissingGeometry);

        let polygon = input(json!({
            "geometry": {"type": "Polygon", "coordinates": [0.0, 0.0]},
            "properties": {"name": "x"},
        }))
        .into_parts::<UserLocation>();
        assert_eq!(polygon.unwrap_err(), FeatureError::InvalidGeometry);

        let out_of_range = input(json!({
            "geometry": {"type": "Point", "coordinates": [0.0, 95.0]},
            "properties": {"name": "x"},
        }))
        .into_parts::<UserLocation>();
        assert_eq!(out_of_range.unwrap_err(), FeatureError::InvalidGeometry);

        let wrong_kind = input(json!({"type": "FeatureCollection"})).into_parts::<UserLocation>();
        assert!(matches!(wrong_kind, Err(FeatureError::NotAFeature(_))));

        let no_type = input(json!({
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
            "properties": {"name": "x"},
        }))
        .into_parts::<Restaurant>();
        assert!(matches!(no_type, Err(FeatureError::InvalidProperties(_))));
    }

    #[test]
    fn test_merge_partial() {
        let current = record();
        let (location, entity): (Coordinate, Restaurant) = input(json!({
            "properties": {"delivers": false},
        }))
        .merge_into(&current)
        .unwrap();
        assert_eq!(location, current.location);
        assert_eq!(entity.name, "Chipper");
        assert!(!entity.delivers);

        let (location, _): (Coordinate, Restaurant) = input(json!({
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
        }))
        .merge_into(&current)
        .unwrap();
        assert_eq!(location, Coordinate::new(1.0, 2.0).unwrap());
    }
}
