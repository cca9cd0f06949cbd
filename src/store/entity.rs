//! Stored entity shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Coordinate;

pub type EntityId = u64;

const NAME_MAX_LEN: usize = 100;
const CATEGORY_MAX_LEN: usize = 50;

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' must not be empty")]
    Required(&'static str),
    #[error("'{field}' must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Attributes of something that lives in a [`Collection`](super::Collection).
///
/// The id and location are kept on [`Record`]; implementors only carry their
/// own properties.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, used for the file stem and log fields.
    const COLLECTION: &'static str;

    fn name(&self) -> &str;

    fn validate(&self) -> Result<(), ValidationError>;
}

/// A stored entity together with its id and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: EntityId,
    pub location: Coordinate,
    #[serde(flatten)]
    pub entity: T,
}

/// A search hit: the record and its distance to the query point in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Nearby<T> {
    pub record: Record<T>,
    pub distance: f64,
}

/// A saved point on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    pub name: String,
}

impl Entity for UserLocation {
    const COLLECTION: &'static str = "user_locations";

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_text("name", &self.name, NAME_MAX_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    /// Cuisine or kind, e.g. "Italian" or "Fast Food".
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default)]
    pub delivers: bool,
}

impl Entity for Restaurant {
    const COLLECTION: &'static str = "restaurants";

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_text("name", &self.name, NAME_MAX_LEN)?;
        check_text("type", &self.category, CATEGORY_MAX_LEN)
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
