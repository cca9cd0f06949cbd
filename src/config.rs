//! Runtime configuration, assembled once at startup and passed down.

use std::path::PathBuf;

use crate::geometry::GeoError;
use crate::search::DEFAULT_MAX_DISTANCE_M;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory holding one JSON file per collection.
    pub data_dir: PathBuf,
    /// Radius in meters for nearby searches that omit `max_distance`.
    pub default_max_distance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            data_dir: Self::default_data_dir(),
            default_max_distance: DEFAULT_MAX_DISTANCE_M,
        }
    }
}

impl Config {
    /// `~/.webmap`, or `./.webmap` when there is no home directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".webmap")
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.default_max_distance.is_finite() || self.default_max_distance < 0.0 {
            return Err(GeoError::InvalidDistance);
        }
        Ok(())
    }
}
