//! webmap: a small map data service for user locations and restaurants, with
//! a nearest-first radius search over an R-tree.

pub mod config;
pub mod geojson;
pub mod geometry;
pub mod logging;
pub mod search;
pub mod server;
pub mod store;
