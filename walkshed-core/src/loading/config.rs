//! Run configuration

use std::path::PathBuf;

use serde::Deserialize;

use crate::Length;

/// Configuration for a walkshed generation run.
///
/// Distances are in the linear unit of the input CRS; the defaults
/// assume metres (804.672 m is half a mile).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkshedConfig {
    /// Pedestrian network source (GeoJSON line features)
    pub network_path: PathBuf,
    /// Stops source (GeoJSON points or CSV, decided by extension)
    pub stops_path: PathBuf,
    /// Directory receiving intermediate and final artifacts
    pub output_dir: PathBuf,
    /// Prefix for final artifact names, may be empty
    pub output_prefix: String,
    /// Stop attribute carrying the route key
    pub route_field: String,
    /// Declared CRS identity; compared against any source-declared CRS
    pub crs: Option<String>,
    /// Walking distance budget
    pub distance: Length,
    /// Concave hull shape parameter (inverse scale)
    pub concave_alpha: f64,
    /// Maximum edge length; longer segments are split
    pub max_edge_length: Length,
    /// Network clip radius as a multiple of the distance budget
    pub reducer_multiplier: f64,
    /// Routes processed per batch
    pub batch_size: usize,
    /// Optional per-route wall-clock cap; exceeding it skips the route
    pub route_time_budget_secs: Option<u64>,
}

impl WalkshedConfig {
    pub const DEFAULT_DISTANCE: Length = 804.672;
    pub const DEFAULT_CONCAVE_ALPHA: f64 = 0.015;
    pub const DEFAULT_MAX_EDGE_LENGTH: Length = 100.0;
    pub const DEFAULT_REDUCER_MULTIPLIER: f64 = 3.3;
    pub const DEFAULT_BATCH_SIZE: usize = 5;
    pub const DEFAULT_ROUTE_FIELD: &str = "rte";
}

impl Default for WalkshedConfig {
    fn default() -> Self {
        Self {
            network_path: PathBuf::new(),
            stops_path: PathBuf::new(),
            output_dir: PathBuf::from("output"),
            output_prefix: String::new(),
            route_field: Self::DEFAULT_ROUTE_FIELD.to_string(),
            crs: None,
            distance: Self::DEFAULT_DISTANCE,
            concave_alpha: Self::DEFAULT_CONCAVE_ALPHA,
            max_edge_length: Self::DEFAULT_MAX_EDGE_LENGTH,
            reducer_multiplier: Self::DEFAULT_REDUCER_MULTIPLIER,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            route_time_budget_secs: None,
        }
    }
}
