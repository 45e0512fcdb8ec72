// Re-export key components
pub use crate::algo::{dissolve, walkshed_polygon};
pub use crate::batch::{GeoJsonStore, RunSummary, run};
pub use crate::loading::{WalkshedConfig, WalkshedModel, create_walkshed_model};
pub use crate::model::{Stop, StopIndex, StreetGraph};
pub use crate::routing::{ServiceArea, reduce_network, service_area};

// Core types
pub use crate::Error;
pub use crate::Length;
pub use crate::RouteKey;
