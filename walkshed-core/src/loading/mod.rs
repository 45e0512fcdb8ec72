//! This module is responsible for loading feature sources (network,
//! stops) and assembling the walkshed model.

mod builder;
mod config;
mod sources;

pub use builder::{WalkshedModel, create_walkshed_model};
pub use config::WalkshedConfig;
pub use sources::{load_network, load_stops};
