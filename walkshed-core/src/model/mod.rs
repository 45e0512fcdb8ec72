//! Data model for walkshed generation
//!
//! Contains the pedestrian network graph and the stop arena.

pub mod stops;
pub mod streets;

pub use stops::{Stop, StopIndex};
pub use streets::{GraphBuilder, StreetEdge, StreetGraph, StreetNode};
