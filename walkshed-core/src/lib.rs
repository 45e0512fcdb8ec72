//! Walkshed generation core.
//!
//! Computes polygons approximating the area reachable on foot from
//! transit stops within a distance budget, measured along a pedestrian
//! network. Per route: the network is clipped to the stops' vicinity,
//! a bounded multi-source search produces the reachable sub-network,
//! hull construction turns it into a polygon, and per-route results
//! are dissolved and merged across batches into final deliverables.

pub mod algo;
pub mod batch;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;

/// Network distance in the linear unit of the input CRS
pub type Length = f64;

/// Identifier shared by all stops of one route
pub type RouteKey = String;
