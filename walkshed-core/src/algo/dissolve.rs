//! Dissolve: geometric union of walkshed polygons sharing a route key.

use geo::{BooleanOps, MultiPolygon};

/// Unions all parts into one (possibly multi-part) geometry. Holes and
/// disjoint parts are preserved: two stops whose reachable networks
/// never meet stay two polygons. Idempotent and order-independent with
/// respect to the covered area.
pub fn dissolve(parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    let mut merged = MultiPolygon::new(Vec::new());
    for part in parts {
        merged = merged.union(part);
    }
    merged
}
