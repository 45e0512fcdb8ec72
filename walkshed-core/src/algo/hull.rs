//! Walkshed polygon construction from a reachable sub-network.
//!
//! The convex hull bounds the true reachable extent; the concave hull
//! fits tighter but can spike past sparse areas. Intersecting the two
//! keeps the concavity detail inside the convex envelope.

use geo::algorithm::concave_hull::ConcaveHullOptions;
use geo::{Area, BooleanOps, ConcaveHull, ConvexHull, MultiPoint, MultiPolygon, Point};

use crate::Error;

/// Clamp range for the concave hull shape parameter alpha. Alpha is an
/// inverse-scale parameter: below the minimum the fit degenerates to
/// the convex envelope anyway, above the maximum it fragments into
/// slivers or collapses on sparse point sets. Out-of-range values are
/// pulled back instead of failing the route.
const ALPHA_MIN: f64 = 1e-4;
const ALPHA_MAX: f64 = 1.0;

/// Coordinates closer than this count as one point
const DEDUP_TOLERANCE: f64 = 1e-6;

/// Builds the walkshed polygon for a reached point set: convex hull
/// intersected with the concave (alpha-shape) hull of the same points.
///
/// # Errors
///
/// `Error::DegenerateGeometry` when fewer than 3 distinct points
/// remain, or when all points are collinear and no polygon is
/// producible. Callers skip the route and continue.
pub fn walkshed_polygon(points: &[Point<f64>], alpha: f64) -> Result<MultiPolygon<f64>, Error> {
    let mut unique: Vec<Point<f64>> = points
        .iter()
        .filter(|p| p.x().is_finite() && p.y().is_finite())
        .copied()
        .collect();
    unique.sort_by(|a, b| {
        a.x()
            .total_cmp(&b.x())
            .then_with(|| a.y().total_cmp(&b.y()))
    });
    unique.dedup_by(|a, b| {
        (a.x() - b.x()).abs() < DEDUP_TOLERANCE && (a.y() - b.y()).abs() < DEDUP_TOLERANCE
    });

    if unique.len() < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "{} distinct points, need at least 3 for a hull",
            unique.len()
        )));
    }

    let multi_point = MultiPoint::from(unique);
    let convex = multi_point.convex_hull();
    if convex.unsigned_area() <= 0.0 {
        return Err(Error::DegenerateGeometry(
            "collinear points produce no polygon".to_string(),
        ));
    }

    let alpha = alpha.clamp(ALPHA_MIN, ALPHA_MAX);
    let concave = multi_point.concave_hull_with_options(ConcaveHullOptions {
        concavity: 1.0 / alpha,
        length_threshold: 0.0,
    });

    Ok(convex.intersection(&concave))
}
