//! Reachable sub-network extraction from a bounded search

use geo::{Coord, Distance, Euclidean, LineString, Point};
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::model::StreetGraph;
use crate::routing::dijkstra::{SeedNode, bounded_distances};
use crate::{Error, Length};

/// Reachable sub-network from a seed set within a distance budget.
///
/// Every reached node carries its minimal cumulative distance from any
/// seed; no distance exceeds the budget. Edges with both endpoints
/// reached are included whole; edges with exactly one endpoint reached
/// are cut at the remaining budget, proportionally along the segment,
/// so the cut tip is a boundary sample at exactly the budget distance.
#[derive(Debug, Clone)]
pub struct ServiceArea {
    pub budget: Length,
    /// Minimal network distance from any seed, per reached node
    pub node_distances: HashMap<NodeIndex, Length>,
    /// Reached node locations
    pub nodes: Vec<Point<f64>>,
    /// Fully or partially reached edge geometries
    pub edges: Vec<LineString<f64>>,
}

impl ServiceArea {
    /// All points describing the reachable extent: reached nodes plus
    /// every vertex of the reached edges, cut tips included.
    pub fn boundary_points(&self) -> Vec<Point<f64>> {
        let mut points = self.nodes.clone();
        for edge in &self.edges {
            points.extend(edge.points());
        }
        points
    }
}

/// Multi-source bounded-distance search. Seeds are snapped to their
/// nearest graph node with the snap distance charged against the
/// budget. A seed whose snap node is isolated yields a trivial service
/// area containing only that node; this is not an error.
pub fn service_area(
    graph: &StreetGraph,
    seeds: &[Point<f64>],
    budget: Length,
) -> Result<ServiceArea, Error> {
    let seed_nodes = snap_seeds(graph, seeds)?;
    let node_distances = bounded_distances(graph, &seed_nodes, budget);

    let mut edges = Vec::new();
    for edge in graph.graph.edge_references() {
        let geometry = &edge.weight().geometry;
        let reached_source = node_distances.get(&edge.source()).copied();
        let reached_target = node_distances.get(&edge.target()).copied();

        match (reached_source, reached_target) {
            (Some(_), Some(_)) => edges.push(geometry.clone()),
            (Some(distance), None) => {
                let remaining = budget - distance;
                if remaining > 0.0 {
                    edges.push(cut_linestring(geometry, remaining));
                }
            }
            (None, Some(distance)) => {
                let remaining = budget - distance;
                if remaining > 0.0 {
                    let reversed =
                        LineString::new(geometry.0.iter().rev().copied().collect());
                    edges.push(cut_linestring(&reversed, remaining));
                }
            }
            (None, None) => {}
        }
    }

    let nodes = node_distances
        .keys()
        .filter_map(|&node| graph.node_point(node))
        .collect();

    Ok(ServiceArea {
        budget,
        node_distances,
        nodes,
        edges,
    })
}

fn snap_seeds(graph: &StreetGraph, seeds: &[Point<f64>]) -> Result<Vec<SeedNode>, Error> {
    seeds
        .iter()
        .map(|seed| {
            graph
                .nearest_node(seed)
                .map(|(node, snap_cost)| SeedNode { node, snap_cost })
                .ok_or(Error::NoPointsFound)
        })
        .collect()
}

/// Prefix of `line` of the given length, measured along the segments.
/// The final coordinate is interpolated proportionally.
fn cut_linestring(line: &LineString<f64>, length: Length) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(line.0.len());
    if let Some(&first) = line.0.first() {
        coords.push(first);
    }

    let mut remaining = length;
    for segment in line.lines() {
        let segment_length =
            Euclidean.distance(Point::from(segment.start), Point::from(segment.end));
        if segment_length <= 0.0 {
            continue;
        }
        if remaining < segment_length {
            let t = remaining / segment_length;
            coords.push(Coord {
                x: segment.start.x + (segment.end.x - segment.start.x) * t,
                y: segment.start.y + (segment.end.y - segment.start.y) * t,
            });
            break;
        }
        coords.push(segment.end);
        remaining -= segment_length;
    }

    LineString::new(coords)
}
