//! Clips the full network to the vicinity of a seed set before search.
//!
//! The clip radius is the distance budget times a multiplier greater
//! than one: network paths detour around obstacles, so the clip must be
//! generous enough that no shortest path within budget leaves the
//! clipped region. The multiplier is a tunable trade-off, not a
//! constant.

use geo::Point;
use hashbrown::HashMap;
use log::debug;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};

use crate::Length;
use crate::model::{StreetEdge, StreetGraph, StreetNode};

/// Subgraph of all edges intersecting the union of disks of radius
/// `budget * multiplier` around the seeds. The result is an
/// independent copy with its own spatial indexes; the parent graph is
/// never mutated. An empty result means "no walkshed for this seed
/// set", not an error.
pub fn reduce_network(
    graph: &StreetGraph,
    seeds: &[Point<f64>],
    budget: Length,
    multiplier: f64,
) -> StreetGraph {
    let radius = budget * multiplier;

    let mut keep: Vec<EdgeIndex> = seeds
        .iter()
        .flat_map(|seed| graph.edges_within(seed, radius))
        .collect();
    keep.sort_unstable();
    keep.dedup();

    let mut sub: UnGraph<StreetNode, StreetEdge> = UnGraph::default();
    let mut node_map: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    for &edge in &keep {
        let Some((source, target)) = graph.graph.edge_endpoints(edge) else {
            continue;
        };
        let mapped_source = map_node(&mut sub, &mut node_map, graph, source);
        let mapped_target = map_node(&mut sub, &mut node_map, graph, target);
        if let Some(weight) = graph.graph.edge_weight(edge) {
            sub.add_edge(mapped_source, mapped_target, weight.clone());
        }
    }

    debug!(
        "reduced network to {} of {} edges within {radius:.1} units of {} seed(s)",
        sub.edge_count(),
        graph.edge_count(),
        seeds.len()
    );

    StreetGraph::from_graph(sub)
}

fn map_node(
    sub: &mut UnGraph<StreetNode, StreetEdge>,
    node_map: &mut HashMap<NodeIndex, NodeIndex>,
    graph: &StreetGraph,
    node: NodeIndex,
) -> NodeIndex {
    *node_map
        .entry(node)
        .or_insert_with(|| sub.add_node(graph.graph[node].clone()))
}
