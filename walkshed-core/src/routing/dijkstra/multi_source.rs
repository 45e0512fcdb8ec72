//! Bounded multi-source Dijkstra over the street graph

use std::collections::BinaryHeap;

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::state::State;
use crate::Length;
use crate::model::StreetGraph;

/// A search seed: graph node plus the cost already spent reaching it
/// (the Euclidean snap distance from the original seed point)
#[derive(Debug, Clone, Copy)]
pub struct SeedNode {
    pub node: NodeIndex,
    pub snap_cost: Length,
}

/// Minimal network distance from any seed, for every node reachable
/// within `budget`. States beyond the budget are never pushed, so the
/// distance field cannot overshoot and the search frontier stays
/// bounded. Traversal is undirected.
pub fn bounded_distances(
    graph: &StreetGraph,
    seeds: &[SeedNode],
    budget: Length,
) -> HashMap<NodeIndex, Length> {
    let mut distances: HashMap<NodeIndex, Length> = HashMap::new();
    let mut heap = BinaryHeap::new();

    for seed in seeds {
        if seed.snap_cost > budget {
            continue;
        }
        match distances.entry(seed.node) {
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(seed.snap_cost);
                heap.push(State {
                    cost: seed.snap_cost,
                    node: seed.node,
                });
            }
            hashbrown::hash_map::Entry::Occupied(mut entry) => {
                if seed.snap_cost < *entry.get() {
                    *entry.get_mut() = seed.snap_cost;
                    heap.push(State {
                        cost: seed.snap_cost,
                        node: seed.node,
                    });
                }
            }
        }
    }

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        // Examine neighbors
        for edge in graph.edges(node) {
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let next_cost = cost + edge.weight().weight;
            if next_cost > budget {
                continue;
            }

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphBuilder;
    use geo::LineString;

    fn straight_line(length: f64, step: f64) -> StreetGraph {
        let mut builder = GraphBuilder::new(step);
        builder.add_polyline(&LineString::from(vec![(0.0, 0.0), (length, 0.0)]));
        builder.finish().0
    }

    #[test]
    fn never_exceeds_budget() {
        let graph = straight_line(1000.0, 100.0);
        let (start, _) = graph.nearest_node(&geo::Point::new(0.0, 0.0)).unwrap();

        let distances = bounded_distances(
            &graph,
            &[SeedNode {
                node: start,
                snap_cost: 0.0,
            }],
            400.0,
        );

        assert!(distances.values().all(|&d| d <= 400.0));
        // nodes every 100 units: 0, 100, 200, 300, 400
        assert_eq!(distances.len(), 5);
    }

    #[test]
    fn multiple_seeds_take_the_minimum() {
        let graph = straight_line(1000.0, 100.0);
        let (left, _) = graph.nearest_node(&geo::Point::new(0.0, 0.0)).unwrap();
        let (right, _) = graph.nearest_node(&geo::Point::new(1000.0, 0.0)).unwrap();
        let (mid, _) = graph.nearest_node(&geo::Point::new(500.0, 0.0)).unwrap();

        let distances = bounded_distances(
            &graph,
            &[
                SeedNode {
                    node: left,
                    snap_cost: 0.0,
                },
                SeedNode {
                    node: right,
                    snap_cost: 0.0,
                },
            ],
            600.0,
        );

        // reached from both ends; the middle node is 500 from either
        assert_eq!(distances[&mid], 500.0);
        assert_eq!(distances.len(), 11);
    }

    #[test]
    fn snap_cost_counts_against_the_budget() {
        let graph = straight_line(1000.0, 100.0);
        let (start, _) = graph.nearest_node(&geo::Point::new(0.0, 0.0)).unwrap();

        let distances = bounded_distances(
            &graph,
            &[SeedNode {
                node: start,
                snap_cost: 150.0,
            }],
            400.0,
        );

        // 150 spent snapping leaves 250 of network: nodes at 0, 100, 200
        assert_eq!(distances.len(), 3);
        assert_eq!(distances[&start], 150.0);
    }

    #[test]
    fn seed_beyond_budget_reaches_nothing() {
        let graph = straight_line(1000.0, 100.0);
        let (start, _) = graph.nearest_node(&geo::Point::new(0.0, 0.0)).unwrap();

        let distances = bounded_distances(
            &graph,
            &[SeedNode {
                node: start,
                snap_cost: 500.0,
            }],
            400.0,
        );
        assert!(distances.is_empty());
    }
}
