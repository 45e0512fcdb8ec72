//! Pedestrian network graph with spatial indexes for snapping and
//! radius clipping.

use geo::{Coord, Distance, Euclidean, LineString, Point};
use log::warn;
use petgraph::Undirected;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Line};

use super::{StreetEdge, StreetNode};
use crate::Length;

/// Node locations indexed for nearest-neighbour snapping
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;
/// Edge segments indexed for radius queries
pub type IndexedEdge = GeomWithData<Line<[f64; 2]>, EdgeIndex>;

/// Endpoints closer than this collapse into one node (CRS linear units)
const COINCIDENCE_TOLERANCE: Length = 1e-3;

/// Pedestrian network: undirected graph plus R-trees over nodes and
/// edge segments. Built once per network input; the reducer derives
/// independent sub-graphs from it.
pub struct StreetGraph {
    pub graph: UnGraph<StreetNode, StreetEdge>,
    node_index: RTree<IndexedPoint>,
    edge_index: RTree<IndexedEdge>,
}

impl StreetGraph {
    /// Wraps a finished graph, bulk-loading both spatial indexes.
    pub fn from_graph(graph: UnGraph<StreetNode, StreetEdge>) -> Self {
        let nodes = graph
            .node_indices()
            .map(|idx| {
                let point = graph[idx].geometry;
                IndexedPoint::new([point.x(), point.y()], idx)
            })
            .collect();

        let edges = graph
            .edge_references()
            .filter_map(|edge| {
                let coords = &edge.weight().geometry.0;
                let (first, last) = (coords.first()?, coords.last()?);
                Some(IndexedEdge::new(
                    Line::new([first.x, first.y], [last.x, last.y]),
                    edge.id(),
                ))
            })
            .collect();

        Self {
            graph,
            node_index: RTree::bulk_load(nodes),
            edge_index: RTree::bulk_load(edges),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Nearest graph node to a point, with the Euclidean snap distance
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, Length)> {
        let query = [point.x(), point.y()];
        self.node_index.nearest_neighbor(&query).map(|indexed| {
            let [x, y] = *indexed.geom();
            let snap = (x - point.x()).hypot(y - point.y());
            (indexed.data, snap)
        })
    }

    /// Edges whose segment lies within `radius` of `center`
    pub fn edges_within(
        &self,
        center: &Point<f64>,
        radius: Length,
    ) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.edge_index
            .locate_within_distance([center.x(), center.y()], radius * radius)
            .map(|indexed| indexed.data)
    }

    pub fn edges(
        &self,
        node: NodeIndex,
    ) -> petgraph::graph::Edges<'_, StreetEdge, Undirected> {
        self.graph.edges(node)
    }

    pub fn node_point(&self, node: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(node).map(|n| n.geometry)
    }
}

/// Counters reported by graph construction
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildReport {
    pub edges_built: usize,
    pub segments_split: usize,
    pub degenerate_dropped: usize,
}

/// Incremental graph construction from input polylines.
///
/// Consecutive polyline vertices become edges; segments longer than the
/// maximum edge length are split into equal pieces so travel-cost
/// granularity stays fine near cutoff boundaries. Endpoints coincident
/// within tolerance collapse to one node. Degenerate segments
/// (zero-length, non-finite coordinates) are dropped and counted.
pub struct GraphBuilder {
    graph: UnGraph<StreetNode, StreetEdge>,
    node_index: RTree<IndexedPoint>,
    max_edge_length: Length,
    report: BuildReport,
}

impl GraphBuilder {
    pub fn new(max_edge_length: Length) -> Self {
        Self {
            graph: UnGraph::default(),
            node_index: RTree::new(),
            max_edge_length,
            report: BuildReport::default(),
        }
    }

    pub fn add_polyline(&mut self, line: &LineString<f64>) {
        for segment in line.lines() {
            self.add_segment(segment.start, segment.end);
        }
    }

    fn add_segment(&mut self, start: Coord<f64>, end: Coord<f64>) {
        if ![start.x, start.y, end.x, end.y]
            .iter()
            .all(|v| v.is_finite())
        {
            self.report.degenerate_dropped += 1;
            return;
        }

        let length = Euclidean.distance(Point::from(start), Point::from(end));
        if length <= 0.0 {
            self.report.degenerate_dropped += 1;
            return;
        }

        let pieces = (length / self.max_edge_length).ceil() as usize;
        if pieces > 1 {
            self.report.segments_split += 1;
        }

        let mut previous = start;
        for i in 1..=pieces {
            let t = i as f64 / pieces as f64;
            let next = Coord {
                x: start.x + (end.x - start.x) * t,
                y: start.y + (end.y - start.y) * t,
            };
            self.push_edge(previous, next);
            previous = next;
        }
    }

    fn push_edge(&mut self, from: Coord<f64>, to: Coord<f64>) {
        let source = self.intern(from);
        let target = self.intern(to);
        let weight = Euclidean.distance(Point::from(from), Point::from(to));
        let geometry = LineString::new(vec![from, to]);
        self.graph
            .add_edge(source, target, StreetEdge { weight, geometry });
        self.report.edges_built += 1;
    }

    /// Returns the existing node within tolerance, or inserts a new one
    fn intern(&mut self, coord: Coord<f64>) -> NodeIndex {
        let query = [coord.x, coord.y];
        if let Some(found) = self.node_index.nearest_neighbor(&query) {
            let [x, y] = *found.geom();
            if (x - coord.x).hypot(y - coord.y) <= COINCIDENCE_TOLERANCE {
                return found.data;
            }
        }

        let id = self.graph.node_count();
        let index = self.graph.add_node(StreetNode {
            id,
            geometry: Point::from(coord),
        });
        self.node_index.insert(IndexedPoint::new(query, index));
        index
    }

    pub fn finish(self) -> (StreetGraph, BuildReport) {
        if self.report.degenerate_dropped > 0 {
            warn!(
                "dropped {} degenerate network segments",
                self.report.degenerate_dropped
            );
        }
        (StreetGraph::from_graph(self.graph), self.report)
    }
}
