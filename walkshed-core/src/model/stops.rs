//! Transit stops grouped by route key

use geo::Point;
use itertools::Itertools;
use serde_json::{Map, Value};

use crate::RouteKey;

/// A transit stop with its pass-through source attributes
#[derive(Debug, Clone)]
pub struct Stop {
    pub stop_id: String,
    pub route: RouteKey,
    pub geometry: Point<f64>,
    /// Opaque attribute bag, carried into outputs unchanged
    pub attributes: Map<String, Value>,
}

/// Stops loaded once into a sorted arena with flat per-route ranges.
/// Per-route subsets are slice views into the arena, never rebuilt
/// collections. Group membership never changes after load.
#[derive(Debug, Clone, Default)]
pub struct StopIndex {
    stops: Vec<Stop>,
    groups: Vec<RouteGroup>,
}

#[derive(Debug, Clone)]
struct RouteGroup {
    key: RouteKey,
    start: usize,
    len: usize,
}

impl StopIndex {
    pub fn from_stops(mut stops: Vec<Stop>) -> Self {
        stops.sort_by(|a, b| {
            a.route
                .cmp(&b.route)
                .then_with(|| a.stop_id.cmp(&b.stop_id))
        });

        let mut groups: Vec<RouteGroup> = Vec::new();
        let mut start = 0;
        for (key, chunk) in &stops.iter().chunk_by(|stop| stop.route.clone()) {
            let len = chunk.count();
            groups.push(RouteGroup { key, start, len });
            start += len;
        }

        Self { stops, groups }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn route_count(&self) -> usize {
        self.groups.len()
    }

    /// Route keys in sorted order
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.key.as_str())
    }

    /// Slice view of the stops belonging to one route
    pub fn route_stops(&self, key: &str) -> &[Stop] {
        match self
            .groups
            .binary_search_by(|group| group.key.as_str().cmp(key))
        {
            Ok(found) => {
                let group = &self.groups[found];
                &self.stops[group.start..group.start + group.len]
            }
            Err(_) => &[],
        }
    }
}
