//! Model assembly from configured feature sources

use geo::{ConvexHull, Intersects, MultiPoint};
use log::info;

use super::config::WalkshedConfig;
use super::sources::{load_network, load_stops};
use crate::Error;
use crate::model::{GraphBuilder, StopIndex, StreetGraph};

/// Long-lived inputs for a run: the full street graph and the stop
/// arena. Everything downstream is derived per route and released
/// once consumed.
pub struct WalkshedModel {
    pub street_graph: StreetGraph,
    pub stops: StopIndex,
}

/// Creates a walkshed model based on the provided configuration
///
/// # Errors
///
/// Returns an error if either feature source is missing, unreadable,
/// empty, or declares a different CRS than configured.
pub fn create_walkshed_model(config: &WalkshedConfig) -> Result<WalkshedModel, Error> {
    validate_config(config)?;

    info!(
        "Processing pedestrian network: {}",
        config.network_path.display()
    );
    let lines = load_network(&config.network_path, config.crs.as_deref())?;
    if lines.is_empty() {
        return Err(Error::Input(format!(
            "no line features in {}",
            config.network_path.display()
        )));
    }

    let mut builder = GraphBuilder::new(config.max_edge_length);
    for line in &lines {
        builder.add_polyline(line);
    }
    let (street_graph, report) = builder.finish();
    info!(
        "Street graph: {} nodes, {} edges ({} long segments split, {} degenerate dropped)",
        street_graph.node_count(),
        street_graph.edge_count(),
        report.segments_split,
        report.degenerate_dropped
    );

    info!("Processing stops: {}", config.stops_path.display());
    let stops = load_stops(&config.stops_path, &config.route_field, config.crs.as_deref())?;
    if stops.is_empty() {
        return Err(Error::Input(format!(
            "no usable stops in {}",
            config.stops_path.display()
        )));
    }
    let stops = StopIndex::from_stops(stops);
    info!("{} stops across {} routes", stops.len(), stops.route_count());

    validate_stop_coverage(&street_graph, &stops);

    Ok(WalkshedModel {
        street_graph,
        stops,
    })
}

fn validate_config(config: &WalkshedConfig) -> Result<(), Error> {
    if !config.network_path.exists() {
        return Err(Error::Input(format!(
            "network file not found: {}",
            config.network_path.display()
        )));
    }
    if !config.stops_path.exists() {
        return Err(Error::Input(format!(
            "stops file not found: {}",
            config.stops_path.display()
        )));
    }
    if config.distance <= 0.0 {
        return Err(Error::Input("walking distance must be positive".to_string()));
    }
    if config.batch_size == 0 {
        return Err(Error::Input("batch size must be positive".to_string()));
    }
    if config.reducer_multiplier < 1.0 {
        return Err(Error::Input(
            "reducer multiplier below 1 truncates walksheds".to_string(),
        ));
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn validate_stop_coverage(streets: &StreetGraph, stops: &StopIndex) {
    let graph_nodes: MultiPoint = streets
        .graph
        .node_weights()
        .map(|node| node.geometry)
        .collect();
    let graph_hull = graph_nodes.convex_hull();

    let mut outside = 0usize;
    let mut total = 0usize;
    for route in stops.routes() {
        for stop in stops.route_stops(route) {
            total += 1;
            if !stop.geometry.intersects(&graph_hull) {
                outside += 1;
            }
        }
    }

    if outside > 0 {
        let percentage = (outside as f64 / total as f64) * 100.0;
        log::warn!(
            "{outside} of {total} stops ({percentage:.1}%) are outside the network \
        coverage area. Their routes may come up degenerate. Consider a network \
        extract that covers all stops."
        );
    }
}
