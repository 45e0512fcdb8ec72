//! Batched run orchestration: per-route pipeline, intermediate
//! persistence, and the final cross-batch merge.
//!
//! Routes are processed in fixed-size batches; each batch's geometry
//! is persisted and then dropped before the next batch starts, so
//! peak memory stays bounded by one batch's working set. Per-route
//! failures are recorded in the run summary and never abort the run.

mod store;

pub use store::GeoJsonStore;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use geo::MultiPolygon;
use geojson::{Feature, JsonObject};
use log::{info, trace, warn};
use rayon::prelude::*;

use crate::algo::{dissolve, walkshed_polygon};
use crate::loading::{WalkshedConfig, WalkshedModel};
use crate::model::Stop;
use crate::routing::{reduce_network, service_area};
use crate::{Error, RouteKey};

const KIND_WALKSHEDS: &str = "walksheds";
const KIND_DISSOLVED: &str = "dissolved";
const KIND_SERVICE_LINES: &str = "service_lines";
const OUTPUT_KINDS: [&str; 3] = [KIND_WALKSHEDS, KIND_DISSOLVED, KIND_SERVICE_LINES];

/// Outcome of one run, reported to the user
#[derive(Debug, Default)]
pub struct RunSummary {
    pub routes_total: usize,
    pub routes_succeeded: usize,
    pub skipped: Vec<SkippedRoute>,
    pub batches: usize,
    pub failed_batches: Vec<(usize, String)>,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct SkippedRoute {
    pub route: RouteKey,
    pub kind: &'static str,
    pub reason: String,
}

struct RouteResult {
    walksheds: Vec<Feature>,
    dissolved: Feature,
    service_lines: Vec<Feature>,
}

/// Runs the full pipeline: per-route walksheds in batches, per-batch
/// persistence, final merge across batches, intermediate cleanup.
pub fn run(model: &WalkshedModel, config: &WalkshedConfig) -> Result<RunSummary, Error> {
    let store = GeoJsonStore::create(&config.output_dir)?;
    let run_stamp = Utc::now().format("%Y%m%dT%H%M%S").to_string();

    let routes: Vec<&str> = model.stops.routes().collect();
    let mut summary = RunSummary {
        routes_total: routes.len(),
        ..RunSummary::default()
    };
    info!(
        "Processing {} routes in batches of {}",
        routes.len(),
        config.batch_size
    );

    let mut intermediates: Vec<(usize, &'static str, String)> = Vec::new();

    for (batch_index, batch) in routes.chunks(config.batch_size).enumerate() {
        info!(
            "Batch {} ({} routes: {})",
            batch_index,
            batch.len(),
            batch.join(", ")
        );

        // Each route works on its own reduced sub-graph and writes to
        // a private slot; the full graph is only read.
        let results: Vec<(String, Result<RouteResult, Error>)> = batch
            .par_iter()
            .map(|route| ((*route).to_string(), process_route(model, config, route)))
            .collect();

        let mut walksheds = Vec::new();
        let mut dissolved = Vec::new();
        let mut service_lines = Vec::new();
        let mut batch_routes = Vec::new();

        for (route, result) in results {
            match result {
                Ok(route_result) => {
                    walksheds.extend(route_result.walksheds);
                    dissolved.push(route_result.dissolved);
                    service_lines.extend(route_result.service_lines);
                    batch_routes.push(route);
                }
                Err(err) if err.is_recoverable() => {
                    warn!("skipping route {route}: {err}");
                    summary.skipped.push(SkippedRoute {
                        route,
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let batch_output = [
            (KIND_WALKSHEDS, walksheds),
            (KIND_DISSOLVED, dissolved),
            (KIND_SERVICE_LINES, service_lines),
        ]
        .into_iter()
        .try_for_each(|(kind, features)| {
            let name = intermediate_name(&run_stamp, batch_index, kind);
            store.write(&name, features)?;
            intermediates.push((batch_index, kind, name));
            Ok::<(), Error>(())
        });

        match batch_output {
            Ok(()) => summary.routes_succeeded += batch_routes.len(),
            Err(err) => {
                // the batch's artifacts are lost; other batches are unaffected
                warn!("batch {batch_index} failed to persist: {err}");
                summary.failed_batches.push((batch_index, err.to_string()));
                for (_, _, name) in intermediates
                    .iter()
                    .filter(|(index, _, _)| *index == batch_index)
                {
                    let _ = store.remove(name);
                }
                intermediates.retain(|(index, _, _)| *index != batch_index);
                for route in batch_routes {
                    summary.skipped.push(SkippedRoute {
                        route,
                        kind: "storage",
                        reason: err.to_string(),
                    });
                }
            }
        }
        summary.batches += 1;
        // batch geometry is dropped here, before the next batch starts
    }

    merge_batches(&store, config, &intermediates, &mut summary)?;

    info!(
        "Run complete: {} of {} routes succeeded, {} skipped",
        summary.routes_succeeded,
        summary.routes_total,
        summary.skipped.len()
    );
    Ok(summary)
}

/// Merges all intermediate artifacts per output kind into one final
/// artifact per kind, then removes the intermediates. Merging is a
/// concatenation: geometry was already unioned within each route key,
/// so batch order cannot change the covered area.
fn merge_batches(
    store: &GeoJsonStore,
    config: &WalkshedConfig,
    intermediates: &[(usize, &'static str, String)],
    summary: &mut RunSummary,
) -> Result<(), Error> {
    let prefix = if config.output_prefix.is_empty() {
        String::new()
    } else {
        format!("{}_", config.output_prefix)
    };

    for kind in OUTPUT_KINDS {
        let mut merged = Vec::new();
        for (_, _, name) in intermediates.iter().filter(|(_, k, _)| *k == kind) {
            merged.extend(store.read(name)?);
        }
        let final_name = format!("{prefix}{kind}.geojson");
        store.write(&final_name, merged)?;
        summary.outputs.push(store.path(&final_name));
    }

    for (_, _, name) in intermediates {
        if let Err(err) = store.remove(name) {
            warn!("could not remove intermediate {name}: {err}");
        }
    }
    Ok(())
}

fn intermediate_name(run_stamp: &str, batch_index: usize, kind: &str) -> String {
    format!("{run_stamp}_batch{batch_index}_{kind}.geojson")
}

/// Runs the per-route pipeline: for every stop of the route, clip the
/// network, search within the budget, and build a hull; then dissolve
/// the stop walksheds into the route polygon.
fn process_route(
    model: &WalkshedModel,
    config: &WalkshedConfig,
    route: &str,
) -> Result<RouteResult, Error> {
    let started = Instant::now();
    let time_budget = config.route_time_budget_secs.map(Duration::from_secs);

    let stops = model.stops.route_stops(route);
    let mut stop_polygons: Vec<(MultiPolygon<f64>, &Stop)> = Vec::new();
    let mut service_lines = Vec::new();
    let mut degenerate_stops = 0usize;

    for stop in stops {
        if let Some(budget) = time_budget {
            if started.elapsed() > budget {
                return Err(Error::TimeBudgetExceeded);
            }
        }

        let sub = reduce_network(
            &model.street_graph,
            &[stop.geometry],
            config.distance,
            config.reducer_multiplier,
        );
        if sub.is_empty() {
            trace!("stop {} of route {route}: no network in range", stop.stop_id);
            degenerate_stops += 1;
            continue;
        }

        let area = match service_area(&sub, &[stop.geometry], config.distance) {
            Ok(area) => area,
            Err(Error::NoPointsFound) => {
                degenerate_stops += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        match walkshed_polygon(&area.boundary_points(), config.concave_alpha) {
            Ok(polygon) => {
                service_lines.push(lines_feature(&config.route_field, stop, &area.edges));
                stop_polygons.push((polygon, stop));
            }
            Err(Error::DegenerateGeometry(reason)) => {
                trace!("stop {} of route {route}: {reason}", stop.stop_id);
                degenerate_stops += 1;
            }
            Err(err) => return Err(err),
        }
    }

    if stop_polygons.is_empty() {
        return Err(Error::DegenerateGeometry(format!(
            "no stop of route {route} produced a polygon ({degenerate_stops} degenerate)"
        )));
    }

    let parts: Vec<MultiPolygon<f64>> = stop_polygons
        .iter()
        .map(|(polygon, _)| polygon.clone())
        .collect();
    let dissolved_geometry = dissolve(&parts);

    let walksheds = stop_polygons
        .iter()
        .map(|(polygon, stop)| polygon_feature(&config.route_field, stop, polygon))
        .collect();
    let dissolved = dissolved_feature(
        &config.route_field,
        route,
        stop_polygons.len(),
        &dissolved_geometry,
    );

    Ok(RouteResult {
        walksheds,
        dissolved,
        service_lines,
    })
}

fn polygon_feature(route_field: &str, stop: &Stop, polygon: &MultiPolygon<f64>) -> Feature {
    let mut properties = stop.attributes.clone();
    properties.insert(route_field.to_string(), stop.route.clone().into());
    properties.insert("stop_id".to_string(), stop.stop_id.clone().into());
    feature(geojson::Value::from(polygon), properties)
}

fn dissolved_feature(
    route_field: &str,
    route: &str,
    stop_count: usize,
    polygon: &MultiPolygon<f64>,
) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(route_field.to_string(), route.into());
    properties.insert("stop_count".to_string(), stop_count.into());
    feature(geojson::Value::from(polygon), properties)
}

fn lines_feature(route_field: &str, stop: &Stop, edges: &[geo::LineString<f64>]) -> Feature {
    let lines = geo::MultiLineString::new(edges.to_vec());
    let mut properties = JsonObject::new();
    properties.insert(route_field.to_string(), stop.route.clone().into());
    properties.insert("stop_id".to_string(), stop.stop_id.clone().into());
    feature(geojson::Value::from(&lines), properties)
}

fn feature(value: geojson::Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
