//! End-to-end pipeline tests over synthetic street grids.

use std::fs;
use std::path::Path;

use geojson::{FeatureCollection, GeoJson};
use serde_json::json;
use walkshed_core::batch::run;
use walkshed_core::loading::{WalkshedConfig, create_walkshed_model};

/// 5x5 street grid centered on (cx, cy): ten 400-unit lines with
/// 100-unit spacing, fully connected at shared vertices.
fn grid_cluster(cx: f64, cy: f64) -> Vec<serde_json::Value> {
    let mut features = Vec::new();
    for i in 0..5 {
        let offset = -200.0 + 100.0 * i as f64;
        features.push(json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[cx - 200.0, cy + offset], [cx + 200.0, cy + offset]]
            }
        }));
        features.push(json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[cx + offset, cy - 200.0], [cx + offset, cy + 200.0]]
            }
        }));
    }
    features
}

fn write_network(path: &Path, clusters: &[(f64, f64)]) {
    let features: Vec<_> = clusters
        .iter()
        .flat_map(|&(cx, cy)| grid_cluster(cx, cy))
        .collect();
    let body = json!({"type": "FeatureCollection", "features": features});
    fs::write(path, body.to_string()).unwrap();
}

fn write_stops(path: &Path, stops: &[(&str, &str, f64, f64)]) {
    let features: Vec<_> = stops
        .iter()
        .map(|(stop_id, route, x, y)| {
            json!({
                "type": "Feature",
                "properties": {"stop_id": stop_id, "rte": route},
                "geometry": {"type": "Point", "coordinates": [x, y]}
            })
        })
        .collect();
    let body = json!({"type": "FeatureCollection", "features": features});
    fs::write(path, body.to_string()).unwrap();
}

fn read_features(path: &Path) -> Vec<geojson::Feature> {
    let geojson: GeoJson = fs::read_to_string(path).unwrap().parse().unwrap();
    FeatureCollection::try_from(geojson).unwrap().features
}

fn base_config(dir: &Path) -> WalkshedConfig {
    WalkshedConfig {
        network_path: dir.join("network.geojson"),
        stops_path: dir.join("stops.geojson"),
        output_dir: dir.join("out"),
        ..WalkshedConfig::default()
    }
}

#[test]
fn twelve_routes_make_three_batches_and_skipped_routes_are_excluded() {
    let dir = tempfile::tempdir().unwrap();

    // 11 routes on their own street clusters, plus one route whose
    // stop sits in empty space far beyond the clip radius
    let clusters: Vec<(f64, f64)> = (0..11).map(|i| (i as f64 * 10_000.0, 0.0)).collect();
    write_network(&dir.path().join("network.geojson"), &clusters);

    let mut stops: Vec<(String, String, f64, f64)> = clusters
        .iter()
        .enumerate()
        .map(|(i, &(cx, cy))| (format!("s{i:02}"), format!("r{i:02}"), cx, cy))
        .collect();
    stops.push(("lost".to_string(), "r99".to_string(), 5_000.0, 50_000.0));
    let stop_refs: Vec<(&str, &str, f64, f64)> = stops
        .iter()
        .map(|(id, route, x, y)| (id.as_str(), route.as_str(), *x, *y))
        .collect();
    write_stops(&dir.path().join("stops.geojson"), &stop_refs);

    let config = base_config(dir.path());
    let model = create_walkshed_model(&config).unwrap();
    let summary = run(&model, &config).unwrap();

    // 12 routes at 5 per batch -> batches of 5, 5, 2
    assert_eq!(summary.routes_total, 12);
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.routes_succeeded, 11);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].route, "r99");
    assert_eq!(summary.skipped[0].kind, "degenerate-geometry");

    // final merge holds one dissolved polygon per surviving route
    let dissolved = read_features(&config.output_dir.join("dissolved.geojson"));
    assert_eq!(dissolved.len(), 11);
    let routes: Vec<&str> = dissolved
        .iter()
        .map(|f| f.properties.as_ref().unwrap()["rte"].as_str().unwrap())
        .collect();
    assert!(!routes.contains(&"r99"));

    let walksheds = read_features(&config.output_dir.join("walksheds.geojson"));
    assert_eq!(walksheds.len(), 11);

    // intermediates are gone; only the three final artifacts remain
    let files: Vec<_> = fs::read_dir(&config.output_dir)
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(files.len(), 3);
}

#[test]
fn distant_stops_on_one_route_dissolve_into_disjoint_parts() {
    let dir = tempfile::tempdir().unwrap();

    // two street clusters whose reachable networks cannot meet
    write_network(
        &dir.path().join("network.geojson"),
        &[(0.0, 0.0), (10_000.0, 0.0)],
    );
    write_stops(
        &dir.path().join("stops.geojson"),
        &[("a1", "A", 0.0, 0.0), ("a2", "A", 10_000.0, 0.0)],
    );

    let config = base_config(dir.path());
    let model = create_walkshed_model(&config).unwrap();
    let summary = run(&model, &config).unwrap();

    assert_eq!(summary.routes_succeeded, 1);

    let dissolved = read_features(&config.output_dir.join("dissolved.geojson"));
    assert_eq!(dissolved.len(), 1);
    let geometry = dissolved[0].geometry.clone().unwrap();
    let multi = geo::MultiPolygon::<f64>::try_from(geometry.value).unwrap();
    assert_eq!(multi.0.len(), 2, "far-apart stops must stay two parts");

    // one per-stop walkshed each
    let walksheds = read_features(&config.output_dir.join("walksheds.geojson"));
    assert_eq!(walksheds.len(), 2);
}

#[test]
fn output_prefix_names_the_final_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_network(&dir.path().join("network.geojson"), &[(0.0, 0.0)]);
    write_stops(&dir.path().join("stops.geojson"), &[("s1", "10", 0.0, 0.0)]);

    let mut config = base_config(dir.path());
    config.output_prefix = "trimet".to_string();

    let model = create_walkshed_model(&config).unwrap();
    let summary = run(&model, &config).unwrap();

    assert_eq!(summary.routes_succeeded, 1);
    assert!(config.output_dir.join("trimet_walksheds.geojson").exists());
    assert!(config.output_dir.join("trimet_dissolved.geojson").exists());
    assert!(
        config
            .output_dir
            .join("trimet_service_lines.geojson")
            .exists()
    );
}

#[test]
fn missing_network_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_stops(&dir.path().join("stops.geojson"), &[("s1", "10", 0.0, 0.0)]);

    let config = base_config(dir.path());
    assert!(create_walkshed_model(&config).is_err());
}
