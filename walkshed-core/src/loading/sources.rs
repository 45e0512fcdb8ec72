//! Feature sources: GeoJSON network and GeoJSON/CSV stop readers.
//!
//! Iteration order of either source is not significant; all attributes
//! ride along unchanged.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use geo::{LineString, Point};
use geojson::{FeatureCollection, GeoJson};
use log::warn;
use serde_json::{Map, Value};

use crate::Error;
use crate::model::Stop;

/// Loads the pedestrian network polylines from a GeoJSON file.
/// MultiLineString features are flattened; other geometry types are
/// skipped with a count.
pub fn load_network(path: &Path, expected_crs: Option<&str>) -> Result<Vec<LineString<f64>>, Error> {
    let collection = read_feature_collection(path, expected_crs)?;

    let mut lines = Vec::new();
    let mut skipped = 0usize;
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            skipped += 1;
            continue;
        };
        match geometry.value {
            geojson::Value::LineString { .. } => {
                lines.push(LineString::try_from(geometry.value)?);
            }
            geojson::Value::MultiLineString { .. } => {
                let multi = geo::MultiLineString::try_from(geometry.value)?;
                lines.extend(multi.0);
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("skipped {skipped} non-line features in {}", path.display());
    }
    Ok(lines)
}

/// Loads stops from GeoJSON or CSV, decided by file extension. The
/// route key is read from `route_field`; rows without one, or without
/// usable coordinates, are dropped with a count.
pub fn load_stops(
    path: &Path,
    route_field: &str,
    expected_crs: Option<&str>,
) -> Result<Vec<Stop>, Error> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        stops_from_csv(path, route_field)
    } else {
        stops_from_geojson(path, route_field, expected_crs)
    }
}

fn stops_from_geojson(
    path: &Path,
    route_field: &str,
    expected_crs: Option<&str>,
) -> Result<Vec<Stop>, Error> {
    let collection = read_feature_collection(path, expected_crs)?;

    let mut stops = Vec::new();
    let mut dropped = 0usize;
    for (index, feature) in collection.features.into_iter().enumerate() {
        let geometry = feature
            .geometry
            .filter(|g| matches!(g.value, geojson::Value::Point { .. }));
        let properties = feature.properties.unwrap_or_default();
        let route = properties.get(route_field).map(property_as_string);

        match (geometry, route) {
            (Some(geometry), Some(route)) => {
                let point: Point<f64> = Point::try_from(geometry.value)?;
                if !(point.x().is_finite() && point.y().is_finite()) {
                    dropped += 1;
                    continue;
                }
                let stop_id = properties
                    .get("stop_id")
                    .map(property_as_string)
                    .unwrap_or_else(|| index.to_string());
                stops.push(Stop {
                    stop_id,
                    route,
                    geometry: point,
                    attributes: properties,
                });
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("dropped {dropped} unusable stop features in {}", path.display());
    }
    Ok(stops)
}

fn stops_from_csv(path: &Path, route_field: &str) -> Result<Vec<Stop>, Error> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut stops = Vec::new();
    let mut dropped = 0usize;
    for (index, record) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        let record = record?;
        let x = record.get("x").and_then(|v| v.parse::<f64>().ok());
        let y = record.get("y").and_then(|v| v.parse::<f64>().ok());
        let route = record.get(route_field).filter(|r| !r.is_empty());

        let (Some(x), Some(y), Some(route)) = (x, y, route) else {
            dropped += 1;
            continue;
        };
        if !(x.is_finite() && y.is_finite()) {
            dropped += 1;
            continue;
        }

        let stop_id = record
            .get("stop_id")
            .filter(|id| !id.is_empty())
            .cloned()
            .unwrap_or_else(|| index.to_string());
        let attributes: Map<String, Value> = record
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();

        stops.push(Stop {
            stop_id,
            route: route.clone(),
            geometry: Point::new(x, y),
            attributes,
        });
    }

    if dropped > 0 {
        warn!("dropped {dropped} unusable stop rows in {}", path.display());
    }
    Ok(stops)
}

fn read_feature_collection(
    path: &Path,
    expected_crs: Option<&str>,
) -> Result<FeatureCollection, Error> {
    let text = fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;
    check_crs(&collection, expected_crs)?;
    Ok(collection)
}

/// Compares a legacy `crs` member, when present, against the
/// configured CRS identity. All inputs must share one planar CRS; a
/// mismatch is fatal to the run.
fn check_crs(collection: &FeatureCollection, expected: Option<&str>) -> Result<(), Error> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let declared = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|properties| properties.get("name"))
        .and_then(Value::as_str);

    match declared {
        Some(found) if !found.eq_ignore_ascii_case(expected) => Err(Error::CrsMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}

fn property_as_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_network_lines_and_flattens_multilines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "net.geojson",
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[0,0],[100,0]]}},
                {"type":"Feature","properties":{},"geometry":{"type":"MultiLineString","coordinates":[[[0,0],[0,100]],[[5,5],[5,50]]]}}
            ]}"#,
        );
        let lines = load_network(&path, None).unwrap();
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn crs_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "net.geojson",
            r#"{"type":"FeatureCollection",
                "crs":{"type":"name","properties":{"name":"EPSG:4326"}},
                "features":[]}"#,
        );
        let result = load_network(&path, Some("EPSG:2913"));
        assert!(matches!(result, Err(Error::CrsMismatch { .. })));
    }

    #[test]
    fn matching_crs_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "net.geojson",
            r#"{"type":"FeatureCollection",
                "crs":{"type":"name","properties":{"name":"EPSG:2913"}},
                "features":[]}"#,
        );
        assert!(load_network(&path, Some("EPSG:2913")).unwrap().is_empty());
    }

    #[test]
    fn reads_stops_with_route_keys_and_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "stops.geojson",
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"rte":"10","stop_id":"s1","zone":"A"},"geometry":{"type":"Point","coordinates":[10,20]}},
                {"type":"Feature","properties":{"rte":9},"geometry":{"type":"Point","coordinates":[30,40]}},
                {"type":"Feature","properties":{"name":"no route"},"geometry":{"type":"Point","coordinates":[50,60]}}
            ]}"#,
        );
        let stops = load_stops(&path, "rte", None).unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].route, "10");
        assert_eq!(stops[0].attributes["zone"], "A");
        // numeric route keys stringify
        assert_eq!(stops[1].route, "9");
    }

    #[test]
    fn reads_stops_from_csv_with_passthrough_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "stops.csv",
            "stop_id,rte,x,y,shelter\ns1,10,0.0,5.0,yes\ns2,10,bad,5.0,no\ns3,20,100.0,5.0,\n",
        );
        let stops = load_stops(&path, "rte", None).unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].stop_id, "s1");
        assert_eq!(stops[0].attributes["shelter"], "yes");
        assert_eq!(stops[1].route, "20");
    }
}
