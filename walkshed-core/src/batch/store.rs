//! GeoJSON-backed result store for intermediate and final artifacts

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, GeoJson};
use log::warn;

use crate::Error;

/// Directory-backed sink for walkshed artifacts. Collections are
/// written atomically (write-then-rename) so a failed run never leaves
/// a truncated artifact behind, re-readable for the merge step, and
/// removable once superseded.
pub struct GeoJsonStore {
    dir: PathBuf,
}

impl GeoJsonStore {
    pub fn create(dir: &Path) -> Result<Self, Error> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Writes a named collection, retrying once on failure before
    /// surfacing a storage error.
    pub fn write(&self, name: &str, features: Vec<Feature>) -> Result<(), Error> {
        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };
        let body = GeoJson::from(collection).to_string();

        if let Err(first) = self.write_atomic(name, &body) {
            warn!("write of {name} failed ({first}), retrying once");
            self.write_atomic(name, &body)
                .map_err(|err| Error::Storage(format!("{name}: {err}")))?;
        }
        Ok(())
    }

    fn write_atomic(&self, name: &str, body: &str) -> Result<(), std::io::Error> {
        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, self.dir.join(name))
    }

    pub fn read(&self, name: &str) -> Result<Vec<Feature>, Error> {
        let text = fs::read_to_string(self.path(name))?;
        let geojson: GeoJson = text.parse()?;
        Ok(FeatureCollection::try_from(geojson)?.features)
    }

    pub fn remove(&self, name: &str) -> Result<(), Error> {
        fs::remove_file(self.path(name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::JsonObject;

    fn feature(route: &str) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("rte".to_string(), route.into());
        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point {
                coordinates: vec![1.0, 2.0].into(),
            })),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[test]
    fn write_read_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = GeoJsonStore::create(dir.path()).unwrap();

        store
            .write("batch_0.geojson", vec![feature("10"), feature("20")])
            .unwrap();
        let features = store.read("batch_0.geojson").unwrap();
        assert_eq!(features.len(), 2);

        store.remove("batch_0.geojson").unwrap();
        assert!(store.read("batch_0.geojson").is_err());
    }

    #[test]
    fn no_temp_files_remain_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = GeoJsonStore::create(dir.path()).unwrap();
        store.write("out.geojson", vec![feature("10")]).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "tmp")
            })
            .collect();
        assert!(leftovers.is_empty());
    }
}
