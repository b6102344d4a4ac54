use crate::util::{read_polygon_layer, write_polygon_layer};
use anyhow::Result;
use geo::GeoFloat;
use geo_types::MultiPolygon;
use shapefile::dbase::{Record, TableInfo};
use std::path::Path;

pub mod detect;
pub mod index;
pub mod prelude;
pub mod progress;
pub mod sanitize;
pub mod util;

/// Position of a feature in the source layer.
///
/// Identity is positional: two features may carry identical geometry and
/// remain distinct. Ids survive sanitation (dropped features leave gaps), so
/// a flagged id always points back at its original attribute record.
pub type FeatureId = usize;

/// A polygonal feature with its precomputed area.
#[derive(Debug, Clone)]
pub struct Feature<T: GeoFloat = f64> {
    pub id: FeatureId,
    pub geometry: MultiPolygon<T>,
    pub area: T,
}

/// A polygon layer read from disk: geometries plus the opaque attribute
/// records they came with. The records are never interpreted, only carried
/// through to the output layer.
pub struct VectorDataset {
    shapes: Vec<MultiPolygon<f64>>,
    records: Vec<Record>,
    table_info: TableInfo,
}

impl VectorDataset {
    pub fn open(path: &Path) -> Result<Self> {
        let layer = read_polygon_layer(path)?;
        Ok(VectorDataset {
            shapes: layer.shapes,
            records: layer.records,
            table_info: layer.table_info,
        })
    }

    /// The layer's geometries, in record order. Null shapes come out as
    /// empty multipolygons so indices keep lining up with the records.
    pub fn to_geo(&self) -> Vec<MultiPolygon<f64>> {
        self.shapes.clone()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Write the given features to a new layer, each with its original
    /// attribute record and the source table schema.
    pub fn to_file<'a>(
        self,
        features: impl IntoIterator<Item = &'a Feature<f64>>,
        out_path: &Path,
    ) -> Result<()> {
        let VectorDataset {
            records, table_info, ..
        } = self;
        write_polygon_layer(
            out_path,
            table_info,
            features
                .into_iter()
                .map(|feature| (&feature.geometry, records[feature.id].clone())),
        )
    }
}
