use crate::util::geometry::{geo_to_shp, shp_to_geo};
use anyhow::{bail, ensure, Context, Result};
use geo_types::MultiPolygon;
use shapefile::dbase::{Record, TableInfo};
use shapefile::{Reader, Shape, Writer};
use std::path::Path;

/// A polygon layer pulled off disk: geometries and attribute records in
/// file order, plus the table schema for writing compatible output.
pub struct PolygonLayer {
    pub shapes: Vec<MultiPolygon<f64>>,
    pub records: Vec<Record>,
    pub table_info: TableInfo,
}

pub fn read_polygon_layer(path: &Path) -> Result<PolygonLayer> {
    ensure!(
        path.exists(),
        "The provided path {:?} does not exist",
        path
    );
    let mut reader =
        Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut shapes = Vec::new();
    let mut records = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Failed to read a feature record")?;
        shapes.push(match shape {
            Shape::Polygon(polygon) => shp_to_geo(&polygon),
            // Null shapes keep their slot so ids stay aligned with the
            // records; the sanitizer drops them.
            Shape::NullShape => MultiPolygon(Vec::new()),
            other => bail!("Layer contains a non-polygon shape: {}", other.shapetype()),
        });
        records.push(record);
    }
    let table_info = reader.into_table_info();

    Ok(PolygonLayer {
        shapes,
        records,
        table_info,
    })
}

/// Write features to a new shapefile carrying the source table schema.
pub fn write_polygon_layer<'a>(
    out_path: &Path,
    table_info: TableInfo,
    features: impl IntoIterator<Item = (&'a MultiPolygon<f64>, Record)>,
) -> Result<()> {
    let mut writer = Writer::from_path_with_info(out_path, table_info)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    for (geometry, record) in features {
        let shape = geo_to_shp(geometry);
        writer
            .write_shape_and_record(&shape, &record)
            .with_context(|| format!("Failed to write a feature to {}", out_path.display()))?;
    }
    Ok(())
}
