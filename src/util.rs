mod geometry;
mod io;

pub use geometry::{geo_to_shp, polygonal_area, shp_to_geo};
pub use io::{read_polygon_layer, write_polygon_layer, PolygonLayer};
