use geo::{Area, GeoFloat};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{Point, PolygonRing};

/// Total area of every polygonal part of a boolean-operation result.
pub fn polygonal_area<T: GeoFloat>(parts: &MultiPolygon<T>) -> T {
    parts
        .iter()
        .fold(T::zero(), |total, part| total + part.unsigned_area())
}

/// Convert a shapefile polygon into a [MultiPolygon].
///
/// Shapefiles store one flat ring list per shape, every outer ring followed
/// by the holes it owns; regroup that list into polygons.
pub fn shp_to_geo(polygon: &shapefile::Polygon) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();
    for ring in polygon.rings() {
        let line = ring_to_linestring(ring.points());
        match ring {
            PolygonRing::Outer(_) => {
                if let Some(exterior) = exterior.take() {
                    polygons.push(Polygon::new(exterior, std::mem::take(&mut holes)));
                }
                exterior = Some(line);
            }
            PolygonRing::Inner(_) => holes.push(line),
        }
    }
    if let Some(exterior) = exterior {
        polygons.push(Polygon::new(exterior, holes));
    }
    MultiPolygon(polygons)
}

/// Convert a [MultiPolygon] back into a shapefile polygon. Ring winding is
/// the writer's concern; the constructor reorders points as needed.
pub fn geo_to_shp(multi_polygon: &MultiPolygon<f64>) -> shapefile::Polygon {
    let mut rings = Vec::new();
    for polygon in &multi_polygon.0 {
        rings.push(PolygonRing::Outer(linestring_to_points(polygon.exterior())));
        for hole in polygon.interiors() {
            rings.push(PolygonRing::Inner(linestring_to_points(hole)));
        }
    }
    shapefile::Polygon::with_rings(rings)
}

fn ring_to_linestring(points: &[Point]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = points
        .iter()
        .map(|point| Coord {
            x: point.x,
            y: point.y,
        })
        .collect();
    // geo expects rings to close on themselves.
    if !coords.is_empty() && coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    LineString(coords)
}

fn linestring_to_points(line: &LineString<f64>) -> Vec<Point> {
    line.coords()
        .map(|coord| Point {
            x: coord.x,
            y: coord.y,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn ring(points: &[(f64, f64)]) -> Vec<Point> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn groups_holes_under_their_outer_ring() {
        let shape = shapefile::Polygon::with_rings(vec![
            PolygonRing::Outer(ring(&[(0., 0.), (4., 0.), (4., 4.), (0., 4.), (0., 0.)])),
            PolygonRing::Inner(ring(&[(1., 1.), (1., 2.), (2., 2.), (2., 1.), (1., 1.)])),
            PolygonRing::Outer(ring(&[(10., 10.), (11., 10.), (11., 11.), (10., 11.), (10., 10.)])),
        ]);
        let converted = shp_to_geo(&shape);
        assert_eq!(converted.0.len(), 2);
        assert_eq!(converted.0[0].interiors().len(), 1);
        assert_eq!(converted.0[1].interiors().len(), 0);
        // 16 minus the unit hole, plus the far unit square.
        assert_eq!(converted.unsigned_area(), 16.0);
    }

    #[test]
    fn round_trip_keeps_every_ring() {
        let multi_polygon = MultiPolygon::new(vec![
            polygon![
                exterior: [
                    (x: 0., y: 0.),
                    (x: 4., y: 0.),
                    (x: 4., y: 4.),
                    (x: 0., y: 4.),
                    (x: 0., y: 0.),
                ],
                interiors: [
                    [
                        (x: 1., y: 1.),
                        (x: 2., y: 1.),
                        (x: 2., y: 2.),
                        (x: 1., y: 2.),
                        (x: 1., y: 1.),
                    ],
                ],
            ],
            polygon![
                (x: 10., y: 10.),
                (x: 11., y: 10.),
                (x: 11., y: 11.),
                (x: 10., y: 11.),
                (x: 10., y: 10.),
            ],
        ]);
        let round_tripped = shp_to_geo(&geo_to_shp(&multi_polygon));
        assert_eq!(round_tripped.0.len(), 2);
        assert_eq!(round_tripped.0[0].interiors().len(), 1);
        assert_eq!(round_tripped.unsigned_area(), multi_polygon.unsigned_area());
    }

    #[test]
    fn sums_area_across_parts() {
        let parts = MultiPolygon::new(vec![
            polygon![
                (x: 0., y: 0.),
                (x: 1., y: 0.),
                (x: 1., y: 1.),
                (x: 0., y: 1.),
                (x: 0., y: 0.),
            ],
            polygon![
                (x: 2., y: 0.),
                (x: 3., y: 0.),
                (x: 3., y: 1.),
                (x: 2., y: 1.),
                (x: 2., y: 0.),
            ],
        ]);
        assert_eq!(polygonal_area(&parts), 2.0);
    }

    #[test]
    fn empty_result_has_zero_area() {
        assert_eq!(polygonal_area(&MultiPolygon::<f64>::new(Vec::new())), 0.0);
    }
}
