//! Point-in-polygon classification by even-odd ray casting.

use crate::error::{Result, RouteError};
use crate::models::{trim_closure, Coordinate, Polygon};

/// Check if `point` lies inside a single ring.
///
/// A point exactly on an edge returns `!ignore_boundary`. The closing vertex
/// is trimmed before testing; fewer than three remaining vertices is an error.
pub fn point_in_ring(
    point: Coordinate,
    ring: &[Coordinate],
    ignore_boundary: bool,
) -> Result<bool> {
    let ring = trim_closure(ring);
    if ring.len() < 3 {
        return Err(RouteError::degenerate(format!(
            "ring has {} vertices after closure trim",
            ring.len()
        )));
    }

    let (px, py) = (point.lon, point.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].lon, ring[i].lat);
        let (xj, yj) = (ring[j].lon, ring[j].lat);
        j = i;

        let collinear = py * (xi - xj) + yi * (xj - px) + yj * (px - xi) == 0.0;
        let on_boundary =
            collinear && (xi - px) * (xj - px) <= 0.0 && (yi - py) * (yj - py) <= 0.0;
        if on_boundary {
            return Ok(!ignore_boundary);
        }

        // Horizontal ray towards +lon: count edges straddling the point's latitude.
        let crosses = ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi);
        if crosses {
            inside = !inside;
        }
    }
    Ok(inside)
}

/// Check if `point` is inside `polygon`, honouring holes.
///
/// Points on a hole's boundary still count as inside the polygon.
pub fn point_in_polygon(
    point: Coordinate,
    polygon: &Polygon,
    ignore_boundary: bool,
) -> Result<bool> {
    // Quick elimination if point is not inside bbox
    if let Some(bbox) = polygon.bbox {
        if !bbox.contains(point) {
            return Ok(false);
        }
    }

    if !point_in_ring(point, &polygon.exterior, ignore_boundary)? {
        return Ok(false);
    }
    for hole in &polygon.holes {
        if point_in_ring(point, hole, true)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True if `point` is inside at least one polygon (boundary inclusive).
pub fn point_in_any(point: Coordinate, polygons: &[Polygon]) -> Result<bool> {
    for polygon in polygons {
        if point_in_polygon(point, polygon, false)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<Coordinate> {
        vec![
            Coordinate::new(min, min),
            Coordinate::new(max, min),
            Coordinate::new(max, max),
            Coordinate::new(min, max),
            Coordinate::new(min, min),
        ]
    }

    #[test]
    fn inside_and_outside_square() {
        let poly = Polygon::new(square(0.0, 10.0));
        assert!(point_in_polygon(Coordinate::new(5.0, 5.0), &poly, false).unwrap());
        assert!(!point_in_polygon(Coordinate::new(15.0, 5.0), &poly, false).unwrap());
        assert!(!point_in_polygon(Coordinate::new(-0.1, 5.0), &poly, false).unwrap());
    }

    #[test]
    fn boundary_counts_unless_ignored() {
        let poly = Polygon::new(square(0.0, 10.0));
        let edge = Coordinate::new(10.0, 4.0);
        let corner = Coordinate::new(0.0, 0.0);
        assert!(point_in_polygon(edge, &poly, false).unwrap());
        assert!(point_in_polygon(corner, &poly, false).unwrap());
        assert!(!point_in_polygon(edge, &poly, true).unwrap());
    }

    #[test]
    fn hole_excludes_interior_but_not_its_boundary() {
        let poly = Polygon::new(square(0.0, 10.0)).with_hole(square(4.0, 6.0));
        assert!(!point_in_polygon(Coordinate::new(5.0, 5.0), &poly, false).unwrap());
        assert!(point_in_polygon(Coordinate::new(4.0, 5.0), &poly, false).unwrap());
        assert!(point_in_polygon(Coordinate::new(2.0, 2.0), &poly, false).unwrap());
    }

    #[test]
    fn concave_ring() {
        // U shape opening north.
        let ring = Polygon::from_lon_lat(&[
            [0.0, 0.0],
            [6.0, 0.0],
            [6.0, 6.0],
            [4.0, 6.0],
            [4.0, 2.0],
            [2.0, 2.0],
            [2.0, 6.0],
            [0.0, 6.0],
            [0.0, 0.0],
        ]);
        assert!(point_in_polygon(Coordinate::new(1.0, 5.0), &ring, false).unwrap());
        assert!(!point_in_polygon(Coordinate::new(3.0, 5.0), &ring, false).unwrap());
        assert!(point_in_polygon(Coordinate::new(3.0, 1.0), &ring, false).unwrap());
    }

    #[test]
    fn bbox_rejects_early() {
        let poly = Polygon::new(square(0.0, 10.0)).with_bbox();
        assert!(poly.bbox.is_some());
        assert!(!point_in_polygon(Coordinate::new(20.0, 20.0), &poly, false).unwrap());
    }

    #[test]
    fn degenerate_ring_is_an_error() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let err = point_in_ring(Coordinate::new(0.5, 0.5), &ring, false).unwrap_err();
        assert!(matches!(err, RouteError::DegenerateGeometry(_)));
    }

    #[test]
    fn any_of_several_polygons_blocks() {
        let polys = vec![
            Polygon::new(square(0.0, 1.0)),
            Polygon::new(square(5.0, 6.0)),
        ];
        assert!(point_in_any(Coordinate::new(5.5, 5.5), &polys).unwrap());
        assert!(!point_in_any(Coordinate::new(3.0, 3.0), &polys).unwrap());
        assert!(!point_in_any(Coordinate::new(3.0, 3.0), &[]).unwrap());
    }
}
