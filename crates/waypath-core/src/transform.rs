//! Scaling of polygons about their bounding-box center along rhumb lines.

use crate::error::{Result, RouteError};
use crate::models::{BoundingBox, Coordinate, Polygon};
use crate::spatial::{
    bbox_of_polygon, bbox_polygon, center, rhumb_bearing, rhumb_destination, rhumb_distance,
};

/// Scale every ring of `polygon` by `factor` about the center of its extent.
///
/// Each vertex keeps its rhumb bearing from the center while its rhumb
/// distance is multiplied by `factor`. A negative factor mirrors the polygon
/// through the center.
pub fn expand(polygon: &Polygon, factor: f64) -> Result<Polygon> {
    if !factor.is_finite() || factor == 0.0 {
        return Err(RouteError::invalid_input(format!(
            "invalid scale factor {factor}"
        )));
    }
    let Some(extent) = bbox_of_polygon(polygon) else {
        return Err(RouteError::invalid_input("polygon has no vertices"));
    };

    // Shortcut no-scaling
    let is_point = extent.west == extent.east && extent.south == extent.north;
    if factor == 1.0 || is_point {
        return Ok(polygon.clone());
    }

    let origin = center(&extent);
    let scale_ring = |ring: &[Coordinate]| -> Vec<Coordinate> {
        ring.iter()
            .map(|&vertex| scale_vertex(origin, vertex, factor))
            .collect()
    };

    let mut scaled = Polygon {
        exterior: scale_ring(&polygon.exterior),
        holes: polygon.holes.iter().map(|hole| scale_ring(hole)).collect(),
        bbox: None,
    };
    if polygon.bbox.is_some() {
        scaled = scaled.with_bbox();
    }
    Ok(scaled)
}

fn scale_vertex(origin: Coordinate, vertex: Coordinate, factor: f64) -> Coordinate {
    let distance = rhumb_distance(origin, vertex);
    let bearing = rhumb_bearing(origin, vertex, false);
    rhumb_destination(origin, distance * factor, bearing)
}

/// Pad a bounding box by scaling its polygon and re-measuring the extent.
pub fn pad_bbox(bbox: &BoundingBox, factor: f64) -> Result<BoundingBox> {
    let scaled = expand(&bbox_polygon(bbox), factor)?;
    bbox_of_polygon(&scaled).ok_or_else(|| RouteError::invalid_input("scaled bbox is empty"))
}
