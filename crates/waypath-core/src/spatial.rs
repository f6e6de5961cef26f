//! Spherical-earth measurement: rhumb lines, great-circle distance and extents.
//!
//! All rhumb formulas share the same Mercator stretch factor and the same
//! ill-conditioning guard, so that `rhumb_destination(p, rhumb_distance(p, q),
//! rhumb_bearing(p, q, false))` lands back on `q`.

use crate::models::{BoundingBox, Coordinate, Polygon};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Below this |Δψ| the course is treated as east-west and q falls back to cos φ₁.
const PSI_EPSILON: f64 = 1e-11;

/// Calculate distance between two points in meters using Haversine formula.
///
/// This is the great-circle distance, used for grid resolution and snapping.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Isometric latitude difference Δψ between two latitudes (radians).
fn mercator_delta_psi(phi1: f64, phi2: f64) -> f64 {
    ((phi2 / 2.0 + FRAC_PI_4).tan() / (phi1 / 2.0 + FRAC_PI_4).tan()).ln()
}

/// Mercator stretch factor q = Δφ/Δψ, or cos φ₁ on an east-west course (0/0).
fn stretch_factor(delta_phi: f64, delta_psi: f64, phi1: f64) -> f64 {
    if delta_psi.abs() > PSI_EPSILON {
        delta_phi / delta_psi
    } else {
        phi1.cos()
    }
}

/// Distance in meters along the rhumb line from `from` to `to`.
///
/// When the longitudes are more than 180° apart the shorter line across the
/// antimeridian is taken.
pub fn rhumb_distance(from: Coordinate, to: Coordinate) -> f64 {
    let mut to_lon = to.lon;
    if to_lon - from.lon > 180.0 {
        to_lon -= 360.0;
    } else if from.lon - to_lon > 180.0 {
        to_lon += 360.0;
    }

    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_phi = phi2 - phi1;
    let mut delta_lambda = (to_lon - from.lon).abs().to_radians();
    if delta_lambda > PI {
        delta_lambda -= 2.0 * PI;
    }

    let delta_psi = mercator_delta_psi(phi1, phi2);
    let q = stretch_factor(delta_phi, delta_psi, phi1);

    // Pythagoras on the stretched Mercator projection.
    let delta = (delta_phi * delta_phi + q * q * delta_lambda * delta_lambda).sqrt();
    delta * EARTH_RADIUS_M
}

/// Constant bearing from `start` to `end` in degrees, within (-180, 180].
///
/// With `final_bearing` set the endpoints are swapped, giving the bearing of
/// the reverse course.
pub fn rhumb_bearing(start: Coordinate, end: Coordinate, final_bearing: bool) -> f64 {
    let bear360 = if final_bearing {
        bearing_360(end, start)
    } else {
        bearing_360(start, end)
    };
    if bear360 > 180.0 {
        -(360.0 - bear360)
    } else {
        bear360
    }
}

fn bearing_360(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let mut delta_lambda = (to.lon - from.lon).to_radians();
    if delta_lambda > PI {
        delta_lambda -= 2.0 * PI;
    }
    if delta_lambda < -PI {
        delta_lambda += 2.0 * PI;
    }

    let delta_psi = mercator_delta_psi(phi1, phi2);
    let theta = delta_lambda.atan2(delta_psi);
    (theta.to_degrees() + 360.0) % 360.0
}

/// Point reached after travelling `distance_m` along a rhumb line with
/// constant `bearing_deg` from `origin`.
///
/// Negative distances travel the opposite way. Latitude is reflected if the
/// course overshoots a pole. The result longitude stays within 180° of the
/// origin, so it may leave [-180, 180] when the antimeridian is crossed.
pub fn rhumb_destination(origin: Coordinate, distance_m: f64, bearing_deg: f64) -> Coordinate {
    let delta = distance_m / EARTH_RADIUS_M;
    let lambda1 = origin.lon.to_radians();
    let phi1 = origin.lat.to_radians();
    let theta = bearing_deg.to_radians();

    let delta_phi = delta * theta.cos();
    let mut phi2 = phi1 + delta_phi;
    if phi2.abs() > FRAC_PI_2 {
        phi2 = if phi2 > 0.0 { PI - phi2 } else { -PI - phi2 };
    }

    let delta_psi = mercator_delta_psi(phi1, phi2);
    let q = stretch_factor(delta_phi, delta_psi, phi1);

    let delta_lambda = delta * theta.sin() / q;
    let lambda2 = lambda1 + delta_lambda;

    let mut lon = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    if lon - origin.lon > 180.0 {
        lon -= 360.0;
    } else if origin.lon - lon > 180.0 {
        lon += 360.0;
    }
    Coordinate::new(lon, phi2.to_degrees())
}

/// Min/max extent of a set of coordinates.
pub fn bbox(coords: &[Coordinate]) -> Option<BoundingBox> {
    let (first, rest) = coords.split_first()?;
    let mut bbox = BoundingBox::from_point(*first);
    for point in rest {
        bbox.include(*point);
    }
    Some(bbox)
}

/// Extent of every ring of a polygon.
pub fn bbox_of_polygon(polygon: &Polygon) -> Option<BoundingBox> {
    let mut out: Option<BoundingBox> = None;
    for ring in polygon.rings() {
        if let Some(ring_box) = bbox(ring) {
            match out.as_mut() {
                Some(existing) => existing.union(&ring_box),
                None => out = Some(ring_box),
            }
        }
    }
    out
}

/// Midpoint of a bounding box.
pub fn center(bbox: &BoundingBox) -> Coordinate {
    Coordinate::new((bbox.west + bbox.east) / 2.0, (bbox.south + bbox.north) / 2.0)
}

/// Closed counter-clockwise ring covering a bounding box.
pub fn bbox_polygon(bbox: &BoundingBox) -> Polygon {
    let sw = Coordinate::new(bbox.west, bbox.south);
    Polygon::new(vec![
        sw,
        Coordinate::new(bbox.east, bbox.south),
        Coordinate::new(bbox.east, bbox.north),
        Coordinate::new(bbox.west, bbox.north),
        sw,
    ])
}
