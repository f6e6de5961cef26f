//! Geometry model shared by the rasterizer, snapper and planner.

use crate::error::{Result, RouteError};
use serde::{Deserialize, Serialize};

// ========== COORDINATES ==========

/// A geographic position in decimal degrees.
///
/// Serialized as a `[lon, lat]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lon, value.lat]
    }
}

/// Axis-aligned extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Box around a single point (zero area).
    pub const fn from_point(point: Coordinate) -> Self {
        Self::new(point.lon, point.lat, point.lon, point.lat)
    }

    pub fn width_deg(&self) -> f64 {
        self.east - self.west
    }

    pub fn height_deg(&self) -> f64 {
        self.north - self.south
    }

    /// Grow the box so that it covers `point`.
    pub fn include(&mut self, point: Coordinate) {
        self.west = self.west.min(point.lon);
        self.south = self.south.min(point.lat);
        self.east = self.east.max(point.lon);
        self.north = self.north.max(point.lat);
    }

    /// Grow the box so that it covers `other`.
    pub fn union(&mut self, other: &BoundingBox) {
        self.include(Coordinate::new(other.west, other.south));
        self.include(Coordinate::new(other.east, other.north));
    }

    /// Inclusive containment test, edges count as inside.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.west <= point.lon
            && self.south <= point.lat
            && self.east >= point.lon
            && self.north >= point.lat
    }

    /// West < east and south < north, all values finite.
    pub fn has_area(&self) -> bool {
        self.west.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.north.is_finite()
            && self.west < self.east
            && self.south < self.north
    }
}

// ========== POLYGONS ==========

/// A polygon with one outer ring and optional holes.
///
/// Every ring is closed: its first vertex equals its last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Coordinate>>,
    /// Optional precomputed extent used for quick rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Polygon {
    pub fn new(exterior: Vec<Coordinate>) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
            bbox: None,
        }
    }

    /// Build a polygon from `[lon, lat]` pairs.
    pub fn from_lon_lat(exterior: &[[f64; 2]]) -> Self {
        Self::new(exterior.iter().copied().map(Coordinate::from).collect())
    }

    pub fn with_hole(mut self, hole: Vec<Coordinate>) -> Self {
        self.holes.push(hole);
        self
    }

    /// Compute and attach the bounding box of the outer ring.
    pub fn with_bbox(mut self) -> Self {
        self.bbox = crate::spatial::bbox(&self.exterior);
        self
    }

    /// Outer ring first, then the holes.
    pub fn rings(&self) -> impl Iterator<Item = &[Coordinate]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Check polygon configuration.
    pub fn validate(&self) -> Result<()> {
        for (idx, ring) in self.rings().enumerate() {
            validate_ring(ring).map_err(|err| match err {
                RouteError::InvalidInput(msg) => {
                    RouteError::InvalidInput(format!("ring {idx}: {msg}"))
                }
                RouteError::DegenerateGeometry(msg) => {
                    RouteError::DegenerateGeometry(format!("ring {idx}: {msg}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Check if a point is inside this polygon (boundary counts as inside).
    pub fn contains(&self, point: Coordinate) -> Result<bool> {
        crate::containment::point_in_polygon(point, self, false)
    }
}

/// Validate a single closed ring.
pub fn validate_ring(ring: &[Coordinate]) -> Result<()> {
    let (Some(first), Some(last)) = (ring.first(), ring.last()) else {
        return Err(RouteError::invalid_input("ring is empty"));
    };
    if let Some(bad) = ring.iter().find(|c| !c.is_finite()) {
        return Err(RouteError::invalid_input(format!(
            "non-finite vertex ({}, {})",
            bad.lon, bad.lat
        )));
    }
    if first != last {
        return Err(RouteError::invalid_input(
            "ring must be closed (first vertex must equal last)",
        ));
    }

    let distinct = distinct_vertices(trim_closure(ring));
    if distinct < 3 {
        return Err(RouteError::degenerate(format!(
            "ring has {distinct} distinct vertices, need at least 3"
        )));
    }
    Ok(())
}

/// Drop the closing vertex of a ring when it repeats the first one.
pub fn trim_closure(ring: &[Coordinate]) -> &[Coordinate] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn distinct_vertices(ring: &[Coordinate]) -> usize {
    let mut keys: Vec<(u64, u64)> = ring
        .iter()
        .map(|c| (c.lon.to_bits(), c.lat.to_bits()))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

// ========== OBSTACLE INPUT ==========

/// A named point such as an entrance or exit. Widens the planning area but never blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub point: Coordinate,
}

/// Obstacle geometry as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObstacleInput {
    /// Any number of blocking polygons.
    PolygonCollection { polygons: Vec<Polygon> },
    /// One blocking polygon.
    SinglePolygon(Polygon),
    /// A non-blocking marker.
    PointMarker(NamedPoint),
}

/// Obstacle geometry after normalization: validated polygons with attached
/// bounding boxes, plus the markers that only shape the planning area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSet {
    pub polygons: Vec<Polygon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<NamedPoint>,
}

impl ObstacleSet {
    /// Resolve every input variant once, validating polygons on the way.
    pub fn normalize(inputs: &[ObstacleInput]) -> Result<Self> {
        let mut set = Self::default();
        for input in inputs {
            match input {
                ObstacleInput::PolygonCollection { polygons } => {
                    for polygon in polygons {
                        set.push_polygon(polygon.clone())?;
                    }
                }
                ObstacleInput::SinglePolygon(polygon) => set.push_polygon(polygon.clone())?,
                ObstacleInput::PointMarker(marker) => {
                    if !marker.point.is_finite() {
                        return Err(RouteError::invalid_input("point marker is not finite"));
                    }
                    set.markers.push(marker.clone());
                }
            }
        }
        Ok(set)
    }

    pub fn from_polygons(polygons: Vec<Polygon>) -> Result<Self> {
        let mut set = Self::default();
        for polygon in polygons {
            set.push_polygon(polygon)?;
        }
        Ok(set)
    }

    fn push_polygon(&mut self, polygon: Polygon) -> Result<()> {
        polygon.validate()?;
        let polygon = if polygon.bbox.is_some() {
            polygon
        } else {
            polygon.with_bbox()
        };
        self.polygons.push(polygon);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Extent of all polygons and markers, or `None` when there is no geometry.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let points = self
            .polygons
            .iter()
            .flat_map(|p| p.exterior.iter().copied())
            .chain(self.markers.iter().map(|m| m.point));
        let mut bbox: Option<BoundingBox> = None;
        for point in points {
            match bbox.as_mut() {
                Some(existing) => existing.include(point),
                None => bbox = Some(BoundingBox::from_point(point)),
            }
        }
        bbox
    }
}
