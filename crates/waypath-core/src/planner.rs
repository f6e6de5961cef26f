//! Route planning entry points.
//!
//! A geographic plan runs: bbox of obstacles, markers and endpoints, padding,
//! rasterization, snapping, one A* search, and path reconstruction.

use crate::config::PlannerConfig;
use crate::error::{Result, RouteError};
use crate::models::{BoundingBox, Coordinate, ObstacleInput, ObstacleSet};
use crate::path::{reconstruct, RoutePath};
use crate::raster::{rasterize, CellCoord, RasterGrid};
use crate::search::AStar;
use crate::snap::snap_many;
use crate::transform::pad_bbox;
use serde::{Deserialize, Serialize};

/// Span in degrees given to a planning area that would otherwise be a point.
const MIN_AREA_SPAN_DEG: f64 = 1e-3;

/// A planning request as read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default)]
    pub obstacles: Vec<ObstacleInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PlannerConfig>,
}

impl PlanRequest {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| RouteError::invalid_input(format!("malformed plan request: {err}")))
    }
}

/// A route together with the grid it was searched on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub path: RoutePath,
    pub rows: usize,
    pub cols: usize,
    pub start_cell: CellCoord,
    pub end_cell: CellCoord,
    pub expansions: usize,
    #[serde(skip)]
    pub raster: RasterGrid,
}

impl PlanReport {
    /// Text map of the grid with the path overlaid.
    pub fn render(&self) -> String {
        self.raster.grid.render(&self.path.cells)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan a request, using its own config when it carries one.
    pub fn from_request(request: &PlanRequest) -> Result<PlanReport> {
        let planner = Self::new(request.config.clone().unwrap_or_default())?;
        planner.plan(request.start, request.end, &request.obstacles)
    }

    /// Shortest path from `start` to `end` around `obstacles`.
    pub fn shortest_path(
        &self,
        start: Coordinate,
        end: Coordinate,
        obstacles: &[ObstacleInput],
    ) -> Result<RoutePath> {
        Ok(self.plan(start, end, obstacles)?.path)
    }

    /// Like [`Planner::shortest_path`], keeping the grid and search statistics.
    pub fn plan(
        &self,
        start: Coordinate,
        end: Coordinate,
        obstacles: &[ObstacleInput],
    ) -> Result<PlanReport> {
        for (label, point) in [("start", start), ("end", end)] {
            if !point.is_finite() {
                return Err(RouteError::invalid_input(format!(
                    "{label} coordinate is not finite: {point:?}"
                )));
            }
        }

        let set = ObstacleSet::normalize(obstacles)?;
        let area = planning_area(&set, start, end);
        let padded = pad_bbox(&area, self.config.bbox_padding_factor)?;
        tracing::debug!(
            polygons = set.polygons.len(),
            markers = set.markers.len(),
            west = padded.west,
            south = padded.south,
            east = padded.east,
            north = padded.north,
            "padded planning area"
        );

        let raster = rasterize(&set.polygons, &padded, &self.config)?;
        let snapped = snap_many(&[start, end], &raster)?;
        let [start_cell, end_cell] = snapped[..] else {
            return Err(RouteError::NoFreeCell);
        };

        let outcome = AStar::new(&self.config).search(&raster.grid, start_cell, end_cell)?;
        let path = reconstruct(&outcome, &raster.table, start, end)?;

        tracing::info!(
            cost = path.cost,
            cells = path.cells.len(),
            length_m = path.length_m(),
            expansions = outcome.expansions(),
            "route planned"
        );

        Ok(PlanReport {
            rows: raster.grid.rows(),
            cols: raster.grid.cols(),
            start_cell,
            end_cell,
            expansions: outcome.expansions(),
            path,
            raster,
        })
    }

    /// Search a planar grid between two planar points.
    ///
    /// Points map to `col = floor(x / unit)` and `row = floor((height - y) / unit)`,
    /// clamped into the grid, so a point on a cell's sample lands on that cell.
    pub fn plan_planar(
        &self,
        raster: &RasterGrid,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RoutePath> {
        let start_cell = planar_cell(raster, start)?;
        let end_cell = planar_cell(raster, end)?;
        let outcome = AStar::new(&self.config).search(&raster.grid, start_cell, end_cell)?;
        tracing::debug!(
            cost = outcome.cost(),
            expansions = outcome.expansions(),
            "planar route planned"
        );
        reconstruct(&outcome, &raster.table, start, end)
    }
}

/// Extent of every obstacle, marker and endpoint. A zero-width or zero-height
/// extent borrows the other axis' span so the grid keeps both dimensions.
fn planning_area(set: &ObstacleSet, start: Coordinate, end: Coordinate) -> BoundingBox {
    let mut area = BoundingBox::from_point(start);
    area.include(end);
    if let Some(obstacles) = set.bbox() {
        area.union(&obstacles);
    }

    let (width, height) = (area.width_deg(), area.height_deg());
    let span = width.max(height).max(MIN_AREA_SPAN_DEG);
    if width <= 0.0 {
        area.west -= span / 2.0;
        area.east += span / 2.0;
    }
    if height <= 0.0 {
        area.south -= span / 2.0;
        area.north += span / 2.0;
    }
    area
}

fn planar_cell(raster: &RasterGrid, point: Coordinate) -> Result<CellCoord> {
    if !point.is_finite() {
        return Err(RouteError::invalid_input(format!(
            "planar point is not finite: {point:?}"
        )));
    }
    let unit = raster.cell_width;
    let rows = raster.grid.rows() as f64;
    let cols = raster.grid.cols() as f64;
    let height = rows * unit;
    let col = (point.lon / unit).floor().clamp(0.0, cols - 1.0);
    let row = ((height - point.lat) / unit).floor().clamp(0.0, rows - 1.0);
    Ok(CellCoord::new(row as usize, col as usize))
}
