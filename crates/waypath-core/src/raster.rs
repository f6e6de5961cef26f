//! Occupancy-grid rasterization of obstacle polygons.
//!
//! Row 0 is the northern edge and rows grow southward; column 0 is the western
//! edge and columns grow eastward. A cell is [`Cell::Blocked`] when its sample
//! point falls inside any obstacle polygon.

use crate::config::PlannerConfig;
use crate::containment::point_in_any;
use crate::error::{Result, RouteError};
use crate::models::{BoundingBox, Coordinate, Polygon};
use crate::spatial::haversine_distance;
use serde::Serialize;
use std::fmt;

/// Slack added before flooring cell counts, so that an exact multiple computed
/// through floating-point ratios does not lose its last row or column.
const COUNT_EPSILON: f64 = 1e-9;

/// Marker written on path cells by [`OccupancyGrid::render`].
pub const PATH_CODE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Free,
    Blocked,
}

impl Cell {
    /// Numeric code: 1 = blocked, 0 = free.
    pub fn code(self) -> u8 {
        match self {
            Cell::Free => 0,
            Cell::Blocked => 1,
        }
    }

    pub fn is_blocked(self) -> bool {
        self == Cell::Blocked
    }
}

/// Row/column address of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance in cells.
    pub fn manhattan(self, other: CellCoord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Chebyshev distance in cells.
    pub fn chebyshev(self, other: CellCoord) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

// ========== OCCUPANCY GRID ==========

/// Row-major rows×cols occupancy array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    /// All-free grid. Zero rows or columns is degenerate.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(RouteError::degenerate(format!(
                "grid has {rows} rows and {cols} columns"
            )));
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::Free; rows * cols],
        })
    }

    /// Build a grid from rows of codes (0 = free, 1 = blocked).
    pub fn from_codes(codes: &[Vec<u8>]) -> Result<Self> {
        let rows = codes.len();
        let cols = codes.first().map(Vec::len).unwrap_or(0);
        let mut grid = Self::new(rows, cols)?;
        for (row, line) in codes.iter().enumerate() {
            if line.len() != cols {
                return Err(RouteError::invalid_input(format!(
                    "row {row} has {} columns, expected {cols}",
                    line.len()
                )));
            }
            for (col, code) in line.iter().enumerate() {
                let cell = match code {
                    0 => Cell::Free,
                    1 => Cell::Blocked,
                    other => {
                        return Err(RouteError::invalid_input(format!(
                            "cell ({row}, {col}) has code {other}, expected 0 or 1"
                        )))
                    }
                };
                grid.cells[row * cols + col] = cell;
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat index of `coord`, or `None` if out of bounds.
    pub fn index(&self, coord: CellCoord) -> Option<usize> {
        (coord.row < self.rows && coord.col < self.cols).then(|| coord.row * self.cols + coord.col)
    }

    /// Cell address of a flat index.
    pub fn coord(&self, index: usize) -> CellCoord {
        CellCoord::new(index / self.cols, index % self.cols)
    }

    pub fn get(&self, coord: CellCoord) -> Option<Cell> {
        self.index(coord).map(|idx| self.cells[idx])
    }

    /// In bounds and not blocked.
    pub fn is_free(&self, coord: CellCoord) -> bool {
        matches!(self.get(coord), Some(Cell::Free))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_blocked()).count()
    }

    fn set(&mut self, coord: CellCoord, cell: Cell) {
        if let Some(idx) = self.index(coord) {
            self.cells[idx] = cell;
        }
    }

    /// Text map of the grid with `path` cells drawn as `2`.
    ///
    /// The grid itself is not modified.
    pub fn render(&self, path: &[CellCoord]) -> String {
        let mut codes: Vec<u8> = self.cells.iter().map(|c| c.code()).collect();
        for cell in path {
            if let Some(idx) = self.index(*cell) {
                codes[idx] = PATH_CODE;
            }
        }
        codes
            .chunks(self.cols)
            .map(|row| {
                row.iter()
                    .map(|code| code.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&[]))
    }
}

// ========== CELL TABLE ==========

/// Sample coordinate of every cell, same shape as the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellTable {
    cols: usize,
    points: Vec<Coordinate>,
}

impl CellTable {
    pub fn get(&self, coord: CellCoord) -> Option<Coordinate> {
        if coord.col >= self.cols {
            return None;
        }
        self.points.get(coord.row * self.cols + coord.col).copied()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }
}

/// An occupancy grid with its coordinate lookup and the geometry it was built from.
///
/// Immutable once built; searches only borrow it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterGrid {
    pub grid: OccupancyGrid,
    pub table: CellTable,
    pub bbox: BoundingBox,
    /// Cell size in degrees (geographic) or planar units.
    pub cell_width: f64,
    pub cell_height: f64,
}

impl RasterGrid {
    /// Wrap an existing grid in planar coordinates with square cells of side
    /// `unit`, sampled at `(col·unit, height − row·unit)`.
    pub fn planar(grid: OccupancyGrid, unit: usize) -> Self {
        let (rows, cols) = (grid.rows(), grid.cols());
        let height = rows * unit;
        let points = (0..rows)
            .flat_map(|row| {
                (0..cols).map(move |col| {
                    Coordinate::new((col * unit) as f64, (height - row * unit) as f64)
                })
            })
            .collect();
        Self {
            grid,
            table: CellTable { cols, points },
            bbox: BoundingBox::new(0.0, 0.0, (cols * unit) as f64, height as f64),
            cell_width: unit as f64,
            cell_height: unit as f64,
        }
    }
}

fn check_budget(rows: usize, cols: usize, max_cells: usize) -> Result<()> {
    let requested = rows.saturating_mul(cols);
    if requested > max_cells {
        tracing::warn!(rows, cols, max_cells, "grid exceeds cell budget");
        return Err(RouteError::ResourceExhausted {
            resource: "grid cells",
            limit: max_cells,
            requested,
        });
    }
    Ok(())
}

fn cell_count(extent: f64, cell: f64, axis: &str) -> Result<usize> {
    let count = (extent / cell + COUNT_EPSILON).floor();
    if !count.is_finite() || count < 1.0 {
        return Err(RouteError::degenerate(format!(
            "grid has zero {axis} (extent {extent}, cell size {cell})"
        )));
    }
    if count > usize::MAX as f64 {
        return Err(RouteError::ResourceExhausted {
            resource: "grid cells",
            limit: usize::MAX,
            requested: usize::MAX,
        });
    }
    Ok(count as usize)
}

/// Rasterize `obstacles` over `bbox` into a grid of nominally
/// `config.resolution_columns` columns.
///
/// The resolution is the great-circle width of the southern edge divided by
/// the column count. Cell sizes in degrees follow from the edge lengths, so
/// cells stay roughly square on the ground. The grid is centered inside the
/// bbox and each cell is classified by its center.
pub fn rasterize(
    obstacles: &[Polygon],
    bbox: &BoundingBox,
    config: &PlannerConfig,
) -> Result<RasterGrid> {
    if !bbox.has_area() {
        return Err(RouteError::degenerate(format!(
            "bounding box has no area: {bbox:?}"
        )));
    }
    if config.resolution_columns == 0 {
        return Err(RouteError::invalid_input("resolution_columns must be > 0"));
    }

    let (west, south, east, north) = (bbox.west, bbox.south, bbox.east, bbox.north);
    let width_m = haversine_distance(Coordinate::new(west, south), Coordinate::new(east, south));
    let height_m = haversine_distance(Coordinate::new(west, south), Coordinate::new(west, north));
    if !(width_m > 0.0 && height_m > 0.0) {
        return Err(RouteError::degenerate(format!(
            "bounding box edge lengths {width_m} m x {height_m} m"
        )));
    }
    let resolution = width_m / config.resolution_columns as f64;

    let width_deg = bbox.width_deg();
    let height_deg = bbox.height_deg();
    let cell_width = resolution / width_m * width_deg;
    let cell_height = resolution / height_m * height_deg;

    let cols = cell_count(width_deg, cell_width, "columns")?;
    let rows = cell_count(height_deg, cell_height, "rows")?;
    check_budget(rows, cols, config.max_grid_cells)?;

    // adjust origin of the grid
    let delta_x = (width_deg - cols as f64 * cell_width) / 2.0;
    let delta_y = (height_deg - rows as f64 * cell_height) / 2.0;

    tracing::debug!(
        rows,
        cols,
        resolution_m = resolution,
        cell_width,
        cell_height,
        "rasterizing obstacle grid"
    );

    let mut grid = OccupancyGrid::new(rows, cols)?;
    let mut points = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let lat = north - delta_y - (row as f64 + 0.5) * cell_height;
        for col in 0..cols {
            let lon = west + delta_x + (col as f64 + 0.5) * cell_width;
            let center = Coordinate::new(lon, lat);
            if point_in_any(center, obstacles)? {
                grid.set(CellCoord::new(row, col), Cell::Blocked);
            }
            points.push(center);
        }
    }

    tracing::debug!(
        blocked = grid.len() - grid.free_count(),
        free = grid.free_count(),
        "grid classified"
    );

    Ok(RasterGrid {
        grid,
        table: CellTable { cols, points },
        bbox: *bbox,
        cell_width,
        cell_height,
    })
}

/// Rasterize obstacles over a planar `width`×`height` area with square cells of
/// side `unit`.
///
/// Sample (row, col) sits at `(col·unit, height − row·unit)`, so row 0 is the
/// top edge. Obstacle coordinates are read as planar x/y.
pub fn rasterize_planar(
    width: usize,
    height: usize,
    unit: usize,
    obstacles: &[Polygon],
    max_grid_cells: usize,
) -> Result<RasterGrid> {
    if unit == 0 {
        return Err(RouteError::invalid_input("unit must be > 0"));
    }
    if width % unit != 0 || height % unit != 0 {
        return Err(RouteError::invalid_input(format!(
            "unit {unit} does not divide a {width}x{height} area"
        )));
    }
    let cols = width / unit;
    let rows = height / unit;
    check_budget(rows, cols, max_grid_cells)?;

    let mut grid = OccupancyGrid::new(rows, cols)?;
    for row in 0..rows {
        let y = (height - row * unit) as f64;
        for col in 0..cols {
            if point_in_any(Coordinate::new((col * unit) as f64, y), obstacles)? {
                grid.set(CellCoord::new(row, col), Cell::Blocked);
            }
        }
    }

    tracing::debug!(rows, cols, unit, "rasterized planar grid");
    Ok(RasterGrid::planar(grid, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlannerConfig {
        PlannerConfig::default()
    }

    #[test]
    fn from_codes_round_trips_through_display() {
        let grid = OccupancyGrid::from_codes(&[vec![0, 0, 0], vec![0, 1, 0]]).unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.to_string(), "0 0 0\n0 1 0");
        assert_eq!(grid.get(CellCoord::new(1, 1)), Some(Cell::Blocked));
        assert!(!grid.is_free(CellCoord::new(1, 1)));
        assert!(!grid.is_free(CellCoord::new(2, 0)));
        assert_eq!(grid.free_count(), 5);
    }

    #[test]
    fn from_codes_rejects_ragged_or_unknown_codes() {
        assert!(matches!(
            OccupancyGrid::from_codes(&[vec![0, 0], vec![0]]),
            Err(RouteError::InvalidInput(_))
        ));
        assert!(matches!(
            OccupancyGrid::from_codes(&[vec![0, 2]]),
            Err(RouteError::InvalidInput(_))
        ));
        assert!(matches!(
            OccupancyGrid::from_codes(&[]),
            Err(RouteError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn render_marks_path_without_mutating() {
        let grid = OccupancyGrid::from_codes(&[vec![0, 1], vec![0, 0]]).unwrap();
        let text = grid.render(&[CellCoord::new(0, 0), CellCoord::new(1, 1)]);
        assert_eq!(text, "2 1\n0 2");
        assert_eq!(grid.to_string(), "0 1\n0 0");
    }

    #[test]
    fn empty_obstacles_give_nominal_column_count() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let raster = rasterize(&[], &bbox, &config()).unwrap();
        assert_eq!(raster.grid.cols(), 100);
        // one degree of latitude is a touch longer than one of longitude at the equator edge
        assert!((99..=101).contains(&raster.grid.rows()), "rows {}", raster.grid.rows());
        assert_eq!(raster.grid.free_count(), raster.grid.len());
    }

    #[test]
    fn cell_centers_run_north_to_south_west_to_east() {
        let bbox = BoundingBox::new(10.0, 40.0, 11.0, 41.0);
        let raster = rasterize(&[], &bbox, &config()).unwrap();
        let first = raster.table.get(CellCoord::new(0, 0)).unwrap();
        let right = raster.table.get(CellCoord::new(0, 1)).unwrap();
        let below = raster.table.get(CellCoord::new(1, 0)).unwrap();
        assert!(right.lon > first.lon);
        assert!(below.lat < first.lat);
        assert!(bbox.contains(first));
        let last = raster
            .table
            .get(CellCoord::new(raster.grid.rows() - 1, raster.grid.cols() - 1))
            .unwrap();
        assert!(bbox.contains(last));
        assert!(raster.table.get(CellCoord::new(0, raster.grid.cols())).is_none());
    }

    #[test]
    fn obstacle_cells_are_blocked() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let obstacle = Polygon::from_lon_lat(&[
            [0.25, 0.25],
            [0.75, 0.25],
            [0.75, 0.75],
            [0.25, 0.75],
            [0.25, 0.25],
        ])
        .with_bbox();
        let raster = rasterize(&[obstacle], &bbox, &config()).unwrap();
        let blocked = raster.grid.len() - raster.grid.free_count();
        // roughly a quarter of the area
        let share = blocked as f64 / raster.grid.len() as f64;
        assert!((0.2..0.3).contains(&share), "share {share}");
        for (idx, cell) in raster.grid.cells().iter().enumerate() {
            let point = raster.table.points()[idx];
            let inside = (0.25..=0.75).contains(&point.lon) && (0.25..=0.75).contains(&point.lat);
            assert_eq!(cell.is_blocked(), inside, "cell {idx} at {point:?}");
        }
    }

    #[test]
    fn rasterization_is_idempotent() {
        let bbox = BoundingBox::new(-6.0, -7.3, 10.0, -2.7);
        let obstacle = Polygon::from_lon_lat(&[
            [0.0, -5.0],
            [5.0, -5.0],
            [5.0, -3.0],
            [0.0, -3.0],
            [0.0, -5.0],
        ]);
        let a = rasterize(std::slice::from_ref(&obstacle), &bbox, &config()).unwrap();
        let b = rasterize(&[obstacle], &bbox, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn flat_bbox_is_degenerate() {
        let bbox = BoundingBox::new(0.0, 1.0, 1.0, 1.0);
        assert!(matches!(
            rasterize(&[], &bbox, &config()),
            Err(RouteError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn very_thin_bbox_has_zero_rows() {
        // height is far below one cell of a 100-column grid
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 0.001);
        assert!(matches!(
            rasterize(&[], &bbox, &config()),
            Err(RouteError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn grid_budget_is_enforced() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let tight = PlannerConfig {
            max_grid_cells: 500,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            rasterize(&[], &bbox, &tight),
            Err(RouteError::ResourceExhausted { .. })
        ));
    }

    #[test]
    fn degenerate_obstacle_aborts_rasterization() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let broken = Polygon::from_lon_lat(&[[0.2, 0.2], [0.4, 0.4], [0.2, 0.2]]);
        assert!(matches!(
            rasterize(&[broken], &bbox, &config()),
            Err(RouteError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn planar_grid_matches_unit_layout() {
        let obstacle = Polygon::from_lon_lat(&[
            [5.0, 5.0],
            [15.0, 5.0],
            [15.0, 50.0],
            [5.0, 50.0],
            [5.0, 5.0],
        ]);
        let raster = rasterize_planar(96, 63, 1, &[obstacle], 1_000_000).unwrap();
        assert_eq!(raster.grid.cols(), 96);
        assert_eq!(raster.grid.rows(), 63);
        // row 13 samples y = 50, on the obstacle's top edge
        assert_eq!(raster.table.get(CellCoord::new(13, 10)), Some(Coordinate::new(10.0, 50.0)));
        assert!(!raster.grid.is_free(CellCoord::new(13, 10)));
        assert!(raster.grid.is_free(CellCoord::new(12, 10)));
        assert!(raster.grid.is_free(CellCoord::new(30, 20)));
    }

    #[test]
    fn planar_unit_must_divide_area() {
        assert!(matches!(
            rasterize_planar(10, 7, 2, &[], 1_000),
            Err(RouteError::InvalidInput(_))
        ));
        assert!(matches!(
            rasterize_planar(10, 10, 0, &[], 1_000),
            Err(RouteError::InvalidInput(_))
        ));
    }
}
