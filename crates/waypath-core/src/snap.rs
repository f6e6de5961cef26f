//! Mapping arbitrary coordinates onto the nearest traversable cell.

use crate::error::{Result, RouteError};
use crate::models::Coordinate;
use crate::raster::{CellCoord, RasterGrid};
use crate::spatial::haversine_distance;

/// Nearest free cell to `target` by great-circle distance to the cell center.
///
/// Ties keep the first cell in row-major (north to south, west to east) order.
pub fn snap(target: Coordinate, raster: &RasterGrid) -> Result<CellCoord> {
    let mut cells = snap_many(&[target], raster)?;
    cells.pop().ok_or(RouteError::NoFreeCell)
}

/// Snap several targets in a single pass over the grid.
pub fn snap_many(targets: &[Coordinate], raster: &RasterGrid) -> Result<Vec<CellCoord>> {
    if let Some(bad) = targets.iter().find(|t| !t.is_finite()) {
        return Err(RouteError::invalid_input(format!(
            "cannot snap non-finite coordinate {bad:?}"
        )));
    }

    let mut best: Vec<Option<(usize, f64)>> = vec![None; targets.len()];
    for (idx, (cell, point)) in raster
        .grid
        .cells()
        .iter()
        .zip(raster.table.points())
        .enumerate()
    {
        if cell.is_blocked() {
            continue;
        }
        for (slot, target) in best.iter_mut().zip(targets) {
            let distance = haversine_distance(*point, *target);
            let closer = match *slot {
                Some((_, best_distance)) => distance < best_distance,
                None => true,
            };
            if closer {
                *slot = Some((idx, distance));
            }
        }
    }

    best.into_iter()
        .zip(targets)
        .map(|(slot, target)| {
            let (idx, distance) = slot.ok_or(RouteError::NoFreeCell)?;
            let cell = raster.grid.coord(idx);
            tracing::debug!(
                lon = target.lon,
                lat = target.lat,
                row = cell.row,
                col = cell.col,
                distance_m = distance,
                "snapped to cell"
            );
            Ok(cell)
        })
        .collect()
}
