//! Turning a finished search into a coordinate path.

use crate::error::{Result, RouteError};
use crate::models::Coordinate;
use crate::raster::{CellCoord, CellTable};
use crate::search::SearchOutcome;
use crate::spatial::haversine_distance;
use serde::Serialize;

/// A planned route.
///
/// `coordinates` starts at the requested start and ends at the requested end;
/// everything in between is a cell sample point. `cost` is in edge-cost units
/// of the grid, not metres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePath {
    pub coordinates: Vec<Coordinate>,
    pub cost: f64,
    pub cells: Vec<CellCoord>,
}

impl RoutePath {
    /// Great-circle length of the polyline in metres.
    pub fn length_m(&self) -> f64 {
        self.coordinates
            .windows(2)
            .map(|pair| haversine_distance(pair[0], pair[1]))
            .sum()
    }
}

/// Map the searched cells through `table` and pin the requested endpoints.
pub fn reconstruct(
    outcome: &SearchOutcome,
    table: &CellTable,
    start: Coordinate,
    end: Coordinate,
) -> Result<RoutePath> {
    let cells = outcome.cells();
    let mut coordinates = Vec::with_capacity(cells.len() + 2);
    coordinates.push(start);
    for cell in &cells {
        let point = table.get(*cell).ok_or_else(|| {
            RouteError::invalid_input(format!(
                "cell ({}, {}) is outside the coordinate table",
                cell.row, cell.col
            ))
        })?;
        coordinates.push(point);
    }
    coordinates.push(end);

    Ok(RoutePath {
        coordinates,
        cost: outcome.cost(),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{rasterize_planar, OccupancyGrid};
    use crate::search::AStar;

    #[test]
    fn endpoints_are_pinned_and_cells_mapped() {
        let raster = rasterize_planar(4, 2, 1, &[], 100).unwrap();
        let outcome = AStar::default()
            .search(&raster.grid, CellCoord::new(1, 0), CellCoord::new(1, 3))
            .unwrap();
        let start = Coordinate::new(-0.25, 0.9);
        let end = Coordinate::new(3.4, 1.1);
        let path = reconstruct(&outcome, &raster.table, start, end).unwrap();

        assert_eq!(path.coordinates.first(), Some(&start));
        assert_eq!(path.coordinates.last(), Some(&end));
        assert_eq!(path.coordinates.len(), path.cells.len() + 2);
        // planar sample for row 1 is y = height - 1
        assert_eq!(path.coordinates[1], Coordinate::new(0.0, 1.0));
        assert_eq!(path.cost, outcome.cost());
    }

    #[test]
    fn table_mismatch_is_an_error() {
        let small = rasterize_planar(2, 1, 1, &[], 100).unwrap();
        let big = OccupancyGrid::new(1, 5).unwrap();
        let outcome = AStar::default()
            .search(&big, CellCoord::new(0, 0), CellCoord::new(0, 4))
            .unwrap();
        let err = reconstruct(
            &outcome,
            &small.table,
            Coordinate::new(0.0, 0.0),
            Coordinate::new(4.0, 0.0),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidInput(_)));
    }

    #[test]
    fn length_follows_the_polyline() {
        let path = RoutePath {
            coordinates: vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 0.0),
                Coordinate::new(2.0, 0.0),
            ],
            cost: 2.0,
            cells: Vec::new(),
        };
        let direct = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 0.0));
        assert!((path.length_m() - direct).abs() < 1e-6);
    }
}
