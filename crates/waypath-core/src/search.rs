//! 8-connected A* over an occupancy grid.
//!
//! Every search owns its state: a node arena (parents are arena indices), a
//! binary-heap open set and a closed bitmap. Nothing is shared between calls.
//!
//! The heuristic is the Manhattan cell distance. With diagonal moves costing
//! `sqrt(2)` times a straight move it can overestimate, so the returned path
//! is not guaranteed to be the cheapest one.
//!
//! Improved costs are pushed as new entries and the old entry stays in the
//! heap. When an outdated entry surfaces its cell is already closed and it is
//! dropped without counting as an expansion.

use crate::config::PlannerConfig;
use crate::error::{Result, RouteError};
use crate::raster::{CellCoord, OccupancyGrid};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Neighbour offsets as (d_row, d_col, diagonal): left, up, right, down,
/// up-left, up-right, down-right, down-left.
const NEIGHBORS: [(isize, isize, bool); 8] = [
    (0, -1, false),
    (-1, 0, false),
    (0, 1, false),
    (1, 0, false),
    (-1, -1, true),
    (-1, 1, true),
    (1, 1, true),
    (1, -1, true),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Initialized,
    Searching,
    Succeeded,
    Exhausted,
}

/// Arena entry. `parent` indexes into the same arena and always points at an
/// earlier node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchNode {
    pub cell: CellCoord,
    pub parent: Option<usize>,
    pub g: f64,
    pub h: f64,
}

impl SearchNode {
    pub fn f(&self) -> f64 {
        self.g + self.h
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f_score: FloatOrd,
    h_score: FloatOrd,
    node: usize,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // Lower f first, then lower h, then earlier insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.h_score.cmp(&other.h_score))
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Edge costs and budget for grid searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AStar {
    straight_cost: f64,
    bevel_cost: f64,
    max_expansions: usize,
}

impl Default for AStar {
    fn default() -> Self {
        Self::new(&PlannerConfig::default())
    }
}

impl AStar {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            straight_cost: config.straight_edge_cost,
            bevel_cost: config.bevel_edge_cost(),
            max_expansions: config.max_expansions,
        }
    }

    pub fn straight_cost(&self) -> f64 {
        self.straight_cost
    }

    pub fn bevel_cost(&self) -> f64 {
        self.bevel_cost
    }

    /// Manhattan distance in cells, independent of the edge costs.
    pub fn heuristic(from: CellCoord, to: CellCoord) -> f64 {
        from.manhattan(to) as f64
    }

    /// Prepare a search from `start` to `goal`. Both must be free cells.
    pub fn begin<'g>(
        &self,
        grid: &'g OccupancyGrid,
        start: CellCoord,
        goal: CellCoord,
    ) -> Result<Search<'g>> {
        for (label, cell) in [("start", start), ("goal", goal)] {
            match grid.get(cell) {
                None => {
                    return Err(RouteError::invalid_input(format!(
                        "{label} cell ({}, {}) is outside the {}x{} grid",
                        cell.row,
                        cell.col,
                        grid.rows(),
                        grid.cols()
                    )))
                }
                Some(c) if c.is_blocked() => {
                    return Err(RouteError::invalid_input(format!(
                        "{label} cell ({}, {}) is blocked",
                        cell.row, cell.col
                    )))
                }
                Some(_) => {}
            }
        }

        let mut search = Search {
            grid,
            costs: *self,
            goal,
            nodes: Vec::new(),
            open: BinaryHeap::new(),
            best_open_g: vec![f64::INFINITY; grid.len()],
            closed: vec![false; grid.len()],
            goal_node: None,
            state: SearchState::Initialized,
            expansions: 0,
        };
        search.push(start, None, 0.0);
        Ok(search)
    }

    /// Run a search to completion.
    pub fn search(
        &self,
        grid: &OccupancyGrid,
        start: CellCoord,
        goal: CellCoord,
    ) -> Result<SearchOutcome> {
        self.begin(grid, start, goal)?.run()
    }
}

/// A single in-progress search. Dropped once it has produced an outcome.
pub struct Search<'g> {
    grid: &'g OccupancyGrid,
    costs: AStar,
    goal: CellCoord,
    nodes: Vec<SearchNode>,
    open: BinaryHeap<Reverse<OpenEntry>>,
    /// Lowest g among open entries per cell; infinity when the cell has none.
    best_open_g: Vec<f64>,
    closed: Vec<bool>,
    goal_node: Option<usize>,
    state: SearchState,
    expansions: usize,
}

impl<'g> Search<'g> {
    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn expansions(&self) -> usize {
        self.expansions
    }

    fn flat(&self, cell: CellCoord) -> usize {
        cell.row * self.grid.cols() + cell.col
    }

    fn push(&mut self, cell: CellCoord, parent: Option<usize>, g: f64) {
        let h = AStar::heuristic(cell, self.goal);
        let node = self.nodes.len();
        self.nodes.push(SearchNode { cell, parent, g, h });
        let idx = self.flat(cell);
        self.best_open_g[idx] = g;
        self.open.push(Reverse(OpenEntry {
            f_score: FloatOrd(g + h),
            h_score: FloatOrd(h),
            node,
        }));
    }

    /// Advance by one expansion, or until the search reaches a final state.
    pub fn step(&mut self) -> Result<SearchState> {
        match self.state {
            SearchState::Succeeded | SearchState::Exhausted => return Ok(self.state),
            SearchState::Initialized => self.state = SearchState::Searching,
            SearchState::Searching => {}
        }

        loop {
            if self.goal_node.is_some() {
                self.state = SearchState::Succeeded;
                return Ok(self.state);
            }

            let Some(Reverse(entry)) = self.open.pop() else {
                self.state = SearchState::Exhausted;
                return Ok(self.state);
            };
            let current = self.nodes[entry.node];
            let idx = self.flat(current.cell);
            if self.closed[idx] {
                // stale duplicate
                continue;
            }

            if self.expansions >= self.costs.max_expansions {
                tracing::warn!(
                    expansions = self.expansions,
                    limit = self.costs.max_expansions,
                    "search expansion budget exhausted"
                );
                return Err(RouteError::ResourceExhausted {
                    resource: "search expansions",
                    limit: self.costs.max_expansions,
                    requested: self.expansions + 1,
                });
            }

            self.closed[idx] = true;
            self.expansions += 1;
            tracing::trace!(
                row = current.cell.row,
                col = current.cell.col,
                g = current.g,
                h = current.h,
                "expand"
            );

            if current.cell == self.goal {
                self.goal_node = Some(entry.node);
            } else {
                self.relax_neighbors(entry.node);
            }
            return Ok(self.state);
        }
    }

    fn relax_neighbors(&mut self, current_idx: usize) {
        let current = self.nodes[current_idx];
        for (d_row, d_col, diagonal) in NEIGHBORS {
            let (Some(row), Some(col)) = (
                current.cell.row.checked_add_signed(d_row),
                current.cell.col.checked_add_signed(d_col),
            ) else {
                continue;
            };
            let cell = CellCoord::new(row, col);
            if !self.grid.is_free(cell) {
                continue;
            }
            let idx = self.flat(cell);
            if self.closed[idx] {
                continue;
            }

            let edge = if diagonal {
                self.costs.bevel_cost
            } else {
                self.costs.straight_cost
            };
            let tentative_g = current.g + edge;
            if tentative_g < self.best_open_g[idx] {
                self.push(cell, Some(current_idx), tentative_g);
            }
        }
    }

    /// Step until the search succeeds or the open set is exhausted.
    pub fn run(mut self) -> Result<SearchOutcome> {
        loop {
            match self.step()? {
                SearchState::Succeeded => break,
                SearchState::Exhausted => {
                    tracing::warn!(expansions = self.expansions, "open set exhausted before goal");
                    return Err(RouteError::UnreachableGoal {
                        expansions: self.expansions,
                    });
                }
                SearchState::Initialized | SearchState::Searching => {}
            }
        }

        let goal = self.goal_node.ok_or(RouteError::UnreachableGoal {
            expansions: self.expansions,
        })?;
        Ok(SearchOutcome {
            nodes: self.nodes,
            goal,
            expansions: self.expansions,
        })
    }
}

/// A finished search: the node arena and the node that closed the goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    nodes: Vec<SearchNode>,
    goal: usize,
    expansions: usize,
}

impl SearchOutcome {
    pub fn goal_node(&self) -> &SearchNode {
        &self.nodes[self.goal]
    }

    /// Accumulated edge cost of the path.
    pub fn cost(&self) -> f64 {
        self.goal_node().g
    }

    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Every node created during the search, stale ones included.
    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    /// Cells from start to goal.
    pub fn cells(&self) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        let mut current = Some(self.goal);
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            cells.push(node.cell);
            current = node.parent;
        }
        cells.reverse();
        cells
    }
}
