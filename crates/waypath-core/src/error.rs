//! Error types for route planning.

use thiserror::Error;

/// Errors produced while validating input, building grids or searching them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Missing or malformed input (unclosed ring, zero scale factor, bad config...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Geometry that collapses: a ring with fewer than three distinct vertices,
    /// or a grid with zero rows or columns.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Every cell of the grid is blocked, so start/end cannot be snapped.
    #[error("no free cell in grid")]
    NoFreeCell,

    /// The open set emptied before the goal cell was finalized.
    #[error("goal unreachable after {expansions} expansions")]
    UnreachableGoal { expansions: usize },

    /// A configured grid-size or search budget was exceeded.
    #[error("{resource} budget exceeded: {requested} > {limit}")]
    ResourceExhausted {
        resource: &'static str,
        limit: usize,
        requested: usize,
    },
}

impl RouteError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry(reason.into())
    }

    /// True when the failure means "no route exists" rather than bad input.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::UnreachableGoal { .. } | Self::NoFreeCell)
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;
