//! Planner configuration with environment overrides.

use crate::error::{Result, RouteError};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Cost of an orthogonal move; diagonal moves cost `sqrt(2 * straight^2)`.
    pub straight_edge_cost: f64,
    /// Factor applied to the bbox of obstacles and endpoints before rasterizing.
    pub bbox_padding_factor: f64,
    /// Nominal number of grid columns across the padded bbox.
    pub resolution_columns: usize,
    /// Rasterization fails with `ResourceExhausted` above this many cells.
    pub max_grid_cells: usize,
    /// Search fails with `ResourceExhausted` after this many node expansions.
    pub max_expansions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            straight_edge_cost: 1.0,
            bbox_padding_factor: 1.15,
            resolution_columns: 100,
            max_grid_cells: 4_000_000,
            max_expansions: 2_000_000,
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by `WAYPATH_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            straight_edge_cost: env_or("WAYPATH_STRAIGHT_COST", defaults.straight_edge_cost),
            bbox_padding_factor: env_or("WAYPATH_PADDING_FACTOR", defaults.bbox_padding_factor),
            resolution_columns: env_or("WAYPATH_RESOLUTION_COLUMNS", defaults.resolution_columns),
            max_grid_cells: env_or("WAYPATH_MAX_GRID_CELLS", defaults.max_grid_cells),
            max_expansions: env_or("WAYPATH_MAX_EXPANSIONS", defaults.max_expansions),
        }
    }

    /// Cost of a diagonal move.
    pub fn bevel_edge_cost(&self) -> f64 {
        (self.straight_edge_cost.powi(2) * 2.0).sqrt()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.straight_edge_cost.is_finite() && self.straight_edge_cost > 0.0) {
            return Err(RouteError::invalid_input(format!(
                "straight_edge_cost must be positive, got {}",
                self.straight_edge_cost
            )));
        }
        if !self.bbox_padding_factor.is_finite() || self.bbox_padding_factor == 0.0 {
            return Err(RouteError::invalid_input(format!(
                "bbox_padding_factor must be finite and nonzero, got {}",
                self.bbox_padding_factor
            )));
        }
        if self.resolution_columns == 0 {
            return Err(RouteError::invalid_input("resolution_columns must be > 0"));
        }
        if self.max_grid_cells == 0 || self.max_expansions == 0 {
            return Err(RouteError::invalid_input("budgets must be > 0"));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparseable config override");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.bevel_edge_cost() - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn bevel_cost_scales_with_straight_cost() {
        let config = PlannerConfig {
            straight_edge_cost: 3.0,
            ..PlannerConfig::default()
        };
        assert!((config.bevel_edge_cost() - 3.0 * std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_cost = PlannerConfig {
            straight_edge_cost: 0.0,
            ..PlannerConfig::default()
        };
        assert!(matches!(bad_cost.validate(), Err(RouteError::InvalidInput(_))));

        let bad_factor = PlannerConfig {
            bbox_padding_factor: 0.0,
            ..PlannerConfig::default()
        };
        assert!(bad_factor.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PlannerConfig = serde_json::from_str(r#"{"resolution_columns": 40}"#).unwrap();
        assert_eq!(config.resolution_columns, 40);
        assert_eq!(config.bbox_padding_factor, 1.15);
    }

    #[test]
    fn env_or_parses_and_falls_back() {
        // Keys are unique to this test.
        env::set_var("WAYPATH_TEST_ENV_OR_GOOD", "42");
        env::set_var("WAYPATH_TEST_ENV_OR_BAD", "forty-two");
        assert_eq!(env_or("WAYPATH_TEST_ENV_OR_GOOD", 1usize), 42);
        assert_eq!(env_or("WAYPATH_TEST_ENV_OR_BAD", 1usize), 1);
        assert_eq!(env_or("WAYPATH_TEST_ENV_OR_MISSING", 7usize), 7);
    }
}
