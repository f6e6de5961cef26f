//! Reading plan requests and writing results.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use waypath_core::{PlanRequest, Planner, PlannerConfig, RoutePath};

/// Read the raw request text from a file, or from stdin when `input` is `-`.
pub fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read request from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(Path::new(input))
        .with_context(|| format!("failed to read request file {input}"))
}

pub fn load_request(input: &str) -> Result<PlanRequest> {
    let raw = read_input(input)?;
    Ok(PlanRequest::from_json(&raw)?)
}

/// Planner for a request: its own config if present, else the environment.
pub fn planner_for(request: &PlanRequest) -> Result<Planner> {
    let config = request
        .config
        .clone()
        .unwrap_or_else(PlannerConfig::from_env);
    Ok(Planner::new(config)?)
}

pub fn format_path(path: &RoutePath, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(path)?
    } else {
        serde_json::to_string(path)?
    };
    Ok(text)
}
