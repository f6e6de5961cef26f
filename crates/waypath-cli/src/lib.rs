//! Waypath CLI - command line tools around the waypath route planner.
//!
//! Binaries:
//! - plan_route: plan a route from a JSON request file or stdin

pub mod request;

pub use request::{format_path, load_request, planner_for, read_input};
