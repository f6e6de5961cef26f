//! Plan a route around polygonal obstacles.
//!
//! Reads a JSON request `{start, end, obstacles, config?}` and prints the route
//! as JSON. Exits with code 2 when no route exists.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waypath_cli::{format_path, load_request, planner_for};

/// Plan the shortest grid route between two coordinates
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Request file, or `-` for stdin
    #[arg(long, short, default_value = "-")]
    input: String,

    /// Print the occupancy grid with the route to stderr
    #[arg(long)]
    render: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("waypath_core=info".parse()?)
                .add_directive("plan_route=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let request = load_request(&args.input)?;
    let planner = planner_for(&request)?;

    let report = match planner.plan(request.start, request.end, &request.obstacles) {
        Ok(report) => report,
        Err(err) if err.is_unreachable() => {
            eprintln!("No route: {err}");
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(err.into()),
    };

    if args.render {
        eprintln!("{}", report.render());
    }
    println!("{}", format_path(&report.path, args.pretty)?);
    tracing::info!(
        rows = report.rows,
        cols = report.cols,
        expansions = report.expansions,
        "done"
    );

    Ok(ExitCode::SUCCESS)
}
