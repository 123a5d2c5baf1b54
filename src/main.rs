//! Freight route optimizer CLI.
//!
//! Loads tabular transport data, builds the static catalog graph, and finds
//! ranked routes for a single request described by positional arguments.
//! No network stack, no request-JSON layer — see `DESIGN.md`.

use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freight_route_core::builder::tables::RawTables;
use freight_route_core::builder::GraphBuilder;
use freight_route_core::facade::{find_routes, CustomWeights, OptimizationType, RouteRequest, TradeNeighbourIndex};
use freight_route_core::geo::Coordinates;
use freight_route_core::AppConfig;

fn usage() -> &'static str {
    "usage: freight-route-core <start_lat> <start_lon> <end_lat> <end_lon> \
<initial_country> <final_country> <weight_grams> <volume_m3> \
<time|cost|emissions|logistics|custom> [max_days]"
}

fn parse_optimization(kind: &str) -> Result<OptimizationType> {
    match kind {
        "time" => Ok(OptimizationType::Time),
        "cost" => Ok(OptimizationType::Cost),
        "emissions" => Ok(OptimizationType::Emissions),
        "logistics" => Ok(OptimizationType::LogisticsScore),
        "custom" => Ok(OptimizationType::Custom(CustomWeights::default())),
        other => bail!("unknown optimization type '{other}'; {}", usage()),
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 9 {
        bail!(usage());
    }

    let config = AppConfig::load(env::var("FREIGHT_CONFIG").ok().as_deref())?;

    let request = RouteRequest {
        start: Coordinates::new(args[0].parse().context("start_lat")?, args[1].parse().context("start_lon")?),
        end: Coordinates::new(args[2].parse().context("end_lat")?, args[3].parse().context("end_lon")?),
        initial_country: args[4].clone(),
        final_country: args[5].clone(),
        weight_grams: args[6].parse().context("weight_grams")?,
        volume_m3: args[7].parse().context("volume_m3")?,
        optimization: parse_optimization(&args[8])?,
        max_days: args.get(9).map(|s| s.parse()).transpose().context("max_days")?,
    };

    let tables = RawTables::from_dir(&config.data.raw_nodes_dir, &config.data.raw_edges_dir)
        .context("loading raw tables")?;
    let mut graph = GraphBuilder::build(&tables, &config.defaults);
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "graph built");

    let trade_neighbours = TradeNeighbourIndex::from_rows(&tables.trade_neighbour);

    let results = find_routes(&mut graph, &request, &trade_neighbours, &config.defaults)?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::builder().with_default_directive(Level::INFO.into()).from_env_lossy())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
