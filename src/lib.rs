//! Multi-objective multimodal freight route optimization core.
//!
//! Pure library: given raw tabular inputs (or a pre-built [`graph::Graph`])
//! and a [`facade::RouteRequest`], returns a ranked list of candidate routes.
//! No network, persistence, or visualization surface — see `DESIGN.md` for
//! what was dropped from the teacher and why.

pub mod builder;
pub mod config;
pub mod error;
pub mod facade;
pub mod geo;
pub mod graph;
pub mod moa_star;
pub mod parsers;
pub mod ranker;
pub mod route_constructor;

pub use config::{AppConfig, Defaults};
pub use error::{CoreError, CoreResult};
pub use facade::{find_routes, CustomWeights, OptimizationType, RouteRequest, RouteResult, TradeNeighbourIndex};
pub use graph::Graph;
