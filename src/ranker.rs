//! Scalarize, sort, and truncate to the top candidates.
//!
//! Grounded on `src/optimization/route_constructor.py`'s `rank_routes`
//! (`score = sum(w * metrics[k] ...)`, ascending sort, `ranked[:10]`) and the
//! teacher's `routes.sort_by(...).truncate(...)` pattern in
//! `optimizer/mod.rs`.

use crate::moa_star::ObjectiveWeights;
use crate::route_constructor::FullRoute;

pub const TOP_K: usize = 10;

/// A route paired with its scalarized score, ready for presentation.
#[derive(Debug, Clone)]
pub struct RankedRoute {
    pub score: f64,
    pub route: FullRoute,
}

/// Scalarize every route under `weights`, sort ascending by score (ties
/// preserve construction order — `sort_by` is a stable sort), and keep the
/// best [`TOP_K`].
pub fn rank(routes: Vec<FullRoute>, weights: ObjectiveWeights) -> Vec<RankedRoute> {
    let mut ranked: Vec<RankedRoute> =
        routes.into_iter().map(|route| RankedRoute { score: weights.dot(&route.metrics), route }).collect();

    ranked.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(TOP_K);
    ranked
}
