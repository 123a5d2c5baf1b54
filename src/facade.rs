//! End-to-end orchestration: validate, build graph, enumerate node pairs,
//! search, construct, rank.
//!
//! Grounded on `main.py`'s `/api/find-routes` handler for the preset weight
//! selection, trade-neighbor expansion, and response shaping (rounding,
//! `time_days`/`emissions` unit conversions), and on the teacher's
//! `parse_optimize_request` (`grpc/mod.rs`) for the general request-shaping
//! structure.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::builder::tables::TradeNeighbourRow;
use crate::builder::GraphBuilder;
use crate::config::Defaults;
use crate::error::CoreError;
use crate::geo::Coordinates;
use crate::graph::{Graph, Mode};
use crate::moa_star::{self, ObjectiveWeights};
use crate::ranker::{self, RankedRoute};
use crate::route_constructor;

/// Caller-supplied weights for `optimizationType: "customWeights"`. Field
/// names mirror the request payload's keys exactly (`logisticsScore` maps
/// onto the customs objective slot, as in the source).
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomWeights {
    pub time: Option<f64>,
    pub cost: Option<f64>,
    pub emissions: Option<f64>,
    pub logistics_score: Option<f64>,
}

impl CustomWeights {
    /// Missing entries default to `0.25`, unnormalized — preserved
    /// literally from the source; see `SPEC_FULL.md` section 3.
    fn into_weights(self) -> ObjectiveWeights {
        ObjectiveWeights {
            time: self.time.unwrap_or(0.25),
            cost: self.cost.unwrap_or(0.25),
            emissions: self.emissions.unwrap_or(0.25),
            customs: self.logistics_score.unwrap_or(0.25),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum OptimizationType {
    Time,
    Cost,
    Emissions,
    LogisticsScore,
    Custom(CustomWeights),
}

#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub start: Coordinates,
    pub end: Coordinates,
    pub initial_country: String,
    pub final_country: String,
    /// Default 500 when absent.
    pub max_days: Option<f64>,
    pub weight_grams: f64,
    pub volume_m3: f64,
    pub optimization: OptimizationType,
}

fn validate(request: &RouteRequest) -> Result<(), CoreError> {
    let coords_in_range = |c: Coordinates| (-90.0..=90.0).contains(&c.lat) && (-180.0..=180.0).contains(&c.lon);
    if !coords_in_range(request.start) {
        return Err(CoreError::Validation(format!("start coordinates out of range: {:?}", request.start)));
    }
    if !coords_in_range(request.end) {
        return Err(CoreError::Validation(format!("end coordinates out of range: {:?}", request.end)));
    }
    if let Some(max_days) = request.max_days {
        if !(max_days > 0.0) {
            return Err(CoreError::Validation(format!("max_days must be positive, got {max_days}")));
        }
    }
    if !(request.weight_grams > 0.0) {
        return Err(CoreError::Validation(format!("weight_grams must be positive, got {}", request.weight_grams)));
    }
    if !(request.volume_m3 > 0.0) {
        return Err(CoreError::Validation(format!("volume_m3 must be positive, got {}", request.volume_m3)));
    }
    if let OptimizationType::Custom(custom) = request.optimization {
        for (name, w) in [
            ("time", custom.time),
            ("cost", custom.cost),
            ("emissions", custom.emissions),
            ("logisticsScore", custom.logistics_score),
        ] {
            if let Some(w) = w {
                if w < 0.0 {
                    return Err(CoreError::Validation(format!("custom weight {name} must be non-negative, got {w}")));
                }
            }
        }
    }
    Ok(())
}

/// `spec.md` section 4.6's preset weight vectors. The heavy-load override
/// (mass > 10 t or volume > 400 m^3) takes priority over the caller's
/// declared `optimizationType`, exactly as in the source's `if`/`elif`
/// chain.
fn select_weights(request: &RouteRequest, tonnes: f64) -> ObjectiveWeights {
    if tonnes > 10.0 || request.volume_m3 > 400.0 {
        return ObjectiveWeights { time: 0.1, cost: 0.9, emissions: 0.0, customs: 0.0 };
    }
    match request.optimization {
        OptimizationType::Time => ObjectiveWeights { time: 1.0, cost: 0.0, emissions: 0.0, customs: 0.0 },
        OptimizationType::Cost => ObjectiveWeights { time: 0.0, cost: 1.0, emissions: 0.0, customs: 0.0 },
        OptimizationType::Emissions => ObjectiveWeights { time: 0.0, cost: 0.0, emissions: 1.0, customs: 0.0 },
        OptimizationType::LogisticsScore => ObjectiveWeights { time: 0.5, cost: 0.0, emissions: 0.0, customs: 0.5 },
        OptimizationType::Custom(custom) => custom.into_weights(),
    }
}

/// Country -> trade-neighbor list, built from the `trade_neighbour` table.
pub struct TradeNeighbourIndex {
    neighbours: HashMap<String, Vec<String>>,
}

impl TradeNeighbourIndex {
    pub fn from_rows(rows: &[TradeNeighbourRow]) -> Self {
        let mut neighbours = HashMap::new();
        for row in rows {
            let list = match row.trade_neighbors_country.as_deref() {
                None | Some("None") => vec![],
                Some(s) => s.split(';').map(|n| n.trim().to_string()).collect(),
            };
            neighbours.insert(row.country.clone(), list);
        }
        TradeNeighbourIndex { neighbours }
    }

    fn of(&self, country: &str) -> &[String] {
        self.neighbours.get(country).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `{country}` plus its declared trade neighbors, per `spec.md`
    /// section 4.6 step 1-2.
    fn expand(&self, country: &str) -> Vec<String> {
        let mut countries = vec![country.to_string()];
        countries.extend(self.of(country).iter().cloned());
        countries
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub rank: usize,
    pub score: f64,
    pub time_days: f64,
    pub cost: f64,
    pub emissions_kg: f64,
    pub path: Vec<String>,
    pub modes: Vec<Mode>,
    pub cost_breakdown: BTreeMap<String, f64>,
    pub time_breakdown: BTreeMap<String, f64>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn to_route_result(rank: usize, ranked: RankedRoute) -> RouteResult {
    let route = ranked.route;
    RouteResult {
        rank,
        score: round2(ranked.score),
        time_days: round2(route.metrics.time / 24.0),
        cost: round2(route.metrics.cost),
        emissions_kg: round2(route.metrics.emissions),
        path: route.path,
        modes: route.modes,
        cost_breakdown: route.cost_breakdown.into_iter().map(|(k, v)| (k, round2(v))).collect(),
        time_breakdown: route.time_breakdown.into_iter().map(|(k, v)| (k, round2(v / 24.0))).collect(),
    }
}

fn nodes_in_countries(graph: &Graph, countries: &[String]) -> Vec<String> {
    graph
        .nodes()
        .filter(|n| countries.iter().any(|c| n.key.starts_with(&format!("{c}_"))))
        .map(|n| n.key.clone())
        .collect()
}

/// Validate `request`, splice its ephemeral nodes into `graph`, enumerate
/// trade-neighbor-expanded (source, target) node pairs, search, construct,
/// and rank. The ephemeral nodes are removed again before returning, so
/// `graph` is safe to reuse across sequential requests.
pub fn find_routes(
    graph: &mut Graph,
    request: &RouteRequest,
    trade_neighbours: &TradeNeighbourIndex,
    defaults: &Defaults,
) -> Result<Vec<RouteResult>, CoreError> {
    validate(request)?;

    let max_days = request.max_days.unwrap_or(500.0);
    let tonnes = request.weight_grams / 1000.0;
    let shipment_kg = tonnes * 1000.0;
    let weights = select_weights(request, tonnes);

    let (start_key, end_key) = GraphBuilder::splice_ephemeral(
        graph,
        request.start,
        request.end,
        &request.initial_country,
        &request.final_country,
        defaults,
    );

    let initial_countries = trade_neighbours.expand(&request.initial_country);
    let final_countries = trade_neighbours.expand(&request.final_country);
    let initial_nodes = nodes_in_countries(graph, &initial_countries);
    let final_nodes = nodes_in_countries(graph, &final_countries);

    tracing::info!(initial = initial_nodes.len(), r#final = final_nodes.len(), "enumerating node pairs");

    let mut core_routes = Vec::new();
    for start in &initial_nodes {
        for goal in &final_nodes {
            if let Some(result) = moa_star::search(graph, start, goal, weights, shipment_kg, max_days) {
                core_routes.push(result);
            }
        }
    }
    tracing::info!(count = core_routes.len(), "core routes found");

    let full_routes = route_constructor::construct_full_routes(
        graph,
        &core_routes,
        &start_key,
        &end_key,
        request.start,
        request.end,
        shipment_kg,
        max_days,
        defaults,
    );
    let ranked = ranker::rank(full_routes, weights);

    graph.remove_node(&start_key);
    graph.remove_node(&end_key);

    Ok(ranked.into_iter().enumerate().map(|(i, r)| to_route_result(i + 1, r)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(country: &str, neighbours: Option<&str>) -> TradeNeighbourRow {
        TradeNeighbourRow { country: country.to_string(), trade_neighbors_country: neighbours.map(String::from) }
    }

    #[test]
    fn trade_neighbour_expansion_includes_self_and_listed_neighbours() {
        let index = TradeNeighbourIndex::from_rows(&[row("France", Some("Germany;Italy"))]);
        let mut expanded = index.expand("France");
        expanded.sort();
        assert_eq!(expanded, vec!["France".to_string(), "Germany".to_string(), "Italy".to_string()]);
    }

    #[test]
    fn trade_neighbour_expansion_handles_none_literal_and_missing_rows() {
        let index = TradeNeighbourIndex::from_rows(&[row("Isolatia", Some("None"))]);
        assert_eq!(index.expand("Isolatia"), vec!["Isolatia".to_string()]);
        assert_eq!(index.expand("Unlisted"), vec!["Unlisted".to_string()]);
    }

    fn base_request() -> RouteRequest {
        RouteRequest {
            start: Coordinates::new(40.7128, -74.0060),
            end: Coordinates::new(51.5074, -0.1278),
            initial_country: "US".to_string(),
            final_country: "UK".to_string(),
            max_days: Some(30.0),
            weight_grams: 1000.0,
            volume_m3: 1.0,
            optimization: OptimizationType::Time,
        }
    }

    #[test]
    fn heavy_mass_overrides_declared_optimization_type() {
        let mut request = base_request();
        request.weight_grams = 20_000.0; // tonnes = weight_grams / 1000 = 20, over the 10t threshold
        let weights = select_weights(&request, request.weight_grams / 1000.0);
        assert_eq!(weights.time, 0.1);
        assert_eq!(weights.cost, 0.9);
    }

    #[test]
    fn heavy_volume_overrides_declared_optimization_type() {
        let mut request = base_request();
        request.volume_m3 = 500.0;
        let weights = select_weights(&request, request.weight_grams / 1000.0);
        assert_eq!(weights.cost, 0.9);
    }

    #[test]
    fn custom_weights_default_missing_entries_to_quarter_unnormalized() {
        let mut request = base_request();
        request.optimization = OptimizationType::Custom(CustomWeights { time: Some(1.0), ..Default::default() });
        let weights = select_weights(&request, request.weight_grams / 1000.0);
        assert_eq!(weights.time, 1.0);
        assert_eq!(weights.cost, 0.25);
        assert_eq!(weights.emissions, 0.25);
        assert_eq!(weights.customs, 0.25);
    }

    #[test]
    fn negative_custom_weight_is_rejected() {
        let mut request = base_request();
        request.optimization = OptimizationType::Custom(CustomWeights { cost: Some(-1.0), ..Default::default() });
        assert!(validate(&request).is_err());
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut request = base_request();
        request.start = Coordinates::new(200.0, 0.0);
        assert!(matches!(validate(&request), Err(CoreError::Validation(_))));
    }

    #[test]
    fn non_positive_mass_is_rejected() {
        let mut request = base_request();
        request.weight_grams = 0.0;
        assert!(validate(&request).is_err());
    }
}
