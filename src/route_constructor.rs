//! First/last-mile route assembly.
//!
//! Grounded on `src/optimization/route_constructor.py`'s `RouteConstructor`
//! (`add_road_segment`/`construct_full_routes`), re-typed onto this crate's
//! [`Graph`]/[`Edge`] and renamed in the teacher's `RouteSegment`/
//! `CandidateRoute` style (`optimizer/mod.rs`).

use std::collections::BTreeMap;

use crate::config::Defaults;
use crate::geo::{haversine_distance, node_coords, Coordinates};
use crate::graph::{Graph, Mode};
use crate::moa_star::CostVector;

/// A synthesized or retained single-hop segment prepended/appended to a
/// core path to reach the caller's exact coordinates.
struct BoundarySegment {
    mode: Mode,
    time_hours: f64,
    emissions_kg: f64,
    total_cost: f64,
}

/// A fully assembled route: ephemeral start, core catalog path, ephemeral
/// end, with per-segment breakdowns.
#[derive(Debug, Clone)]
pub struct FullRoute {
    pub path: Vec<String>,
    pub modes: Vec<Mode>,
    pub metrics: CostVector,
    pub cost_breakdown: BTreeMap<String, f64>,
    pub time_breakdown: BTreeMap<String, f64>,
}

/// Synthesize a road segment from `coords` to `node`, per
/// `add_road_segment`. Used when no graph edge exists between the
/// ephemeral node and the core path's endpoint, or the existing one is
/// degenerate (zero distance or time).
fn synthesize_road_segment(graph: &Graph, coords: Coordinates, node_key: &str, shipment_kg: f64, defaults: &Defaults) -> BoundarySegment {
    let Some(node_coords_) = graph.get_node(node_key).and_then(node_coords) else {
        tracing::warn!(node_key, "no coordinates for node; assuming zero-distance road segment");
        return BoundarySegment { mode: Mode::Road, time_hours: 0.0, emissions_kg: 0.0, total_cost: 0.0 };
    };

    let distance = haversine_distance(coords, node_coords_);
    let time_hours = distance / defaults.fallback_speed_km_h;
    let emission_factor_kg = defaults.road_emission_factor / 1000.0;
    let emissions_kg = distance * emission_factor_kg * (shipment_kg / 1000.0);
    let total_cost = defaults.road_cost_per_km * distance;

    BoundarySegment { mode: Mode::Road, time_hours, emissions_kg, total_cost }
}

/// Look up the existing edge `from -> to`, if any, and derive a boundary
/// segment from it unless it is absent or degenerate (zero distance/time),
/// in which case a fresh road segment is synthesized.
fn boundary_segment(graph: &Graph, from: &str, to: &str, coords: Coordinates, shipment_kg: f64, defaults: &Defaults) -> BoundarySegment {
    let existing = graph.edges_from(from).into_iter().find(|(n, _)| n.key == to);

    match existing {
        Some((_, edge)) if edge.distance_km != 0.0 && edge.time_hours != 0.0 => BoundarySegment {
            mode: edge.mode,
            time_hours: edge.time_hours,
            emissions_kg: edge.emissions_kg_per_tonne * (shipment_kg / 1000.0),
            total_cost: edge.total_cost(shipment_kg),
        },
        _ => synthesize_road_segment(graph, coords, to, shipment_kg, defaults),
    }
}

/// Assemble full routes from each `(core_path, core_metrics)` produced by
/// `moa_star::search`, attaching first/last-mile segments and applying the
/// total-time-budget gate. Routes that exceed `max_days` are dropped.
#[allow(clippy::too_many_arguments)]
pub fn construct_full_routes(
    graph: &Graph,
    core_routes: &[(Vec<String>, CostVector)],
    start_node: &str,
    end_node: &str,
    start_coords: Coordinates,
    end_coords: Coordinates,
    shipment_kg: f64,
    max_days: f64,
    defaults: &Defaults,
) -> Vec<FullRoute> {
    let mut routes = Vec::new();

    for (core_path, core_metrics) in core_routes {
        if core_path.is_empty() {
            continue;
        }

        let start_segment = boundary_segment(graph, start_node, &core_path[0], start_coords, shipment_kg, defaults);
        let end_segment = boundary_segment(graph, core_path.last().unwrap(), end_node, end_coords, shipment_kg, defaults);

        let mut cost_breakdown = BTreeMap::new();
        let mut time_breakdown = BTreeMap::new();
        let mut core_cost = 0.0;

        for window in core_path.windows(2) {
            let (u, v) = (&window[0], &window[1]);
            let Some((_, edge)) = graph.edges_from(u).into_iter().find(|(n, _)| &n.key == v) else {
                continue;
            };
            let segment_cost = edge.total_cost(shipment_kg);
            core_cost += segment_cost;
            cost_breakdown.insert(format!("{u} -> {v}"), segment_cost);
            time_breakdown.insert(format!("{u} -> {v}"), edge.time_hours);
        }

        let total_time = core_metrics.time + start_segment.time_hours + end_segment.time_hours;
        if total_time / 24.0 > max_days {
            tracing::debug!(start_node, end_node, days = total_time / 24.0, max_days, "route exceeds time budget");
            continue;
        }

        let total_cost = core_cost + start_segment.total_cost + end_segment.total_cost;
        let total_emissions = core_metrics.emissions + start_segment.emissions_kg + end_segment.emissions_kg;

        let first_customs = graph.get_node(&core_path[0]).map(|n| n.customs_score()).unwrap_or(0.0);
        let end_customs = graph.get_node(end_node).map(|n| n.customs_score()).unwrap_or(0.0);
        let total_customs = core_metrics.customs + first_customs + end_customs;

        cost_breakdown.insert(format!("{start_node} -> {}", core_path[0]), start_segment.total_cost);
        cost_breakdown.insert(format!("{} -> {end_node}", core_path.last().unwrap()), end_segment.total_cost);
        time_breakdown.insert(format!("{start_node} -> {}", core_path[0]), start_segment.time_hours);
        time_breakdown.insert(format!("{} -> {end_node}", core_path.last().unwrap()), end_segment.time_hours);

        let mut full_path = vec![start_node.to_string()];
        full_path.extend(core_path.iter().cloned());
        full_path.push(end_node.to_string());

        let mut modes = vec![start_segment.mode];
        for window in core_path.windows(2) {
            let (u, v) = (&window[0], &window[1]);
            if let Some((_, edge)) = graph.edges_from(u).into_iter().find(|(n, _)| &n.key == v) {
                modes.push(edge.mode);
            }
        }
        modes.push(end_segment.mode);

        routes.push(FullRoute {
            path: full_path,
            modes,
            metrics: CostVector { time: total_time, cost: total_cost, emissions: total_emissions, customs: total_customs },
            cost_breakdown,
            time_breakdown,
        });
    }

    routes
}
