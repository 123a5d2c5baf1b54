//! Multi-objective A* with Pareto-frontier pruning.
//!
//! Grounded on `src/optimization/moa_star.py`'s `moa_star`/`heuristic`/
//! `dominates`, with the search-record ordering generalized from the
//! teacher's `SearchState` `Ord` impl (`optimizer/mod.rs`) to the
//! deterministic FIFO tie-break `spec.md` section 5 requires (the Python
//! source's accidental lexicographic-by-node-name tie-break, an artifact of
//! comparing raw tuples, is not reproduced).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::geo::{haversine_distance, node_coords};
use crate::graph::Graph;

/// Cumulative (or estimated) cost along a path. Component order is fixed:
/// time, cost, emissions, customs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostVector {
    pub time: f64,
    pub cost: f64,
    pub emissions: f64,
    pub customs: f64,
}

impl CostVector {
    pub const ZERO: CostVector = CostVector { time: 0.0, cost: 0.0, emissions: 0.0, customs: 0.0 };

    fn components(&self) -> [f64; 4] {
        [self.time, self.cost, self.emissions, self.customs]
    }
}

/// Per-objective weight vector, same component order as [`CostVector`].
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveWeights {
    pub time: f64,
    pub cost: f64,
    pub emissions: f64,
    pub customs: f64,
}

impl ObjectiveWeights {
    pub fn dot(&self, costs: &CostVector) -> f64 {
        self.time * costs.time + self.cost * costs.cost + self.emissions * costs.emissions + self.customs * costs.customs
    }
}

/// `a` dominates `b` iff every component of `a` is `<= ` the matching
/// component of `b`, and at least one is strictly less.
pub fn dominates(a: &CostVector, b: &CostVector) -> bool {
    let (ac, bc) = (a.components(), b.components());
    ac.iter().zip(bc.iter()).all(|(x, y)| x <= y) && ac.iter().zip(bc.iter()).any(|(x, y)| x < y)
}

struct SearchRecord {
    f_score: f64,
    sequence: u64,
    node: String,
    path: Vec<String>,
    costs: CostVector,
}

impl PartialEq for SearchRecord {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.sequence == other.sequence
    }
}

impl Eq for SearchRecord {}

impl PartialOrd for SearchRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchRecord {
    /// Reversed so `BinaryHeap` (a max-heap) behaves as a min-heap on
    /// `f_score`; ties broken by insertion sequence, lowest first, giving
    /// deterministic FIFO pops for equal keys.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Estimate the minimum remaining scalarized cost from `node` to `goal`.
/// Zero when either endpoint lacks coordinates (a trivially admissible,
/// uninformative estimate) — not a provable admissibility certificate
/// across all four objectives; see `spec.md` section 9.
fn heuristic(graph: &Graph, node: &str, goal: &str, weights: ObjectiveWeights) -> f64 {
    let Some(node_coords_) = graph.get_node(node).and_then(node_coords) else {
        return 0.0;
    };
    let Some(goal_coords) = graph.get_node(goal).and_then(node_coords) else {
        return 0.0;
    };

    let distance_km = haversine_distance(node_coords_, goal_coords);
    let estimate = CostVector {
        time: distance_km / 800.0,
        cost: distance_km * 0.01 * 1000.0,
        emissions: distance_km * 10.0,
        customs: 1.0,
    };
    weights.dot(&estimate)
}

/// Search for a path from `start` to `goal` honoring `max_days`, returning
/// the first goal-reaching path whose time budget is met under the heap's
/// priority order, or `None` if the heap empties first.
pub fn search(
    graph: &Graph,
    start: &str,
    goal: &str,
    weights: ObjectiveWeights,
    shipment_kg: f64,
    max_days: f64,
) -> Option<(Vec<String>, CostVector)> {
    if !graph.contains_node(start) || !graph.contains_node(goal) {
        tracing::warn!(start, goal, "start or goal not present in graph");
        return None;
    }

    let mut sequence: u64 = 0;
    let mut heap = BinaryHeap::new();
    heap.push(SearchRecord {
        f_score: 0.0,
        sequence,
        node: start.to_string(),
        path: vec![start.to_string()],
        costs: CostVector::ZERO,
    });
    sequence += 1;

    let mut closed: HashSet<String> = HashSet::new();
    let mut pareto_frontier: HashMap<String, Vec<CostVector>> = HashMap::new();

    while let Some(record) = heap.pop() {
        if closed.contains(&record.node) {
            continue;
        }

        if record.node == goal {
            if record.costs.time / 24.0 <= max_days {
                return Some((record.path, record.costs));
            }
            tracing::debug!(goal, days = record.costs.time / 24.0, max_days, "goal path exceeds time budget");
            continue;
        }

        closed.insert(record.node.clone());

        for (neighbor, edge) in graph.edges_from(&record.node) {
            if closed.contains(&neighbor.key) {
                continue;
            }

            let new_time = record.costs.time + edge.time_hours;
            if new_time / 24.0 > max_days {
                continue;
            }

            let new_costs = CostVector {
                time: new_time,
                cost: record.costs.cost + (edge.unit_cost() + edge.border_cost) * shipment_kg,
                emissions: record.costs.emissions + edge.emissions_kg_per_tonne * (shipment_kg / 1000.0),
                customs: record.costs.customs + neighbor.customs_score(),
            };

            let frontier = pareto_frontier.entry(neighbor.key.clone()).or_default();
            if frontier.iter().any(|existing| dominates(existing, &new_costs)) {
                continue;
            }
            frontier.retain(|existing| !dominates(&new_costs, existing));
            frontier.push(new_costs);

            let mut new_path = record.path.clone();
            new_path.push(neighbor.key.clone());
            let f_score = weights.dot(&new_costs) + heuristic(graph, &neighbor.key, goal, weights);

            heap.push(SearchRecord {
                f_score,
                sequence,
                node: neighbor.key.clone(),
                path: new_path,
                costs: new_costs,
            });
            sequence += 1;
        }
    }

    tracing::debug!(start, goal, max_days, "no path found within time budget");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Mode, Node, NodeKind};

    fn node(key: &str, lat: f64, lon: f64) -> Node {
        Node {
            key: key.to_string(),
            kind: NodeKind::Seaport,
            country: "X".to_string(),
            city: key.to_string(),
            latitude: Some(lat),
            longitude: Some(lon),
            customs_score: Some(1.0),
            mean_port_dwell_time: Some(0.0),
            mean_turnaround_time: Some(0.0),
        }
    }

    fn sea_edge(time: f64, cost_per_kg: f64) -> Edge {
        Edge {
            mode: Mode::Sea,
            distance_km: 100.0,
            time_hours: time,
            transportation_cost_per_kg: Some(cost_per_kg),
            cost_per_km: None,
            border_cost: 0.0,
            emissions_kg_per_tonne: 5.0,
            route: None,
        }
    }

    fn uniform_weights() -> ObjectiveWeights {
        ObjectiveWeights { time: 0.25, cost: 0.25, emissions: 0.25, customs: 0.25 }
    }

    #[test]
    fn dominance_is_strict_and_irreflexive() {
        let a = CostVector { time: 1.0, cost: 1.0, emissions: 1.0, customs: 1.0 };
        assert!(!dominates(&a, &a));

        let b = CostVector { time: 2.0, cost: 2.0, emissions: 2.0, customs: 2.0 };
        assert!(dominates(&a, &b));
        assert!(!dominates(&b, &a));

        // Neither dominates when components trade off.
        let c = CostVector { time: 0.5, cost: 3.0, emissions: 1.0, customs: 1.0 };
        assert!(!dominates(&a, &c));
        assert!(!dominates(&c, &a));
    }

    #[test]
    fn finds_path_across_two_hops() {
        let mut graph = Graph::new();
        graph.add_node(node("A", 0.0, 0.0));
        graph.add_node(node("B", 0.0, 1.0));
        graph.add_node(node("C", 0.0, 2.0));
        graph.add_edge_if_better("A", "B", sea_edge(10.0, 1.0));
        graph.add_edge_if_better("B", "C", sea_edge(10.0, 1.0));

        let result = search(&graph, "A", "C", uniform_weights(), 1000.0, 30.0);
        let (path, costs) = result.expect("path must be found");
        assert_eq!(path, vec!["A", "B", "C"]);
        assert_eq!(costs.time, 20.0);
    }

    #[test]
    fn respects_time_budget() {
        let mut graph = Graph::new();
        graph.add_node(node("A", 0.0, 0.0));
        graph.add_node(node("B", 0.0, 1.0));
        graph.add_edge_if_better("A", "B", sea_edge(1000.0, 1.0));

        let result = search(&graph, "A", "B", uniform_weights(), 1000.0, 1.0);
        assert!(result.is_none());
    }

    #[test]
    fn missing_start_or_goal_returns_none() {
        let graph = Graph::new();
        assert!(search(&graph, "A", "B", uniform_weights(), 1000.0, 30.0).is_none());
    }

    #[test]
    fn prefers_lower_f_score_path() {
        let mut graph = Graph::new();
        graph.add_node(node("A", 0.0, 0.0));
        graph.add_node(node("B", 0.0, 1.0));
        graph.add_node(node("C", 0.0, 2.0));
        graph.add_edge_if_better("A", "C", sea_edge(50.0, 5.0));
        graph.add_edge_if_better("A", "B", sea_edge(1.0, 0.1));
        graph.add_edge_if_better("B", "C", sea_edge(1.0, 0.1));

        let (path, _) = search(&graph, "A", "C", uniform_weights(), 1000.0, 30.0).unwrap();
        assert_eq!(path, vec!["A", "B", "C"]);
    }
}
