//! Transport network graph.
//!
//! In-memory multi-digraph of the multimodal transport network: one node per
//! seaport/airport/ephemeral start-or-end location, with parallel mode-tagged
//! edges between them. Grounded on the teacher's `TransportGraph` (petgraph
//! `DiGraph` + a `code -> NodeIndex` lookup map), generalized from a single
//! edge per pair to the spec's same-mode-deduplicated multi-edge policy.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

/// Kind of node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Seaport,
    Airport,
    Start,
    End,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Seaport => write!(f, "seaport"),
            NodeKind::Airport => write!(f, "airport"),
            NodeKind::Start => write!(f, "start"),
            NodeKind::End => write!(f, "end"),
        }
    }
}

/// Transport mode of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Sea,
    Air,
    Road,
    Intermodal,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Sea => write!(f, "sea"),
            Mode::Air => write!(f, "air"),
            Mode::Road => write!(f, "road"),
            Mode::Intermodal => write!(f, "intermodal"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sea" => Ok(Mode::Sea),
            "air" => Ok(Mode::Air),
            "road" => Ok(Mode::Road),
            "intermodal" => Ok(Mode::Intermodal),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// A node in the transport network: a seaport, an airport, or an ephemeral
/// request-lifetime start/end location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    pub kind: NodeKind,
    pub country: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Seaport-only customs clearance score; default 3.0 when absent.
    pub customs_score: Option<f64>,
    /// Seaport-only mean dwell time, hours; default 48.
    pub mean_port_dwell_time: Option<f64>,
    /// Seaport-only mean turnaround time, hours; default 24.
    pub mean_turnaround_time: Option<f64>,
}

impl Node {
    pub fn customs_score(&self) -> f64 {
        self.customs_score.unwrap_or(0.0)
    }
}

/// A directed edge (route segment) between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub mode: Mode,
    pub distance_km: f64,
    pub time_hours: f64,
    /// USD/kg; set for sea, air, and intermodal edges.
    pub transportation_cost_per_kg: Option<f64>,
    /// USD/km; set for road edges only.
    pub cost_per_km: Option<f64>,
    pub border_cost: f64,
    /// kg CO2 per tonne transported over this edge's distance (normalized at
    /// ingest; see `SPEC_FULL.md` section 3 for the unit resolution).
    pub emissions_kg_per_tonne: f64,
    pub route: Option<String>,
}

impl Edge {
    /// The per-unit cost figure used for same-mode duplicate-edge quality
    /// comparison and for MOAStar's scalarized cost accumulation: whichever
    /// of `transportation_cost_per_kg` / `cost_per_km` is populated for this
    /// edge's mode.
    pub fn unit_cost(&self) -> f64 {
        self.transportation_cost_per_kg.or(self.cost_per_km).unwrap_or(0.0)
    }

    /// Lower is better. Used by [`Graph::add_edge_if_better`] to resolve
    /// duplicate same-mode edges between the same endpoints.
    pub fn quality_score(&self) -> f64 {
        self.unit_cost() + self.border_cost + self.time_hours
    }

    /// Total monetary cost of traversing this edge for `shipment_kg`,
    /// applying the mode-dependent rule from `spec.md` section 4.4: road
    /// edges bill per kilometer, all other modes bill per kilogram.
    pub fn total_cost(&self, shipment_kg: f64) -> f64 {
        match self.mode {
            Mode::Road => self.cost_per_km.unwrap_or(0.0) * self.distance_km + self.border_cost,
            _ => self.transportation_cost_per_kg.unwrap_or(0.0) * shipment_kg + self.border_cost,
        }
    }
}

/// The transport multi-digraph.
pub struct Graph {
    inner: DiGraph<Node, Edge>,
    node_index: HashMap<String, NodeIndex>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: DiGraph::new(),
            node_index: HashMap::new(),
        }
    }

    /// Insert `node`, keyed on `node.key`. Re-inserting an existing key
    /// returns the existing index and leaves the stored node untouched.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let key = node.key.clone();
        if let Some(&existing) = self.node_index.get(&key) {
            return existing;
        }
        let idx = self.inner.add_node(node);
        self.node_index.insert(key, idx);
        idx
    }

    /// Remove a node and all of its incident edges. Used to tear down the
    /// ephemeral start/end nodes spliced in for a single request.
    pub fn remove_node(&mut self, key: &str) {
        if let Some(idx) = self.node_index.remove(key) {
            self.inner.remove_node(idx);
            // petgraph::remove_node swaps the last node into the freed slot;
            // the index map must follow that swap.
            if let Some(moved) = self.inner.node_weight(idx) {
                self.node_index.insert(moved.key.clone(), idx);
            }
        }
    }

    pub fn contains_node(&self, key: &str) -> bool {
        self.node_index.contains_key(key)
    }

    pub fn get_node(&self, key: &str) -> Option<&Node> {
        self.node_index.get(key).map(|&idx| &self.inner[idx])
    }

    pub fn get_node_index(&self, key: &str) -> Option<NodeIndex> {
        self.node_index.get(key).copied()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner.edge_weights()
    }

    /// Find the existing same-mode edge between `from` and `to`, if any.
    pub fn find_edge_with_mode(&self, from: &str, to: &str, mode: Mode) -> Option<EdgeIndex> {
        let from_idx = self.node_index.get(from)?;
        let to_idx = self.node_index.get(to)?;
        self.inner
            .edges_connecting(*from_idx, *to_idx)
            .find(|e| e.weight().mode == mode)
            .map(|e| e.id())
    }

    /// Insert `edge` between `from` and `to`, honoring the parallel-edge
    /// policy: at most one edge per `(from, to, mode)`, the lower
    /// [`Edge::quality_score`] wins. Both endpoints must already exist or the
    /// edge is skipped (and a warning logged), per `spec.md` section 3.
    ///
    /// Returns `true` if the edge was inserted or replaced an existing one.
    pub fn add_edge_if_better(&mut self, from: &str, to: &str, edge: Edge) -> bool {
        let Some(&from_idx) = self.node_index.get(from) else {
            tracing::warn!(from, to, "skipping edge; source node missing");
            return false;
        };
        let Some(&to_idx) = self.node_index.get(to) else {
            tracing::warn!(from, to, "skipping edge; destination node missing");
            return false;
        };

        if let Some(existing_id) = self.find_edge_with_mode(from, to, edge.mode) {
            let existing_score = self.inner[existing_id].quality_score();
            let new_score = edge.quality_score();
            if new_score < existing_score {
                self.inner[existing_id] = edge;
                true
            } else {
                false
            }
        } else {
            self.inner.add_edge(from_idx, to_idx, edge);
            true
        }
    }

    /// All (neighbor node, edge) pairs reachable directly from `key`.
    pub fn edges_from(&self, key: &str) -> Vec<(&Node, &Edge)> {
        let Some(&idx) = self.node_index.get(key) else {
            return vec![];
        };
        self.inner
            .edges(idx)
            .map(|e| (&self.inner[e.target()], e.weight()))
            .collect()
    }

    pub fn edge_count_by_mode(&self) -> HashMap<Mode, usize> {
        let mut counts = HashMap::new();
        for edge in self.inner.edge_weights() {
            *counts.entry(edge.mode).or_insert(0) += 1;
        }
        counts
    }

    /// Node keys whose `key` starts with `"{country}_"` (used for
    /// trade-neighbor expansion in `CoreFacade`).
    pub fn nodes_in_country(&self, country: &str) -> Vec<String> {
        let prefix = format!("{country}_");
        self.node_index.keys().filter(|k| k.starts_with(&prefix)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seaport(key: &str, country: &str, city: &str) -> Node {
        Node {
            key: key.to_string(),
            kind: NodeKind::Seaport,
            country: country.to_string(),
            city: city.to_string(),
            latitude: Some(1.0),
            longitude: Some(1.0),
            customs_score: Some(3.0),
            mean_port_dwell_time: Some(48.0),
            mean_turnaround_time: Some(24.0),
        }
    }

    fn sea_edge(cost_per_kg: f64, border_cost: f64, time_hours: f64) -> Edge {
        Edge {
            mode: Mode::Sea,
            distance_km: 1000.0,
            time_hours,
            transportation_cost_per_kg: Some(cost_per_kg),
            cost_per_km: None,
            border_cost,
            emissions_kg_per_tonne: 20.0,
            route: None,
        }
    }

    #[test]
    fn edge_skipped_when_endpoint_missing() {
        let mut g = Graph::new();
        g.add_node(seaport("A_X_Seaport", "A", "X"));
        assert!(!g.add_edge_if_better("A_X_Seaport", "B_Y_Seaport", sea_edge(1.0, 0.0, 10.0)));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn parallel_same_mode_edges_are_deduplicated() {
        let mut g = Graph::new();
        g.add_node(seaport("A_X_Seaport", "A", "X"));
        g.add_node(seaport("B_Y_Seaport", "B", "Y"));

        assert!(g.add_edge_if_better("A_X_Seaport", "B_Y_Seaport", sea_edge(1.0, 0.0, 10.0)));
        assert_eq!(g.edge_count(), 1);

        // Worse edge (higher score) is rejected.
        assert!(!g.add_edge_if_better("A_X_Seaport", "B_Y_Seaport", sea_edge(5.0, 0.0, 10.0)));
        assert_eq!(g.edge_count(), 1);

        // Better edge (lower score) replaces the existing one.
        assert!(g.add_edge_if_better("A_X_Seaport", "B_Y_Seaport", sea_edge(0.1, 0.0, 10.0)));
        assert_eq!(g.edge_count(), 1);
        let kept = g.find_edge_with_mode("A_X_Seaport", "B_Y_Seaport", Mode::Sea).unwrap();
        assert_eq!(g.inner[kept].transportation_cost_per_kg, Some(0.1));
    }

    #[test]
    fn distinct_modes_coexist_as_parallel_edges() {
        let mut g = Graph::new();
        g.add_node(seaport("A_X_Seaport", "A", "X"));
        g.add_node(seaport("B_Y_Seaport", "B", "Y"));

        g.add_edge_if_better("A_X_Seaport", "B_Y_Seaport", sea_edge(1.0, 0.0, 10.0));
        let mut road = sea_edge(1.0, 0.0, 10.0);
        road.mode = Mode::Road;
        road.transportation_cost_per_kg = None;
        road.cost_per_km = Some(0.5);
        g.add_edge_if_better("A_X_Seaport", "B_Y_Seaport", road);

        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn remove_node_clears_lookup_after_index_swap() {
        let mut g = Graph::new();
        g.add_node(seaport("A_X_Seaport", "A", "X"));
        g.add_node(seaport("B_Y_Seaport", "B", "Y"));
        g.remove_node("A_X_Seaport");
        assert!(!g.contains_node("A_X_Seaport"));
        assert!(g.contains_node("B_Y_Seaport"));
        assert_eq!(g.node_count(), 1);
    }
}
