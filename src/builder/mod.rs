//! Graph construction: tabular inputs to canonical multi-digraph.
//!
//! Grounded on `src/data_processing/graph_builder.py`'s `GraphBuilder`
//! (`build_nodes`/`build_edges`/`add_intermodal_edges`/`add_dynamic_road`),
//! reusing the teacher's node-index-backed `Graph` for storage.

pub mod tables;

use std::collections::HashMap;

use crate::config::Defaults;
use crate::geo::{haversine_distance, Coordinates};
use crate::graph::{Edge, Graph, Mode, Node, NodeKind};
use crate::parsers::{parse_distance_km, parse_time_hours};

use tables::RawTables;

pub struct GraphBuilder;

struct BorderCosts {
    export: HashMap<String, f64>,
    import: HashMap<String, f64>,
}

impl BorderCosts {
    fn cost(&self, from_country: &str, to_country: &str, default: f64) -> f64 {
        if from_country == to_country {
            return 0.0;
        }
        let export = self.export.get(from_country).copied().unwrap_or(default);
        let import = self.import.get(to_country).copied().unwrap_or(default);
        export + import
    }
}

impl GraphBuilder {
    /// Build the static catalog graph from `tables`, applying
    /// `spec.md` section 4.2 steps 1-7 in order.
    pub fn build(tables: &RawTables, defaults: &Defaults) -> Graph {
        let mut graph = Graph::new();

        let logistics: HashMap<&str, &tables::LogisticsRow> =
            tables.logistics.iter().map(|r| (r.country.as_str(), r)).collect();

        // Step 1: seaport and airport nodes.
        for row in &tables.seaports {
            let key = format!("{}_{}_Seaport", row.country, row.city);
            let (customs_score, dwell, turnaround) = match logistics.get(row.country.as_str()) {
                Some(l) => (
                    l.customs_score.unwrap_or(3.0),
                    l.mean_port_dwell_time_days.unwrap_or(2.0) * 24.0,
                    l.mean_turnaround_time_days.unwrap_or(1.0) * 24.0,
                ),
                None => (3.0, 48.0, 24.0),
            };
            graph.add_node(Node {
                key,
                kind: NodeKind::Seaport,
                country: row.country.clone(),
                city: row.city.clone(),
                latitude: row.latitude,
                longitude: row.longitude,
                customs_score: Some(customs_score),
                mean_port_dwell_time: Some(dwell),
                mean_turnaround_time: Some(turnaround),
            });
        }

        for row in &tables.airports {
            let key = format!("{}_{}_Airport", row.country, row.city);
            graph.add_node(Node {
                key,
                kind: NodeKind::Airport,
                country: row.country.clone(),
                city: row.city.clone(),
                latitude: row.latitude,
                longitude: row.longitude,
                customs_score: None,
                mean_port_dwell_time: None,
                mean_turnaround_time: None,
            });
        }

        // Step 2: IATA -> (country, city) index, for flight endpoint resolution.
        let mut iata_to_city: HashMap<&str, (&str, &str)> = HashMap::new();
        for row in &tables.airports {
            if let Some(iata) = row.iata.as_deref() {
                iata_to_city.insert(iata, (row.country.as_str(), row.city.as_str()));
            }
        }

        let border = BorderCosts {
            export: tables
                .trade
                .iter()
                .filter_map(|r| r.export_border_cost.map(|c| (r.country.clone(), c)))
                .collect(),
            import: tables
                .trade
                .iter()
                .filter_map(|r| r.import_border_cost.map(|c| (r.country.clone(), c)))
                .collect(),
        };

        let carbon: HashMap<&str, f64> = tables
            .carbon_emission
            .iter()
            .map(|r| (r.mode_of_transport.as_str(), r.emission_factor_g_per_tonne_km / 1000.0))
            .collect();
        let sea_factor = carbon.get("Sea Freight").copied().unwrap_or(0.0);
        let air_factor = carbon.get("Air Freight").copied().unwrap_or(0.0);
        let road_factor = carbon.get("Road Freight").copied().unwrap_or(defaults.road_emission_factor / 1000.0);

        // Step 3: sea edges.
        for row in &tables.ships {
            let node_a = format!("{}_{}_Seaport", row.country_a, row.port_a);
            let node_b = format!("{}_{}_Seaport", row.country_b, row.port_b);
            let distance = parse_distance_km(&row.distance, defaults.fallback_distance_km);
            let dwell = graph.get_node(&node_b).and_then(|n| n.mean_port_dwell_time).unwrap_or(0.0);
            let time = parse_time_hours(&row.time, defaults.fallback_time_hours) + dwell;
            let cost_per_kg = row.price_per_kg.unwrap_or(defaults.sea_cost_per_kg);
            let border_cost = border.cost(&row.country_a, &row.country_b, defaults.border_cost);

            graph.add_edge_if_better(
                &node_a,
                &node_b,
                Edge {
                    mode: Mode::Sea,
                    distance_km: distance,
                    time_hours: time,
                    transportation_cost_per_kg: Some(cost_per_kg),
                    cost_per_km: None,
                    border_cost,
                    emissions_kg_per_tonne: distance * sea_factor,
                    route: row.route.clone(),
                },
            );
        }

        // Step 4: air edges.
        for row in &tables.flights {
            let (from_country, from_city) = iata_to_city
                .get(row.from_iata.as_str())
                .map(|&(c, ci)| (c.to_string(), ci.to_string()))
                .unwrap_or_else(|| (row.from_country.clone(), row.from_iata.clone()));
            let (to_country, to_city) = iata_to_city
                .get(row.to_iata.as_str())
                .map(|&(c, ci)| (c.to_string(), ci.to_string()))
                .unwrap_or_else(|| (row.to_country.clone(), row.to_iata.clone()));

            let node_a = format!("{from_country}_{from_city}_Airport");
            let node_b = format!("{to_country}_{to_city}_Airport");
            let distance = parse_distance_km(&row.distance_km, defaults.fallback_distance_km);
            let time = parse_time_hours(&row.flight_time_minutes, defaults.fallback_time_hours * 60.0) / 60.0;
            let border_cost = border.cost(&row.from_country, &row.to_country, defaults.border_cost);

            graph.add_edge_if_better(
                &node_a,
                &node_b,
                Edge {
                    mode: Mode::Air,
                    distance_km: distance,
                    time_hours: time,
                    transportation_cost_per_kg: Some(row.cost_per_kg),
                    cost_per_km: None,
                    border_cost,
                    emissions_kg_per_tonne: distance * air_factor,
                    route: None,
                },
            );
        }

        // Step 5: seaport <-> airport same-country road connectors.
        for row in &tables.seaport_airport_connect {
            let node_a = format!("{}_{}_Seaport", row.port_country, row.port_city);
            let node_b = format!("{}_{}_Airport", row.port_country, row.airport_city);
            let distance = parse_distance_km(&row.distance, defaults.fallback_distance_km);
            let time = parse_time_hours(&row.time, defaults.fallback_time_hours);
            let cost_per_km = row.cost_usd / 1000.0;

            graph.add_edge_if_better(
                &node_a,
                &node_b,
                Edge {
                    mode: Mode::Road,
                    distance_km: distance,
                    time_hours: time,
                    transportation_cost_per_kg: None,
                    cost_per_km: Some(cost_per_km),
                    border_cost: 0.0,
                    emissions_kg_per_tonne: distance * road_factor,
                    route: None,
                },
            );
        }

        // Step 6: cross-country trade-neighbor road edges.
        let mut trade_neighbours: HashMap<String, Vec<String>> = HashMap::new();
        for row in &tables.trade_neighbour {
            let neighbours = match row.trade_neighbors_country.as_deref() {
                None | Some("None") => vec![],
                Some(list) => list.split(';').map(|s| s.trim().to_string()).collect(),
            };
            trade_neighbours.insert(row.country.clone(), neighbours);
        }

        for (country, neighbours) in &trade_neighbours {
            for neighbour in neighbours {
                let country_nodes = graph.nodes_in_country(country);
                let neighbour_nodes = graph.nodes_in_country(neighbour);
                for n1 in &country_nodes {
                    for n2 in &neighbour_nodes {
                        if n1 == n2 {
                            continue;
                        }
                        let (Some(c1), Some(c2)) = (
                            graph.get_node(n1).and_then(node_coords),
                            graph.get_node(n2).and_then(node_coords),
                        ) else {
                            continue;
                        };
                        let distance = haversine_distance(c1, c2);
                        if distance > defaults.max_road_distance_km {
                            continue;
                        }
                        let time = distance / defaults.fallback_speed_km_h;
                        let border_cost = border.cost(country, neighbour, defaults.border_cost);

                        graph.add_edge_if_better(
                            n1,
                            n2,
                            Edge {
                                mode: Mode::Road,
                                distance_km: distance,
                                time_hours: time,
                                transportation_cost_per_kg: None,
                                cost_per_km: Some(defaults.road_cost_per_km),
                                border_cost,
                                emissions_kg_per_tonne: distance * road_factor,
                                route: None,
                            },
                        );
                    }
                }
            }
        }

        // Step 7: intermodal edges, same-city same-country seaport <-> airport.
        let seaport_keys: Vec<String> = graph
            .nodes()
            .filter(|n| n.kind == NodeKind::Seaport)
            .map(|n| n.key.clone())
            .collect();
        for seaport_key in seaport_keys {
            let seaport = graph.get_node(&seaport_key).expect("key from nodes() must resolve");
            let airport_key = format!("{}_{}_Airport", seaport.country, seaport.city);
            if !graph.contains_node(&airport_key) {
                continue;
            }
            let dwell = seaport.mean_port_dwell_time.unwrap_or(defaults.dwell_time);
            let intermodal_edge = || Edge {
                mode: Mode::Intermodal,
                distance_km: 0.0,
                time_hours: dwell,
                transportation_cost_per_kg: Some(0.0),
                cost_per_km: None,
                border_cost: 0.0,
                emissions_kg_per_tonne: 0.0,
                route: None,
            };
            graph.add_edge_if_better(&seaport_key, &airport_key, intermodal_edge());
            graph.add_edge_if_better(&airport_key, &seaport_key, intermodal_edge());
        }

        graph
    }

    /// Splice the two request-scoped ephemeral nodes (origin and
    /// destination) into `graph`, with bidirectional road edges to the
    /// geographically nearest seaport and airport within each node's
    /// declared country, per `add_dynamic_road`.
    ///
    /// Returns `(start_key, end_key)`.
    pub fn splice_ephemeral(
        graph: &mut Graph,
        start: Coordinates,
        end: Coordinates,
        start_country: &str,
        end_country: &str,
        defaults: &Defaults,
    ) -> (String, String) {
        let start_key = format!("Custom_{}_{}_Start", start.lat, start.lon);
        let end_key = format!("Custom_{}_{}_End", end.lat, end.lon);

        graph.add_node(Node {
            key: start_key.clone(),
            kind: NodeKind::Start,
            country: "Unknown".to_string(),
            city: "Custom".to_string(),
            latitude: Some(start.lat),
            longitude: Some(start.lon),
            customs_score: None,
            mean_port_dwell_time: None,
            mean_turnaround_time: None,
        });
        graph.add_node(Node {
            key: end_key.clone(),
            kind: NodeKind::End,
            country: "Unknown".to_string(),
            city: "Custom".to_string(),
            latitude: Some(end.lat),
            longitude: Some(end.lon),
            customs_score: None,
            mean_port_dwell_time: None,
            mean_turnaround_time: None,
        });

        splice_roads(graph, &start_key, start, start_country, defaults);
        splice_roads(graph, &end_key, end, end_country, defaults);

        (start_key, end_key)
    }
}

fn node_coords(node: &Node) -> Option<Coordinates> {
    crate::geo::node_coords(node)
}

fn nearest_in_country(graph: &Graph, location: Coordinates, country: &str) -> (Option<String>, Option<String>) {
    let mut nearest_seaport: Option<(String, f64)> = None;
    let mut nearest_airport: Option<(String, f64)> = None;

    for node in graph.nodes() {
        if node.country != country {
            continue;
        }
        let Some(coords) = node_coords(node) else {
            continue;
        };
        let distance = haversine_distance(location, coords);
        match node.kind {
            NodeKind::Seaport => {
                if nearest_seaport.as_ref().map(|(_, d)| distance < *d).unwrap_or(true) {
                    nearest_seaport = Some((node.key.clone(), distance));
                }
            }
            NodeKind::Airport => {
                if nearest_airport.as_ref().map(|(_, d)| distance < *d).unwrap_or(true) {
                    nearest_airport = Some((node.key.clone(), distance));
                }
            }
            _ => {}
        }
    }

    (nearest_seaport.map(|(k, _)| k), nearest_airport.map(|(k, _)| k))
}

fn splice_roads(graph: &mut Graph, ephemeral_key: &str, location: Coordinates, country: &str, defaults: &Defaults) {
    let (seaport, airport) = nearest_in_country(graph, location, country);
    for nearest in [seaport, airport].into_iter().flatten() {
        let Some(coords) = graph.get_node(&nearest).and_then(node_coords) else {
            continue;
        };
        let distance = haversine_distance(location, coords);
        let time = distance / defaults.fallback_speed_km_h;
        let edge = || Edge {
            mode: Mode::Road,
            distance_km: distance,
            time_hours: time,
            transportation_cost_per_kg: None,
            cost_per_km: Some(defaults.road_cost_per_km),
            border_cost: 0.0,
            emissions_kg_per_tonne: distance * (defaults.road_emission_factor / 1000.0),
            route: None,
        };
        graph.add_edge_if_better(ephemeral_key, &nearest, edge());
        graph.add_edge_if_better(&nearest, ephemeral_key, edge());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tables::read_csv_reader;

    fn sample_tables() -> RawTables {
        let seaports = "Country,City,Latitude,Longitude\n\
US,Newark,40.735,-74.15\n\
UK,Felixstowe,51.96,1.35\n";
        let airports = "Country,City,IATA,Latitude,Longitude\n\
US,Newark,EWR,40.69,-74.17\n\
UK,London,LHR,51.47,-0.45\n";
        let ships = "Country_A,Port_A,Country_B,Port_B,Distance,Time,Price_Per_kg,Route\n\
US,Newark,UK,Felixstowe,5500 km,240,0.02,Transatlantic\n\
US,Newark,UK,Felixstowe,5500 km,240,0.05,Transatlantic\n";
        let flights = "From_IATA,From_Country,To_IATA,To_Country,Distance_km,Flight_Time_Minutes,Cost_Per_Kg\n\
EWR,US,LHR,UK,5585,420,1.5\n";
        let connect = "Port_Country,Port_City,City,Distance,Time,Cost_USD\n\
US,Newark,Newark,20,1,40\n";
        let trade = "Country,Cost to export: Border compliance (USD),Cost to import: Border compliance (USD)\n\
US,25,25\nUK,25,25\n";
        let logistics = "Country,Customs Score,Mean Port Dwell Time (days),Mean Turnaround Time at Port (days)\n\
US,2.5,2,1\nUK,3.5,3,1.5\n";
        let carbon = "Mode of Transport,Emission Factor (g CO\u{2082}/tonne-km)\n\
Sea Freight,20\nAir Freight,800\nRoad Freight,169\n";
        let trade_neighbour = "Country,Trade_Neighbors_Country\nUS,None\nUK,None\n";

        RawTables::from_tables(
            read_csv_reader(Cursor::new(seaports), "seaports.csv").unwrap(),
            read_csv_reader(Cursor::new(airports), "airports.csv").unwrap(),
            read_csv_reader(Cursor::new(ships), "ships.csv").unwrap(),
            read_csv_reader(Cursor::new(flights), "flights.csv").unwrap(),
            read_csv_reader(Cursor::new(connect), "seaport_airport_connect.csv").unwrap(),
            read_csv_reader(Cursor::new(trade), "trade.csv").unwrap(),
            read_csv_reader(Cursor::new(logistics), "logistics.csv").unwrap(),
            read_csv_reader(Cursor::new(carbon), "carbon_emission.csv").unwrap(),
            read_csv_reader(Cursor::new(trade_neighbour), "trade_neighbour.csv").unwrap(),
        )
    }

    #[test]
    fn duplicate_sea_lane_keeps_lower_quality_score() {
        let defaults = Defaults::default();
        let graph = GraphBuilder::build(&sample_tables(), &defaults);
        assert!(graph
            .find_edge_with_mode("US_Newark_Seaport", "UK_Felixstowe_Seaport", Mode::Sea)
            .is_some());

        // The second row (cost 0.05) scores worse than the first (cost 0.02);
        // the lower-cost edge must be retained.
        let mut found_cost = None;
        for (neighbor, edge) in graph.edges_from("US_Newark_Seaport") {
            if neighbor.key == "UK_Felixstowe_Seaport" && edge.mode == Mode::Sea {
                found_cost = edge.transportation_cost_per_kg;
            }
        }
        assert_eq!(found_cost, Some(0.02));
    }

    #[test]
    fn intermodal_edges_are_symmetric_and_equal_time() {
        let defaults = Defaults::default();
        let graph = GraphBuilder::build(&sample_tables(), &defaults);
        let seaport_key = "US_Newark_Seaport";
        let airport_key = "US_Newark_Airport";

        let forward = graph.find_edge_with_mode(seaport_key, airport_key, Mode::Intermodal);
        let backward = graph.find_edge_with_mode(airport_key, seaport_key, Mode::Intermodal);
        assert!(forward.is_some() && backward.is_some());

        let dwell = graph.get_node(seaport_key).unwrap().mean_port_dwell_time.unwrap();
        for (neighbor, edge) in graph.edges_from(seaport_key) {
            if neighbor.key == airport_key {
                assert_eq!(edge.time_hours, dwell);
            }
        }
        for (neighbor, edge) in graph.edges_from(airport_key) {
            if neighbor.key == seaport_key {
                assert_eq!(edge.time_hours, dwell);
            }
        }
    }

    #[test]
    fn splice_ephemeral_adds_bidirectional_road_edges_within_country() {
        let defaults = Defaults::default();
        let mut graph = GraphBuilder::build(&sample_tables(), &defaults);
        let (start_key, end_key) =
            GraphBuilder::splice_ephemeral(&mut graph, Coordinates::new(40.70, -74.20), Coordinates::new(51.50, -0.10), "US", "UK", &defaults);

        assert!(!graph.edges_from(&start_key).is_empty());
        assert!(!graph.edges_from(&end_key).is_empty());
        for (_, edge) in graph.edges_from(&start_key) {
            assert_eq!(edge.mode, Mode::Road);
        }
    }

    #[test]
    fn splice_ephemeral_with_no_nodes_in_country_yields_no_edges() {
        let defaults = Defaults::default();
        let mut graph = GraphBuilder::build(&sample_tables(), &defaults);
        let (start_key, _) = GraphBuilder::splice_ephemeral(
            &mut graph,
            Coordinates::new(0.0, 0.0),
            Coordinates::new(51.50, -0.10),
            "Nowhere",
            "UK",
            &defaults,
        );
        assert!(graph.edges_from(&start_key).is_empty());
    }
}
