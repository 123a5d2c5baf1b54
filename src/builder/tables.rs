//! Raw CSV row shapes and the loaded table bundle.
//!
//! Grounded on `src/data_processing/graph_builder.py`'s `load_data` for the
//! file names and column headers, and on the teacher pack's
//! `dt-schedule/src/loader.rs` for the dual `from_dir` (filesystem) /
//! `from_tables` (in-memory, for tests) constructor split.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct SeaportRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirportRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "IATA")]
    pub iata: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShipRow {
    #[serde(rename = "Country_A")]
    pub country_a: String,
    #[serde(rename = "Port_A")]
    pub port_a: String,
    #[serde(rename = "Country_B")]
    pub country_b: String,
    #[serde(rename = "Port_B")]
    pub port_b: String,
    #[serde(rename = "Distance")]
    pub distance: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Price_Per_kg")]
    pub price_per_kg: Option<f64>,
    #[serde(rename = "Route")]
    pub route: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlightRow {
    #[serde(rename = "From_IATA")]
    pub from_iata: String,
    #[serde(rename = "From_Country")]
    pub from_country: String,
    #[serde(rename = "To_IATA")]
    pub to_iata: String,
    #[serde(rename = "To_Country")]
    pub to_country: String,
    #[serde(rename = "Distance_km")]
    pub distance_km: String,
    #[serde(rename = "Flight_Time_Minutes")]
    pub flight_time_minutes: String,
    #[serde(rename = "Cost_Per_Kg")]
    pub cost_per_kg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeaportAirportConnectRow {
    #[serde(rename = "Port_Country")]
    pub port_country: String,
    #[serde(rename = "Port_City")]
    pub port_city: String,
    #[serde(rename = "City")]
    pub airport_city: String,
    #[serde(rename = "Distance")]
    pub distance: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Cost_USD")]
    pub cost_usd: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Cost to export: Border compliance (USD)")]
    pub export_border_cost: Option<f64>,
    #[serde(rename = "Cost to import: Border compliance (USD)")]
    pub import_border_cost: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticsRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Customs Score")]
    pub customs_score: Option<f64>,
    #[serde(rename = "Mean Port Dwell Time (days)")]
    pub mean_port_dwell_time_days: Option<f64>,
    #[serde(rename = "Mean Turnaround Time at Port (days)")]
    pub mean_turnaround_time_days: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarbonEmissionRow {
    #[serde(rename = "Mode of Transport")]
    pub mode_of_transport: String,
    #[serde(rename = "Emission Factor (g CO\u{2082}/tonne-km)")]
    pub emission_factor_g_per_tonne_km: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeNeighbourRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Trade_Neighbors_Country")]
    pub trade_neighbors_country: Option<String>,
}

/// All raw tables needed to build a [`crate::graph::Graph`].
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub seaports: Vec<SeaportRow>,
    pub airports: Vec<AirportRow>,
    pub ships: Vec<ShipRow>,
    pub flights: Vec<FlightRow>,
    pub seaport_airport_connect: Vec<SeaportAirportConnectRow>,
    pub trade: Vec<TradeRow>,
    pub logistics: Vec<LogisticsRow>,
    pub carbon_emission: Vec<CarbonEmissionRow>,
    pub trade_neighbour: Vec<TradeNeighbourRow>,
}

impl RawTables {
    /// Build a `RawTables` directly from already-deserialized rows, with no
    /// filesystem access. Used by tests to assemble small synthetic worlds
    /// in-memory, mirroring `from_dir`'s field order.
    #[allow(clippy::too_many_arguments)]
    pub fn from_tables(
        seaports: Vec<SeaportRow>,
        airports: Vec<AirportRow>,
        ships: Vec<ShipRow>,
        flights: Vec<FlightRow>,
        seaport_airport_connect: Vec<SeaportAirportConnectRow>,
        trade: Vec<TradeRow>,
        logistics: Vec<LogisticsRow>,
        carbon_emission: Vec<CarbonEmissionRow>,
        trade_neighbour: Vec<TradeNeighbourRow>,
    ) -> Self {
        RawTables {
            seaports,
            airports,
            ships,
            flights,
            seaport_airport_connect,
            trade,
            logistics,
            carbon_emission,
            trade_neighbour,
        }
    }

    /// Load all nine tables from `nodes_dir`/`edges_dir`, matching the
    /// layout in `spec.md` section 6 (`seaports.csv`, `airports.csv` under
    /// nodes; the rest under edges).
    pub fn from_dir(nodes_dir: &Path, edges_dir: &Path) -> Result<Self, CoreError> {
        Ok(RawTables {
            seaports: read_csv(&nodes_dir.join("seaports.csv"))?,
            airports: read_csv(&nodes_dir.join("airports.csv"))?,
            ships: read_csv(&edges_dir.join("ships.csv"))?,
            flights: read_csv(&edges_dir.join("flights.csv"))?,
            seaport_airport_connect: read_csv(&edges_dir.join("seaport_airport_connect.csv"))?,
            trade: read_csv(&edges_dir.join("trade.csv"))?,
            logistics: read_csv(&edges_dir.join("logistics.csv"))?,
            carbon_emission: read_csv(&edges_dir.join("carbon_emission.csv"))?,
            trade_neighbour: read_csv(&edges_dir.join("trade_neighbour.csv"))?,
        })
    }
}

fn read_csv<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, CoreError> {
    let file = std::fs::File::open(path).map_err(|source| CoreError::MissingTable {
        path: path.display().to_string(),
        source,
    })?;
    read_csv_reader(file, &path.display().to_string())
}

/// Parse rows from any [`Read`] source. Used directly by tests to build
/// [`RawTables`] from in-memory CSV strings instead of on-disk fixtures.
pub fn read_csv_reader<T: for<'de> Deserialize<'de>, R: Read>(
    reader: R,
    label: &str,
) -> Result<Vec<T>, CoreError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|source| CoreError::MalformedTable {
            path: label.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn seaport_row_parses_with_missing_coordinates() {
        let csv = "Country,City,Latitude,Longitude\nUS,Newark,,\n";
        let rows: Vec<SeaportRow> = read_csv_reader(Cursor::new(csv), "seaports.csv").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "US");
        assert!(rows[0].latitude.is_none());
    }

    #[test]
    fn trade_neighbour_row_allows_blank_neighbours() {
        let csv = "Country,Trade_Neighbors_Country\nUS,\n";
        let rows: Vec<TradeNeighbourRow> =
            read_csv_reader(Cursor::new(csv), "trade_neighbour.csv").unwrap();
        assert_eq!(rows[0].trade_neighbors_country, None);
    }

    #[test]
    fn malformed_row_surfaces_as_core_error() {
        let csv = "Country,City,Latitude,Longitude\nUS,Newark,not-a-number,0.0\n";
        let result: Result<Vec<SeaportRow>, CoreError> =
            read_csv_reader(Cursor::new(csv), "seaports.csv");
        assert!(matches!(result, Err(CoreError::MalformedTable { .. })));
    }
}
