//! Great-circle distance and coordinate extraction.
//!
//! Grounded on the reference implementation's `haversine_distance` (present
//! nearly verbatim in both `src/utils/helpers.py` and
//! `src/utils/geocoding.py`) and generalized to operate on this crate's
//! `Node` type via [`node_coords`].

use crate::graph::Node;

/// Earth radius in kilometers, matching the reference implementation.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinates { lat, lon }
    }
}

/// Great-circle distance between two coordinates, in kilometers.
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Extract `(latitude, longitude)` from a node, if present.
pub fn node_coords(node: &Node) -> Option<Coordinates> {
    match (node.latitude, node.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinates::new(40.7128, -74.0060);
        assert!(haversine_distance(p, p).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(40.7128, -74.0060);
        let b = Coordinates::new(51.5074, -0.1278);
        assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-9);
    }

    #[test]
    fn satisfies_triangle_inequality() {
        let a = Coordinates::new(40.7128, -74.0060); // New York
        let b = Coordinates::new(51.5074, -0.1278); // London
        let c = Coordinates::new(35.6762, 139.6503); // Tokyo

        let ab = haversine_distance(a, b);
        let bc = haversine_distance(b, c);
        let ac = haversine_distance(a, c);

        assert!(ac <= ab + bc + 1e-6);
    }

    #[test]
    fn known_distance_new_york_to_london_is_plausible() {
        let ny = Coordinates::new(40.7128, -74.0060);
        let london = Coordinates::new(51.5074, -0.1278);
        let d = haversine_distance(ny, london);
        // Great-circle distance is ~5570km; allow generous tolerance.
        assert!((d - 5570.0).abs() < 50.0, "unexpected distance: {d}");
    }
}
