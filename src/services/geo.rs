//! Geographic calculations

use crate::types::{Coordinate, Zone};

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Ray-casting point-in-polygon test.
///
/// Points exactly on an edge may resolve to either side; ring orientation
/// does not matter and the ring does not need to repeat its first vertex.
pub fn polygon_contains(ring: &[Coordinate], point: &Coordinate) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);

        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Id of the first zone whose polygon contains the point, in iteration
/// order. Overlapping zones resolve to the earlier one; no containment
/// yields `None`.
pub fn assign_zone_id(zones: &[Zone], point: &Coordinate) -> Option<String> {
    zones
        .iter()
        .find(|zone| polygon_contains(&zone.polygon, point))
        .map(|zone| zone.id.clone())
}

/// Haversine distance between two points in kilometers.
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: &str, west: f64, south: f64, east: f64, north: f64) -> Zone {
        Zone {
            id: id.to_string(),
            polygon: vec![
                Coordinate::new(west, south),
                Coordinate::new(east, south),
                Coordinate::new(east, north),
                Coordinate::new(west, north),
            ],
        }
    }

    #[test]
    fn test_polygon_contains_inside_and_outside() {
        let zone = square("A-0", 126.2, 33.2, 126.6, 33.5);

        assert!(polygon_contains(
            &zone.polygon,
            &Coordinate::new(126.4, 33.3)
        ));
        assert!(!polygon_contains(
            &zone.polygon,
            &Coordinate::new(126.8, 33.3)
        ));
        assert!(!polygon_contains(
            &zone.polygon,
            &Coordinate::new(126.4, 33.7)
        ));
    }

    #[test]
    fn test_polygon_contains_degenerate_ring() {
        let line = vec![Coordinate::new(126.2, 33.2), Coordinate::new(126.6, 33.5)];
        assert!(!polygon_contains(&line, &Coordinate::new(126.4, 33.3)));
    }

    #[test]
    fn test_assign_zone_id_first_match_wins_on_overlap() {
        let zones = vec![
            square("A-0", 126.2, 33.2, 126.6, 33.5),
            square("B-0", 126.3, 33.2, 126.9, 33.5),
        ];

        // Inside both; the earlier zone takes it.
        assert_eq!(
            assign_zone_id(&zones, &Coordinate::new(126.4, 33.3)).as_deref(),
            Some("A-0")
        );
        // Inside only the second.
        assert_eq!(
            assign_zone_id(&zones, &Coordinate::new(126.8, 33.3)).as_deref(),
            Some("B-0")
        );
    }

    #[test]
    fn test_assign_zone_id_no_containment() {
        let zones = vec![square("A-0", 126.2, 33.2, 126.6, 33.5)];
        assert!(assign_zone_id(&zones, &Coordinate::new(127.5, 34.5)).is_none());
    }

    #[test]
    fn test_haversine_jeju_city_to_seogwipo() {
        let jeju_city = Coordinate::new(126.5312, 33.4996);
        let seogwipo = Coordinate::new(126.5600, 33.2541);

        let distance = haversine_distance(&jeju_city, &seogwipo);

        // Roughly 27 km across the island.
        assert!((distance - 27.0).abs() < 3.0, "got {} km", distance);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinate::new(126.5, 33.5);
        assert!(haversine_distance(&point, &point).abs() < 0.001);
    }
}
