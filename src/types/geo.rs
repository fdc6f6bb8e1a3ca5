use serde::{Deserialize, Serialize};

/// Geographic coordinate, serialized on the wire as a `[longitude, latitude]`
/// array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Bit-exact key for duplicate-location grouping and depot matching.
    /// Two stops are "the same place" only when the platform sent identical
    /// floats.
    pub fn bits(&self) -> (u64, u64) {
        (self.longitude.to_bits(), self.latitude.to_bits())
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coordinate: Coordinate) -> Self {
        [coordinate.longitude, coordinate.latitude]
    }
}

/// Delivery zone: a named polygon ring. Zones may overlap; containment is
/// resolved to the first matching zone in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub polygon: Vec<Coordinate>,
}
