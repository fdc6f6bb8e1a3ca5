use serde::{Deserialize, Serialize};

use super::Coordinate;

fn default_profile() -> String {
    "car".to_string()
}

/// Fleet vehicle. `include` lists the zones the vehicle owns; `exclude`
/// lists zones it stays out of unless an override forces work onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    /// Routing profile understood by the optimizer (`car` or `atlan`).
    #[serde(default = "default_profile")]
    pub profile: String,
    pub current_location: Coordinate,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub home: Option<Coordinate>,
}

/// Assembly point (depot). The first assembly in a request is the canonical
/// rendezvous point for convoy synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assembly {
    pub id: String,
    pub location: Coordinate,
    #[serde(default)]
    pub capacity: i64,
}
