use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Normalized stop kinds surfaced to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Pickup,
    Delivery,
    ShipmentPickup,
    ShipmentDelivery,
    /// Terminal stop at an assembly point.
    Arrival,
}

/// A single stop on a vehicle's plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub work_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// Seconds from wave start until arrival at this stop.
    pub eta: u64,
    pub duration: u64,
    pub distance: u64,
    pub setup_time: u64,
    pub service_time: u64,
    pub assembly_id: Option<String>,
    pub location: Coordinate,
}

/// Ordered plan for one vehicle, rebuilt from scratch on every
/// reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleTaskList {
    pub vehicle_id: String,
    pub tasks: Vec<Task>,
}

/// Load-swap instruction for the depot stopover between the pickup and
/// delivery phases: work ids to load (`up`) and unload (`down`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSwap {
    pub vehicle_id: String,
    pub assembly_id: String,
    /// Shared rendezvous time; identical for every vehicle in the wave.
    pub stopover_time: u64,
    pub up: Vec<String>,
    pub down: Vec<String>,
}
