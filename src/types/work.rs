use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Work lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// No action yet; the parcel sits at `pickup.location`.
    Waiting,
    /// Aboard the vehicle named in `Status::vehicle_id`.
    Shipped,
    /// Set down off-vehicle (breakdown etc.); another vehicle must take over.
    Stopped,
    /// Delivered.
    Done,
}

/// Current whereabouts of a work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "type")]
    pub status: WorkStatus,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            status: WorkStatus::Waiting,
            vehicle_id: None,
            location: None,
        }
    }
}

/// One side of a work: where it is picked up or dropped off.
///
/// `setup_time`/`service_time` are stamped by the preprocessor before any
/// optimizer call; caller-supplied values are overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkPoint {
    pub location: Coordinate,
    #[serde(default)]
    pub setup_time: u64,
    #[serde(default)]
    pub service_time: u64,
    #[serde(default)]
    pub zone_id: Option<String>,
}

/// A delivery order: pick up at one point, drop off at another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    pub id: String,
    pub pickup: WorkPoint,
    pub delivery: WorkPoint,
    /// Capacity units, passed through from the platform untouched.
    #[serde(default)]
    pub amount: Option<Vec<i64>>,
    #[serde(default)]
    pub status: Status,
    /// Manual override: ignore zone ownership and force `fix_vehicle_id`.
    #[serde(default)]
    pub exception: bool,
    #[serde(default)]
    pub fix_vehicle_id: Option<String>,
}

impl Work {
    pub fn is_waiting(&self) -> bool {
        self.status.status == WorkStatus::Waiting
    }

    pub fn is_shipped(&self) -> bool {
        self.status.status == WorkStatus::Shipped
    }

    pub fn is_done(&self) -> bool {
        self.status.status == WorkStatus::Done
    }

    /// True when this work is aboard the given vehicle.
    pub fn carried_by(&self, vehicle_id: &str) -> bool {
        self.is_shipped() && self.status.vehicle_id.as_deref() == Some(vehicle_id)
    }
}
