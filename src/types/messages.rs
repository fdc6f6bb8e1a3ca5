//! NATS message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Assembly, Vehicle, VehicleSwap, VehicleTaskList, Work, Zone};

/// Generic request wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<T> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

impl<T> Request<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Generic success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse<T> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(request_id: Uuid, payload: T) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(request_id: Uuid, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Inbound dispatch payload: the full fleet picture for one wave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub current_time: DateTime<Utc>,
    pub works: Vec<Work>,
    pub vehicles: Vec<Vehicle>,
    pub assemblies: Vec<Assembly>,
    pub boundaries: Vec<Zone>,
}

/// Before-cutoff wave result: one task list per vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeforeWaveResponse {
    pub vehicle_tasks: Vec<VehicleTaskList>,
    pub unassigned: Vec<String>,
}

/// After-cutoff wave result: pickup-phase plans, delivery-phase plans and
/// the depot load swaps joining them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AfterWaveResponse {
    pub before_tasks: Vec<VehicleTaskList>,
    pub after_tasks: Vec<VehicleTaskList>,
    pub swaps: Vec<VehicleSwap>,
}
