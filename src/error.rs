//! Dispatch error taxonomy.

use thiserror::Error;

/// Failures a dispatch request can surface to the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed input, rejected before any optimizer call is issued.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A work could not be routed to any vehicle.
    #[error("work {work_id} cannot be assigned: {reason}")]
    Assignment { work_id: String, reason: String },

    /// A mandatory (second-round) optimizer call failed.
    #[error("optimizer call failed for vehicle {vehicle_id}")]
    OptimizerFailure { vehicle_id: String },

    /// The optimizer echoed an id this request never issued.
    #[error("unknown routing id {0} in optimizer response")]
    IdentityResolution(u64),
}

impl DispatchError {
    /// Error code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "INVALID_REQUEST",
            DispatchError::Assignment { .. } => "ASSIGNMENT_ERROR",
            DispatchError::OptimizerFailure { .. } => "OPTIMIZER_ERROR",
            DispatchError::IdentityResolution(_) => "PROTOCOL_ERROR",
        }
    }
}
