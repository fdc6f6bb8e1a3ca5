//! VRoouty optimizer protocol and clients.
//!
//! VRoouty accepts jobs/shipments/vehicles plus distribution options and
//! returns per-vehicle routes of ordered, timed steps. The solver itself is
//! a remote service; this module only speaks its wire format.

mod vroouty;

pub use vroouty::{VRooutyClient, VRooutyConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::services::geo::haversine_distance;
use crate::types::Coordinate;

/// A single visit the optimizer must schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingJob {
    pub id: u64,
    pub location: Coordinate,
    /// Seconds before service can start (parking, building access).
    pub setup: u64,
    /// Seconds of on-site service.
    pub service: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// Paired pickup+delivery the optimizer must keep on one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingShipment {
    pub pickup: RoutingJob,
    pub delivery: RoutingJob,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingVehicle {
    pub id: u64,
    pub profile: String,
    pub start: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Coordinate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Toggle {
    pub enabled: bool,
}

/// Distribution options understood by VRoouty.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SolveOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_matrix: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equalize_work_time: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_vehicle_work_time: Option<u64>,
}

impl SolveOptions {
    pub fn custom_matrix() -> Self {
        Self {
            custom_matrix: Some(Toggle { enabled: true }),
            ..Self::default()
        }
    }

    pub fn equalize() -> Self {
        Self {
            equalize_work_time: Some(Toggle { enabled: true }),
            ..Self::default()
        }
    }

    pub fn equalize_capped(max_vehicle_work_time: u64) -> Self {
        Self {
            equalize_work_time: Some(Toggle { enabled: true }),
            max_vehicle_work_time: Some(max_vehicle_work_time),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveRequest {
    pub jobs: Vec<RoutingJob>,
    pub shipments: Vec<RoutingShipment>,
    pub vehicles: Vec<RoutingVehicle>,
    pub distribute_options: SolveOptions,
}

/// Step kinds VRoouty can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Start,
    Job,
    Pickup,
    Delivery,
    ShipmentPickup,
    ShipmentDelivery,
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingStep {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: StepKind,
    /// Seconds from wave start.
    pub arrival: u64,
    #[serde(default)]
    pub setup: u64,
    #[serde(default)]
    pub service: u64,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub distance: u64,
    pub location: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRoute {
    pub vehicle: u64,
    pub steps: Vec<RoutingStep>,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub setup: u64,
    #[serde(default)]
    pub service: u64,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub waiting_time: u64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub distance: u64,
    #[serde(default)]
    pub geometry: Option<String>,
}

/// Job the optimizer could not place. Parsed for logging; the dispatch
/// responses do not thread it through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingUnassigned {
    pub id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub unassigned: Vec<RoutingUnassigned>,
    pub routes: Vec<RoutingRoute>,
}

impl SolveResponse {
    /// Arrival of the first terminal `End` step across the response's
    /// routes, if any.
    pub fn terminal_arrival(&self) -> Option<u64> {
        self.routes
            .iter()
            .flat_map(|route| &route.steps)
            .find(|step| step.kind == StepKind::End)
            .map(|step| step.arrival)
    }
}

/// Optimizer RPC boundary.
///
/// A failed call (transport error, non-success status, undecodable body)
/// surfaces as `None`; the orchestrator decides whether that is fatal.
#[async_trait]
pub trait OptimizerClient: Send + Sync {
    async fn solve(&self, request: &SolveRequest) -> Option<SolveResponse>;

    /// Client name for logging.
    fn name(&self) -> &str;
}

/// Mock optimizer for tests and offline development.
///
/// Visits jobs in submission order (then shipment legs) and estimates travel
/// with haversine distance at a fixed road speed.
pub struct MockOptimizer {
    /// Coefficient for converting straight-line to road distance
    road_coefficient: f64,
    /// Average speed in km/h for time estimation
    average_speed_kmh: f64,
}

impl Default for MockOptimizer {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_kmh: 40.0,
        }
    }
}

impl MockOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn leg(&self, from: &Coordinate, to: &Coordinate) -> (u64, u64) {
        let road_km = haversine_distance(from, to) * self.road_coefficient;
        let seconds = (road_km / self.average_speed_kmh * 3600.0) as u64;
        let meters = (road_km * 1000.0) as u64;
        (seconds, meters)
    }
}

#[async_trait]
impl OptimizerClient for MockOptimizer {
    async fn solve(&self, request: &SolveRequest) -> Option<SolveResponse> {
        let vehicle = request.vehicles.first()?;

        let mut visits: Vec<(StepKind, &RoutingJob)> = request
            .jobs
            .iter()
            .map(|job| (StepKind::Job, job))
            .collect();
        for shipment in &request.shipments {
            visits.push((StepKind::ShipmentPickup, &shipment.pickup));
            visits.push((StepKind::ShipmentDelivery, &shipment.delivery));
        }

        let mut steps = vec![RoutingStep {
            id: None,
            kind: StepKind::Start,
            arrival: 0,
            setup: 0,
            service: 0,
            duration: 0,
            distance: 0,
            location: vehicle.start,
        }];

        let mut clock = 0u64;
        let mut travelled = 0u64;
        let mut position = vehicle.start;

        for (kind, job) in visits {
            let (seconds, meters) = self.leg(&position, &job.location);
            clock += seconds;
            travelled += meters;
            steps.push(RoutingStep {
                id: Some(job.id),
                kind,
                arrival: clock,
                setup: job.setup,
                service: job.service,
                duration: clock,
                distance: travelled,
                location: job.location,
            });
            clock += job.setup + job.service;
            position = job.location;
        }

        let end_location = vehicle.end.unwrap_or(position);
        let (seconds, meters) = self.leg(&position, &end_location);
        clock += seconds;
        travelled += meters;
        steps.push(RoutingStep {
            id: None,
            kind: StepKind::End,
            arrival: clock,
            setup: 0,
            service: 0,
            duration: clock,
            distance: travelled,
            location: end_location,
        });

        Some(SolveResponse {
            code: 0,
            unassigned: Vec::new(),
            routes: vec![RoutingRoute {
                vehicle: vehicle.id,
                steps,
                cost: clock as i64,
                setup: 0,
                service: 0,
                duration: clock,
                waiting_time: 0,
                priority: 0,
                distance: travelled,
                geometry: None,
            }],
        })
    }

    fn name(&self) -> &str {
        "MockOptimizer"
    }
}

/// Create the optimizer client from configuration. Without a configured URL
/// the worker runs against the built-in mock.
pub fn create_optimizer(url: Option<String>, timeout_seconds: u64) -> Box<dyn OptimizerClient> {
    match url {
        Some(url) => Box::new(VRooutyClient::new(VRooutyConfig {
            base_url: url,
            timeout_seconds,
        })),
        None => {
            tracing::warn!("VROOUTY_URL not configured, using mock optimizer");
            Box::new(MockOptimizer::new())
        }
    }
}
