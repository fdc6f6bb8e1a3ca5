//! Wave dispatch orchestration.
//!
//! One `WaveDispatcher` is built per inbound request and owns everything the
//! request touches: the works, the fleet, the depots, the work→vehicle
//! partition and the identity map. Two entry points: `before_wave` (initial
//! pickup routing with relay re-splitting) and `after_wave` (depot
//! rendezvous: a pickup and a delivery phase joined by load swaps).

mod after;
mod before;
mod reconcile;

use std::collections::HashMap;

use crate::error::DispatchError;
use crate::services::identity::{IdentityMap, Role};
use crate::services::optimizer::{RoutingJob, RoutingShipment, RoutingVehicle};
use crate::services::{partition, preprocess};
use crate::types::{Assembly, Coordinate, DispatchRequest, Vehicle, Work};

/// Per-request dispatch state.
#[derive(Debug)]
pub struct WaveDispatcher {
    works: Vec<Work>,
    vehicles: Vec<Vehicle>,
    assemblies: Vec<Assembly>,
    assigned: HashMap<String, Vec<usize>>,
    identity: IdentityMap,
}

impl WaveDispatcher {
    /// Validate, preprocess and partition a request.
    pub fn new(request: DispatchRequest) -> Result<Self, DispatchError> {
        validate(&request)?;

        let DispatchRequest {
            mut works,
            vehicles,
            assemblies,
            boundaries,
            ..
        } = request;

        preprocess::preprocess_works(&mut works, &boundaries);
        let assigned = partition::partition_works(&works, &vehicles)?;

        Ok(Self {
            works,
            vehicles,
            assemblies,
            assigned,
            identity: IdentityMap::new(),
        })
    }

    /// Canonical rendezvous depot: the first assembly of the request.
    fn depot(&self) -> &Assembly {
        &self.assemblies[0]
    }

    fn work_by_id(&self, id: &str) -> Option<&Work> {
        self.works.iter().find(|work| work.id == id)
    }

    fn assigned_works<'a>(&'a self, vehicle_id: &str) -> impl Iterator<Item = &'a Work> + 'a {
        self.assigned
            .get(vehicle_id)
            .into_iter()
            .flatten()
            .map(|&index| &self.works[index])
    }

    fn pickup_job(&self, work: &Work, priority: Option<u32>) -> RoutingJob {
        RoutingJob {
            id: self.identity.register(Role::Pickup, &work.id),
            location: work.pickup.location,
            setup: work.pickup.setup_time,
            service: work.pickup.service_time,
            priority,
        }
    }

    fn delivery_job(&self, work: &Work, priority: Option<u32>) -> RoutingJob {
        RoutingJob {
            id: self.identity.register(Role::Delivery, &work.id),
            location: work.delivery.location,
            setup: work.delivery.setup_time,
            service: work.delivery.service_time,
            priority,
        }
    }

    fn shipment(&self, work: &Work) -> RoutingShipment {
        RoutingShipment {
            pickup: RoutingJob {
                id: self.identity.register(Role::ShipmentPickup, &work.id),
                location: work.pickup.location,
                setup: work.pickup.setup_time,
                service: work.pickup.service_time,
                priority: None,
            },
            delivery: RoutingJob {
                id: self.identity.register(Role::ShipmentDelivery, &work.id),
                location: work.delivery.location,
                setup: work.delivery.setup_time,
                service: work.delivery.service_time,
                priority: None,
            },
        }
    }

    fn routing_vehicle(
        &self,
        vehicle: &Vehicle,
        start: Coordinate,
        end: Option<Coordinate>,
    ) -> RoutingVehicle {
        RoutingVehicle {
            id: self.identity.register(Role::Vehicle, &vehicle.id),
            profile: vehicle.profile.clone(),
            start,
            end,
        }
    }
}

fn validate(request: &DispatchRequest) -> Result<(), DispatchError> {
    if request.assemblies.is_empty() {
        return Err(DispatchError::Validation(
            "at least one assembly is required".to_string(),
        ));
    }

    for work in &request.works {
        if work.exception && work.fix_vehicle_id.is_none() {
            return Err(DispatchError::Validation(format!(
                "work {}: exception requires fix_vehicle_id",
                work.id
            )));
        }
    }

    Ok(())
}
