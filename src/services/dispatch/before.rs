//! Before-cutoff wave: initial pickup routing with relay re-splitting.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::WaveDispatcher;
use crate::defaults::RELAY_VEHICLE_TIME;
use crate::error::DispatchError;
use crate::services::optimizer::{OptimizerClient, SolveOptions, SolveRequest, SolveResponse};
use crate::types::{BeforeWaveResponse, Vehicle, WorkStatus};

impl WaveDispatcher {
    /// Run the before-cutoff wave.
    ///
    /// First round: one pickup-routing call per vehicle with waiting work,
    /// all in flight at once; a failed call drops that vehicle from the
    /// pass. Second round: every route finishing under the relay threshold
    /// is re-derived with a richer job/shipment set and re-solved; a failure
    /// there fails the whole wave.
    pub async fn before_wave(
        &self,
        optimizer: &dyn OptimizerClient,
    ) -> Result<BeforeWaveResponse, DispatchError> {
        info!(
            works = self.works.len(),
            vehicles = self.vehicles.len(),
            optimizer = optimizer.name(),
            "Starting before-cutoff wave"
        );

        let mut calls = Vec::new();
        for vehicle in &self.vehicles {
            let Some(request) = self.initial_request(vehicle) else {
                debug!(vehicle_id = %vehicle.id, "No waiting work, skipping vehicle");
                continue;
            };
            calls.push(async move { (vehicle, optimizer.solve(&request).await) });
        }

        let mut responses: HashMap<String, SolveResponse> = HashMap::new();
        let mut resplit: Vec<&Vehicle> = Vec::new();
        for (vehicle, response) in join_all(calls).await {
            let Some(response) = response else {
                warn!(vehicle_id = %vehicle.id, "No optimizer result, vehicle dropped from wave");
                continue;
            };
            if response
                .terminal_arrival()
                .is_some_and(|arrival| arrival < RELAY_VEHICLE_TIME)
            {
                debug!(vehicle_id = %vehicle.id, "Route finished under relay threshold, re-splitting");
                resplit.push(vehicle);
            }
            responses.insert(vehicle.id.clone(), response);
        }

        let resplit_calls: Vec<_> = resplit
            .into_iter()
            .map(|vehicle| {
                let request = self.resplit_request(vehicle);
                async move { (vehicle, optimizer.solve(&request).await) }
            })
            .collect();
        for (vehicle, response) in join_all(resplit_calls).await {
            let response = response.ok_or_else(|| DispatchError::OptimizerFailure {
                vehicle_id: vehicle.id.clone(),
            })?;
            responses.insert(vehicle.id.clone(), response);
        }

        info!(routed = responses.len(), "Before-cutoff wave complete");

        Ok(BeforeWaveResponse {
            vehicle_tasks: self.reconcile(&responses)?,
            unassigned: Vec::new(),
        })
    }

    fn initial_request(&self, vehicle: &Vehicle) -> Option<SolveRequest> {
        let jobs: Vec<_> = self
            .assigned_works(&vehicle.id)
            .filter(|work| work.is_waiting())
            .map(|work| self.pickup_job(work, None))
            .collect();
        if jobs.is_empty() {
            return None;
        }

        Some(SolveRequest {
            jobs,
            shipments: Vec::new(),
            vehicles: vec![self.routing_vehicle(vehicle, vehicle.current_location, None)],
            distribute_options: SolveOptions::custom_matrix(),
        })
    }

    /// Re-derive the job set for a vehicle that finished its first pass
    /// early. Waiting works in its excluded zones stay plain pickups (the
    /// assignment already forced them onto it); works entirely inside its
    /// own zones ride as shipments; shipped works deliverable in its zones
    /// become delivery jobs.
    fn resplit_request(&self, vehicle: &Vehicle) -> SolveRequest {
        let mut jobs = Vec::new();
        let mut shipments = Vec::new();

        for work in self.assigned_works(&vehicle.id) {
            match work.status.status {
                WorkStatus::Waiting => {
                    let pickup_zone = work.pickup.zone_id.as_deref();
                    let delivery_zone = work.delivery.zone_id.as_deref();

                    let excluded = pickup_zone
                        .is_some_and(|zone| vehicle.exclude.iter().any(|excl| excl == zone));
                    let fully_included = pickup_zone
                        .is_some_and(|zone| vehicle.include.iter().any(|incl| incl == zone))
                        && delivery_zone
                            .is_some_and(|zone| vehicle.include.iter().any(|incl| incl == zone));

                    if !excluded && fully_included {
                        shipments.push(self.shipment(work));
                    } else {
                        jobs.push(self.pickup_job(work, None));
                    }
                }
                WorkStatus::Shipped => {
                    if work
                        .delivery
                        .zone_id
                        .as_deref()
                        .is_some_and(|zone| vehicle.include.iter().any(|incl| incl == zone))
                    {
                        jobs.push(self.delivery_job(work, None));
                    }
                }
                WorkStatus::Stopped | WorkStatus::Done => {}
            }
        }

        SolveRequest {
            jobs,
            shipments,
            vehicles: vec![self.routing_vehicle(vehicle, vehicle.current_location, None)],
            distribute_options: SolveOptions::custom_matrix(),
        }
    }
}
