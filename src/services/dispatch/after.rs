//! After-cutoff wave: pickup and delivery phases with a depot rendezvous.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::WaveDispatcher;
use crate::defaults::REALLOCATION_PRIORITY;
use crate::error::DispatchError;
use crate::services::identity::Role;
use crate::services::optimizer::{
    OptimizerClient, SolveOptions, SolveRequest, SolveResponse, StepKind,
};
use crate::types::{AfterWaveResponse, TaskKind, Vehicle, VehicleTaskList, WorkStatus};

/// Which side of a work an after-cutoff phase routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterPhase {
    Pickup,
    Delivery,
}

impl WaveDispatcher {
    /// Run the after-cutoff wave: a pickup phase synchronized to a depot
    /// rendezvous, a delivery phase out of the depot, and the load swaps
    /// joining them.
    pub async fn after_wave(
        &mut self,
        optimizer: &dyn OptimizerClient,
    ) -> Result<AfterWaveResponse, DispatchError> {
        info!(
            works = self.works.len(),
            vehicles = self.vehicles.len(),
            optimizer = optimizer.name(),
            "Starting after-cutoff wave"
        );

        let pickup_routes = self.run_phase(optimizer, AfterPhase::Pickup).await;
        let pickup_routes = self.reallocate(optimizer, pickup_routes).await?;
        let before_tasks = self.reconcile(&pickup_routes)?;
        self.mark_completed(&before_tasks);

        let delivery_routes = self.run_phase(optimizer, AfterPhase::Delivery).await;
        let after_tasks = self.reconcile(&delivery_routes)?;

        let swaps = self.combine(&before_tasks, &after_tasks);

        info!(swaps = swaps.len(), "After-cutoff wave complete");

        Ok(AfterWaveResponse {
            before_tasks,
            after_tasks,
            swaps,
        })
    }

    async fn run_phase(
        &self,
        optimizer: &dyn OptimizerClient,
        phase: AfterPhase,
    ) -> HashMap<String, SolveResponse> {
        let mut calls = Vec::new();
        for vehicle in &self.vehicles {
            let Some(request) = self.phase_request(vehicle, phase) else {
                debug!(vehicle_id = %vehicle.id, ?phase, "No work for phase, skipping vehicle");
                continue;
            };
            calls.push(async move { (vehicle, optimizer.solve(&request).await) });
        }

        let mut responses = HashMap::new();
        for (vehicle, response) in join_all(calls).await {
            match response {
                Some(response) => {
                    responses.insert(vehicle.id.clone(), response);
                }
                None => {
                    warn!(vehicle_id = %vehicle.id, ?phase, "No optimizer result, vehicle dropped from phase")
                }
            }
        }
        responses
    }

    fn phase_request(&self, vehicle: &Vehicle, phase: AfterPhase) -> Option<SolveRequest> {
        let jobs: Vec<_> = self
            .assigned_works(&vehicle.id)
            .filter(|work| match phase {
                AfterPhase::Pickup => work.is_waiting(),
                AfterPhase::Delivery => !work.is_done(),
            })
            .map(|work| match phase {
                AfterPhase::Pickup => self.pickup_job(work, None),
                // Deliveries route to the delivery location, not the pickup.
                AfterPhase::Delivery => self.delivery_job(work, None),
            })
            .collect();
        if jobs.is_empty() {
            return None;
        }

        let start = match phase {
            AfterPhase::Pickup => vehicle.current_location,
            AfterPhase::Delivery => self.depot().location,
        };

        Some(SolveRequest {
            jobs,
            shipments: Vec::new(),
            vehicles: vec![self.routing_vehicle(vehicle, start, None)],
            distribute_options: SolveOptions::equalize(),
        })
    }

    /// Stall under-loaded vehicles so the whole fleet reaches the depot at
    /// the slowest vehicle's arrival time.
    async fn reallocate(
        &self,
        optimizer: &dyn OptimizerClient,
        mut routes: HashMap<String, SolveResponse>,
    ) -> Result<HashMap<String, SolveResponse>, DispatchError> {
        let Some(rendezvous) = routes
            .values()
            .filter_map(SolveResponse::terminal_arrival)
            .max()
        else {
            return Ok(routes);
        };

        let mut lagging = Vec::new();
        for vehicle in &self.vehicles {
            let Some(response) = routes.get(&vehicle.id) else {
                continue;
            };
            let Some(arrival) = response.terminal_arrival() else {
                continue;
            };
            if arrival < rendezvous {
                debug!(
                    vehicle_id = %vehicle.id,
                    arrival, rendezvous, "Reallocating under-loaded vehicle"
                );
                lagging.push((
                    vehicle,
                    self.reallocation_request(vehicle, response, rendezvous)?,
                ));
            }
        }

        let calls = lagging
            .into_iter()
            .map(|(vehicle, request)| async move { (vehicle, optimizer.solve(&request).await) });
        for (vehicle, response) in join_all(calls).await {
            let response = response.ok_or_else(|| DispatchError::OptimizerFailure {
                vehicle_id: vehicle.id.clone(),
            })?;
            routes.insert(vehicle.id.clone(), response);
        }

        Ok(routes)
    }

    /// Re-submission for a vehicle arriving before the rendezvous: its
    /// shipped works as deliveries, the waiting works its route already
    /// covers at elevated priority, end forced to the depot and total work
    /// time capped at the rendezvous target.
    fn reallocation_request(
        &self,
        vehicle: &Vehicle,
        route: &SolveResponse,
        rendezvous: u64,
    ) -> Result<SolveRequest, DispatchError> {
        let mut jobs = Vec::new();

        for work in self.works.iter().filter(|work| work.carried_by(&vehicle.id)) {
            jobs.push(self.delivery_job(work, None));
        }

        for step in route.routes.iter().flat_map(|route| &route.steps) {
            if step.kind != StepKind::Job {
                continue;
            }
            let Some(step_id) = step.id else {
                continue;
            };
            let (role, work_id) = self.identity.resolve(step_id)?;
            if role != Role::Pickup {
                continue;
            }
            let Some(work) = self.work_by_id(&work_id) else {
                continue;
            };
            if work.is_waiting() {
                jobs.push(self.pickup_job(work, Some(REALLOCATION_PRIORITY)));
            }
        }

        Ok(SolveRequest {
            jobs,
            shipments: Vec::new(),
            vehicles: vec![self.routing_vehicle(
                vehicle,
                vehicle.current_location,
                Some(self.depot().location),
            )],
            distribute_options: SolveOptions::equalize_capped(rendezvous),
        })
    }

    /// Delivery tasks produced by the pickup phase complete their works;
    /// the only automatic status transition in a wave.
    fn mark_completed(&mut self, task_lists: &[VehicleTaskList]) {
        for task in task_lists.iter().flat_map(|list| &list.tasks) {
            if task.kind != TaskKind::Delivery {
                continue;
            }
            let Some(work_id) = &task.work_id else {
                continue;
            };
            if let Some(work) = self.works.iter_mut().find(|work| &work.id == work_id) {
                if matches!(
                    work.status.status,
                    WorkStatus::Waiting | WorkStatus::Shipped
                ) {
                    debug!(work_id = %work_id, "Work delivered, marking done");
                    work.status.status = WorkStatus::Done;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::WaveDispatcher;
    use super::*;
    use crate::types::Coordinate;

    fn depot_location() -> Coordinate {
        Coordinate::new(126.55, 33.45)
    }

    /// Two vehicles, each owning one zone with one waiting work, plus a
    /// shipped work aboard V1. Identity ids issued in after-wave pickup
    /// phase: W1 pickup = 0, V1 = 1, W2 pickup = 2, V2 = 3.
    fn fleet_request() -> crate::types::DispatchRequest {
        dispatch_request(
            vec![
                waiting_work(
                    "W1",
                    Coordinate::new(126.30, 33.30),
                    Coordinate::new(126.35, 33.35),
                ),
                waiting_work(
                    "W2",
                    Coordinate::new(126.70, 33.30),
                    Coordinate::new(126.75, 33.35),
                ),
                shipped_work(
                    "W3",
                    Coordinate::new(126.31, 33.31),
                    Coordinate::new(126.36, 33.36),
                    "V1",
                ),
            ],
            vec![
                fleet_vehicle("V1", Coordinate::new(126.32, 33.50), &["Z1"], &[]),
                fleet_vehicle("V2", Coordinate::new(126.72, 33.50), &["Z2"], &[]),
            ],
            vec![depot_assembly("DEPOT-1", depot_location())],
            vec![
                square_zone("Z1", 126.1, 33.1, 126.5, 33.6),
                square_zone("Z2", 126.5, 33.1, 126.9, 33.6),
            ],
        )
    }

    #[test]
    fn test_pickup_phase_routes_waiting_pickups_from_current_location() {
        let dispatcher = WaveDispatcher::new(fleet_request()).unwrap();
        let vehicle = &dispatcher.vehicles[0];

        let request = dispatcher
            .phase_request(vehicle, AfterPhase::Pickup)
            .unwrap();

        // Only W1 is waiting and assigned to V1; W3 is already aboard.
        assert_eq!(request.jobs.len(), 1);
        assert_eq!(
            request.jobs[0].location.bits(),
            Coordinate::new(126.30, 33.30).bits()
        );
        assert_eq!(
            request.vehicles[0].start.bits(),
            vehicle.current_location.bits()
        );
        assert!(request.vehicles[0].end.is_none());
        assert!(request.distribute_options.equalize_work_time.is_some());
        assert!(request.distribute_options.max_vehicle_work_time.is_none());
    }

    #[test]
    fn test_delivery_phase_routes_delivery_locations_from_depot() {
        let dispatcher = WaveDispatcher::new(fleet_request()).unwrap();
        let vehicle = &dispatcher.vehicles[0];

        let request = dispatcher
            .phase_request(vehicle, AfterPhase::Delivery)
            .unwrap();

        // W1 and W3 are assigned to V1 and not done; jobs sit at their
        // delivery coordinates.
        assert_eq!(request.jobs.len(), 2);
        assert_eq!(
            request.jobs[0].location.bits(),
            Coordinate::new(126.35, 33.35).bits()
        );
        assert_eq!(
            request.jobs[1].location.bits(),
            Coordinate::new(126.36, 33.36).bits()
        );
        assert_eq!(request.vehicles[0].start.bits(), depot_location().bits());
    }

    #[tokio::test]
    async fn test_reallocation_stalls_the_faster_vehicle() {
        let mut dispatcher = WaveDispatcher::new(fleet_request()).unwrap();
        let optimizer = ScriptedOptimizer::replying(vec![
            // Pickup phase, V1: done at 1000s.
            solved(
                1,
                vec![
                    step(StepKind::Job, Some(0), 500, Coordinate::new(126.30, 33.30)),
                    step(StepKind::End, None, 1000, depot_location()),
                ],
            ),
            // Pickup phase, V2: done at 2000s. This is the rendezvous.
            solved(
                3,
                vec![
                    step(StepKind::Job, Some(2), 900, Coordinate::new(126.70, 33.30)),
                    step(StepKind::End, None, 2000, depot_location()),
                ],
            ),
            // Reallocation for V1 (W3 delivery = 4, W1 re-pickup = 0).
            solved(
                1,
                vec![
                    step(StepKind::Job, Some(0), 500, Coordinate::new(126.30, 33.30)),
                    step(StepKind::Job, Some(4), 1500, Coordinate::new(126.36, 33.36)),
                    step(StepKind::End, None, 2000, depot_location()),
                ],
            ),
            // Delivery phase, V1 then V2.
            solved(
                1,
                vec![
                    step(StepKind::Job, Some(5), 600, Coordinate::new(126.35, 33.35)),
                    step(StepKind::End, None, 1200, depot_location()),
                ],
            ),
            solved(
                3,
                vec![
                    step(StepKind::Job, Some(6), 700, Coordinate::new(126.75, 33.35)),
                    step(StepKind::End, None, 1400, depot_location()),
                ],
            ),
        ]);

        let response = dispatcher.after_wave(&optimizer).await.unwrap();

        let requests = optimizer.seen_requests();
        assert_eq!(requests.len(), 5);

        // The reallocation call re-submits V1 with its end forced to the
        // depot and the fleet-wide cap.
        let reallocation = &requests[2];
        assert_eq!(
            reallocation.vehicles[0].end.unwrap().bits(),
            depot_location().bits()
        );
        assert_eq!(
            reallocation.distribute_options.max_vehicle_work_time,
            Some(2000)
        );
        // W3's delivery plus W1 again, at elevated priority.
        assert_eq!(reallocation.jobs.len(), 2);
        assert_eq!(reallocation.jobs[1].priority, Some(10));

        // V1's before-tasks come from the reallocated route.
        let v1_before = &response.before_tasks[0];
        assert_eq!(v1_before.tasks.len(), 3);
        assert_eq!(v1_before.tasks[1].kind, TaskKind::Delivery);
        assert_eq!(v1_before.tasks[1].work_id.as_deref(), Some("W3"));
    }

    #[tokio::test]
    async fn test_reallocation_failure_is_fatal() {
        let mut dispatcher = WaveDispatcher::new(fleet_request()).unwrap();
        let optimizer = ScriptedOptimizer::replying(vec![
            solved(1, vec![step(StepKind::End, None, 1000, depot_location())]),
            solved(3, vec![step(StepKind::End, None, 2000, depot_location())]),
            None,
        ]);

        let err = dispatcher.after_wave(&optimizer).await.unwrap_err();
        assert!(matches!(err, DispatchError::OptimizerFailure { .. }));
    }

    #[tokio::test]
    async fn test_pickup_phase_delivery_task_marks_work_done() {
        let mut dispatcher = WaveDispatcher::new(fleet_request()).unwrap();

        // Register W3's delivery id up front so the scripted route can echo
        // it back the way the optimizer would.
        let w3_delivery_id = {
            let work = dispatcher.work_by_id("W3").unwrap();
            dispatcher.delivery_job(work, None).id
        };

        // Both vehicles share the terminal, so no reallocation happens; V1
        // delivers W3 on the way in.
        let optimizer = ScriptedOptimizer::replying(vec![
            solved(
                1,
                vec![
                    step(
                        StepKind::Job,
                        Some(w3_delivery_id),
                        700,
                        Coordinate::new(126.36, 33.36),
                    ),
                    step(StepKind::End, None, 2000, depot_location()),
                ],
            ),
            solved(3, vec![step(StepKind::End, None, 2000, depot_location())]),
            // Delivery phase responses.
            solved(1, vec![step(StepKind::End, None, 900, depot_location())]),
            solved(3, vec![step(StepKind::End, None, 900, depot_location())]),
        ]);

        dispatcher.after_wave(&optimizer).await.unwrap();

        assert!(dispatcher.work_by_id("W3").unwrap().is_done());
    }

    #[tokio::test]
    async fn test_after_wave_produces_uniform_stopover_swaps() {
        let mut dispatcher = WaveDispatcher::new(fleet_request()).unwrap();
        let optimizer = ScriptedOptimizer::replying(vec![
            // Pickup phase: V1 picks W1, V2 picks W2, both at the shared
            // terminal so no reallocation.
            solved(
                1,
                vec![
                    step(StepKind::Job, Some(0), 500, Coordinate::new(126.30, 33.30)),
                    step(StepKind::End, None, 2000, depot_location()),
                ],
            ),
            solved(
                3,
                vec![
                    step(StepKind::Job, Some(2), 900, Coordinate::new(126.70, 33.30)),
                    step(StepKind::End, None, 1800, depot_location()),
                ],
            ),
            // V2 lags behind the 2000s rendezvous and is reallocated.
            solved(
                3,
                vec![
                    step(StepKind::Job, Some(2), 900, Coordinate::new(126.70, 33.30)),
                    step(StepKind::End, None, 2000, depot_location()),
                ],
            ),
            // Delivery phase: V1 keeps W3's delivery (id 5), V2 takes over
            // W1's (id 4, registered by V1's delivery request).
            solved(
                1,
                vec![
                    step(StepKind::Job, Some(5), 600, Coordinate::new(126.36, 33.36)),
                    step(StepKind::End, None, 1100, depot_location()),
                ],
            ),
            solved(
                3,
                vec![
                    step(StepKind::Job, Some(4), 700, Coordinate::new(126.35, 33.35)),
                    step(StepKind::End, None, 1300, depot_location()),
                ],
            ),
        ]);

        let response = dispatcher.after_wave(&optimizer).await.unwrap();

        assert_eq!(response.swaps.len(), 2);
        for swap in &response.swaps {
            assert_eq!(swap.assembly_id, "DEPOT-1");
            assert_eq!(swap.stopover_time, 2000);
        }

        // V1 held {W1 (picked), W3 (aboard)} and needs {W3}: W1 goes down.
        let v1_swap = &response.swaps[0];
        assert_eq!(v1_swap.down, vec!["W1".to_string()]);
        assert!(v1_swap.up.is_empty());

        // V2 held {W2} and needs {W1}: W1 comes up, W2 goes down.
        let v2_swap = &response.swaps[1];
        assert_eq!(v2_swap.up, vec!["W1".to_string()]);
        assert_eq!(v2_swap.down, vec!["W2".to_string()]);
    }
}
