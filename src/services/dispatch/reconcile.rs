//! Optimizer routes back into domain task lists and depot load swaps.

use std::collections::{BTreeSet, HashMap};

use super::WaveDispatcher;
use crate::error::DispatchError;
use crate::services::identity::Role;
use crate::services::optimizer::{RoutingStep, SolveResponse, StepKind};
use crate::types::{Task, TaskKind, VehicleSwap, VehicleTaskList};

impl WaveDispatcher {
    /// Turn per-vehicle optimizer routes back into domain task lists. Every
    /// request vehicle gets an entry, empty when it has no route.
    pub(super) fn reconcile(
        &self,
        responses: &HashMap<String, SolveResponse>,
    ) -> Result<Vec<VehicleTaskList>, DispatchError> {
        let mut lists = Vec::with_capacity(self.vehicles.len());
        for vehicle in &self.vehicles {
            let mut tasks = Vec::new();
            if let Some(response) = responses.get(&vehicle.id) {
                for step in response.routes.iter().flat_map(|route| &route.steps) {
                    if let Some(task) = self.task_for_step(step)? {
                        tasks.push(task);
                    }
                }
            }
            lists.push(VehicleTaskList {
                vehicle_id: vehicle.id.clone(),
                tasks,
            });
        }
        Ok(lists)
    }

    fn task_for_step(&self, step: &RoutingStep) -> Result<Option<Task>, DispatchError> {
        match step.kind {
            StepKind::Start => Ok(None),
            StepKind::End => Ok(self.arrival_task(step)),
            StepKind::Job
            | StepKind::Pickup
            | StepKind::Delivery
            | StepKind::ShipmentPickup
            | StepKind::ShipmentDelivery => self.work_task(step),
        }
    }

    fn work_task(&self, step: &RoutingStep) -> Result<Option<Task>, DispatchError> {
        let resolved = match step.id {
            Some(id) => Some(self.identity.resolve(id)?),
            None => None,
        };

        let kind = match step.kind {
            StepKind::Pickup => TaskKind::Pickup,
            StepKind::Delivery => TaskKind::Delivery,
            StepKind::ShipmentPickup => TaskKind::ShipmentPickup,
            StepKind::ShipmentDelivery => TaskKind::ShipmentDelivery,
            // Plain job steps echo whatever role they were submitted under.
            _ => match resolved.as_ref().map(|(role, _)| role) {
                Some(Role::Pickup) => TaskKind::Pickup,
                Some(Role::Delivery) => TaskKind::Delivery,
                Some(Role::ShipmentPickup) => TaskKind::ShipmentPickup,
                Some(Role::ShipmentDelivery) => TaskKind::ShipmentDelivery,
                _ => return Ok(None),
            },
        };

        Ok(Some(Task {
            work_id: resolved.map(|(_, work_id)| work_id),
            kind,
            eta: step.arrival,
            duration: step.duration,
            distance: step.distance,
            setup_time: step.setup,
            service_time: step.service,
            assembly_id: None,
            location: step.location,
        }))
    }

    /// End steps become arrival tasks only when they land on a known depot.
    fn arrival_task(&self, step: &RoutingStep) -> Option<Task> {
        let assembly = self
            .assemblies
            .iter()
            .find(|assembly| assembly.location.bits() == step.location.bits())?;

        Some(Task {
            work_id: None,
            kind: TaskKind::Arrival,
            eta: step.arrival,
            duration: step.duration,
            distance: step.distance,
            setup_time: step.setup,
            service_time: step.service,
            assembly_id: Some(assembly.id.clone()),
            location: step.location,
        })
    }

    /// Depot load swaps between the pickup-phase and delivery-phase plans.
    ///
    /// For each vehicle: `shipped` is what it holds arriving at the depot
    /// (works in its pickup-phase tasks plus works already aboard), `need`
    /// is what its delivery-phase plan requires; `up`/`down` are the set
    /// differences. Every entry carries the same stopover time, the latest
    /// depot arrival in the fleet.
    pub(super) fn combine(
        &self,
        before: &[VehicleTaskList],
        after: &[VehicleTaskList],
    ) -> Vec<VehicleSwap> {
        let stopover_time = before
            .iter()
            .flat_map(|list| &list.tasks)
            .filter(|task| task.kind == TaskKind::Arrival)
            .map(|task| task.eta)
            .max()
            .unwrap_or(0);

        let depot_id = &self.depot().id;

        self.vehicles
            .iter()
            .map(|vehicle| {
                let mut shipped = work_ids_for(before, &vehicle.id);
                shipped.extend(
                    self.works
                        .iter()
                        .filter(|work| work.carried_by(&vehicle.id))
                        .map(|work| work.id.clone()),
                );
                let need = work_ids_for(after, &vehicle.id);

                VehicleSwap {
                    vehicle_id: vehicle.id.clone(),
                    assembly_id: depot_id.clone(),
                    stopover_time,
                    up: need.difference(&shipped).cloned().collect(),
                    down: shipped.difference(&need).cloned().collect(),
                }
            })
            .collect()
    }
}

fn work_ids_for(lists: &[VehicleTaskList], vehicle_id: &str) -> BTreeSet<String> {
    lists
        .iter()
        .filter(|list| list.vehicle_id == vehicle_id)
        .flat_map(|list| &list.tasks)
        .filter_map(|task| task.work_id.clone())
        .collect()
}
