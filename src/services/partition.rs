//! Work → owning-vehicle partitioning.

use std::collections::HashMap;

use crate::error::DispatchError;
use crate::types::{Vehicle, Work};

/// Assign every work to exactly one vehicle.
///
/// Ownership comes from the vehicles' `include` lists; when two vehicles
/// claim the same zone, the later vehicle in request order wins. Exception
/// works go to their forced vehicle regardless of zones. A work whose
/// pickup zone is unset or owned by nobody fails the whole request.
///
/// Returns indices into `works`, keyed by vehicle id; every vehicle gets an
/// entry, possibly empty.
pub fn partition_works(
    works: &[Work],
    vehicles: &[Vehicle],
) -> Result<HashMap<String, Vec<usize>>, DispatchError> {
    let mut zone_owner: HashMap<&str, &str> = HashMap::new();
    let mut assigned: HashMap<String, Vec<usize>> = HashMap::new();

    for vehicle in vehicles {
        assigned.entry(vehicle.id.clone()).or_default();
        for zone_id in &vehicle.include {
            zone_owner.insert(zone_id.as_str(), vehicle.id.as_str());
        }
    }

    for (index, work) in works.iter().enumerate() {
        if work.exception {
            let vehicle_id = work.fix_vehicle_id.as_deref().ok_or_else(|| {
                DispatchError::Validation(format!(
                    "work {}: exception requires fix_vehicle_id",
                    work.id
                ))
            })?;
            let slot = assigned.get_mut(vehicle_id).ok_or_else(|| {
                DispatchError::Validation(format!(
                    "work {}: fix_vehicle_id {} is not a known vehicle",
                    work.id, vehicle_id
                ))
            })?;
            slot.push(index);
            continue;
        }

        let zone_id = work.pickup.zone_id.as_deref().ok_or_else(|| {
            DispatchError::Assignment {
                work_id: work.id.clone(),
                reason: "pickup location is outside every zone".to_string(),
            }
        })?;
        let owner = zone_owner
            .get(zone_id)
            .ok_or_else(|| DispatchError::Assignment {
                work_id: work.id.clone(),
                reason: format!("no vehicle owns zone {zone_id}"),
            })?;

        assigned
            .get_mut(*owner)
            .expect("owner comes from the vehicle table")
            .push(index);
    }

    Ok(assigned)
}
