//! Zone assignment and stop-timing preprocessing.

use std::collections::HashMap;

use crate::defaults::{
    SHARED_LOCATION_SETUP_SECONDS, SINGLE_LOCATION_SETUP_SECONDS, STOP_SERVICE_SECONDS,
};
use crate::services::geo::assign_zone_id;
use crate::types::{Work, Zone};

/// Stamp zone ids and setup/service seconds onto every work in place.
///
/// Zone: first containing polygon in request order; left unset when no zone
/// contains the point. Timing: a coordinate shared by two or more pickups
/// (independently, deliveries) gets the shared-location setup, any other
/// coordinate the single-location setup; service seconds are uniform.
pub fn preprocess_works(works: &mut [Work], zones: &[Zone]) {
    let mut pickup_counts: HashMap<(u64, u64), usize> = HashMap::new();
    let mut delivery_counts: HashMap<(u64, u64), usize> = HashMap::new();

    for work in works.iter_mut() {
        work.pickup.zone_id = assign_zone_id(zones, &work.pickup.location);
        work.delivery.zone_id = assign_zone_id(zones, &work.delivery.location);

        *pickup_counts.entry(work.pickup.location.bits()).or_insert(0) += 1;
        *delivery_counts
            .entry(work.delivery.location.bits())
            .or_insert(0) += 1;
    }

    for work in works.iter_mut() {
        work.pickup.setup_time = setup_seconds(pickup_counts[&work.pickup.location.bits()]);
        work.pickup.service_time = STOP_SERVICE_SECONDS;
        work.delivery.setup_time = setup_seconds(delivery_counts[&work.delivery.location.bits()]);
        work.delivery.service_time = STOP_SERVICE_SECONDS;
    }
}

fn setup_seconds(count: usize) -> u64 {
    if count >= 2 {
        SHARED_LOCATION_SETUP_SECONDS
    } else {
        SINGLE_LOCATION_SETUP_SECONDS
    }
}
