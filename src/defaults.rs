//! Fixed dispatch parameters.

/// A vehicle whose first-pass route ends earlier than this (seconds) has
/// spare capacity and is re-split to take on more work.
pub const RELAY_VEHICLE_TIME: u64 = 1800;

/// Setup seconds for a stop whose coordinate is shared by two or more works.
pub const SHARED_LOCATION_SETUP_SECONDS: u64 = 300;

/// Setup seconds for a stop with a unique coordinate.
pub const SINGLE_LOCATION_SETUP_SECONDS: u64 = 180;

/// Service seconds applied uniformly to every stop.
pub const STOP_SERVICE_SECONDS: u64 = 10;

/// Priority given to re-submitted waiting works during fairness reallocation.
pub const REALLOCATION_PRIORITY: u32 = 10;
