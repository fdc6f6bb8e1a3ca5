//! Request-scoped identity mapping for the optimizer protocol.
//!
//! The optimizer keys jobs and vehicles by small integers; the platform keys
//! them by (role, string id). One `IdentityMap` lives for exactly one
//! dispatch request — sharing a map across requests would leak ids between
//! concurrent waves.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// What a registered integer refers to on the optimizer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pickup,
    Delivery,
    ShipmentPickup,
    ShipmentDelivery,
    ShipmentAssembly,
    Vehicle,
}

/// Bijective (role, domain id) ↔ integer map.
///
/// Registration is idempotent and append-only, so concurrent registration
/// during a solve fan-out only needs a mutex around the tables.
#[derive(Debug, Default)]
pub struct IdentityMap {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next: u64,
    forward: HashMap<(Role, String), u64>,
    reverse: HashMap<u64, (Role, String)>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integer for a (role, id) pair, issuing the next sequential one on
    /// first sight.
    pub fn register(&self, role: Role, id: &str) -> u64 {
        let mut inner = self.inner.lock();
        let key = (role, id.to_string());
        if let Some(&existing) = inner.forward.get(&key) {
            return existing;
        }

        let issued = inner.next;
        inner.next += 1;
        inner.reverse.insert(issued, key.clone());
        inner.forward.insert(key, issued);
        issued
    }

    /// Reverse lookup. Fails when the optimizer echoes an id this request
    /// never issued (protocol desync).
    pub fn resolve(&self, id: u64) -> Result<(Role, String), DispatchError> {
        self.inner
            .lock()
            .reverse
            .get(&id)
            .cloned()
            .ok_or(DispatchError::IdentityResolution(id))
    }
}
