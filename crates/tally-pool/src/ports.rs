//! Port allocation: find the role that owns each pre-selected port.
//!
//! The solver has already chosen concrete port numbers, so this is a
//! read-only lookup against the pool's `ports` ranges.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use tally_core::{PORTS, Range, Reservation, ResourceValue};

use crate::error::{PoolError, PoolResult};
use crate::pool::ResourcePool;

/// The role whose `ports` ranges contain `port`, if any.
///
/// Roles are scanned in allocation order, so if two roles claim the same
/// port the reserved one wins over the wildcard.
pub fn owning_role(pool: &ResourcePool, port: u64) -> Option<&str> {
    pool.roles(PORTS)
        .into_iter()
        .find(|role| pool.ranges(PORTS, role).iter().any(|r| r.contains(port)))
}

/// One single-port reservation per assigned port, in the given order.
pub fn assign_ports(pool: &ResourcePool, ports: &[u64]) -> PoolResult<Vec<Reservation>> {
    ports
        .iter()
        .map(|&port| {
            let Some(role) = owning_role(pool, port) else {
                warn!(port, "assigned port is not part of the offer");
                return Err(PoolError::PortNotOffered { port });
            };
            debug!(port, role, "reserved port");
            Ok(Reservation {
                name: PORTS.to_string(),
                role: role.to_string(),
                value: ResourceValue::Ranges(vec![Range::single(port)]),
            })
        })
        .collect()
}

/// Environment variables advertising assigned ports: `{prefix}{index} = port`.
pub fn port_env(prefix: &str, ports: &[u64]) -> BTreeMap<String, String> {
    ports
        .iter()
        .enumerate()
        .map(|(i, port)| (format!("{prefix}{i}"), port.to_string()))
        .collect()
}
