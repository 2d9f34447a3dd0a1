//! Scalar allocation: exact amounts taken role by role.
//!
//! Roles are drained in [`ResourcePool::roles`] order, so reserved
//! capacity is spent before the shared wildcard pool is touched.

use tracing::{debug, warn};

use tally_core::{Reservation, ResourceValue, ScalarRequirement};

use crate::error::{PoolError, PoolResult};
use crate::pool::ResourcePool;

/// Residue below this is treated as fully satisfied.
pub const EPSILON: f64 = 1e-9;

/// Outcome of allocating one scalar resource.
#[derive(Debug, Clone)]
pub struct ScalarAllocation {
    /// Pool after the reservations were subtracted.
    pub pool: ResourcePool,
    pub reservations: Vec<Reservation>,
    /// Amount no role could cover.
    pub unmet: f64,
}

impl ScalarAllocation {
    pub fn is_satisfied(&self) -> bool {
        self.unmet <= EPSILON
    }
}

/// Reserve `amount` of `name` from `pool`.
///
/// Never fails: a shortfall is reported through [`ScalarAllocation::unmet`]
/// and the caller decides what to do with it.
pub fn allocate(pool: &ResourcePool, name: &str, amount: f64) -> ScalarAllocation {
    let mut next = pool.clone();
    let mut reservations = Vec::new();
    let mut needed = amount.max(0.0);

    for role in pool.roles(name) {
        if needed <= EPSILON {
            break;
        }
        let available = pool.scalar(name, role);
        if available <= EPSILON {
            // Float residue from earlier tasks is not capacity.
            if available != 0.0 {
                next.set_scalar(name, role, 0.0);
            }
            continue;
        }
        let taken = needed.min(available);
        let left = available - taken;

        next.set_scalar(name, role, if left <= EPSILON { 0.0 } else { left });
        reservations.push(Reservation {
            name: name.to_string(),
            role: role.to_string(),
            value: ResourceValue::Scalar(taken),
        });
        needed -= taken;

        debug!(resource = name, role, amount = taken, "reserved scalar");
    }

    ScalarAllocation {
        pool: next,
        reservations,
        unmet: if needed <= EPSILON { 0.0 } else { needed },
    }
}

/// Reserve every requirement of one task, threading the pool through.
///
/// Fails on the first requirement that cannot be fully covered; the
/// input pool is left as it was.
pub fn allocate_all(
    pool: &ResourcePool,
    requirements: &[ScalarRequirement],
) -> PoolResult<ScalarAllocation> {
    let mut current = pool.clone();
    let mut reservations = Vec::new();

    for req in requirements {
        let step = allocate(&current, &req.name, req.amount);
        if !step.is_satisfied() {
            warn!(
                resource = %req.name,
                requested = req.amount,
                unmet = step.unmet,
                available = current.total(&req.name),
                "scalar requirement exceeds offered capacity"
            );
            let available = current
                .roles(&req.name)
                .into_iter()
                .map(|role| (role.to_string(), current.scalar(&req.name, role)))
                .collect();
            return Err(PoolError::Deficit {
                resource: req.name.clone(),
                requested: req.amount,
                unmet: step.unmet,
                available,
            });
        }
        current = step.pool;
        reservations.extend(step.reservations);
    }

    Ok(ScalarAllocation {
        pool: current,
        reservations,
        unmet: 0.0,
    })
}
