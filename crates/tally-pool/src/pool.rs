//! Resource pool: offers flattened into `name -> role -> value`.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tally_core::{Offer, Range, ResourceValue, WILDCARD_ROLE};

/// Aggregated capacity of one offer batch, partitioned by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    entries: BTreeMap<String, BTreeMap<String, ResourceValue>>,
}

impl ResourcePool {
    /// Build a pool from every declaration in `offers`.
    ///
    /// Same-name, same-role declarations are combined: scalars sum, range
    /// sets are concatenated. A declaration whose kind disagrees with an
    /// earlier one under the same name and role is skipped.
    pub fn from_offers(offers: &[Offer]) -> Self {
        let mut entries: BTreeMap<String, BTreeMap<String, ResourceValue>> = BTreeMap::new();

        for decl in offers.iter().flat_map(|o| o.resources.iter()) {
            let roles = entries.entry(decl.name.clone()).or_default();
            match roles.entry(decl.role.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(decl.value.clone());
                }
                Entry::Occupied(mut slot) => {
                    if !slot.get_mut().combine(decl.value.clone()) {
                        warn!(
                            resource = %decl.name,
                            role = %decl.role,
                            "ignoring declaration with mismatched resource kind"
                        );
                    }
                }
            }
        }

        debug!(offers = offers.len(), resources = entries.len(), "built resource pool");
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resource names present in the pool, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str, role: &str) -> Option<&ResourceValue> {
        self.entries.get(name).and_then(|roles| roles.get(role))
    }

    /// Scalar amount held under `role`; zero when absent or not a scalar.
    pub fn scalar(&self, name: &str, role: &str) -> f64 {
        self.get(name, role)
            .and_then(ResourceValue::as_scalar)
            .unwrap_or(0.0)
    }

    /// Range set held under `role`; empty when absent or not a range set.
    pub fn ranges(&self, name: &str, role: &str) -> &[Range] {
        self.get(name, role)
            .and_then(ResourceValue::as_ranges)
            .unwrap_or(&[])
    }

    /// Sum of the scalar amounts for `name` across all roles.
    pub fn total(&self, name: &str) -> f64 {
        self.entries
            .get(name)
            .map(|roles| roles.values().filter_map(ResourceValue::as_scalar).sum())
            .unwrap_or(0.0)
    }

    /// Roles holding `name`, in allocation order.
    ///
    /// Reserved roles come first in sorted order; the wildcard role is
    /// always last so tenant capacity is consumed before shared capacity.
    pub fn roles(&self, name: &str) -> Vec<&str> {
        let Some(roles) = self.entries.get(name) else {
            return Vec::new();
        };
        let mut ordered: Vec<&str> = roles
            .keys()
            .map(String::as_str)
            .filter(|r| *r != WILDCARD_ROLE)
            .collect();
        if roles.contains_key(WILDCARD_ROLE) {
            ordered.push(WILDCARD_ROLE);
        }
        ordered
    }

    pub(crate) fn set_scalar(&mut self, name: &str, role: &str, amount: f64) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .insert(role.to_string(), ResourceValue::Scalar(amount));
    }
}
