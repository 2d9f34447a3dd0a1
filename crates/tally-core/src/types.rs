//! Shared resource types used across tally crates.

use serde::{Deserialize, Serialize};

/// Role tag for unreserved capacity shared by every tenant.
pub const WILDCARD_ROLE: &str = "*";

/// Resource name for CPU shares.
pub const CPUS: &str = "cpus";
/// Resource name for memory (MiB).
pub const MEM: &str = "mem";
/// Resource name for the port range set.
pub const PORTS: &str = "ports";

fn default_role() -> String {
    WILDCARD_ROLE.to_string()
}

/// Inclusive integer range, e.g. a block of ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    pub begin: u64,
    pub end: u64,
}

impl Range {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    /// A range covering exactly one value.
    pub fn single(value: u64) -> Self {
        Self { begin: value, end: value }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.begin <= value && value <= self.end
    }
}

/// The closed set of resource kinds an agent can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Scalar,
    Ranges,
}

/// A quantity of some resource: either a subtractable amount or a set of ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResourceValue {
    Scalar(f64),
    Ranges(Vec<Range>),
}

impl ResourceValue {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceValue::Scalar(_) => ResourceKind::Scalar,
            ResourceValue::Ranges(_) => ResourceKind::Ranges,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ResourceValue::Scalar(v) => Some(*v),
            ResourceValue::Ranges(_) => None,
        }
    }

    pub fn as_ranges(&self) -> Option<&[Range]> {
        match self {
            ResourceValue::Ranges(r) => Some(r),
            ResourceValue::Scalar(_) => None,
        }
    }

    /// Fold `other` into `self`: scalars add, range sets concatenate.
    ///
    /// Adjacent ranges are not coalesced. Returns `false` (leaving `self`
    /// untouched) when the kinds differ.
    pub fn combine(&mut self, other: ResourceValue) -> bool {
        match (self, other) {
            (ResourceValue::Scalar(a), ResourceValue::Scalar(b)) => {
                *a += b;
                true
            }
            (ResourceValue::Ranges(a), ResourceValue::Ranges(b)) => {
                a.extend(b);
                true
            }
            _ => false,
        }
    }
}

/// One resource entry inside an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDeclaration", into = "RawDeclaration")]
pub struct ResourceDeclaration {
    pub name: String,
    pub role: String,
    pub value: ResourceValue,
}

/// On-disk shape of a declaration: `kind` selects which payload field is read.
#[derive(Serialize, Deserialize)]
struct RawDeclaration {
    name: String,
    #[serde(default = "default_role")]
    role: String,
    kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scalar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ranges: Option<Vec<Range>>,
}

impl TryFrom<RawDeclaration> for ResourceDeclaration {
    type Error = String;

    fn try_from(raw: RawDeclaration) -> Result<Self, Self::Error> {
        let value = match (raw.kind, raw.scalar, raw.ranges) {
            (ResourceKind::Scalar, Some(v), _) => ResourceValue::Scalar(v),
            (ResourceKind::Ranges, _, Some(r)) => ResourceValue::Ranges(r),
            (ResourceKind::Scalar, None, _) => {
                return Err(format!("resource {}: scalar kind without `scalar` value", raw.name));
            }
            (ResourceKind::Ranges, _, None) => {
                return Err(format!("resource {}: ranges kind without `ranges` value", raw.name));
            }
        };
        Ok(Self {
            name: raw.name,
            role: raw.role,
            value,
        })
    }
}

impl From<ResourceDeclaration> for RawDeclaration {
    fn from(decl: ResourceDeclaration) -> Self {
        let kind = decl.kind();
        let (scalar, ranges) = match decl.value {
            ResourceValue::Scalar(v) => (Some(v), None),
            ResourceValue::Ranges(r) => (None, Some(r)),
        };
        Self {
            name: decl.name,
            role: decl.role,
            kind,
            scalar,
            ranges,
        }
    }
}

impl ResourceDeclaration {
    pub fn scalar(name: &str, role: &str, amount: f64) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            value: ResourceValue::Scalar(amount),
        }
    }

    pub fn ranges(name: &str, role: &str, ranges: Vec<Range>) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            value: ResourceValue::Ranges(ranges),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.value.kind()
    }
}

/// Capacity advertised by one agent at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(default)]
    pub id: String,
    pub agent_id: String,
    #[serde(default)]
    pub hostname: Option<String>,
    pub resources: Vec<ResourceDeclaration>,
}

/// A scalar amount a task needs, e.g. `cpus: 1.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRequirement {
    pub name: String,
    pub amount: f64,
}

impl ScalarRequirement {
    pub fn new(name: &str, amount: f64) -> Self {
        Self {
            name: name.to_string(),
            amount,
        }
    }
}

/// A resolved grant of capacity under a single role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub name: String,
    pub role: String,
    pub value: ResourceValue,
}

impl Reservation {
    pub fn kind(&self) -> ResourceKind {
        self.value.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_combine_by_addition() {
        let mut v = ResourceValue::Scalar(1.5);
        assert!(v.combine(ResourceValue::Scalar(2.0)));
        assert_eq!(v, ResourceValue::Scalar(3.5));
    }

    #[test]
    fn ranges_combine_without_coalescing() {
        let mut v = ResourceValue::Ranges(vec![Range::new(1, 5)]);
        assert!(v.combine(ResourceValue::Ranges(vec![Range::new(6, 9)])));
        assert_eq!(
            v,
            ResourceValue::Ranges(vec![Range::new(1, 5), Range::new(6, 9)])
        );
    }

    #[test]
    fn mismatched_kinds_do_not_combine() {
        let mut v = ResourceValue::Scalar(1.0);
        assert!(!v.combine(ResourceValue::Ranges(vec![Range::single(80)])));
        assert_eq!(v, ResourceValue::Scalar(1.0));
    }

    #[test]
    fn rejects_declaration_missing_its_payload() {
        let json = r#"{"name": "mem", "kind": "scalar"}"#;
        let err = serde_json::from_str::<ResourceDeclaration>(json).unwrap_err();
        assert!(err.to_string().contains("mem"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let r = Range::new(31000, 31010);
        assert!(r.contains(31000));
        assert!(r.contains(31010));
        assert!(!r.contains(30999));
        assert!(!r.contains(31011));
    }

    #[test]
    fn declaration_role_defaults_to_wildcard() {
        let json = r#"{"name": "cpus", "kind": "scalar", "scalar": 4.0}"#;
        let decl: ResourceDeclaration = serde_json::from_str(json).unwrap();
        assert_eq!(decl.role, WILDCARD_ROLE);
        assert_eq!(decl.value, ResourceValue::Scalar(4.0));
    }

    #[test]
    fn parses_range_declaration() {
        let json = r#"{
            "name": "ports",
            "role": "teamA",
            "kind": "ranges",
            "ranges": [{"begin": 31000, "end": 31010}]
        }"#;
        let decl: ResourceDeclaration = serde_json::from_str(json).unwrap();
        assert_eq!(decl.kind(), ResourceKind::Ranges);
        assert_eq!(decl.value.as_ranges(), Some(&[Range::new(31000, 31010)][..]));
    }
}
