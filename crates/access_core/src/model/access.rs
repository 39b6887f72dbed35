//! Access grant model and the employee-with-access read view.
//!
//! # Invariants
//! - At most one grant exists per `(employee_id, software_id)`.
//! - `EmployeeWithAccess::grants` keeps storage insertion order.

use super::employee::{Employee, EmployeeId};
use super::software::SoftwareId;
use serde::{Deserialize, Serialize};

/// Access level held by one employee on one software title.
///
/// There is no `None` variant: no access means no grant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Basic,
    Intermediate,
    Administrator,
}

impl AccessLevel {
    /// All storable levels, lowest first.
    pub const ALL: [AccessLevel; 3] = [Self::Basic, Self::Intermediate, Self::Administrator];

    /// Stable storage/serialization string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Administrator => "administrator",
        }
    }

    /// Parses a stored level string. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(Self::Basic),
            "intermediate" => Some(Self::Intermediate),
            "administrator" => Some(Self::Administrator),
            _ => None,
        }
    }
}

/// One entry of a desired grant set submitted to the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantSpec {
    pub software_id: SoftwareId,
    pub level: AccessLevel,
}

impl GrantSpec {
    pub fn new(software_id: SoftwareId, level: AccessLevel) -> Self {
        Self { software_id, level }
    }
}

/// Persisted grant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub employee_id: EmployeeId,
    pub software_id: SoftwareId,
    pub level: AccessLevel,
}

impl AccessGrant {
    pub fn spec(&self) -> GrantSpec {
        GrantSpec::new(self.software_id, self.level)
    }
}

/// Employee together with its current grants. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeWithAccess {
    #[serde(flatten)]
    pub employee: Employee,
    pub grants: Vec<AccessGrant>,
}

impl EmployeeWithAccess {
    /// Level held on `software_id`, or `None` when no grant exists.
    pub fn level_for(&self, software_id: SoftwareId) -> Option<AccessLevel> {
        self.grants
            .iter()
            .find(|grant| grant.software_id == software_id)
            .map(|grant| grant.level)
    }

    /// Grant set as submitted specs, in stored order.
    pub fn grant_specs(&self) -> Vec<GrantSpec> {
        self.grants.iter().map(AccessGrant::spec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::AccessLevel;

    #[test]
    fn access_level_strings_are_stable() {
        for level in AccessLevel::ALL {
            assert_eq!(AccessLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(AccessLevel::parse("none"), None);
        assert_eq!(AccessLevel::parse("Basic"), None);
    }
}
