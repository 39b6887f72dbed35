//! Consistency guard: pre-flight checks run before a write transaction opens.
//!
//! # Responsibility
//! - Reject case-insensitive name collisions early.
//! - Reject deleting software that the current roster still references.
//!
//! # Invariants
//! - Checks are pure functions over in-memory state.
//! - Checks are advisory; storage constraints remain the source of truth.

use crate::model::access::EmployeeWithAccess;
use crate::model::software::SoftwareId;

/// Returns `true` when no existing record other than `exclude_id` has a name
/// equal to `candidate`, ignoring case and surrounding whitespace.
///
/// `exclude_id` lets an entity keep its own unchanged name while edited.
pub fn name_is_unique<'a, I>(candidate: &str, existing: I, exclude_id: Option<i64>) -> bool
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    let candidate = fold_name(candidate);
    !existing
        .into_iter()
        .filter(|(id, _)| Some(*id) != exclude_id)
        .any(|(_, name)| fold_name(name) == candidate)
}

/// Returns `true` when any employee holds a grant on `software_id`.
pub fn software_is_in_use(software_id: SoftwareId, employees: &[EmployeeWithAccess]) -> bool {
    reference_count(software_id, employees) > 0
}

/// Counts grants on `software_id` across `employees`.
pub fn reference_count(software_id: SoftwareId, employees: &[EmployeeWithAccess]) -> u64 {
    employees
        .iter()
        .flat_map(|employee| employee.grants.iter())
        .filter(|grant| grant.software_id == software_id)
        .count() as u64
}

fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}
