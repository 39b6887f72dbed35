//! Employee row and grant row persistence primitives.
//!
//! These run inside a caller-owned transaction; the synchronizer composes
//! them into the replace-all operation. Employee names are checked for
//! ASCII-case collisions under the same write lock as the insert or update.

use super::error::{
    on_unique, violated_constraint, Constraint, EntityRef, RepoError, RepoResult, UniqueKey,
};
use crate::model::access::GrantSpec;
use crate::model::employee::{EmployeeDraft, EmployeeId};
use rusqlite::{params, Transaction};

pub(super) fn insert_employee(
    tx: &Transaction<'_>,
    draft: &EmployeeDraft,
) -> RepoResult<EmployeeId> {
    ensure_name_free(tx, &draft.name, None)?;
    tx.execute(
        "INSERT INTO employees (name, department, role, manager)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            draft.name.as_str(),
            draft.department.as_str(),
            draft.role.as_str(),
            draft.manager.as_deref(),
        ],
    )
    .map_err(|err| on_unique(err, || UniqueKey::EmployeeName(draft.name.clone())))?;

    Ok(tx.last_insert_rowid())
}

pub(super) fn update_employee(
    tx: &Transaction<'_>,
    id: EmployeeId,
    draft: &EmployeeDraft,
) -> RepoResult<()> {
    ensure_name_free(tx, &draft.name, Some(id))?;
    let changed = tx
        .execute(
            "UPDATE employees
             SET
                name = ?2,
                department = ?3,
                role = ?4,
                manager = ?5
             WHERE id = ?1;",
            params![
                id,
                draft.name.as_str(),
                draft.department.as_str(),
                draft.role.as_str(),
                draft.manager.as_deref(),
            ],
        )
        .map_err(|err| on_unique(err, || UniqueKey::EmployeeName(draft.name.clone())))?;

    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Employee(id)));
    }
    Ok(())
}

fn ensure_name_free(
    tx: &Transaction<'_>,
    name: &str,
    exclude_id: Option<EmployeeId>,
) -> RepoResult<()> {
    let taken: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM employees
            WHERE name = ?1 COLLATE NOCASE AND id IS NOT ?2
        );",
        params![name, exclude_id],
        |row| row.get(0),
    )?;
    if taken == 1 {
        return Err(RepoError::DuplicateKey(UniqueKey::EmployeeName(
            name.to_string(),
        )));
    }
    Ok(())
}

/// Deletes the employee row; grant rows go with it via `ON DELETE CASCADE`.
pub(super) fn delete_employee(tx: &Transaction<'_>, id: EmployeeId) -> RepoResult<()> {
    let changed = tx.execute("DELETE FROM employees WHERE id = ?1;", [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Employee(id)));
    }
    Ok(())
}

/// Removes every grant of one employee. Returns the number of rows removed.
pub(super) fn delete_grants(tx: &Transaction<'_>, employee_id: EmployeeId) -> RepoResult<usize> {
    let removed = tx.execute(
        "DELETE FROM software_access WHERE employee_id = ?1;",
        [employee_id],
    )?;
    Ok(removed)
}

/// Inserts one grant row.
///
/// # Errors
/// - `DuplicateKey(Grant)` when the pair already has a row in this set.
/// - `NotFound(Software)` when `software_id` does not resolve.
pub(super) fn insert_grant(
    tx: &Transaction<'_>,
    employee_id: EmployeeId,
    grant: &GrantSpec,
) -> RepoResult<()> {
    let result = tx.execute(
        "INSERT INTO software_access (employee_id, software_id, access_level)
         VALUES (?1, ?2, ?3);",
        params![employee_id, grant.software_id, grant.level.as_str()],
    );

    match result {
        Ok(_) => Ok(()),
        Err(err) => match violated_constraint(&err) {
            Some(Constraint::Unique) => Err(RepoError::DuplicateKey(UniqueKey::Grant {
                employee_id,
                software_id: grant.software_id,
            })),
            // The employee row was written earlier in this transaction, so
            // the only unresolved reference left is the software id.
            Some(Constraint::ForeignKey) => {
                Err(RepoError::NotFound(EntityRef::Software(grant.software_id)))
            }
            None => Err(err.into()),
        },
    }
}
