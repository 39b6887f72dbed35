//! Access repository contract, SQLite implementation and the replace-all
//! access synchronizer.
//!
//! # Responsibility
//! - Expose the entity store operations used by the access service.
//! - Replace an employee's full grant set in one all-or-nothing transaction.
//!
//! # Invariants
//! - `replace_employee_access` either commits the scalar fields and the whole
//!   target grant set, or leaves both exactly as they were.
//! - The write lock is taken at `BEGIN IMMEDIATE`, so concurrent replaces on
//!   the same employee never interleave their delete/insert steps.
//! - Duplicate pairs in a target set are rejected by the composite unique key,
//!   not deduplicated.

use super::employee_repo::{
    delete_employee, delete_grants, insert_employee, insert_grant, update_employee,
};
use super::error::RepoResult;
use super::software_repo::{delete_software, insert_software, rename_software};
use crate::model::access::{EmployeeWithAccess, GrantSpec};
use crate::model::employee::{EmployeeDraft, EmployeeId};
use crate::model::software::{normalize_software_name, Software, SoftwareId};
use crate::query::{self, RosterFilter};
use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Repository interface for the access registry.
pub trait AccessRepository {
    /// Lists all software ordered by name.
    fn list_software(&self) -> RepoResult<Vec<Software>>;
    /// Gets one software row by id.
    fn get_software(&self, id: SoftwareId) -> RepoResult<Option<Software>>;
    /// Inserts one software title and returns its id.
    fn create_software(&mut self, name: &str) -> RepoResult<SoftwareId>;
    /// Renames one software title. Grants are untouched.
    fn rename_software(&mut self, id: SoftwareId, name: &str) -> RepoResult<()>;
    /// Deletes one unreferenced software title.
    fn delete_software(&mut self, id: SoftwareId) -> RepoResult<()>;
    /// Lists employees with their grants, ordered by employee name.
    fn list_employees_with_access(
        &self,
        filter: &RosterFilter,
    ) -> RepoResult<Vec<EmployeeWithAccess>>;
    /// Gets one employee with its grants.
    fn get_employee_with_access(&self, id: EmployeeId) -> RepoResult<Option<EmployeeWithAccess>>;
    /// Lists distinct departments in ascending order.
    fn list_departments(&self) -> RepoResult<Vec<String>>;
    /// Creates (`employee_id = None`) or updates an employee and replaces its
    /// full grant set atomically. Returns the employee id.
    fn replace_employee_access(
        &mut self,
        employee_id: Option<EmployeeId>,
        draft: &EmployeeDraft,
        grants: &[GrantSpec],
    ) -> RepoResult<EmployeeId>;
    /// Deletes one employee and, by cascade, all of its grants.
    fn delete_employee(&mut self, id: EmployeeId) -> RepoResult<()>;
}

/// SQLite-backed access repository over an explicitly passed store handle.
pub struct SqliteAccessRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteAccessRepository<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    fn write_tx(&mut self) -> RepoResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

impl AccessRepository for SqliteAccessRepository<'_> {
    fn list_software(&self) -> RepoResult<Vec<Software>> {
        query::list_software(self.conn)
    }

    fn get_software(&self, id: SoftwareId) -> RepoResult<Option<Software>> {
        query::get_software(self.conn, id)
    }

    fn create_software(&mut self, name: &str) -> RepoResult<SoftwareId> {
        let name = normalize_software_name(name)?;
        let tx = self.write_tx()?;
        let id = insert_software(&tx, &name)?;
        tx.commit()?;
        Ok(id)
    }

    fn rename_software(&mut self, id: SoftwareId, name: &str) -> RepoResult<()> {
        let name = normalize_software_name(name)?;
        let tx = self.write_tx()?;
        rename_software(&tx, id, &name)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_software(&mut self, id: SoftwareId) -> RepoResult<()> {
        let tx = self.write_tx()?;
        delete_software(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    fn list_employees_with_access(
        &self,
        filter: &RosterFilter,
    ) -> RepoResult<Vec<EmployeeWithAccess>> {
        query::list_employees_with_access(self.conn, filter)
    }

    fn get_employee_with_access(&self, id: EmployeeId) -> RepoResult<Option<EmployeeWithAccess>> {
        query::get_employee_with_access(self.conn, id)
    }

    fn list_departments(&self) -> RepoResult<Vec<String>> {
        query::list_departments(self.conn)
    }

    fn replace_employee_access(
        &mut self,
        employee_id: Option<EmployeeId>,
        draft: &EmployeeDraft,
        grants: &[GrantSpec],
    ) -> RepoResult<EmployeeId> {
        draft.validate()?;
        let draft = draft.normalized();

        // Dropping `tx` on any early return rolls back every step below.
        let tx = self.write_tx()?;
        let employee_id = match employee_id {
            None => insert_employee(&tx, &draft)?,
            Some(id) => {
                update_employee(&tx, id, &draft)?;
                id
            }
        };

        let removed = delete_grants(&tx, employee_id)?;
        for grant in grants {
            insert_grant(&tx, employee_id, grant)?;
        }
        tx.commit()?;

        debug!(
            "event=access_replace module=repo status=ok employee_id={employee_id} removed={removed} inserted={}",
            grants.len()
        );
        Ok(employee_id)
    }

    fn delete_employee(&mut self, id: EmployeeId) -> RepoResult<()> {
        let tx = self.write_tx()?;
        delete_employee(&tx, id)?;
        tx.commit()?;
        Ok(())
    }
}
