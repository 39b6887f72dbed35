//! Access registry use-case service.
//!
//! # Responsibility
//! - Provide the software/employee operations consumed by transport layers.
//! - Fail fast on blank fields, name collisions and in-use deletes before a
//!   write transaction is opened.
//! - Read back written entities so callers get the committed view.
//!
//! # Invariants
//! - Guard rejections use the same error kinds as storage rejections.
//! - Storage failures are surfaced unchanged; nothing is retried.
//! - Log lines carry ids, counts and error codes only, never names.

use crate::db::DbError;
use crate::guard::{name_is_unique, reference_count, software_is_in_use};
use crate::model::access::{EmployeeWithAccess, GrantSpec};
use crate::model::employee::{EmployeeDraft, EmployeeId, ValidationError};
use crate::model::software::{normalize_software_name, Software, SoftwareId};
use crate::query::RosterFilter;
use crate::repo::{AccessRepository, EntityRef, RepoError, UniqueKey};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for access registry use-cases.
#[derive(Debug)]
pub enum AccessServiceError {
    /// Required field is blank.
    InvalidField(ValidationError),
    /// Name or grant-pair collision.
    DuplicateKey(UniqueKey),
    /// Referenced id does not exist.
    NotFound(EntityRef),
    /// Software delete blocked by existing grants.
    ReferentialConflict {
        software_id: SoftwareId,
        grant_count: u64,
    },
    /// Any other storage fault; the transaction was rolled back.
    TransactionFailure(DbError),
    /// Persisted row could not be decoded.
    InvalidData(String),
    /// Write committed but read-back did not find the entity.
    InconsistentState(&'static str),
}

impl AccessServiceError {
    /// Stable machine-readable code for logs and transport mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidField(_) => "invalid_field",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::NotFound(_) => "not_found",
            Self::ReferentialConflict { .. } => "referential_conflict",
            Self::TransactionFailure(_) => "transaction_failure",
            Self::InvalidData(_) => "invalid_data",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for AccessServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidField(err) => write!(f, "{err}"),
            Self::DuplicateKey(key) => write!(f, "duplicate {key}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::ReferentialConflict {
                software_id,
                grant_count,
            } => write!(
                f,
                "software {software_id} is in use by {grant_count} access grant(s)"
            ),
            Self::TransactionFailure(err) => write!(f, "transaction failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for AccessServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidField(err) => Some(err),
            Self::TransactionFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccessServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidField(err),
            RepoError::DuplicateKey(key) => Self::DuplicateKey(key),
            RepoError::NotFound(entity) => Self::NotFound(entity),
            RepoError::ReferentialConflict {
                software_id,
                grant_count,
            } => Self::ReferentialConflict {
                software_id,
                grant_count,
            },
            RepoError::Db(err) => Self::TransactionFailure(err),
            RepoError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

impl From<ValidationError> for AccessServiceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidField(value)
    }
}

pub type ServiceResult<T> = Result<T, AccessServiceError>;

/// Access service facade over repository implementations.
pub struct AccessService<R: AccessRepository> {
    repo: R,
}

impl<R: AccessRepository> AccessService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists software ordered by name.
    pub fn list_software(&self) -> ServiceResult<Vec<Software>> {
        Ok(self.repo.list_software()?)
    }

    /// Adds one software title.
    pub fn add_software(&mut self, name: &str) -> ServiceResult<Software> {
        let started_at = Instant::now();
        let result = self.add_software_inner(name);
        log_outcome("software_add", started_at, &result, |software| {
            format!("software_id={}", software.id)
        });
        result
    }

    fn add_software_inner(&mut self, name: &str) -> ServiceResult<Software> {
        let name = normalize_software_name(name)?;
        self.ensure_software_name_free(&name, None)?;
        let id = self.repo.create_software(&name)?;
        self.read_back_software(id, "created software not found in read-back")
    }

    /// Renames one software title, keeping its grants.
    pub fn rename_software(&mut self, id: SoftwareId, name: &str) -> ServiceResult<Software> {
        let started_at = Instant::now();
        let result = self.rename_software_inner(id, name);
        log_outcome("software_rename", started_at, &result, |software| {
            format!("software_id={}", software.id)
        });
        result
    }

    fn rename_software_inner(&mut self, id: SoftwareId, name: &str) -> ServiceResult<Software> {
        let name = normalize_software_name(name)?;
        self.ensure_software_name_free(&name, Some(id))?;
        self.repo.rename_software(id, &name)?;
        self.read_back_software(id, "renamed software not found in read-back")
    }

    /// Deletes one software title that no employee holds access to.
    pub fn delete_software(&mut self, id: SoftwareId) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.delete_software_inner(id);
        log_outcome("software_delete", started_at, &result, |_| {
            format!("software_id={id}")
        });
        result
    }

    fn delete_software_inner(&mut self, id: SoftwareId) -> ServiceResult<()> {
        let roster = self
            .repo
            .list_employees_with_access(&RosterFilter::default())?;
        if software_is_in_use(id, &roster) {
            return Err(AccessServiceError::ReferentialConflict {
                software_id: id,
                grant_count: reference_count(id, &roster),
            });
        }
        self.repo.delete_software(id)?;
        Ok(())
    }

    /// Lists employees with their grants.
    pub fn list_employees_with_access(
        &self,
        filter: &RosterFilter,
    ) -> ServiceResult<Vec<EmployeeWithAccess>> {
        Ok(self.repo.list_employees_with_access(filter)?)
    }

    /// Gets one employee with its grants.
    pub fn get_employee(&self, id: EmployeeId) -> ServiceResult<Option<EmployeeWithAccess>> {
        Ok(self.repo.get_employee_with_access(id)?)
    }

    /// Lists distinct departments for roster filtering.
    pub fn list_departments(&self) -> ServiceResult<Vec<String>> {
        Ok(self.repo.list_departments()?)
    }

    /// Creates one employee together with its initial grant set.
    pub fn create_employee(
        &mut self,
        draft: &EmployeeDraft,
        grants: &[GrantSpec],
    ) -> ServiceResult<EmployeeWithAccess> {
        let started_at = Instant::now();
        let result = self.write_employee(None, draft, grants);
        log_outcome("employee_create", started_at, &result, |employee| {
            format!(
                "employee_id={} grant_count={}",
                employee.employee.id,
                employee.grants.len()
            )
        });
        result
    }

    /// Overwrites one employee's fields and replaces its full grant set.
    pub fn replace_employee(
        &mut self,
        id: EmployeeId,
        draft: &EmployeeDraft,
        grants: &[GrantSpec],
    ) -> ServiceResult<EmployeeWithAccess> {
        let started_at = Instant::now();
        let result = self.write_employee(Some(id), draft, grants);
        log_outcome("employee_replace", started_at, &result, |employee| {
            format!(
                "employee_id={} grant_count={}",
                employee.employee.id,
                employee.grants.len()
            )
        });
        result
    }

    /// Deletes one employee and all of its grants.
    pub fn delete_employee(&mut self, id: EmployeeId) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete_employee(id).map_err(AccessServiceError::from);
        log_outcome("employee_delete", started_at, &result, |_| {
            format!("employee_id={id}")
        });
        result
    }

    fn write_employee(
        &mut self,
        id: Option<EmployeeId>,
        draft: &EmployeeDraft,
        grants: &[GrantSpec],
    ) -> ServiceResult<EmployeeWithAccess> {
        draft.validate()?;
        let draft = draft.normalized();

        let roster = self
            .repo
            .list_employees_with_access(&RosterFilter::default())?;
        let existing = roster
            .iter()
            .map(|entry| (entry.employee.id, entry.employee.name.as_str()));
        if !name_is_unique(&draft.name, existing, id) {
            return Err(AccessServiceError::DuplicateKey(UniqueKey::EmployeeName(
                draft.name,
            )));
        }

        let employee_id = self.repo.replace_employee_access(id, &draft, grants)?;
        self.repo
            .get_employee_with_access(employee_id)?
            .ok_or(AccessServiceError::InconsistentState(
                "employee not found in read-back",
            ))
    }

    fn ensure_software_name_free(
        &self,
        name: &str,
        exclude_id: Option<SoftwareId>,
    ) -> ServiceResult<()> {
        let catalog = self.repo.list_software()?;
        let existing = catalog
            .iter()
            .map(|software| (software.id, software.name.as_str()));
        if name_is_unique(name, existing, exclude_id) {
            Ok(())
        } else {
            Err(AccessServiceError::DuplicateKey(UniqueKey::SoftwareName(
                name.to_string(),
            )))
        }
    }

    fn read_back_software(&self, id: SoftwareId, details: &'static str) -> ServiceResult<Software> {
        self.repo
            .get_software(id)?
            .ok_or(AccessServiceError::InconsistentState(details))
    }
}

fn log_outcome<T>(
    event: &str,
    started_at: Instant,
    result: &ServiceResult<T>,
    fields: impl FnOnce(&T) -> String,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => info!(
            "event={event} module=service status=ok {} duration_ms={duration_ms}",
            fields(value)
        ),
        Err(err) => warn!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}
