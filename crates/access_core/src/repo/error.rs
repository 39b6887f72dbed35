//! Storage-boundary error taxonomy shared by repositories and read queries.
//!
//! # Invariants
//! - Constraint failures are classified from SQLite extended result codes,
//!   never from message text.
//! - Any failure that is not a known constraint stays `Db` and is reported as
//!   a transaction failure by callers.

use crate::db::DbError;
use crate::model::employee::{EmployeeId, ValidationError};
use crate::model::software::SoftwareId;
use rusqlite::{ffi, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Identity of a row that a caller referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Software(SoftwareId),
    Employee(EmployeeId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software(id) => write!(f, "software {id}"),
            Self::Employee(id) => write!(f, "employee {id}"),
        }
    }
}

/// Unique key that a write collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueKey {
    SoftwareName(String),
    EmployeeName(String),
    /// Second grant for the same pair inside one submitted set.
    Grant {
        employee_id: EmployeeId,
        software_id: SoftwareId,
    },
}

impl Display for UniqueKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SoftwareName(name) => write!(f, "software name `{name}`"),
            Self::EmployeeName(name) => write!(f, "employee name `{name}`"),
            Self::Grant {
                employee_id,
                software_id,
            } => write!(
                f,
                "access grant (employee {employee_id}, software {software_id})"
            ),
        }
    }
}

/// Repository error for access registry persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    DuplicateKey(UniqueKey),
    NotFound(EntityRef),
    /// Delete blocked because grants still reference the software.
    ReferentialConflict {
        software_id: SoftwareId,
        grant_count: u64,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey(key) => write!(f, "duplicate {key}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::ReferentialConflict {
                software_id,
                grant_count,
            } => write!(
                f,
                "software {software_id} is referenced by {grant_count} access grant(s)"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateKey(_)
            | Self::NotFound(_)
            | Self::ReferentialConflict { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Constraint family reported by SQLite for a failed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

pub(crate) fn violated_constraint(err: &rusqlite::Error) -> Option<Constraint> {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation => {
            match inner.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Some(Constraint::Unique)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Maps a unique-constraint failure to `DuplicateKey(key)`; anything else
/// stays a storage error.
pub(crate) fn on_unique(err: rusqlite::Error, key: impl FnOnce() -> UniqueKey) -> RepoError {
    match violated_constraint(&err) {
        Some(Constraint::Unique) => RepoError::DuplicateKey(key()),
        _ => err.into(),
    }
}
