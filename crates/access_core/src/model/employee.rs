//! Employee model and scalar-field validation.
//!
//! # Invariants
//! - `name`, `department` and `role` are non-blank after trimming.
//! - A blank `manager` is represented as `None`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned employee identifier.
pub type EmployeeId = i64;

/// Persisted employee row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    /// Unique display name.
    pub name: String,
    pub department: String,
    pub role: String,
    pub manager: Option<String>,
}

/// Scalar employee fields submitted on create/replace.
///
/// Grants travel separately so the same draft shape serves both paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeDraft {
    pub name: String,
    pub department: String,
    pub role: String,
    pub manager: Option<String>,
}

/// Field-level validation failure raised before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty after trimming. Holds `entity.field`.
    BlankField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
        }
    }
}

impl Error for ValidationError {}

impl EmployeeDraft {
    /// Creates a draft without a manager.
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            role: role.into(),
            manager: None,
        }
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = Some(manager.into());
        self
    }

    /// Returns a trimmed copy, folding a blank manager into `None`.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            department: self.department.trim().to_string(),
            role: self.role.trim().to_string(),
            manager: self
                .manager
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("employee.name"));
        }
        if self.department.trim().is_empty() {
            return Err(ValidationError::BlankField("employee.department"));
        }
        if self.role.trim().is_empty() {
            return Err(ValidationError::BlankField("employee.role"));
        }
        Ok(())
    }
}

impl Employee {
    /// Returns the scalar fields of this row as a draft, e.g. for edits.
    pub fn to_draft(&self) -> EmployeeDraft {
        EmployeeDraft {
            name: self.name.clone(),
            department: self.department.clone(),
            role: self.role.clone(),
            manager: self.manager.clone(),
        }
    }
}
