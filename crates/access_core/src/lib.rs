//! Core domain logic for the software access registry.
//! This crate is the single source of truth for employee/software access
//! invariants.

pub mod config;
pub mod db;
pub mod guard;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use guard::{name_is_unique, software_is_in_use};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::access::{AccessGrant, AccessLevel, EmployeeWithAccess, GrantSpec};
pub use model::employee::{Employee, EmployeeDraft, EmployeeId, ValidationError};
pub use model::software::{Software, SoftwareId};
pub use query::RosterFilter;
pub use repo::{
    AccessRepository, EntityRef, RepoError, RepoResult, SqliteAccessRepository, UniqueKey,
};
pub use service::access_service::{AccessService, AccessServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
