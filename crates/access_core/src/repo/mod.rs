//! Entity store: repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own create/update/delete paths for software, employees and grants.
//! - Translate storage constraint failures into semantic errors
//!   (`DuplicateKey`, `NotFound`, `ReferentialConflict`).
//!
//! # Invariants
//! - Every mutation runs inside one `IMMEDIATE` transaction.
//! - Storage constraints stay authoritative even when callers skip the
//!   consistency guard.

pub mod access_repo;
mod employee_repo;
pub mod error;
mod software_repo;

pub use access_repo::{AccessRepository, SqliteAccessRepository};
pub use error::{EntityRef, RepoError, RepoResult, UniqueKey};
