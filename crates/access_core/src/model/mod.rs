//! Domain model for the software access registry.
//!
//! # Responsibility
//! - Define the records persisted by the entity store.
//! - Define the denormalized employee view assembled by the query layer.
//!
//! # Invariants
//! - Ids are assigned by storage and never reused.
//! - A `None` access level is never a row; it is the absence of a grant.

pub mod access;
pub mod employee;
pub mod software;
