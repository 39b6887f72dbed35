//! Read-side assembly for clients.
//!
//! # Responsibility
//! - Return software and employees-with-access views in stable order.
//!
//! # Invariants
//! - Reads never mutate storage.
//! - One listing is assembled from one statement, so it reflects a single
//!   committed state.

mod roster;

pub use roster::{
    get_employee_with_access, get_software, list_departments, list_employees_with_access,
    list_software, RosterFilter,
};
