//! Core use-case services.
//!
//! # Responsibility
//! - Run validation and consistency-guard checks before storage writes.
//! - Keep transport/presentation layers decoupled from storage details.

pub mod access_service;
