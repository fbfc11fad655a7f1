//! Domain model for the contact agenda.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every persisted contact is identified by a storage-assigned `ContactId`.
//! - Deletion is a hard delete; `is_active` is a visibility flag only.

pub mod contact;
