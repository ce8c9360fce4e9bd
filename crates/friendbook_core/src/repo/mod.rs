//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite and JSON document details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate record shape before persistence.
//! - Absent records are reported as values (`None`, `0`), not errors.

pub mod friend_repo;
