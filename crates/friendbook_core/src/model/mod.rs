//! Domain model for the friends collection.
//!
//! # Responsibility
//! - Define canonical record shapes used by repositories and services.
//!
//! # Invariants
//! - Every stored record is identified by a store-assigned `FriendId`.
//! - Deletion is a hard delete; there are no related records to cascade.

pub mod friend;
