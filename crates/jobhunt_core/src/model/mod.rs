//! Domain model for tracked companies and their tasks.
//!
//! # Responsibility
//! - Define canonical data structures shared by schemas, store and storage.
//!
//! # Invariants
//! - Every company and task is identified by a stable ULID.
//! - A task never outlives or moves between companies.

pub mod company;
