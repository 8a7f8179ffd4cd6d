//! Store and read-side use cases.
//!
//! # Responsibility
//! - Own the company collection and its mutation surface (`company_store`).
//! - Project the collection for calendar, task-list and detail screens
//!   (`views`).

pub mod company_store;
pub mod views;
