//! Core domain logic for the job-hunting tracker.
//! This crate is the single source of truth for company/task invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod schema;
pub mod service;
pub mod storage;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::company::{Company, CompanyId, ProgressStatus, Task, TaskId};
pub use schema::{
    CompanyCreateInput, CompanyPatch, CompanyPatchInput, IssueKind, TaskCreateInput, TaskInput,
    TaskPatchInput, ValidationError, ValidationIssue,
};
pub use service::company_store::{CompanyStore, StoreError, StoreResult};
pub use service::views::{
    calendar_entries, company_summary, open_tasks, CalendarEntry, CalendarEntryKind,
    CompanySummary, NextSchedule, TaskView,
};
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, MemoryStateStorage, PersistedStateStorage,
    SqliteKeyValueStore, SqliteStateStorage, StateStorage, StorageError, StorageResult,
    STORAGE_KEY,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
