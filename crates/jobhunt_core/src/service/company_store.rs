//! Company store: the single mutation surface over the company collection.
//!
//! # Responsibility
//! - Hold the authoritative in-memory list of companies.
//! - Validate inbound payloads, apply mutations, persist through
//!   `StateStorage`.
//!
//! # Invariants
//! - Every mutation is all-or-nothing: validation failures, missing ids and
//!   storage failures leave the collection and revision untouched.
//! - New companies are prepended (most-recent-first).
//! - `candidate_dates` stays duplicate-free and ascending.
//! - `revision` increases by one per committed mutation.

use crate::model::company::{Company, CompanyId, Task, TaskId};
use crate::schema::datetime::normalize_candidate_dates;
use crate::schema::{
    validate_candidate_date, CompanyCreateInput, CompanyPatchInput, TaskCreateInput,
    TaskPatchInput, ValidationError,
};
use crate::storage::{StateStorage, StorageError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use ulid::Ulid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of one store operation.
#[derive(Debug)]
pub enum StoreError {
    /// Input payload rejected before any state change.
    Validation(ValidationError),
    CompanyNotFound(CompanyId),
    TaskNotFound {
        company_id: CompanyId,
        task_id: TaskId,
    },
    Storage(StorageError),
}

impl StoreError {
    /// Stable machine-readable code used in logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::CompanyNotFound(_) => "company_not_found",
            Self::TaskNotFound { .. } => "task_not_found",
            Self::Storage(_) => "storage_failed",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CompanyNotFound(id) => write!(f, "company not found: {id}"),
            Self::TaskNotFound {
                company_id,
                task_id,
            } => write!(f, "task not found: {task_id} (company {company_id})"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::CompanyNotFound(_) | Self::TaskNotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// In-memory company collection with write-through persistence.
pub struct CompanyStore<S: StateStorage> {
    storage: S,
    companies: Vec<Company>,
    revision: u64,
}

impl<S: StateStorage> CompanyStore<S> {
    /// Loads the persisted collection; an empty slot yields an empty store.
    pub fn load(storage: S) -> StoreResult<Self> {
        let started_at = Instant::now();
        match storage.load() {
            Ok(companies) => {
                info!(
                    "event=store_load module=store status=ok companies={} duration_ms={}",
                    companies.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    storage,
                    companies,
                    revision: 0,
                })
            }
            Err(err) => {
                error!(
                    "event=store_load module=store status=error duration_ms={} error_code=storage_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Companies, most recently created first.
    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.iter().find(|company| company.id == id)
    }

    /// Number of committed mutations since load.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Validates and inserts a new company at the front of the collection.
    pub fn create_company(&mut self, input: &CompanyCreateInput) -> StoreResult<CompanyId> {
        self.commit("company_create", |companies| {
            let draft = input.validate()?;
            let id = fresh_id(|candidate| companies.iter().any(|company| company.id == candidate));

            let mut company = Company::new(id, draft.name, draft.progress_status);
            for task in draft.tasks {
                let task_id = fresh_id(|candidate| company.task(candidate).is_some());
                company.tasks.push(task.into_task(task_id));
            }
            company.candidate_dates = normalize_candidate_dates(draft.candidate_dates);
            company.confirmed_date = draft.confirmed_date;
            company.remarks = draft.remarks;
            company.next_action = draft.next_action;

            companies.insert(0, company);
            Ok(id)
        })
    }

    /// Applies only the fields present in `patch`.
    ///
    /// A `tasks` field replaces the whole task list with the supplied ids.
    pub fn update_company(&mut self, id: CompanyId, patch: &CompanyPatchInput) -> StoreResult<()> {
        self.commit("company_update", |companies| {
            let patch = patch.validate()?;
            let company = find_company(companies, id)?;
            patch.apply(company);
            company.candidate_dates =
                normalize_candidate_dates(std::mem::take(&mut company.candidate_dates));
            Ok(())
        })
    }

    pub fn delete_company(&mut self, id: CompanyId) -> StoreResult<()> {
        self.commit("company_delete", |companies| {
            let index = companies
                .iter()
                .position(|company| company.id == id)
                .ok_or(StoreError::CompanyNotFound(id))?;
            companies.remove(index);
            Ok(())
        })
    }

    /// Adds a candidate date and re-normalizes the list.
    pub fn add_candidate_date(&mut self, id: CompanyId, date: &str) -> StoreResult<()> {
        self.commit("candidate_date_add", |companies| {
            let date = validate_candidate_date(date)?;
            let company = find_company(companies, id)?;
            company.candidate_dates.push(date);
            company.candidate_dates =
                normalize_candidate_dates(std::mem::take(&mut company.candidate_dates));
            Ok(())
        })
    }

    /// Removes the exact matching string; absent dates are ignored.
    pub fn remove_candidate_date(&mut self, id: CompanyId, date: &str) -> StoreResult<()> {
        self.commit("candidate_date_remove", |companies| {
            let company = find_company(companies, id)?;
            company.candidate_dates.retain(|existing| existing != date);
            Ok(())
        })
    }

    /// Promotes `date` to the confirmed date and drops every candidate.
    pub fn confirm_candidate_date(&mut self, id: CompanyId, date: &str) -> StoreResult<()> {
        self.commit("candidate_date_confirm", |companies| {
            let date = validate_candidate_date(date)?;
            let company = find_company(companies, id)?;
            company.confirmed_date = Some(date);
            company.candidate_dates.clear();
            Ok(())
        })
    }

    /// Clears the confirmed date without restoring candidates.
    pub fn clear_confirmed_date(&mut self, id: CompanyId) -> StoreResult<()> {
        self.commit("confirmed_date_clear", |companies| {
            find_company(companies, id)?.confirmed_date = None;
            Ok(())
        })
    }

    /// Appends a new task to the company's list.
    pub fn add_task(&mut self, company_id: CompanyId, input: &TaskCreateInput) -> StoreResult<TaskId> {
        self.commit("task_add", |companies| {
            let draft = input.validate()?;
            let company = find_company(companies, company_id)?;
            let task_id = fresh_id(|candidate| company.task(candidate).is_some());
            company.tasks.push(draft.into_task(task_id));
            Ok(task_id)
        })
    }

    /// Flips the done flag and returns its new value.
    pub fn toggle_task(&mut self, company_id: CompanyId, task_id: TaskId) -> StoreResult<bool> {
        self.commit("task_toggle", |companies| {
            let task = find_task(companies, company_id, task_id)?;
            task.is_done = !task.is_done;
            Ok(task.is_done)
        })
    }

    pub fn update_task(
        &mut self,
        company_id: CompanyId,
        task_id: TaskId,
        patch: &TaskPatchInput,
    ) -> StoreResult<()> {
        self.commit("task_update", |companies| {
            let patch = patch.validate()?;
            patch.apply(find_task(companies, company_id, task_id)?);
            Ok(())
        })
    }

    pub fn remove_task(&mut self, company_id: CompanyId, task_id: TaskId) -> StoreResult<()> {
        self.commit("task_remove", |companies| {
            let company = find_company(companies, company_id)?;
            let index = company
                .tasks
                .iter()
                .position(|task| task.id == task_id)
                .ok_or(StoreError::TaskNotFound {
                    company_id,
                    task_id,
                })?;
            company.tasks.remove(index);
            Ok(())
        })
    }

    /// Runs `mutate` on a working copy, persists it, then swaps it in.
    fn commit<T>(
        &mut self,
        event: &'static str,
        mutate: impl FnOnce(&mut Vec<Company>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let mut next = self.companies.clone();
        let result = mutate(&mut next).and_then(|value| {
            self.storage.save(&next)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                self.companies = next;
                self.revision += 1;
                info!(
                    "event={event} module=store status=ok revision={} companies={} duration_ms={}",
                    self.revision,
                    self.companies.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err @ StoreError::Storage(_)) => {
                error!(
                    "event={event} module=store status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
            Err(err) => {
                // Validation messages may echo user input; log the code only.
                warn!(
                    "event={event} module=store status=rejected duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                Err(err)
            }
        }
    }
}

fn find_company(companies: &mut [Company], id: CompanyId) -> StoreResult<&mut Company> {
    companies
        .iter_mut()
        .find(|company| company.id == id)
        .ok_or(StoreError::CompanyNotFound(id))
}

fn find_task(
    companies: &mut [Company],
    company_id: CompanyId,
    task_id: TaskId,
) -> StoreResult<&mut Task> {
    find_company(companies, company_id)?
        .task_mut(task_id)
        .ok_or(StoreError::TaskNotFound {
            company_id,
            task_id,
        })
}

/// Generates a ULID not rejected by `taken`.
fn fresh_id(taken: impl Fn(Ulid) -> bool) -> Ulid {
    loop {
        let candidate = Ulid::new();
        if !taken(candidate) {
            return candidate;
        }
    }
}
