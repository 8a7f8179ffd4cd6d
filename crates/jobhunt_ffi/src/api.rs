//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide company store and its SQLite slot.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Payloads cross the boundary as camelCase JSON strings.
//! - Ids that are not valid ULIDs are reported as not found.

use jobhunt_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CompanyCreateInput, CompanyId, CompanyPatchInput, CompanyStore, PersistedStateStorage,
    SqliteKeyValueStore, SqliteStateStorage, StoreResult, TaskCreateInput, TaskId,
    TaskPatchInput,
};
use log::warn;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const STORE_DB_FILE_NAME: &str = "jobhunt_store.sqlite3";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE: Mutex<Option<CompanyStore<SqliteStateStorage>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Created company/task id, when the action creates one.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl StoreActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Snapshot envelope carrying the full company list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompaniesSnapshotResponse {
    pub ok: bool,
    /// JSON array of companies, most recently created first. `[]` on failure.
    pub companies_json: String,
    pub message: String,
}

/// Returns every company as a JSON array.
///
/// # FFI contract
/// - Sync call, opens the store on first use.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn companies_snapshot() -> CompaniesSnapshotResponse {
    let encoded = with_store(|store| {
        serde_json::to_string(store.companies()).map_err(|err| format!("encode failed: {err}"))
    })
    .and_then(|result| result);

    match encoded {
        Ok(companies_json) => CompaniesSnapshotResponse {
            ok: true,
            companies_json,
            message: "Snapshot loaded.".to_string(),
        },
        Err(err) => CompaniesSnapshotResponse {
            ok: false,
            companies_json: "[]".to_string(),
            message: format!("companies_snapshot failed: {err}"),
        },
    }
}

/// Creates a company from a `CompanyCreateInput` JSON payload.
#[flutter_rust_bridge::frb(sync)]
pub fn company_create(payload_json: String) -> StoreActionResponse {
    let result = parse_payload::<CompanyCreateInput>(&payload_json)
        .and_then(|input| run_store_action(|store| store.create_company(&input)));
    match result {
        Ok(id) => StoreActionResponse::success("Company created.", Some(id.to_string())),
        Err(err) => StoreActionResponse::failure(format!("company_create failed: {err}")),
    }
}

/// Applies a partial `CompanyPatchInput` JSON payload.
///
/// Absent keys are untouched; `null` clears nullable fields.
#[flutter_rust_bridge::frb(sync)]
pub fn company_update(company_id: String, patch_json: String) -> StoreActionResponse {
    let result = parse_company_id(&company_id).and_then(|id| {
        let patch = parse_payload::<CompanyPatchInput>(&patch_json)?;
        run_store_action(|store| store.update_company(id, &patch))
    });
    unit_response("company_update", "Company updated.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn company_delete(company_id: String) -> StoreActionResponse {
    let result = parse_company_id(&company_id)
        .and_then(|id| run_store_action(|store| store.delete_company(id)));
    unit_response("company_delete", "Company deleted.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn candidate_date_add(company_id: String, date: String) -> StoreActionResponse {
    let result = parse_company_id(&company_id)
        .and_then(|id| run_store_action(|store| store.add_candidate_date(id, &date)));
    unit_response("candidate_date_add", "Candidate date added.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn candidate_date_remove(company_id: String, date: String) -> StoreActionResponse {
    let result = parse_company_id(&company_id)
        .and_then(|id| run_store_action(|store| store.remove_candidate_date(id, &date)));
    unit_response("candidate_date_remove", "Candidate date removed.", result)
}

/// Confirms `date` and clears every remaining candidate.
#[flutter_rust_bridge::frb(sync)]
pub fn candidate_date_confirm(company_id: String, date: String) -> StoreActionResponse {
    let result = parse_company_id(&company_id)
        .and_then(|id| run_store_action(|store| store.confirm_candidate_date(id, &date)));
    unit_response("candidate_date_confirm", "Date confirmed.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn confirmed_date_clear(company_id: String) -> StoreActionResponse {
    let result = parse_company_id(&company_id)
        .and_then(|id| run_store_action(|store| store.clear_confirmed_date(id)));
    unit_response("confirmed_date_clear", "Confirmed date cleared.", result)
}

/// Appends a task from a `TaskCreateInput` JSON payload.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(company_id: String, payload_json: String) -> StoreActionResponse {
    let result = parse_company_id(&company_id).and_then(|id| {
        let input = parse_payload::<TaskCreateInput>(&payload_json)?;
        run_store_action(|store| store.add_task(id, &input))
    });
    match result {
        Ok(task_id) => StoreActionResponse::success("Task added.", Some(task_id.to_string())),
        Err(err) => StoreActionResponse::failure(format!("task_add failed: {err}")),
    }
}

/// Flips the task's done flag; the message carries the new state.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(company_id: String, task_id: String) -> StoreActionResponse {
    let result = parse_task_ids(&company_id, &task_id)
        .and_then(|(company, task)| run_store_action(|store| store.toggle_task(company, task)));
    match result {
        Ok(true) => StoreActionResponse::success("Task done.", None),
        Ok(false) => StoreActionResponse::success("Task reopened.", None),
        Err(err) => StoreActionResponse::failure(format!("task_toggle failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_update(company_id: String, task_id: String, patch_json: String) -> StoreActionResponse {
    let result = parse_task_ids(&company_id, &task_id).and_then(|(company, task)| {
        let patch = parse_payload::<TaskPatchInput>(&patch_json)?;
        run_store_action(|store| store.update_task(company, task, &patch))
    });
    unit_response("task_update", "Task updated.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_remove(company_id: String, task_id: String) -> StoreActionResponse {
    let result = parse_task_ids(&company_id, &task_id)
        .and_then(|(company, task)| run_store_action(|store| store.remove_task(company, task)));
    unit_response("task_remove", "Task removed.", result)
}

fn unit_response(
    action: &str,
    message: &str,
    result: Result<(), String>,
) -> StoreActionResponse {
    match result {
        Ok(()) => StoreActionResponse::success(message, None),
        Err(err) => StoreActionResponse::failure(format!("{action} failed: {err}")),
    }
}

fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|err| format!("invalid payload: {err}"))
}

fn parse_company_id(raw: &str) -> Result<CompanyId, String> {
    raw.trim()
        .parse::<CompanyId>()
        .map_err(|_| format!("company not found: {raw}"))
}

fn parse_task_ids(company_id: &str, task_id: &str) -> Result<(CompanyId, TaskId), String> {
    let company = parse_company_id(company_id)?;
    let task = task_id
        .trim()
        .parse::<TaskId>()
        .map_err(|_| format!("task not found: {task_id} (company {company})"))?;
    Ok((company, task))
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("JOBHUNT_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn open_store() -> Result<CompanyStore<SqliteStateStorage>, String> {
    let db_path = resolve_store_db_path();
    let backend =
        SqliteKeyValueStore::open(&db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    CompanyStore::load(PersistedStateStorage::new(backend))
        .map_err(|err| format!("store load failed: {err}"))
}

/// Locks the process-wide store, opening it on first use.
fn with_store<T>(
    f: impl FnOnce(&mut CompanyStore<SqliteStateStorage>) -> T,
) -> Result<T, String> {
    let mut guard = STORE.lock().map_err(|_| {
        warn!("event=store_lock module=ffi status=error error_code=lock_poisoned");
        "store lock poisoned".to_string()
    })?;
    if guard.is_none() {
        *guard = Some(open_store()?);
    }
    match guard.as_mut() {
        Some(store) => Ok(f(store)),
        None => Err("store unavailable".to_string()),
    }
}

fn run_store_action<T>(
    f: impl FnOnce(&mut CompanyStore<SqliteStateStorage>) -> StoreResult<T>,
) -> Result<T, String> {
    with_store(|store| f(store).map_err(|err| err.to_string())).and_then(|result| result)
}
