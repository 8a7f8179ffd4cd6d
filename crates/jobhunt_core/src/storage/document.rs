//! Versioned persisted document and load-time migration.
//!
//! # Layout
//! `{"state":{"companies":[...]},"version":1}` under `STORAGE_KEY`.
//!
//! # Invariants
//! - Documents without `version` are legacy version 0.
//! - Migrations run in ascending order; each is registered exactly once.
//! - Every decoded company passes `Company::validate()`.

use super::{KeyValueStore, StateStorage, StorageError, StorageResult};
use crate::model::company::Company;
use crate::schema::normalize_candidate_dates;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Fixed key of the persisted document.
pub const STORAGE_KEY: &str = "job-hunt-storage";

/// Document version written by this build.
pub const DOCUMENT_VERSION: u32 = 1;

type MigrationFn = fn(&mut Value) -> Result<(), String>;

#[derive(Clone, Copy)]
struct DocumentMigration {
    version: u32,
    apply: MigrationFn,
}

const MIGRATIONS: &[DocumentMigration] = &[DocumentMigration {
    version: 1,
    apply: migrate_legacy_document,
}];

#[derive(Serialize)]
struct DocumentOut<'a> {
    state: StateOut<'a>,
    version: u32,
}

#[derive(Serialize)]
struct StateOut<'a> {
    companies: &'a [Company],
}

#[derive(Deserialize)]
struct DocumentIn {
    state: StateIn,
}

#[derive(Deserialize)]
struct StateIn {
    #[serde(default)]
    companies: Vec<Company>,
}

/// Serializes the collection as a current-version document.
pub fn encode_document(companies: &[Company]) -> StorageResult<String> {
    serde_json::to_string(&DocumentOut {
        state: StateOut { companies },
        version: DOCUMENT_VERSION,
    })
    .map_err(StorageError::Encode)
}

/// Parses, migrates and validates a persisted document.
pub fn decode_document(raw: &str) -> StorageResult<Vec<Company>> {
    let mut value: Value = serde_json::from_str(raw)
        .map_err(|err| StorageError::Corrupt(format!("document is not valid JSON: {err}")))?;

    let version = document_version(&value)?;
    if version > u64::from(DOCUMENT_VERSION) {
        return Err(StorageError::UnsupportedDocumentVersion {
            version,
            latest_supported: DOCUMENT_VERSION,
        });
    }

    for migration in MIGRATIONS
        .iter()
        .filter(|migration| u64::from(migration.version) > version)
    {
        (migration.apply)(&mut value).map_err(|message| {
            StorageError::Corrupt(format!(
                "migration to version {} failed: {message}",
                migration.version
            ))
        })?;
        set_version(&mut value, migration.version);
        info!(
            "event=document_migrate module=storage status=ok to_version={}",
            migration.version
        );
    }

    let document: DocumentIn = serde_json::from_value(value)
        .map_err(|err| StorageError::Corrupt(format!("unexpected document shape: {err}")))?;

    let mut seen = HashSet::new();
    for (index, company) in document.state.companies.iter().enumerate() {
        company
            .validate()
            .map_err(|err| StorageError::InvalidData(format!("companies[{index}]: {err}")))?;
        if !seen.insert(company.id) {
            return Err(StorageError::InvalidData(format!(
                "companies[{index}]: duplicate company id {}",
                company.id
            )));
        }
    }

    Ok(document.state.companies)
}

fn document_version(value: &Value) -> StorageResult<u64> {
    let object = value
        .as_object()
        .ok_or_else(|| StorageError::Corrupt("document root must be an object".to_string()))?;
    match object.get("version") {
        None | Some(Value::Null) => Ok(0),
        Some(version) => version.as_u64().ok_or_else(|| {
            StorageError::Corrupt(format!("document version `{version}` is not an integer"))
        }),
    }
}

fn set_version(value: &mut Value, version: u32) {
    if let Some(object) = value.as_object_mut() {
        object.insert("version".to_string(), Value::from(version));
    }
}

/// 0 -> 1: wraps bare `{companies}` roots, fills defaulted arrays and flags,
/// drops blank optionals and normalizes candidate dates.
fn migrate_legacy_document(value: &mut Value) -> Result<(), String> {
    let root = value
        .as_object_mut()
        .ok_or_else(|| "document root must be an object".to_string())?;

    if !root.contains_key("state") {
        let companies = root.remove("companies").unwrap_or(Value::Array(Vec::new()));
        let mut state = Map::new();
        state.insert("companies".to_string(), companies);
        root.insert("state".to_string(), Value::Object(state));
    }

    let state = root
        .get_mut("state")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| "`state` must be an object".to_string())?;
    if matches!(state.get("companies"), None | Some(Value::Null)) {
        state.insert("companies".to_string(), Value::Array(Vec::new()));
    }
    let companies = match state.get_mut("companies") {
        Some(Value::Array(companies)) => companies,
        _ => return Err("`state.companies` must be an array".to_string()),
    };

    for (index, company) in companies.iter_mut().enumerate() {
        let company = company
            .as_object_mut()
            .ok_or_else(|| format!("companies[{index}] must be an object"))?;

        for key in ["confirmedDate", "remarks", "nextAction"] {
            drop_blank(company, key);
        }

        let mut tasks = take_array(company, "tasks");
        for task in tasks.iter_mut().filter_map(Value::as_object_mut) {
            drop_blank(task, "dueDate");
            if !matches!(task.get("isDone"), Some(Value::Bool(_))) {
                task.insert("isDone".to_string(), Value::Bool(false));
            }
        }
        company.insert("tasks".to_string(), Value::Array(tasks));

        let dates = take_array(company, "candidateDates")
            .iter()
            .map(|date| {
                date.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("companies[{index}].candidateDates must be strings"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let before = dates.len();
        let normalized = normalize_candidate_dates(dates);
        if normalized.len() != before {
            warn!(
                "event=document_migrate module=storage status=repaired company_index={} dropped_duplicates={}",
                index,
                before - normalized.len()
            );
        }
        company.insert(
            "candidateDates".to_string(),
            Value::Array(normalized.into_iter().map(Value::String).collect()),
        );
    }

    Ok(())
}

fn drop_blank(object: &mut Map<String, Value>, key: &str) {
    let blank = match object.get(key) {
        Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        _ => false,
    };
    if blank {
        object.remove(key);
    }
}

fn take_array(object: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match object.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// `StateStorage` that stores the document in one key-value slot.
pub struct PersistedStateStorage<K: KeyValueStore> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> PersistedStateStorage<K> {
    /// Uses the fixed `STORAGE_KEY` slot.
    pub fn new(backend: K) -> Self {
        Self::with_key(backend, STORAGE_KEY)
    }

    pub fn with_key(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the raw stored document, if any.
    pub fn raw_document(&self) -> StorageResult<Option<String>> {
        self.backend.get_item(&self.key)
    }

    pub fn into_inner(self) -> K {
        self.backend
    }
}

impl<K: KeyValueStore + Default> Default for PersistedStateStorage<K> {
    fn default() -> Self {
        Self::new(K::default())
    }
}

impl<K: KeyValueStore> StateStorage for PersistedStateStorage<K> {
    fn load(&self) -> StorageResult<Vec<Company>> {
        match self.backend.get_item(&self.key)? {
            Some(raw) => decode_document(&raw),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, companies: &[Company]) -> StorageResult<()> {
        let encoded = encode_document(companies)?;
        self.backend.set_item(&self.key, &encoded)
    }
}
