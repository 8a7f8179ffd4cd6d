//! Persistence collaborators for the company store.
//!
//! # Responsibility
//! - Define the `StateStorage` contract injected into `CompanyStore`.
//! - Provide key-value slot backends (SQLite, in-memory).
//! - Encode/decode the versioned persisted document.
//!
//! # Invariants
//! - A missing document loads as an empty collection.
//! - A present but unreadable document is an error, never an empty result.

use crate::db::DbError;
use crate::model::company::Company;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document;
pub mod kv;

pub use document::{
    decode_document, encode_document, PersistedStateStorage, DOCUMENT_VERSION, STORAGE_KEY,
};
pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};

pub type StorageResult<T> = Result<T, StorageError>;

/// Document storage backed by device-local SQLite.
pub type SqliteStateStorage = PersistedStateStorage<SqliteKeyValueStore>;

/// Document storage held in process memory.
pub type MemoryStateStorage = PersistedStateStorage<MemoryKeyValueStore>;

/// Load/save contract for the full company collection.
pub trait StateStorage {
    /// Returns the persisted collection, or an empty one when nothing was saved.
    fn load(&self) -> StorageResult<Vec<Company>>;

    /// Replaces the persisted collection.
    fn save(&mut self, companies: &[Company]) -> StorageResult<()>;
}

/// Persistence error for load/save operations.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Stored text is not a readable document.
    Corrupt(String),
    /// Document was written by a newer build.
    UnsupportedDocumentVersion { version: u64, latest_supported: u32 },
    /// Document parsed but violates record invariants.
    InvalidData(String),
    Encode(serde_json::Error),
    /// Backend-specific failure outside SQLite.
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Corrupt(message) => write!(f, "corrupt persisted document: {message}"),
            Self::UnsupportedDocumentVersion {
                version,
                latest_supported,
            } => write!(
                f,
                "persisted document version {version} is newer than supported {latest_supported}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted company data: {message}"),
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
