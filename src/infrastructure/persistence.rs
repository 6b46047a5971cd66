use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::domain::OnboardingRecord;

/// The two logical records kept by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// The signed-in user.
    Session,
    /// The account created at registration.
    RegisteredAccount,
}

impl RecordKey {
    pub const ALL: [RecordKey; 2] = [RecordKey::Session, RecordKey::RegisteredAccount];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKey::Session => "user",
            RecordKey::RegisteredAccount => "registeredUser",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access record '{key}': {source}")]
    Io {
        key: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("record '{key}' is not valid JSON: {source}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value record storage.
///
/// Writes replace the whole value under a key; there is no versioning.
pub trait RecordStore {
    fn get(&self, key: RecordKey) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: RecordKey, value: &Value) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Reads a record, treating missing, unreadable or non-object data as absent.
pub fn load_record(store: &dyn RecordStore, key: RecordKey) -> Option<OnboardingRecord> {
    match store.get(key) {
        Ok(Some(Value::Object(record))) => Some(record),
        Ok(Some(other)) => {
            tracing::warn!(
                key = key.as_str(),
                kind = ?other,
                "stored record is not an object, ignoring"
            );
            None
        }
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(
                key = key.as_str(),
                error = %err,
                "could not read stored record, using defaults"
            );
            None
        }
    }
}

/// Overlays `fields` onto whatever is stored under `key`; same-named fields
/// are overwritten. Nothing is written.
pub fn merge_record(
    store: &dyn RecordStore,
    key: RecordKey,
    fields: &OnboardingRecord,
) -> OnboardingRecord {
    let mut record = load_record(store, key).unwrap_or_default();
    record.extend(fields.clone());
    record
}

/// Stores each record as `<key>.json` inside one directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: RecordKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl RecordStore for JsonFileStore {
    fn get(&self, key: RecordKey) -> Result<Option<Value>, StoreError> {
        let content = match fs::read_to_string(self.path_for(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { key: key.as_str(), source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Serialization { key: key.as_str(), source })
    }

    fn set(&self, key: RecordKey, value: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Serialization { key: key.as_str(), source })?;
        let io_error = |source| StoreError::Io { key: key.as_str(), source };
        fs::create_dir_all(&self.dir).map_err(io_error)?;
        fs::write(self.path_for(key), json).map_err(io_error)
    }

    fn clear(&self) -> Result<(), StoreError> {
        for key in RecordKey::ALL {
            match fs::remove_file(self.path_for(key)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { key: key.as_str(), source }),
            }
        }
        Ok(())
    }
}

/// In-memory store that also counts writes per key.
#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<RecordKey, Value>>,
    writes: RefCell<HashMap<RecordKey, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(key: RecordKey, value: Value) -> Self {
        let store = Self::new();
        store.records.borrow_mut().insert(key, value);
        store
    }

    pub fn write_count(&self, key: RecordKey) -> usize {
        self.writes.borrow().get(&key).copied().unwrap_or(0)
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: RecordKey) -> Result<Option<Value>, StoreError> {
        Ok(self.records.borrow().get(&key).cloned())
    }

    fn set(&self, key: RecordKey, value: &Value) -> Result<(), StoreError> {
        self.records.borrow_mut().insert(key, value.clone());
        *self.writes.borrow_mut().entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.records.borrow_mut().clear();
        Ok(())
    }
}
