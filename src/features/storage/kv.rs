//! Key-value adapter contract, in-memory implementation, and typed helpers.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Storage key for the singleton user record
pub const USER_KEY: &str = "@PlantManager:user";

/// Storage key for the serialized plant collection
pub const PLANTS_KEY: &str = "@PlantManager:plants";

/// Storage key for notifications waiting to fire
pub const NOTIFICATIONS_KEY: &str = "@PlantManager:notifications";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] ::sqlite::Error),
    #[error("malformed value under '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Read-modify-write step run by [`KeyValueStore::update`]. Receives the
/// current value; `Some` replaces it, `None` leaves it untouched.
pub type UpdateFn =
    Box<dyn FnOnce(Option<String>) -> Result<Option<String>, StorageError> + Send>;

/// Async string-keyed store. Absent keys are `Ok(None)`, not errors.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Atomically read, transform and write one key. No other writer,
    /// in this process or another one sharing the backend, can slip in
    /// between the read and the write. An error from `apply` aborts
    /// without writing.
    async fn update(&self, key: &str, apply: UpdateFn) -> Result<(), StorageError>;
}

/// In-memory store keyed by string
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: DashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn update(&self, key: &str, apply: UpdateFn) -> Result<(), StorageError> {
        // The entry guard holds the shard lock for the whole step
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if let Some(value) = apply(Some(occupied.get().clone()))? {
                    occupied.insert(value);
                }
            }
            Entry::Vacant(vacant) => {
                if let Some(value) = apply(None)? {
                    vacant.insert(value);
                }
            }
        }
        Ok(())
    }
}

/// Load and deserialize a JSON value stored under `key`
pub async fn load_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|source| StorageError::Malformed {
        key: key.to_string(),
        source,
    })?;
    Ok(Some(value))
}

/// Serialize `value` as JSON and store it under `key`
pub async fn save_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw).await
}

/// Atomically transform the JSON value under `key` with `f`, starting
/// from `T::default()` when absent, and return what `f` returns. An `Err`
/// from `f` leaves the stored value untouched.
pub async fn update_json<S, T, R, E, F>(store: &S, key: &str, f: F) -> Result<R, E>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Serialize + Default + 'static,
    R: Send + 'static,
    E: From<StorageError> + Send + 'static,
    F: FnOnce(&mut T) -> Result<R, E> + Send + 'static,
{
    let outcome: Arc<Mutex<Option<Result<R, E>>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&outcome);
    let owned_key = key.to_string();

    store
        .update(
            key,
            Box::new(move |raw| {
                let mut value: T = match raw {
                    Some(raw) => {
                        serde_json::from_str(&raw).map_err(|source| StorageError::Malformed {
                            key: owned_key.clone(),
                            source,
                        })?
                    }
                    None => T::default(),
                };
                let result = f(&mut value);
                let write = match &result {
                    Ok(_) => Some(serde_json::to_string(&value).map_err(|source| {
                        StorageError::Encode {
                            key: owned_key,
                            source,
                        }
                    })?),
                    Err(_) => None,
                };
                if let Ok(mut guard) = slot.lock() {
                    *guard = Some(result);
                }
                Ok(write)
            }),
        )
        .await?;

    let result = outcome.lock().ok().and_then(|mut guard| guard.take());
    result.unwrap_or_else(|| {
        Err(StorageError::Backend(format!("update of '{key}' produced no result")).into())
    })
}
