//! SQLite-backed [`KeyValueStore`].
//!
//! A single `kv` table holds every key. Statements run on the blocking
//! pool so the async callers never stall the runtime.

use super::kv::{KeyValueStore, StorageError, UpdateFn};
use async_trait::async_trait;
use log::{debug, info, warn};
use sqlite::{Connection, State};
use std::sync::{Arc, Mutex};

/// How long a connection waits for another one holding the write lock
const BUSY_TIMEOUT_MS: usize = 5_000;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

#[derive(Clone)]
pub struct SqliteKeyValueStore {
    connection: Arc<Mutex<Connection>>,
    path: String,
}

impl SqliteKeyValueStore {
    /// Open (or create) the database at `path`. `":memory:"` gives a
    /// throwaway database.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let mut connection = sqlite::open(path)?;
        connection.set_busy_timeout(BUSY_TIMEOUT_MS)?;
        connection.execute(CREATE_TABLE)?;
        info!("Opened key-value store at {path}");

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| StorageError::Backend("sqlite connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await?
    }
}

fn read_value(connection: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    let mut statement = connection.prepare("SELECT value FROM kv WHERE key = ?")?;
    statement.bind((1, key))?;
    if let State::Row = statement.next()? {
        Ok(Some(statement.read::<String, _>("value")?))
    } else {
        Ok(None)
    }
}

fn write_value(connection: &Connection, key: &str, value: &str) -> Result<(), StorageError> {
    let mut statement =
        connection.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")?;
    statement.bind((1, key))?;
    statement.bind((2, value))?;
    while statement.next()? != State::Done {}
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_string();
        self.with_connection(move |connection| read_value(connection, &key))
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        let value = value.to_string();
        debug!("Writing {} bytes under {key}", value.len());
        self.with_connection(move |connection| write_value(connection, &key, &value))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        self.with_connection(move |connection| {
            let mut statement = connection.prepare("DELETE FROM kv WHERE key = ?")?;
            statement.bind((1, key.as_str()))?;
            while statement.next()? != State::Done {}
            Ok(())
        })
        .await
    }

    async fn update(&self, key: &str, apply: UpdateFn) -> Result<(), StorageError> {
        let key = key.to_string();
        self.with_connection(move |connection| {
            // IMMEDIATE takes the write lock up front, so another connection
            // cannot write between our read and our write.
            connection.execute("BEGIN IMMEDIATE")?;
            let outcome = read_value(connection, &key)
                .and_then(apply)
                .and_then(|next| match next {
                    Some(value) => write_value(connection, &key, &value),
                    None => Ok(()),
                });
            match outcome {
                Ok(()) => {
                    connection.execute("COMMIT")?;
                    Ok(())
                }
                Err(e) => {
                    if let Err(rollback) = connection.execute("ROLLBACK") {
                        warn!("Rollback of {key} failed: {rollback}");
                    }
                    Err(e)
                }
            }
        })
        .await
    }
}
