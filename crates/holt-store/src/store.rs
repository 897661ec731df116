//! KV store implementation using redb

use crate::error::{StoreError, StoreResult};
use crate::instance::{AccessMode, StoreInstance};
use crate::record::{self, Record, StoredValue, ValueRef};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of "now" in unix seconds, used for expiry
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

// Table definition for the KV store
const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("holt");

/// Options a store instance is opened with
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub mode: AccessMode,
    pub crypt_key: Option<String>,
}

/// KV store backed by redb
pub struct KvStore {
    db: Database,
    path: Option<PathBuf>,
    options: StoreOptions,
    clock: Clock,
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("path", &self.path)
            .field("mode", &self.options.mode)
            .field("encrypted", &self.options.crypt_key.is_some())
            .finish()
    }
}

impl KvStore {
    /// Open or create a KV store
    ///
    /// # Arguments
    /// * `path` - Database path. Use `:memory:` for an in-memory database,
    ///   or a file path for persistent storage
    pub fn open(path: &str, options: StoreOptions) -> StoreResult<Self> {
        if path == ":memory:" {
            let db = redb::Builder::new()
                .create_with_backend(redb::backends::InMemoryBackend::new())?;
            return Self::init(db, None, options);
        }

        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::InvalidPath(e.to_string()))?;
            }
        }
        let db = Database::create(path)?;
        Self::init(db, Some(path.to_path_buf()), options)
    }

    fn init(db: Database, path: Option<PathBuf>, options: StoreOptions) -> StoreResult<Self> {
        // Initialize the table
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TABLE)?;
        }
        write_txn.commit()?;

        debug!(path = ?path, mode = options.mode.bits(), "Opened store");
        Ok(Self {
            db,
            path,
            options,
            clock: Arc::new(record::now_secs),
        })
    }

    /// Replace the clock expiry is checked against
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> u64 {
        (self.clock)()
    }

    /// Write a value, optionally expiring `ttl` seconds from now
    pub fn put(&self, key: &str, value: ValueRef<'_>, ttl: Option<u32>) -> StoreResult<()> {
        if self.options.mode.is_read_only() {
            return Err(StoreError::ReadOnly);
        }

        let expire_at = ttl.map(|secs| self.now().saturating_add(u64::from(secs)));
        let bytes = record::encode(value, expire_at);

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE)?;
            table.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Read the record stored under `key`, ignoring expiry
    pub fn record(&self, key: &str) -> StoreResult<Option<Record>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE)?;

        match table.get(key)? {
            Some(guard) => Ok(Some(record::decode(key, guard.value())?)),
            None => Ok(None),
        }
    }

    /// Read the live value stored under `key`
    pub fn load(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        let now = self.now();
        Ok(self
            .record(key)?
            .filter(|r| !r.is_expired_at(now))
            .map(|r| r.value))
    }

    /// Delete a key. Returns whether a live value was removed.
    pub fn delete(&self, key: &str) -> StoreResult<bool> {
        if self.options.mode.is_read_only() {
            return Err(StoreError::ReadOnly);
        }

        let now = self.now();
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(TABLE)?;
            let old = table.remove(key)?;
            match old {
                Some(guard) => !record::decode(key, guard.value())?.is_expired_at(now),
                None => false,
            }
        };
        write_txn.commit()?;

        Ok(removed)
    }

    /// Get all live keys
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let now = self.now();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE)?;

        let mut keys = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            let key = key.value();
            match record::decode(key, value.value()) {
                Ok(record) if record.is_expired_at(now) => {}
                Ok(_) => keys.push(key.to_string()),
                Err(err) => warn!(key, error = %err, "Skipping undecodable record"),
            }
        }

        Ok(keys)
    }

    /// Clear all keys, expired ones included
    pub fn clear(&self) -> StoreResult<()> {
        if self.options.mode.is_read_only() {
            return Err(StoreError::ReadOnly);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE)?;
            table.retain(|_, _| false)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Check if this is an in-memory store
    pub fn is_memory(&self) -> bool {
        self.path.is_none()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn mode(&self) -> AccessMode {
        self.options.mode
    }

    pub fn crypt_key(&self) -> Option<&str> {
        self.options.crypt_key.as_deref()
    }
}

impl StoreInstance for KvStore {
    fn set(&self, key: &str, value: ValueRef<'_>) -> bool {
        match self.put(key, value, None) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "Failed to write value");
                false
            }
        }
    }

    fn set_with_expiration(&self, key: &str, value: ValueRef<'_>, expiration: u32) -> bool {
        match self.put(key, value, Some(expiration)) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, expiration, error = %err, "Failed to write expiring value");
                false
            }
        }
    }

    fn get(&self, key: &str) -> Option<StoredValue> {
        self.load(key).unwrap_or_else(|err| {
            warn!(key, error = %err, "Failed to read value");
            None
        })
    }

    fn remove_value(&self, key: &str) -> bool {
        self.delete(key).unwrap_or_else(|err| {
            warn!(key, error = %err, "Failed to remove value");
            false
        })
    }

    fn count(&self) -> usize {
        self.keys().map(|keys| keys.len()).unwrap_or_else(|err| {
            warn!(error = %err, "Failed to count keys");
            0
        })
    }
}
