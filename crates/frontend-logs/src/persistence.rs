// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Durable mirror of the log buffer.
//!
//! The buffer is persisted as a whole under a single key holding the JSON
//! array of entries. Writes are whole-buffer overwrites, never incremental,
//! so a failed write leaves the previously persisted snapshot intact.
//!
//! # Failure Policy
//!
//! Persistence is best effort. Storage errors never leave this module: they
//! are reported once on the side channel (`warn`), later failures of the same
//! streak are only logged at `debug`, and a successful operation re-arms the
//! report.
//!
//! # Ordering
//!
//! Saves and clears run one at a time. [`PersistenceBridge::save_with`] and
//! [`PersistenceBridge::sync_with`] take their snapshot only once they hold
//! the write lock, so the value left in storage always reflects the buffer as
//! of the last operation to complete.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::buffer::Snapshot;
use crate::constants::STORAGE_KEY;
use crate::entry::LogEntry;
use crate::error::PersistenceError;

/// Key-value durable storage.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    /// Replaces the value stored under `key`.
    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    /// Removes `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a temporary file which is then renamed over the target, so a
/// reader never observes a partially written value. Every write gets its own
/// temporary file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        static NEXT_WRITE: AtomicU64 = AtomicU64::new(0);
        let id = NEXT_WRITE.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{key}.json.{}.{id}.tmp", std::process::id()))
    }
}

async fn write_and_rename(
    tmp: &Path,
    value: &str,
    target: &Path,
) -> Result<(), PersistenceError> {
    tokio::fs::write(tmp, value).await?;
    tokio::fs::rename(tmp, target).await?;
    Ok(())
}

#[async_trait]
impl Storage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.temp_path(key);
        if let Err(e) = write_and_rename(&tmp, value, &self.path(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local storage, used when no storage directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Saves, loads and clears the persisted buffer. Never returns an error.
pub struct PersistenceBridge {
    storage: Arc<dyn Storage>,
    key: String,
    failing: AtomicBool,
    write_lock: tokio::sync::Mutex<()>,
}

impl PersistenceBridge {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    pub fn with_key(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            failing: AtomicBool::new(false),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Overwrites the persisted buffer with `entries`.
    ///
    /// Returns `false` if the write failed; the previous value is left in place.
    pub async fn save(&self, entries: &[LogEntry]) -> bool {
        let _write = self.write_lock.lock().await;
        self.write(entries).await
    }

    /// Persists the snapshot returned by `snapshot`, taken once no other save
    /// or clear is running.
    pub async fn save_with<F>(&self, snapshot: F) -> bool
    where
        F: FnOnce() -> Snapshot,
    {
        let _write = self.write_lock.lock().await;
        let snapshot = snapshot();
        self.write(snapshot.entries()).await
    }

    /// Like [`save_with`](Self::save_with), but an empty snapshot removes the
    /// key instead of writing an empty array.
    pub async fn sync_with<F>(&self, snapshot: F) -> bool
    where
        F: FnOnce() -> Snapshot,
    {
        let _write = self.write_lock.lock().await;
        let snapshot = snapshot();
        if snapshot.is_empty() {
            self.remove().await
        } else {
            self.write(snapshot.entries()).await
        }
    }

    async fn write(&self, entries: &[LogEntry]) -> bool {
        let result = match serde_json::to_string(entries) {
            Ok(serialized) => self.storage.write(&self.key, &serialized).await,
            Err(e) => Err(e.into()),
        };
        self.settle("save", result).is_some()
    }

    /// Returns the persisted sequence, or an empty array if absent or corrupt.
    pub async fn load(&self) -> Value {
        let empty = Value::Array(Vec::new());
        match self.settle("load", self.storage.read(&self.key).await) {
            Some(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!("LOGS | Ignoring corrupt persisted logs: {}", e);
                empty
            }),
            _ => empty,
        }
    }

    /// Removes the persisted buffer. Returns `false` if the removal failed.
    pub async fn clear(&self) -> bool {
        let _write = self.write_lock.lock().await;
        self.remove().await
    }

    async fn remove(&self) -> bool {
        self.settle("clear", self.storage.remove(&self.key).await)
            .is_some()
    }

    fn settle<T>(&self, operation: &str, result: Result<T, PersistenceError>) -> Option<T> {
        match result {
            Ok(value) => {
                if self.failing.swap(false, Ordering::Relaxed) {
                    debug!("LOGS | Persisted logs storage recovered");
                }
                Some(value)
            }
            Err(e) => {
                if self.failing.swap(true, Ordering::Relaxed) {
                    debug!("LOGS | Failed to {} persisted logs: {}", operation, e);
                } else {
                    warn!("LOGS | Failed to {} persisted logs: {}", operation, e);
                }
                None
            }
        }
    }
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("key", &self.key)
            .field("failing", &self.failing.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::buffer::RingBuffer;
    use crate::config::log_level::LogLevel;
    use crate::entry::build;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    /// Storage whose writes and removals fail until `heal` is called.
    #[derive(Default)]
    pub(crate) struct FlakyStorage {
        inner: MemoryStorage,
        broken: AtomicBool,
        pub(crate) writes: AtomicUsize,
    }

    impl FlakyStorage {
        pub(crate) fn broken() -> Self {
            let storage = Self::default();
            storage.broken.store(true, Ordering::SeqCst);
            storage
        }

        pub(crate) fn heal(&self) {
            self.broken.store(false, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), PersistenceError> {
            if self.broken.load(Ordering::SeqCst) {
                Err(std::io::Error::new(ErrorKind::Other, "quota exceeded").into())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.inner.write(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
            self.check()?;
            self.inner.remove(key).await
        }
    }

    fn create_entries(count: usize) -> Vec<LogEntry> {
        (0..count)
            .map(|i| build(LogLevel::Info, format!("entry {i}"), None, None, "o", "a"))
            .collect()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let bridge = PersistenceBridge::new(Arc::new(MemoryStorage::new()));
        let entries = create_entries(3);

        assert!(bridge.save(&entries).await);
        let loaded = bridge.load().await;

        assert_eq!(loaded, serde_json::to_value(&entries).unwrap());
    }

    #[tokio::test]
    async fn test_load_absent_is_empty() {
        let bridge = PersistenceBridge::new(Arc::new(MemoryStorage::new()));
        assert_eq!(bridge.load().await, Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_load_corrupt_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(STORAGE_KEY, "[{not json").await.unwrap();
        let bridge = PersistenceBridge::new(storage);

        assert_eq!(bridge.load().await, Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_clear_removes_key() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::new(storage.clone());
        bridge.save(&create_entries(1)).await;

        assert!(bridge.clear().await);
        assert!(storage.read(STORAGE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_snapshot() {
        let storage = Arc::new(FlakyStorage::default());
        let bridge = PersistenceBridge::new(storage.clone());
        let first = create_entries(2);
        assert!(bridge.save(&first).await);

        storage.broken.store(true, Ordering::SeqCst);
        assert!(!bridge.save(&create_entries(5)).await);

        assert_eq!(bridge.load().await, serde_json::to_value(&first).unwrap());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failure_reported_once() {
        let storage = Arc::new(FlakyStorage::broken());
        let bridge = PersistenceBridge::new(storage.clone());

        for _ in 0..3 {
            assert!(!bridge.save(&create_entries(1)).await);
        }

        logs_assert(|lines: &[&str]| {
            let warnings = lines
                .iter()
                .filter(|line| line.contains("WARN") && line.contains("Failed to save"))
                .count();
            match warnings {
                1 => Ok(()),
                n => Err(format!("expected 1 warning, got {n}")),
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_success_rearms_failure_report() {
        let storage = Arc::new(FlakyStorage::broken());
        let bridge = PersistenceBridge::new(storage.clone());

        bridge.save(&create_entries(1)).await;
        storage.heal();
        bridge.save(&create_entries(1)).await;
        storage.broken.store(true, Ordering::SeqCst);
        bridge.save(&create_entries(1)).await;

        assert!(logs_contain("Persisted logs storage recovered"));
        logs_assert(|lines: &[&str]| {
            let warnings = lines
                .iter()
                .filter(|line| line.contains("WARN") && line.contains("Failed to save"))
                .count();
            match warnings {
                2 => Ok(()),
                n => Err(format!("expected 2 warnings, got {n}")),
            }
        });
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage.read("key").await.unwrap().is_none());
        storage.write("key", "[1]").await.unwrap();
        storage.write("key", "[2]").await.unwrap();
        assert_eq!(storage.read("key").await.unwrap().as_deref(), Some("[2]"));
        let files: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("key.json")]);

        storage.remove("key").await.unwrap();
        storage.remove("key").await.unwrap();
        assert!(storage.read("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_storage_bridge_layout() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = PersistenceBridge::new(Arc::new(FileStorage::new(dir.path())));
        let entries = create_entries(2);

        bridge.save(&entries).await;

        let raw = std::fs::read_to_string(dir.path().join("frontend_logs.json")).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["message"], "entry 0");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_storage_concurrent_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()));

        let writes: Vec<_> = (0..32)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.write("key", &format!("[{i}]")).await })
            })
            .collect();
        for write in writes {
            write.await.unwrap().unwrap();
        }

        let raw = storage.read("key").await.unwrap().unwrap();
        assert!(serde_json::from_str::<Value>(&raw).unwrap().is_array());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_sync_with_empty_snapshot_removes_key() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::new(storage.clone());
        bridge.save(&create_entries(2)).await;

        assert!(bridge.sync_with(|| RingBuffer::default().snapshot()).await);
        assert!(storage.read(STORAGE_KEY).await.unwrap().is_none());

        let mut buffer = RingBuffer::default();
        buffer.append(create_entries(1).remove(0));
        assert!(bridge.sync_with(|| buffer.snapshot()).await);
        assert_eq!(bridge.load().await.as_array().unwrap().len(), 1);
    }
}
