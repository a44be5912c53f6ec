// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The public logging facade.
//!
//! [`FrontendLogger`] is the single logger context of a process. It is cheap
//! to clone; every clone shares the same buffer, threshold, location,
//! persistence bridge and exporter.
//!
//! # Emitting
//!
//! ```text
//!   debug/info/warn/error ──┐
//!   domain emitters ────────┼──> threshold ──> entry::build ──> RingBuffer
//!   capture layer ──────────┘
//! ```
//!
//! Emitters below the threshold are no-ops, except `error` which always
//! records. Emitting never blocks on I/O and never fails.
//!
//! # Locking
//!
//! The buffer sits behind a `std::sync::Mutex`. Critical sections are short
//! and synchronous; the lock is never held across an `.await`. A poisoned
//! lock is recovered, never propagated.

use std::error::Error;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::buffer::RingBuffer;
use crate::config::log_level::LogLevel;
use crate::config::Config;
use crate::entry::{self, safe_stringify, ErrorInfo, LogEntry};
use crate::export::{Collector, ExportBatch, ExportOutcome, Exporter, HttpCollector};
use crate::persistence::{FileStorage, MemoryStorage, PersistenceBridge, Storage};

/// Cloneable handle on the shared logger context.
#[derive(Clone, Debug)]
pub struct FrontendLogger {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    level: AtomicU8,
    buffer: Mutex<RingBuffer>,
    location: RwLock<String>,
    agent_info: String,
    persistence: PersistenceBridge,
    exporter: Exporter,
}

/// Aggregate view of the buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsSummary {
    pub total: usize,
    pub by_level: LevelCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    #[serde(rename = "DEBUG")]
    pub debug: usize,
    #[serde(rename = "INFO")]
    pub info: usize,
    #[serde(rename = "WARN")]
    pub warn: usize,
    #[serde(rename = "ERROR")]
    pub error: usize,
}

impl LevelCounts {
    #[must_use]
    pub fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
        }
    }

    fn increment(&mut self, level: LogLevel) {
        match level {
            LogLevel::Debug => self.debug += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Error => self.error += 1,
        }
    }
}

impl FrontendLogger {
    /// Creates the logger and restores the persisted buffer, trimmed to the
    /// most recent entries.
    pub async fn new(
        config: &Config,
        storage: Arc<dyn Storage>,
        collector: Arc<dyn Collector>,
    ) -> Self {
        let persistence = PersistenceBridge::new(storage);
        let mut buffer = RingBuffer::default();
        let restored = buffer.restore(persistence.load().await);
        if restored > 0 {
            debug!("LOGS | Restored {} persisted entries", restored);
        }

        FrontendLogger {
            inner: Arc::new(Inner {
                level: AtomicU8::new(config.log_level.as_u8()),
                buffer: Mutex::new(buffer),
                location: RwLock::new(config.origin.clone()),
                agent_info: config.agent_info.clone(),
                persistence,
                exporter: Exporter::new(collector),
            }),
        }
    }

    /// Creates the logger with file storage when a storage directory is
    /// configured, in-memory storage otherwise, and the HTTP collector.
    pub async fn from_config(config: &Config) -> Self {
        let storage: Arc<dyn Storage> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        let collector = Arc::new(HttpCollector::new(config));
        Self::new(config, storage, collector).await
    }

    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.level.load(Ordering::Relaxed))
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Whether an entry at `level` would be recorded.
    #[must_use]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level == LogLevel::Error || level >= self.log_level()
    }

    #[must_use]
    pub fn location(&self) -> String {
        self.inner
            .location
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sets the origin recorded on subsequent entries.
    pub fn set_location(&self, location: impl Into<String>) {
        *self
            .inner
            .location
            .write()
            .unwrap_or_else(PoisonError::into_inner) = location.into();
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, message, None, None);
    }

    pub fn log_with<T: Serialize + ?Sized>(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: &T,
    ) {
        if self.is_enabled(level) {
            self.emit(level, message, Some(safe_stringify(context)), None);
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn debug_with<T: Serialize + ?Sized>(&self, message: impl Into<String>, context: &T) {
        self.log_with(LogLevel::Debug, message, context);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn info_with<T: Serialize + ?Sized>(&self, message: impl Into<String>, context: &T) {
        self.log_with(LogLevel::Info, message, context);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn warn_with<T: Serialize + ?Sized>(&self, message: impl Into<String>, context: &T) {
        self.log_with(LogLevel::Warn, message, context);
    }

    /// Records an ERROR entry whatever the threshold.
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn error_with<T: Serialize + ?Sized>(&self, message: impl Into<String>, context: &T) {
        self.log_with(LogLevel::Error, message, context);
    }

    /// Records an ERROR entry carrying `err`'s message, type name and cause chain.
    pub fn error_with_source<E: Error + ?Sized>(&self, message: impl Into<String>, err: &E) {
        self.emit(
            LogLevel::Error,
            message,
            None,
            Some(ErrorInfo::from_error(err)),
        );
    }

    pub fn api_request(&self, method: &str, url: &str, body: Option<&Value>) {
        let method = method.to_uppercase();
        self.debug_with(
            format!("API Request: {method} {url}"),
            &json!({ "method": method, "url": url, "body": body }),
        );
    }

    /// Records an ERROR for a status of 400 and above, DEBUG otherwise.
    pub fn api_response(&self, method: &str, url: &str, status: u16, body: Option<&Value>) {
        let method = method.to_uppercase();
        let level = if status >= 400 {
            LogLevel::Error
        } else {
            LogLevel::Debug
        };
        self.log_with(
            level,
            format!("API Response: {method} {url} - {status}"),
            &json!({ "method": method, "url": url, "status": status, "body": body }),
        );
    }

    pub fn user_action(&self, action: &str, details: Option<&Value>) {
        let message = format!("User Action: {action}");
        match details {
            Some(details) => self.info_with(message, details),
            None => self.info(message),
        }
    }

    /// Records the transition, then makes `to` the origin of later entries.
    pub fn navigation(&self, from: &str, to: &str) {
        self.info_with(
            format!("Navigation: {from} -> {to}"),
            &json!({ "from": from, "to": to }),
        );
        self.set_location(to);
    }

    pub fn component_lifecycle(&self, component: &str, event: &str, props: Option<&Value>) {
        self.debug_with(
            format!("Component {event}: {component}"),
            &json!({ "component": component, "event": event, "props": props }),
        );
    }

    pub fn state_change(
        &self,
        store: &str,
        action: &str,
        prev_state: Option<&Value>,
        next_state: Option<&Value>,
    ) {
        self.debug_with(
            format!("State Change: {store}.{action}"),
            &json!({
                "store": store,
                "action": action,
                "prevState": prev_state,
                "nextState": next_state,
            }),
        );
    }

    /// Returns buffered entries, optionally restricted to one level.
    ///
    /// With a `limit`, the most recent entries come first; without one the
    /// view is chronological.
    #[must_use]
    pub fn get_logs(&self, level: Option<LogLevel>, limit: Option<usize>) -> Vec<LogEntry> {
        let buffer = self.buffer();
        let matches = |entry: &&LogEntry| level.map_or(true, |level| entry.level() == level);
        match limit {
            Some(limit) => buffer.iter().rev().filter(matches).take(limit).cloned().collect(),
            None => buffer.iter().filter(matches).cloned().collect(),
        }
    }

    #[must_use]
    pub fn get_logs_summary(&self) -> LogsSummary {
        let buffer = self.buffer();
        let mut by_level = LevelCounts::default();
        for entry in buffer.iter() {
            by_level.increment(entry.level());
        }
        let oldest = buffer.iter().next().map(|e| e.timestamp().to_string());
        let newest = buffer.iter().next_back().map(|e| e.timestamp().to_string());
        LogsSummary {
            total: buffer.len(),
            by_level,
            oldest,
            newest,
        }
    }

    /// Persists the current buffer. Returns `false` if the write failed.
    pub async fn save(&self) -> bool {
        self.inner
            .persistence
            .save_with(|| self.buffer().snapshot())
            .await
    }

    /// Ships the buffer to the collector.
    ///
    /// On success the exported entries are removed from the buffer and the
    /// persisted copy is updated to what remains. On failure nothing changes.
    /// A call made while another export is in flight returns
    /// [`ExportOutcome::Skipped`] without contacting the collector.
    pub async fn export_logs(&self) -> ExportOutcome {
        let Some(_guard) = self.inner.exporter.try_begin() else {
            debug!("LOGS | Export already in flight, skipping");
            return ExportOutcome::Skipped;
        };

        let snapshot = self.buffer().snapshot();
        if snapshot.is_empty() {
            return ExportOutcome::Empty;
        }
        let batch = ExportBatch::new(snapshot);

        if let Err(e) = self.inner.exporter.deliver(&batch).await {
            warn!(
                "LOGS | Failed to export {} entries, keeping them for the next attempt: {}",
                batch.len(),
                e
            );
            return ExportOutcome::Failed;
        }

        self.inner
            .persistence
            .sync_with(|| {
                let mut buffer = self.buffer();
                buffer.clear_through(batch.logs());
                buffer.snapshot()
            })
            .await;
        debug!("LOGS | Exported {} entries", batch.len());
        ExportOutcome::Delivered(batch.len())
    }

    /// Empties the buffer and removes the persisted copy.
    pub async fn clear_logs(&self) {
        self.buffer().clear();
        self.inner.persistence.clear().await;
    }

    pub(crate) fn emit(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: Option<String>,
        error: Option<ErrorInfo>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        let entry = self.build(level, message.into(), context, error, self.location());
        self.buffer().append(entry);
    }

    /// Records an ERROR entry without ever waiting on a lock.
    ///
    /// Returns `false` if the buffer was busy and the entry was dropped.
    pub(crate) fn try_emit_error(&self, message: String, error: ErrorInfo) -> bool {
        let location = match self.inner.location.try_read() {
            Ok(location) => location.clone(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().clone(),
            Err(TryLockError::WouldBlock) => String::new(),
        };
        let entry = self.build(LogLevel::Error, message, None, Some(error), location);
        match self.inner.buffer.try_lock() {
            Ok(mut buffer) => {
                buffer.append(entry);
                true
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().append(entry);
                true
            }
            Err(TryLockError::WouldBlock) => false,
        }
    }

    fn build(
        &self,
        level: LogLevel,
        message: String,
        context: Option<String>,
        error: Option<ErrorInfo>,
        origin: String,
    ) -> LogEntry {
        entry::build(level, message, context, error, &origin, &self.inner.agent_info)
    }

    fn buffer(&self) -> MutexGuard<'_, RingBuffer> {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
