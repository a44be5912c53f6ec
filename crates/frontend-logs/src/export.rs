// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of buffer snapshots to the remote collector.
//!
//! # Wire Contract
//!
//! ```text
//! POST {collector_url}/api/v1/logs/frontend
//! Content-Type: application/json
//!
//! { "logs": [LogEntry...], "timestamp": "<ISO-8601>", "source": "frontend" }
//! ```
//!
//! Any 2xx status acknowledges the batch. Every other outcome (transport
//! error, non-2xx status, panic inside the collector) is retryable and leaves
//! the buffer untouched.
//!
//! # Re-entrancy
//!
//! At most one export is in flight. [`Exporter::try_begin`] hands out a guard
//! that releases the slot when dropped, including on panic or cancellation.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, error};

use crate::buffer::Snapshot;
use crate::config::Config;
use crate::constants::{COLLECTOR_PATH, EXPORT_SOURCE};
use crate::entry::panic_message;
use crate::error::ExportError;

/// A snapshot tagged with its export time and source.
#[derive(Debug, Clone, Serialize)]
pub struct ExportBatch {
    logs: Snapshot,
    timestamp: String,
    source: &'static str,
}

impl ExportBatch {
    #[must_use]
    pub fn new(logs: Snapshot) -> Self {
        Self {
            logs,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source: EXPORT_SOURCE,
        }
    }

    #[must_use]
    pub fn logs(&self) -> &Snapshot {
        &self.logs
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Remote endpoint accepting batches.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Sends one batch. `Ok` means the collector acknowledged it.
    async fn send(&self, batch: &ExportBatch) -> Result<(), ExportError>;
}

/// Collector reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: reqwest::Client,
    url: String,
}

impl HttpCollector {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let client = match build_client(config.https_proxy.as_deref()) {
            Ok(client) => client,
            Err(e) => {
                error!(
                    "LOGS | Unable to parse proxy configuration: {}, falling back to direct connection",
                    e
                );
                reqwest::Client::new()
            }
        };
        Self {
            client,
            url: intake_url(&config.collector_url),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn send(&self, batch: &ExportBatch) -> Result<(), ExportError> {
        let resp = self.client.post(&self.url).json(batch).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ExportError::Status(status.as_u16()))
        }
    }
}

fn build_client(https_proxy: Option<&str>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    builder.build()
}

fn intake_url(collector_url: &str) -> String {
    format!("{}{}", collector_url.trim_end_matches('/'), COLLECTOR_PATH)
}

/// Result of one export trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The collector acknowledged this many entries; they were cleared.
    Delivered(usize),
    /// Nothing to send; no request was made.
    Empty,
    /// Another export was in flight.
    Skipped,
    /// Delivery failed; the buffer was kept for the next trigger.
    Failed,
}

impl ExportOutcome {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, ExportOutcome::Delivered(_))
    }
}

/// Owns the collector and the single in-flight slot.
pub struct Exporter {
    collector: Arc<dyn Collector>,
    in_flight: AtomicBool,
}

impl Exporter {
    #[must_use]
    pub fn new(collector: Arc<dyn Collector>) -> Self {
        Self {
            collector,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Claims the in-flight slot, or returns `None` if an export is running.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: &self.in_flight,
            })
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Sends `batch`, turning a panic inside the collector into an error.
    pub async fn deliver(&self, batch: &ExportBatch) -> Result<(), ExportError> {
        debug!("LOGS | Sending {} entries to collector", batch.len());
        match AssertUnwindSafe(self.collector.send(batch))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(ExportError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("in_flight", &self.is_in_flight())
            .finish_non_exhaustive()
    }
}

/// Releases the in-flight slot on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
