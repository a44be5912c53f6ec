// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Capacity, truncation and scheduling limits for the frontend log pipeline.
//!
//! # Capacity Policy
//!
//! The live buffer and the restore path use two different limits:
//! - **Live cap**: the buffer never holds more than [`MAX_BUFFERED_ENTRIES`]
//! - **Restore trim**: a cold start keeps only the newest [`RESTORED_ENTRIES`]
//!
//! The asymmetry is intentional: a restored buffer leaves headroom for the
//! entries produced by the new process before eviction kicks in.

use std::time::Duration;

/// Hard capacity of the live buffer.
///
/// Appending to a full buffer evicts the oldest entry first.
pub const MAX_BUFFERED_ENTRIES: usize = 1000;

/// Number of entries kept when restoring a persisted buffer at cold start.
///
/// The most recent entries win; their relative order is preserved.
pub const RESTORED_ENTRIES: usize = 500;

/// Maximum characters kept from a string context value.
pub const MAX_STRING_CONTEXT_CHARS: usize = 500;

/// Maximum characters kept from a serialized structured context value.
pub const MAX_OBJECT_CONTEXT_CHARS: usize = 1000;

/// Marker appended to every truncated value.
pub const TRUNCATION_MARKER: &str = "...";

/// Default period of the persistence timer (`T_save`).
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Default period of the export timer (`T_export`).
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Path of the collector intake, appended to the configured base URL.
pub const COLLECTOR_PATH: &str = "/api/v1/logs/frontend";

/// Source identifier attached to every exported batch.
pub const EXPORT_SOURCE: &str = "frontend";

/// Durable storage key holding the serialized buffer.
pub const STORAGE_KEY: &str = "frontend_logs";
