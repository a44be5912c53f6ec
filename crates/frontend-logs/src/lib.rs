// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Frontend Logs
//!
//! Client-side log aggregation: diagnostic events are captured into a bounded
//! in-memory buffer, mirrored to durable storage so they survive a restart,
//! and shipped to a remote collector with at-least-once delivery.
//!
//! ## Architecture
//!
//! ```text
//!   application ──> FrontendLogger ──> entry::build ──> RingBuffer
//!                        ^                                  │
//!   capture (tracing,    │                  ┌───────────────┴──────────────┐
//!   console, panics) ────┘                  v                              v
//!                                   PersistenceBridge              Exporter ──> collector
//!                                           ^                              ^
//!                                           └────────── Scheduler ─────────┘
//! ```
//!
//! - [`entry`]: canonical entries and bounded serialization of context values
//! - [`buffer`]: capacity-bounded FIFO store
//! - [`persistence`]: storage backends and the best-effort bridge
//! - [`export`]: collector trait, HTTP collector and the in-flight guard
//! - [`scheduler`]: save/export timers and lifecycle signals
//! - [`logger`]: the public facade
//! - [`capture`]: tracing layer, console adapter, panic and task hooks
//!
//! ## Example
//!
//! ```rust,ignore
//! use frontend_logs::{capture, Config, FrontendLogger, Scheduler};
//!
//! let config = Config::from_env()?;
//! let logger = FrontendLogger::from_config(&config).await;
//! capture::init(&logger, &config)?;
//!
//! let (scheduler, handle) = Scheduler::new(logger.clone(), &config);
//! tokio::spawn(scheduler.run());
//!
//! logger.navigation("app://home", "app://projects");
//! logger.api_response("GET", "/api/projects", 500, None);
//!
//! handle.shutdown().await?;
//! ```

#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod buffer;
pub mod capture;
pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod export;
pub mod logger;
pub mod persistence;
pub mod scheduler;

pub use config::log_level::LogLevel;
pub use config::Config;
pub use entry::{ErrorInfo, LogEntry};
pub use export::{Collector, ExportBatch, ExportOutcome, HttpCollector};
pub use logger::{FrontendLogger, LevelCounts, LogsSummary};
pub use persistence::{FileStorage, MemoryStorage, Storage};
pub use scheduler::{Scheduler, SchedulerHandle};
