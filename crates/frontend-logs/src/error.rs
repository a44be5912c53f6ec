// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while building the configuration.
///
/// These are the only errors returned to the host application; everything
/// that fails inside the running pipeline terminates locally.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by a [`Storage`](crate::persistence::Storage) backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode persisted logs: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while delivering a batch to the collector.
///
/// All variants are retryable: the buffer is kept for the next trigger.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collector responded with status {0}")]
    Status(u16),

    #[error("collector panicked: {0}")]
    Panicked(String),
}

/// Errors raised while installing the capture layer.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed: {0}")]
    SubscriberAlreadySet(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid capture filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}
