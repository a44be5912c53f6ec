// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! `tracing` layer recording the process's diagnostic events into the buffer.
//!
//! Events are mapped to levels as follows:
//!
//! | tracing        | entry   |
//! |----------------|---------|
//! | TRACE, DEBUG   | DEBUG   |
//! | INFO           | INFO    |
//! | WARN           | WARN    |
//! | ERROR          | ERROR   |
//!
//! Events emitted by this crate, or by the HTTP stack the exporter runs on,
//! are never recorded: a failing export must not produce entries that are
//! exported in turn.

use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::config::log_level::LogLevel;
use crate::entry::safe_stringify;
use crate::logger::FrontendLogger;

const IGNORED_TARGETS: [&str; 7] = [
    env!("CARGO_CRATE_NAME"),
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "tower",
];

/// Records every event not coming from an ignored target.
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    logger: FrontendLogger,
}

impl CaptureLayer {
    #[must_use]
    pub fn new(logger: FrontendLogger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_ignored(metadata.target()) {
            return;
        }
        let level = map_level(metadata.level());
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let context = (!visitor.fields.is_empty()).then(|| safe_stringify(&visitor.fields));
        self.logger.emit(level, visitor.message, context, None);
    }
}

fn map_level(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE | Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}

/// Whether `target` is one of the ignored crates or one of their modules.
fn is_ignored(target: &str) -> bool {
    IGNORED_TARGETS.iter().any(|ignored| {
        target
            .strip_prefix(ignored)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Splits an event into its `message` and the remaining fields.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.insert(field, value.into());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.insert(field, format!("{value:?}").into());
        }
    }
}
