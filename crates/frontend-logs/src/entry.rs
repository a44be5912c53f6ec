// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Canonical log entries and size-bounded serialization of context values.
//!
//! Every entry that reaches the buffer is built here. Building never fails:
//! context values that cannot be serialized degrade to a placeholder naming
//! their type, and oversized values are truncated with [`TRUNCATION_MARKER`].
//!
//! # Output Format
//!
//! Entries serialize with camelCase keys; absent optional fields are omitted:
//! ```json
//! {
//!   "timestamp": "2025-03-01T10:15:30.123Z",
//!   "level": "ERROR",
//!   "message": "API Response: GET /api/projects - 500",
//!   "context": "{\n  \"status\": 500\n}",
//!   "origin": "app://projects",
//!   "agentInfo": "frontend-logs/0.1.0 (linux; x86_64)"
//! }
//! ```

use std::any::{type_name, Any};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::log_level::LogLevel;
use crate::constants::{MAX_OBJECT_CONTEXT_CHARS, MAX_STRING_CONTEXT_CHARS, TRUNCATION_MARKER};

/// One normalized diagnostic record.
///
/// Fields are private: an entry cannot be changed once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    timestamp: String,
    level: LogLevel,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
    origin: String,
    agent_info: String,
}

impl LogEntry {
    /// ISO-8601 timestamp with millisecond precision, in UTC.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn agent_info(&self) -> &str {
        &self.agent_info
    }
}

/// Detached description of an error: no reference to the original value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub name: String,
}

impl ErrorInfo {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            stack,
            name: name.into(),
        }
    }

    /// Captures `message`, `name` and a textual stack from any error.
    ///
    /// The stack lists the `source()` chain, one cause per line, followed by
    /// a backtrace when backtraces are enabled (`RUST_BACKTRACE`).
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let mut stack = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = writeln!(stack, "caused by: {cause}");
            source = cause.source();
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(stack, "{backtrace}");
        }

        Self {
            message: err.to_string(),
            stack: (!stack.is_empty()).then(|| stack.trim_end().to_string()),
            name: short_type_name(type_name::<E>()),
        }
    }
}

/// Builds an entry stamped with the current time.
///
/// `context` is expected to come from [`safe_stringify`]; `agent_info` is
/// bounded with the string context limit.
#[must_use]
pub fn build(
    level: LogLevel,
    message: impl Into<String>,
    context: Option<String>,
    error: Option<ErrorInfo>,
    origin: &str,
    agent_info: &str,
) -> LogEntry {
    LogEntry {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        message: message.into(),
        context,
        error,
        origin: origin.to_string(),
        agent_info: truncate(agent_info, MAX_STRING_CONTEXT_CHARS),
    }
}

/// Renders an arbitrary value as bounded, readable text. Never fails.
///
/// - `null` (including `None` and `()`) renders as `"null"`
/// - strings are kept verbatim up to [`MAX_STRING_CONTEXT_CHARS`]
/// - anything else is pretty-printed JSON up to [`MAX_OBJECT_CONTEXT_CHARS`]
/// - a value that fails to serialize renders as `[unserializable <type>]`
pub fn safe_stringify<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::Null) => "null".to_string(),
        Ok(Value::String(s)) => truncate(&s, MAX_STRING_CONTEXT_CHARS),
        Ok(other) => serde_json::to_string_pretty(&other)
            .map(|text| truncate(&text, MAX_OBJECT_CONTEXT_CHARS))
            .unwrap_or_else(|_| unserializable::<T>()),
        Err(_) => unserializable::<T>(),
    }
}

/// Truncates `value` to `limit` characters and appends [`TRUNCATION_MARKER`].
///
/// Truncating an already truncated value keeps the same prefix and marker, so
/// truncating twice is the same as truncating once.
#[must_use]
pub fn truncate(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(limit).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Text of a panic payload (`&str` or `String`), or a generic description.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn unserializable<T: ?Sized>() -> String {
    format!("[unserializable {}]", short_type_name(type_name::<T>()))
}

/// Strips module paths from every segment of a type name:
/// `std::collections::HashMap<alloc::string::String, u8>` becomes `HashMap<String, u8>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
        } else {
            short.push_str(segment.rsplit("::").next().unwrap_or_default());
            segment.clear();
            short.push(c);
        }
    }
    short.push_str(segment.rsplit("::").next().unwrap_or_default());
    short
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn entry(context: Option<String>) -> LogEntry {
        build(
            LogLevel::Info,
            "message",
            context,
            None,
            "app://home",
            "agent",
        )
    }

    #[test]
    fn test_null_renders_literal() {
        assert_eq!(safe_stringify(&Value::Null), "null");
        assert_eq!(safe_stringify(&None::<u32>), "null");
        assert_eq!(safe_stringify(&()), "null");
    }

    #[test]
    fn test_short_string_kept_verbatim() {
        assert_eq!(safe_stringify("hello"), "hello");
    }

    #[test]
    fn test_long_string_truncated() {
        let context = "x".repeat(2000);
        let rendered = safe_stringify(&context);

        assert_eq!(rendered.chars().count(), 500 + TRUNCATION_MARKER.len());
        assert!(rendered.starts_with(&"x".repeat(500)));
        assert!(rendered.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let once = safe_stringify(&"y".repeat(2000));
        let twice = safe_stringify(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_marker_shaped_input_truncates_like_any_other() {
        let raw = format!("{}...", "z".repeat(500));

        let stored = safe_stringify(&raw);

        assert_eq!(stored, format!("{}...", "z".repeat(500)));
        let marked = format!("{}...", "w".repeat(501));
        assert_eq!(truncate(&marked, 500), format!("{}...", "w".repeat(500)));
    }

    #[test]
    fn test_truncate_counts_characters() {
        let context = "é".repeat(600);
        let rendered = truncate(&context, 500);
        assert_eq!(rendered.chars().count(), 503);
    }

    #[test]
    fn test_object_pretty_printed() {
        let rendered = safe_stringify(&json!({"status": 500}));
        assert_eq!(rendered, "{\n  \"status\": 500\n}");
    }

    #[test]
    fn test_large_object_truncated_at_1000() {
        let items: Vec<String> = (0..500).map(|i| format!("item-{i}")).collect();
        let rendered = safe_stringify(&items);

        assert_eq!(rendered.chars().count(), 1000 + TRUNCATION_MARKER.len());
        assert!(rendered.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_unserializable_degrades_to_placeholder() {
        let mut map: HashMap<(u8, u8), u8> = HashMap::new();
        map.insert((1, 2), 3);

        let rendered = safe_stringify(&map);
        assert!(rendered.starts_with("[unserializable HashMap<(u8, u8), u8"));
        assert!(rendered.ends_with(']'));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(
            short_type_name("std::collections::hash::map::HashMap<alloc::string::String, u8>"),
            "HashMap<String, u8>"
        );
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("u32"), "u32");
    }

    #[test]
    fn test_error_info_from_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let info = ErrorInfo::from_error(&err);

        assert_eq!(info.message, "missing file");
        assert_eq!(info.name, "Error");
    }

    #[test]
    fn test_error_info_captures_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("request failed")]
        struct RequestFailed(#[source] std::io::Error);

        let err = RequestFailed(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "socket timed out",
        ));
        let info = ErrorInfo::from_error(&err);

        assert_eq!(info.name, "RequestFailed");
        assert!(info
            .stack
            .unwrap()
            .starts_with("caused by: socket timed out"));
    }

    #[test]
    fn test_build_sets_fields() {
        let entry = entry(Some("ctx".to_string()));

        assert_eq!(entry.level(), LogLevel::Info);
        assert_eq!(entry.message(), "message");
        assert_eq!(entry.context(), Some("ctx"));
        assert_eq!(entry.origin(), "app://home");
        assert_eq!(entry.agent_info(), "agent");
        assert!(entry.timestamp().ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(entry.timestamp()).is_ok());
    }

    #[test]
    fn test_build_bounds_agent_info() {
        let agent = "a".repeat(800);
        let entry = build(LogLevel::Debug, "m", None, None, "o", &agent);
        assert_eq!(entry.agent_info().chars().count(), 503);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(entry(None)).unwrap();

        assert_eq!(value["level"], "INFO");
        assert_eq!(value["agentInfo"], "agent");
        assert!(value.get("context").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_deserialize_persisted_entry() {
        let raw = json!({
            "timestamp": "2025-03-01T10:15:30.123Z",
            "level": "WARN",
            "message": "slow response",
            "origin": "app://projects",
            "agentInfo": "agent",
            "error": {"message": "boom", "name": "TypeError"}
        });
        let entry: LogEntry = serde_json::from_value(raw).unwrap();

        assert_eq!(entry.level(), LogLevel::Warn);
        assert_eq!(entry.error().unwrap().name, "TypeError");
        assert!(entry.error().unwrap().stack.is_none());
    }
}
