// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Severity levels of buffered entries and the filtering threshold.
//!
//! # Log Levels
//!
//! Four levels, ordered from least to most severe:
//! - **DEBUG**: diagnostic detail (API traffic, component lifecycle, state changes)
//! - **INFO**: normal operation (user actions, navigation) - the default threshold
//! - **WARN**: hazardous situations that may lead to errors
//! - **ERROR**: failures; always recorded regardless of the threshold
//!
//! # Configuration
//!
//! The initial threshold is read from `FRONTEND_LOGS_LEVEL` (case-insensitive).
//! Unknown values fall back to the default with an error on the side channel,
//! so a bad setting never prevents the logger from starting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::error;

/// Severity of a log entry.
///
/// The derived ordering is the filtering order: `Debug < Info < Warn < Error`.
///
/// ```
/// use frontend_logs::config::log_level::LogLevel;
/// use std::str::FromStr;
///
/// assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warn);
/// assert!(LogLevel::Debug < LogLevel::Error);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    /// Lower priority information useful for debugging.
    Debug,
    /// Useful information about normal operation.
    #[default]
    Info,
    /// Hazardous situations that may lead to errors.
    Warn,
    /// Failures. Recorded even when the threshold is above it.
    Error,
}

impl LogLevel {
    /// All levels, least severe first.
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Parses a level, falling back to [`LogLevel::default`] on invalid input.
    ///
    /// The parse failure is reported on the side channel.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match LogLevel::from_str(s) {
            Ok(level) => level,
            Err(e) => {
                error!("LOGS | {e}");
                LogLevel::default()
            }
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warn => 2,
            LogLevel::Error => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Case-insensitive parsing. `warning` is accepted as an alias of `warn`.
impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!(
                "Invalid log level: '{s}'. Valid levels are: debug, info, warn, error",
            )),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_ref())
    }
}

/// Strict deserialization: persisted entries with an unknown level are malformed.
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        LogLevel::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str(" error ").unwrap(), LogLevel::Error);
        assert!(LogLevel::from_str("trace").is_err());
    }

    #[test]
    fn test_parse_lenient_falls_back_to_default() {
        assert_eq!(LogLevel::parse_lenient("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient("warn"), LogLevel::Warn);
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_value(LogLevel::Warn).unwrap(), json!("WARN"));
        let level: LogLevel = serde_json::from_value(json!("error")).unwrap();
        assert_eq!(level, LogLevel::Error);
    }

    #[test]
    fn test_deserialize_rejects_unknown() {
        assert!(serde_json::from_value::<LogLevel>(json!("loud")).is_err());
        assert!(serde_json::from_value::<LogLevel>(json!(3)).is_err());
    }

    #[test]
    fn test_u8_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_u8(level.as_u8()), level);
        }
    }
}
