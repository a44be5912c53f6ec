// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Configuration of the frontend log pipeline, read from environment variables.

pub mod log_level;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_EXPORT_INTERVAL, DEFAULT_SAVE_INTERVAL};
use crate::error::ConfigError;
use log_level::LogLevel;

const DEFAULT_COLLECTOR_URL: &str = "http://localhost:8000";
const DEFAULT_ORIGIN: &str = "app://";
const DEFAULT_CAPTURE_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the collector; the intake path is appended to it
    pub collector_url: String,
    /// Initial threshold of the level-gated emitters
    pub log_level: LogLevel,
    /// Directory holding the persisted buffer. `None` keeps it in memory only
    pub storage_dir: Option<PathBuf>,
    /// how often the buffer is persisted (`T_save`)
    pub save_interval: Duration,
    /// how often the buffer is exported (`T_export`)
    pub export_interval: Duration,
    /// Location recorded as the origin of entries until the first navigation
    pub origin: String,
    /// Client description attached to every entry
    pub agent_info: String,
    /// `EnvFilter` directive selecting which ambient tracing events are captured
    pub capture_filter: String,
    pub https_proxy: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            log_level: LogLevel::default(),
            storage_dir: None,
            save_interval: DEFAULT_SAVE_INTERVAL,
            export_interval: DEFAULT_EXPORT_INTERVAL,
            origin: DEFAULT_ORIGIN.to_string(),
            agent_info: default_agent_info(),
            capture_filter: DEFAULT_CAPTURE_FILTER.to_string(),
            https_proxy: None,
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let collector_url = env::var("FRONTEND_LOGS_COLLECTOR_URL")
            .map(|url| url.trim().to_string())
            .unwrap_or(defaults.collector_url);
        let log_level = env::var("FRONTEND_LOGS_LEVEL")
            .map(|val| LogLevel::parse_lenient(&val))
            .unwrap_or(defaults.log_level);
        let storage_dir = env::var("FRONTEND_LOGS_STORAGE_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        let save_interval =
            secs_from_env("FRONTEND_LOGS_SAVE_INTERVAL_SECS")?.unwrap_or(defaults.save_interval);
        let export_interval = secs_from_env("FRONTEND_LOGS_EXPORT_INTERVAL_SECS")?
            .unwrap_or(defaults.export_interval);
        let origin = env::var("FRONTEND_LOGS_ORIGIN").unwrap_or(defaults.origin);
        let agent_info = env::var("FRONTEND_LOGS_AGENT_INFO").unwrap_or(defaults.agent_info);
        let capture_filter =
            env::var("FRONTEND_LOGS_CAPTURE_FILTER").unwrap_or(defaults.capture_filter);
        let https_proxy = env::var("FRONTEND_LOGS_HTTPS_PROXY")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();

        let config = Self {
            collector_url,
            log_level,
            storage_dir,
            save_interval,
            export_interval,
            origin,
            agent_info,
            capture_filter,
            https_proxy,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collector_url.is_empty() {
            return Err(ConfigError::Invalid(
                "collector URL cannot be empty".to_string(),
            ));
        }
        if !(self.collector_url.starts_with("http://") || self.collector_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "collector URL '{}' must start with http:// or https://",
                self.collector_url
            )));
        }
        if self.save_interval.is_zero() || self.export_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "save and export intervals must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn secs_from_env(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

fn default_agent_info() -> String {
    format!(
        "{}/{} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env::consts::OS,
        env::consts::ARCH
    )
}
