// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Interception of the process's ambient diagnostics.
//!
//! Everything captured here is routed through the [`FrontendLogger`]:
//! - `tracing` events (and `log` records) through [`CaptureLayer`]
//! - console-style writes through [`instrument_console`]
//! - panics through the hook installed by [`install_panic_hook`]
//! - failed background tasks through [`spawn_monitored`]

pub mod console;
pub mod formatter;
pub mod hooks;
pub mod layer;

pub use console::{instrument_console, Channel, Console};
pub use formatter::Formatter;
pub use hooks::{install_panic_hook, spawn_monitored};
pub use layer::CaptureLayer;

use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::InitError;
use crate::logger::FrontendLogger;

/// Installs the global subscriber (filter, stderr output, capture) and the
/// panic hook.
///
/// Fails if a global subscriber is already installed; the panic hook is not
/// installed in that case.
pub fn init(logger: &FrontendLogger, config: &Config) -> Result<(), InitError> {
    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.capture_filter);
    let filter = EnvFilter::try_new(env_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(Formatter)
                .with_writer(std::io::stderr),
        )
        .with(CaptureLayer::new(logger.clone()))
        .try_init()?;

    install_panic_hook(logger.clone());
    debug!("LOGS | Capture layer installed");
    Ok(())
}
