// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Global handlers for panics and failed background tasks.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write as _;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use tokio::task::JoinHandle;

use crate::config::log_level::LogLevel;
use crate::entry::{panic_message, ErrorInfo};
use crate::logger::FrontendLogger;

const PANIC_ERROR_NAME: &str = "Panic";

/// Chains a hook recording every panic as an ERROR entry before running the
/// previously installed hook.
///
/// The hook never waits for the buffer: if it is locked (for instance by the
/// panicking thread itself) the entry is dropped.
pub fn install_panic_hook(logger: FrontendLogger) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());

        let mut stack = String::new();
        if let Some(location) = info.location() {
            let _ = writeln!(
                stack,
                "at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(stack, "{backtrace}");
        }
        let stack = (!stack.is_empty()).then(|| stack.trim_end().to_string());

        logger.try_emit_error(
            format!("Uncaught panic: {message}"),
            ErrorInfo::new(PANIC_ERROR_NAME, message, stack),
        );
        previous(info);
    }));
}

/// Spawns `future`, recording an `Err` or a panic as an ERROR entry.
///
/// The failure is never propagated: the handle resolves to `None` instead.
pub fn spawn_monitored<F, T, E>(logger: FrontendLogger, future: F) -> JoinHandle<Option<T>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Error + Send + 'static,
{
    tokio::spawn(async move {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                logger.error_with_source(format!("Unhandled rejection: {e}"), &e);
                None
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                logger.emit(
                    LogLevel::Error,
                    format!("Unhandled rejection: {message}"),
                    None,
                    Some(ErrorInfo::new(PANIC_ERROR_NAME, message, None)),
                );
                None
            }
        }
    })
}
