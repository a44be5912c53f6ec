// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use frontend_logs::{
    capture::{self, instrument_console, Channel, Console},
    Config, FrontendLogger, Scheduler, SchedulerHandle,
};

#[tokio::main]
pub async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FRONTEND_LOGS | ERROR | {e}");
            std::process::exit(1);
        }
    };

    let logger = FrontendLogger::from_config(&config).await;
    if let Err(e) = capture::init(&logger, &config) {
        eprintln!("FRONTEND_LOGS | ERROR | {e}");
    }

    let (scheduler, handle) = Scheduler::new(logger.clone(), &config);
    let scheduler_task = tokio::spawn(scheduler.run());

    let cancel_token = CancellationToken::new();
    tokio::spawn(watch_signals(handle.clone(), cancel_token.clone()));

    info!(
        "Relaying stdin to {} (save every {:?}, export every {:?})",
        config.collector_url, config.save_interval, config.export_interval
    );
    let console = instrument_console(Console::stdio(), logger);
    relay(BufReader::new(tokio::io::stdin()), &console, &cancel_token).await;

    match handle.shutdown().await {
        Ok(outcome) => debug!("Final export: {outcome:?}"),
        Err(e) => error!("{e}"),
    }
    if let Err(e) = scheduler_task.await {
        error!("Scheduler task failed: {e}");
    }
}

/// Writes every line of `input` to `console` until EOF or cancellation.
async fn relay<R>(input: R, console: &Console, cancel_token: &CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => console.write(channel_for(&line), &line),
                Ok(None) => {
                    debug!("Input closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {e}");
                    break;
                }
            },
        }
    }
}

/// Picks the channel from a leading level word, `log` otherwise.
fn channel_for(line: &str) -> Channel {
    let word: String = line
        .trim_start()
        .chars()
        .skip_while(|c| *c == '[')
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    match word.to_ascii_uppercase().as_str() {
        "ERROR" | "FATAL" => Channel::Error,
        "WARN" | "WARNING" => Channel::Warn,
        "INFO" => Channel::Info,
        "DEBUG" | "TRACE" => Channel::Debug,
        _ => Channel::Log,
    }
}

/// Cancels on SIGINT or SIGTERM. SIGUSR1 is treated as the app going to
/// the background.
async fn watch_signals(handle: SchedulerHandle, cancel_token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (Ok(mut sigterm), Ok(mut sigusr1)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::user_defined1()),
        ) else {
            error!("Failed to register signal handlers");
            return;
        };
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = sigterm.recv() => break,
                _ = sigusr1.recv() => {
                    if let Err(e) = handle.hidden() {
                        error!("Failed to signal scheduler: {e}");
                    }
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = &handle;
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {e}");
        }
    }

    info!("Shutdown signal received");
    cancel_token.cancel();
}
