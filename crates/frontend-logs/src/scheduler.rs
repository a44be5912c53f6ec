// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Timers and lifecycle signals driving persistence and export.
//!
//! ```text
//!    save timer (T_save) ─────> save
//!    export timer (T_export) ─> spawn export (fire-and-forget)
//!    Hidden ──────────────────> save + spawn export
//!    Shutdown / handles gone ─> save + awaited export, then stop
//! ```
//!
//! The scheduler is an actor: it owns the timers and receives signals from
//! cloneable [`SchedulerHandle`]s. Races between timers and signals are
//! settled by the logger's single in-flight export slot.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::config::Config;
use crate::export::ExportOutcome;
use crate::logger::FrontendLogger;

/// Signals sent from handles to the scheduler.
#[derive(Debug)]
pub enum SchedulerCommand {
    /// The application went to the background.
    Hidden,
    /// The process is about to exit. The sender is notified once the final
    /// save and export have completed.
    Shutdown(oneshot::Sender<ExportOutcome>),
}

#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Requests a save and an export without waiting for them.
    pub fn hidden(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.tx.send(SchedulerCommand::Hidden)
    }

    /// Stops the scheduler after a final save and export, and waits for them.
    pub async fn shutdown(&self) -> Result<ExportOutcome, String> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(SchedulerCommand::Shutdown(response_tx))
            .map_err(|e| format!("Failed to send shutdown command: {e}"))?;

        response_rx
            .await
            .map_err(|e| format!("Failed to receive shutdown response: {e}"))
    }
}

pub struct Scheduler {
    logger: FrontendLogger,
    save_interval: Duration,
    export_interval: Duration,
    rx: mpsc::UnboundedReceiver<SchedulerCommand>,
}

impl Scheduler {
    /// Returns the scheduler (to be spawned) and a handle to signal it.
    #[must_use]
    pub fn new(logger: FrontendLogger, config: &Config) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            logger,
            save_interval: config.save_interval,
            export_interval: config.export_interval,
            rx,
        };
        (scheduler, SchedulerHandle { tx })
    }

    /// Runs until a `Shutdown` command is received or every handle is dropped.
    pub async fn run(mut self) {
        debug!("LOGS | Scheduler started");

        let mut save_interval = interval(self.save_interval);
        save_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        save_interval.tick().await; // discard first tick, which is instantaneous
        let mut export_interval = interval(self.export_interval);
        export_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        export_interval.tick().await;

        loop {
            tokio::select! {
                _ = save_interval.tick() => {
                    self.logger.save().await;
                }
                _ = export_interval.tick() => {
                    self.spawn_export();
                }
                command = self.rx.recv() => match command {
                    Some(SchedulerCommand::Hidden) => {
                        debug!("LOGS | Application hidden, saving and exporting logs");
                        self.logger.save().await;
                        self.spawn_export();
                    }
                    Some(SchedulerCommand::Shutdown(response_tx)) => {
                        let outcome = self.flush().await;
                        if response_tx.send(outcome).is_err() {
                            error!("LOGS | Failed to send shutdown response - receiver dropped");
                        }
                        break;
                    }
                    None => {
                        self.flush().await;
                        break;
                    }
                },
            }
        }

        debug!("LOGS | Scheduler stopped");
    }

    fn spawn_export(&self) {
        let logger = self.logger.clone();
        tokio::spawn(async move {
            logger.export_logs().await;
        });
    }

    async fn flush(&self) -> ExportOutcome {
        debug!("LOGS | Shutting down, flushing logs");
        self.logger.save().await;
        self.logger.export_logs().await
    }
}
