// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Console-style output channels and their recording adapter.
//!
//! A [`Console`] is a set of five write functions (`log`, `debug`, `info`,
//! `warn`, `error`). [`instrument_console`] wraps an existing console so that
//! each write still reaches the original function, unchanged, and is also
//! recorded as an entry.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use crate::config::log_level::LogLevel;
use crate::logger::FrontendLogger;

/// One output channel of a [`Console`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Log,
    Debug,
    Info,
    Warn,
    Error,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Log,
        Channel::Debug,
        Channel::Info,
        Channel::Warn,
        Channel::Error,
    ];

    /// Level recorded for writes to this channel. `log` records at DEBUG.
    #[must_use]
    pub fn level(self) -> LogLevel {
        match self {
            Channel::Log | Channel::Debug => LogLevel::Debug,
            Channel::Info => LogLevel::Info,
            Channel::Warn => LogLevel::Warn,
            Channel::Error => LogLevel::Error,
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::Log => 0,
            Channel::Debug => 1,
            Channel::Info => 2,
            Channel::Warn => 3,
            Channel::Error => 4,
        }
    }
}

/// A write function for one channel.
pub type Sink = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
pub struct Console {
    sinks: [Sink; 5],
}

impl Console {
    /// Builds a console from one sink per channel.
    pub fn new(mut sink_for: impl FnMut(Channel) -> Sink) -> Self {
        Self {
            sinks: Channel::ALL.map(&mut sink_for),
        }
    }

    /// Writes `log`, `debug` and `info` to stdout, `warn` and `error` to stderr.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(|channel| -> Sink {
            match channel {
                Channel::Log | Channel::Debug | Channel::Info => Arc::new(|message: &str| {
                    let _ = writeln!(io::stdout().lock(), "{message}");
                }),
                Channel::Warn | Channel::Error => Arc::new(|message: &str| {
                    let _ = writeln!(io::stderr().lock(), "{message}");
                }),
            }
        })
    }

    #[must_use]
    pub fn sink(&self, channel: Channel) -> &Sink {
        &self.sinks[channel.index()]
    }

    pub fn write(&self, channel: Channel, message: &str) {
        (self.sink(channel))(message);
    }

    pub fn log(&self, message: &str) {
        self.write(Channel::Log, message);
    }

    pub fn debug(&self, message: &str) {
        self.write(Channel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.write(Channel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.write(Channel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.write(Channel::Error, message);
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Wraps `original` so that every write is forwarded and also recorded.
#[must_use]
pub fn instrument_console(original: Console, logger: FrontendLogger) -> Console {
    Console::new(|channel| {
        let forward = Arc::clone(original.sink(channel));
        let logger = logger.clone();
        let sink: Sink = Arc::new(move |message: &str| {
            forward(message);
            logger.log(channel.level(), message);
        });
        sink
    })
}
