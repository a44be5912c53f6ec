// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use frontend_logs::{capture, Config, FrontendLogger, LogLevel, MemoryStorage};
use frontend_logs::export::HttpCollector;
use std::sync::Arc;

// Installs the global subscriber, so this binary holds a single test.
#[tokio::test]
async fn init_captures_ambient_events_once() {
    let config = Config {
        log_level: LogLevel::Debug,
        capture_filter: "debug".to_string(),
        ..Default::default()
    };
    let logger = FrontendLogger::new(
        &config,
        Arc::new(MemoryStorage::new()),
        Arc::new(HttpCollector::new(&config)),
    )
    .await;

    capture::init(&logger, &config).expect("failed to install capture layer");

    tracing::info!(target: "app::dashboard", widgets = 3, "Dashboard rendered");
    tracing::debug!(target: "hyper::proto", "parsed response headers");

    let logs = logger.get_logs(None, None);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].message(), "Dashboard rendered");
    assert_eq!(logs[0].level(), LogLevel::Info);

    assert!(capture::init(&logger, &config).is_err());
}
