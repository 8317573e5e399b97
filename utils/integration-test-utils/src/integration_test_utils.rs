/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing_subscriber::EnvFilter;

/// Upper bound for anything a test waits on.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Installs a fmt subscriber honoring `RUST_LOG` once per test binary.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Polls `condition` until it holds or `limit` elapses; returns the final outcome.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Next item of `stream`, or `None` when it ends or `limit` elapses first.
pub async fn next_within<S>(stream: &mut S, limit: Duration) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    timeout(limit, stream.next()).await.ok().flatten()
}

/// Panics if `stream` yields anything within `window`.
pub async fn assert_silent_for<S>(stream: &mut S, window: Duration)
where
    S: Stream + Unpin,
    S::Item: std::fmt::Debug,
{
    if let Ok(Some(item)) = timeout(window, stream.next()).await {
        panic!("expected no item within {window:?}, got {item:?}");
    }
}
