/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/wait.rs
*
* Stabilization buffer observed before any routing object is touched. The wait
* is unconditional and not a readiness probe: it gives the green workload a
* fixed amount of time to warm up.
*
* SPDX-License-Identifier: Apache-2.0 */

use chrono::Utc;
use std::time::Duration;
use tracing::info;

/// Buffer length; saturates instead of overflowing for huge values.
pub fn buffer_duration(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Sleeps for `minutes` minutes, logging a start and a stop marker.
pub async fn wait_for_stabilization(minutes: u64) {
    info!(
        "Starting buffer time of {} minute(s) at {}",
        minutes,
        Utc::now().to_rfc3339()
    );
    if minutes > 0 {
        tokio::time::sleep(buffer_duration(minutes)).await;
    }
    info!(
        "Stopping buffer time of {} minute(s) at {}",
        minutes,
        Utc::now().to_rfc3339()
    );
}
