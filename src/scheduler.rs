// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::ConfigHandle;
use crate::pipeline::Pipeline;

/// Spawn the recurring trigger. The interval is re-read from config before
/// each sleep so admin updates apply without a restart. The pipeline's own
/// overlap guard handles a tick racing a manual trigger.
pub fn spawn_scheduler(pipeline: Arc<Pipeline>, config: ConfigHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let mins = config.snapshot().schedule_interval_mins.max(1);
            tokio::time::sleep(Duration::from_secs(mins * 60)).await;

            tracing::info!("scheduled trend collection starting");
            let report = pipeline.run().await;
            tracing::info!(
                state = ?report.state,
                reason = ?report.reason,
                items = report.items,
                "scheduled trend collection finished"
            );
        }
    })
}
