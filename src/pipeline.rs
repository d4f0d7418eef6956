// src/pipeline.rs
//! The run orchestrator: FETCH_SOURCES → RUN_DISPATCH → CURATE → DELIVER →
//! DONE, with FAILED(reason) absorbing from any stage. Both terminal states
//! mean "the run finished" — nothing below ever escapes as an error or
//! panic to the trigger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metrics::counter;

use crate::config::SourceStore;
use crate::digest::Curator;
use crate::notify::Delivery;
use crate::sources::Dispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Done,
    Failed,
}

/// What one run reports back to its trigger.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub reason: Option<String>,
    pub items: usize,
    pub delivery_status: Option<String>,
}

impl RunReport {
    fn failed(reason: &str) -> Self {
        Self {
            state: RunState::Failed,
            reason: Some(reason.to_string()),
            items: 0,
            delivery_status: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == RunState::Done
    }
}

pub struct Pipeline {
    store: Arc<dyn SourceStore>,
    dispatcher: Dispatcher,
    curator: Curator,
    delivery: Arc<dyn Delivery>,
    in_flight: AtomicBool,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn SourceStore>,
        dispatcher: Dispatcher,
        curator: Curator,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            curator,
            delivery,
            in_flight: AtomicBool::new(false),
        }
    }

    /// One complete run. Always returns a report.
    ///
    /// The scheduler and the manual trigger can race; a trigger arriving
    /// while a run is active is rejected instead of starting a second run.
    pub async fn run(&self) -> RunReport {
        crate::metrics::describe_metrics();

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("pipeline trigger ignored: run already in progress");
            return RunReport::failed("run already in progress");
        }

        let report = self.run_inner().await;

        self.in_flight.store(false, Ordering::SeqCst);
        counter!("pipeline_runs_total").increment(1);
        if !report.is_done() {
            counter!("pipeline_failed_total").increment(1);
        }
        report
    }

    async fn run_inner(&self) -> RunReport {
        let sources = self.store.sources().await;
        if sources.is_empty() {
            tracing::warn!("run failed: no sources");
            return RunReport::failed("no sources");
        }
        tracing::info!(sources = sources.len(), "dispatching sources");

        let items = self.dispatcher.run(&sources).await;
        if items.is_empty() {
            tracing::warn!("run failed: no items");
            return RunReport::failed("no items");
        }
        tracing::info!(items = items.len(), "items aggregated, curating");

        let draft = self.curator.curate(&items).await;
        if !draft.succeeded {
            tracing::warn!(reason = %draft.text, "run failed: draft generation failed");
            return RunReport {
                state: RunState::Failed,
                reason: Some("draft generation failed".to_string()),
                items: items.len(),
                delivery_status: None,
            };
        }

        // Delivery failure is logged and reported, not fatal to completion.
        let status = self.delivery.deliver(&draft.text).await;
        tracing::info!(status = %status, "delivery finished");

        RunReport {
            state: RunState::Done,
            reason: None,
            items: items.len(),
            delivery_status: Some(status),
        }
    }
}
