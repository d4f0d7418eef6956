// src/metrics.rs
use axum::{routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn describe_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "pipeline_runs_total",
            "Completed pipeline runs, done or failed."
        );
        describe_counter!(
            "pipeline_failed_total",
            "Runs that ended in the failed state."
        );
        describe_counter!("sources_items_total", "Items contributed by sources.");
        describe_counter!(
            "sources_failed_total",
            "Sources that errored and contributed zero items."
        );
        describe_counter!(
            "extractions_empty_total",
            "Structured extractions that resolved to empty."
        );
        describe_counter!(
            "deliveries_failed_total",
            "Webhook deliveries that reported failure."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder. Call once, before the first run.
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");
        describe_metrics();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
