// src/api.rs
//! Trigger and admin surface: health, run-now, settings, and the source
//! list. A run failure is never an HTTP error; the trigger returns a coarse
//! success flag plus the report detail.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::{AppConfig, ConfigHandle};
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: ConfigHandle,
    pub pipeline: Arc<Pipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/run", post(run_now))
        .route("/api/settings", get(get_settings).post(update_settings))
        .route("/api/sources", post(add_source).delete(remove_source))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct RunResp {
    success: bool,
    state: &'static str,
    detail: Option<String>,
    delivery: Option<String>,
}

async fn run_now(State(state): State<AppState>) -> Json<RunResp> {
    let report = state.pipeline.run().await;
    Json(RunResp {
        success: report.is_done(),
        state: if report.is_done() { "done" } else { "failed" },
        detail: report.reason,
        delivery: report.delivery_status,
    })
}

async fn get_settings(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.config.snapshot())
}

#[derive(Deserialize)]
struct SettingsReq {
    schedule_interval_mins: Option<u64>,
}

async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<SettingsReq>,
) -> Json<AppConfig> {
    state.config.update(|cfg| {
        if let Some(mins) = body.schedule_interval_mins {
            cfg.schedule_interval_mins = mins.max(1);
        }
    });
    Json(state.config.snapshot())
}

#[derive(Deserialize)]
struct SourceReq {
    identifier: String,
}

#[derive(Serialize)]
struct SourcesResp {
    success: bool,
    sources: Vec<String>,
}

async fn add_source(
    State(state): State<AppState>,
    Json(body): Json<SourceReq>,
) -> Json<SourcesResp> {
    let success = state.config.add_source(body.identifier);
    Json(SourcesResp {
        success,
        sources: state.config.snapshot().sources,
    })
}

async fn remove_source(
    State(state): State<AppState>,
    Json(body): Json<SourceReq>,
) -> Json<SourcesResp> {
    let success = state.config.remove_source(&body.identifier);
    Json(SourcesResp {
        success,
        sources: state.config.snapshot().sources,
    })
}
