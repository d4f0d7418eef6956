//! Trendwire — binary entrypoint.
//! Boots tracing, loads config and credentials, wires the pipeline with
//! concrete clients, spawns the scheduler, and serves the Axum surface.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trendwire::api::{self, AppState};
use trendwire::config::{ConfigHandle, Credentials, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use trendwire::digest::Curator;
use trendwire::extract::{StructuredExtractor, TogetherBackend};
use trendwire::metrics::Metrics;
use trendwire::notify::SlackWebhook;
use trendwire::pipeline::Pipeline;
use trendwire::scheduler;
use trendwire::sources::social::SocialFetcher;
use trendwire::sources::web::{FirecrawlScraper, WebFetcher};
use trendwire::sources::Dispatcher;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trendwire=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// All clients are constructed here and passed in; no process-wide
/// singletons, so every component is testable with stand-ins.
fn build_pipeline(config: &ConfigHandle, creds: &Credentials) -> Pipeline {
    let snapshot = config.snapshot();

    let backend = Arc::new(TogetherBackend::new(creds.together_api_key.clone()));

    let social = Arc::new(SocialFetcher::new(
        creds.x_bearer_token.clone(),
        snapshot.social.clone(),
    ));
    let scraper = Arc::new(FirecrawlScraper::new(creds.firecrawl_api_key.clone()));
    let web = Arc::new(WebFetcher::new(
        scraper,
        StructuredExtractor::new(backend.clone()),
        snapshot.topic.clone(),
    ));

    let dispatcher = Dispatcher::new(social, web);
    let curator = Curator::new(StructuredExtractor::new(backend), snapshot.topic);
    let delivery = Arc::new(SlackWebhook::new(creds.webhook_url.clone()));

    Pipeline::new(Arc::new(config.clone()), dispatcher, curator, delivery)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config_path =
        std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ConfigHandle::load(&config_path);
    let creds = Credentials::from_env();

    let metrics = Metrics::init();
    let pipeline = Arc::new(build_pipeline(&config, &creds));

    // Initial collection on boot, then on the configured interval.
    let _boot_run = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            let report = pipeline.run().await;
            tracing::info!(
                state = ?report.state,
                reason = ?report.reason,
                "initial trend collection finished"
            );
        })
    };
    let _scheduler = scheduler::spawn_scheduler(pipeline.clone(), config.clone());

    let router = api::create_router(AppState { config, pipeline }).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding 0.0.0.0:{port}"))?;
    tracing::info!(port, "serving trigger and admin surface");
    axum::serve(listener, router).await.context("serving")?;
    Ok(())
}
