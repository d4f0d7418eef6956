// tests/web_fetcher.rs
//
// Scraper HTTP behavior and the scrape-then-extract path of the web fetcher.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::json;

use trendwire::extract::{FixedBackend, StructuredExtractor};
use trendwire::sources::web::{FirecrawlScraper, PageScraper, WebFetcher};
use trendwire::sources::SourceFetcher;

#[tokio::test]
async fn scraper_returns_markdown_on_success() {
    let server = MockServer::start();
    let scrape = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/scrape")
            .json_body_partial(r#"{"url": "https://blog.example/post", "formats": ["markdown"]}"#);
        then.status(200).json_body(json!({
            "success": true,
            "data": {"markdown": "# Post\nsome content"}
        }));
    });

    let markdown = FirecrawlScraper::new("key".to_string())
        .with_api_base(server.base_url())
        .scrape("https://blog.example/post")
        .await
        .unwrap();

    scrape.assert();
    assert!(markdown.contains("some content"));
}

#[tokio::test]
async fn reported_scrape_failure_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/scrape");
        then.status(200)
            .json_body(json!({"success": false, "error": "blocked by robots"}));
    });

    let result = FirecrawlScraper::new("key".to_string())
        .with_api_base(server.base_url())
        .scrape("https://blog.example/post")
        .await;
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("blocked by robots"));
}

#[tokio::test]
async fn empty_markdown_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/scrape");
        then.status(200)
            .json_body(json!({"success": true, "data": {"markdown": "  "}}));
    });

    let result = FirecrawlScraper::new("key".to_string())
        .with_api_base(server.base_url())
        .scrape("https://blog.example/post")
        .await;
    assert!(result.is_err());
}

struct FailingScraper;

#[async_trait]
impl PageScraper for FailingScraper {
    async fn scrape(&self, _url: &str) -> Result<String> {
        bail!("dns failure");
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn scrape_failure_propagates_as_an_error_for_this_source_only() {
    let fetcher = WebFetcher::new(
        Arc::new(FailingScraper),
        StructuredExtractor::new(Arc::new(FixedBackend::returning(r#"{"stories":[]}"#))),
        "AI and LLM",
    );
    let result = fetcher.fetch("https://blog.example/post").await;
    assert!(result.is_err());
}

struct OkScraper;

#[async_trait]
impl PageScraper for OkScraper {
    async fn scrape(&self, _url: &str) -> Result<String> {
        Ok("# Blog\nA post about models.".to_string())
    }
    fn name(&self) -> &'static str {
        "ok"
    }
}

#[tokio::test]
async fn extracted_stories_flow_through_as_items() {
    let fetcher = WebFetcher::new(
        Arc::new(OkScraper),
        StructuredExtractor::new(Arc::new(FixedBackend::returning(
            r#"{"stories":[
                {"headline":"New model out","link":"https://blog.example/new-model","date_posted":"2026-08-07"},
                {"headline":"Benchmarks","link":"https://blog.example/benchmarks","date_posted":"2026-08-07"}
            ]}"#,
        ))),
        "AI and LLM",
    );

    let items = fetcher.fetch("https://blog.example/post").await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].headline, "New model out");
}

#[tokio::test]
async fn malformed_extraction_output_resolves_to_zero_items() {
    let fetcher = WebFetcher::new(
        Arc::new(OkScraper),
        StructuredExtractor::new(Arc::new(FixedBackend::returning("not json at all"))),
        "AI and LLM",
    );

    let items = fetcher.fetch("https://blog.example/post").await.unwrap();
    assert!(items.is_empty());
}
