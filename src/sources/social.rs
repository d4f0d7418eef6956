// src/sources/social.rs
//! Social profile fetcher: one filtered, time-windowed search per source.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use super::SourceFetcher;
use crate::config::SocialConfig;
use crate::types::Item;

const DEFAULT_API_BASE: &str = "https://api.x.com";

pub struct SocialFetcher {
    http: reqwest::Client,
    bearer_token: String,
    config: SocialConfig,
    api_base: String,
}

impl SocialFetcher {
    pub fn new(bearer_token: String, config: SocialConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("trendwire/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            bearer_token,
            config,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the endpoint, for tests.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// `from:<handle>` plus the always-on filters from config.
    fn build_query(&self, handle: &str) -> String {
        let mut query = format!("from:{handle}");
        if self.config.require_media {
            query.push_str(" has:media");
        }
        if self.config.exclude_reshares {
            query.push_str(" -is:retweet");
        }
        if self.config.exclude_replies {
            query.push_str(" -is:reply");
        }
        query
    }

    /// Start of the rolling window: exactly 24 hours before the call, from
    /// wall-clock now, not a persisted last-run mark. Re-running within the
    /// window re-surfaces the same posts; accepted behavior.
    fn window_start() -> String {
        (Utc::now() - chrono::Duration::hours(24)).to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn profile_handle(source: &str) -> Option<&str> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re =
        RE.get_or_init(|| Regex::new(r"(?:x|twitter)\.com/([A-Za-z0-9_]+)").expect("handle regex"));
    re.captures(source).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<Vec<Post>>,
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    result_count: Option<u64>,
}

#[async_trait]
impl SourceFetcher for SocialFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<Item>> {
        let Some(handle) = profile_handle(source) else {
            tracing::warn!(source = %source, "no profile handle in social source");
            return Ok(Vec::new());
        };

        let query = self.build_query(handle);
        let start_time = Self::window_start();
        let max_results = self.config.max_results.to_string();

        let resp = self
            .http
            .get(format!("{}/2/tweets/search/recent", self.api_base))
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query.as_str()),
                ("max_results", max_results.as_str()),
                ("start_time", start_time.as_str()),
            ])
            .send()
            .await
            .context("social search request")?;

        if !resp.status().is_success() {
            bail!("social search for {handle} returned {}", resp.status());
        }
        let body: SearchResponse = resp.json().await.context("social search body")?;

        if body.meta.as_ref().and_then(|m| m.result_count) == Some(0) {
            tracing::info!(handle, "no recent posts in window");
            return Ok(Vec::new());
        }
        let Some(posts) = body.data else {
            tracing::warn!(handle, "search response without a data array");
            return Ok(Vec::new());
        };

        // date_posted is the window start, not each post's own time.
        let items: Vec<Item> = posts
            .into_iter()
            .map(|post| Item {
                headline: post.text,
                link: format!("https://x.com/i/status/{}", post.id),
                date_posted: start_time.clone(),
            })
            .collect();
        tracing::info!(handle, count = items.len(), "posts found");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "social"
    }
}
