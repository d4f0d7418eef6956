// src/sources/web.rs
//! Generic page fetcher: scrape the page as markdown, then ask the
//! extraction model for today's on-topic items.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::SourceFetcher;
use crate::extract::StructuredExtractor;
use crate::types::{Item, Stories};

/// Retrieves a page as normalized markdown-like text. A retrieval failure or
/// empty-content result is an error for the one source being fetched.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

const DEFAULT_API_BASE: &str = "https://api.firecrawl.dev";

pub struct FirecrawlScraper {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl FirecrawlScraper {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("trendwire/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the endpoint, for tests.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

#[async_trait]
impl PageScraper for FirecrawlScraper {
    async fn scrape(&self, url: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            url: &'a str,
            formats: [&'a str; 1],
        }
        #[derive(Deserialize)]
        struct Resp {
            success: bool,
            error: Option<String>,
            data: Option<RespData>,
        }
        #[derive(Deserialize)]
        struct RespData {
            markdown: Option<String>,
        }

        let resp = self
            .http
            .post(format!("{}/v1/scrape", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&Req {
                url,
                formats: ["markdown"],
            })
            .send()
            .await
            .context("scrape request")?
            .error_for_status()
            .context("scrape non-2xx")?;

        let body: Resp = resp.json().await.context("scrape response body")?;
        if !body.success {
            bail!(
                "scrape failed: {}",
                body.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        match body
            .data
            .and_then(|d| d.markdown)
            .filter(|md| !md.trim().is_empty())
        {
            Some(markdown) => Ok(markdown),
            None => bail!("scrape returned no markdown content"),
        }
    }

    fn name(&self) -> &'static str {
        "firecrawl"
    }
}

pub struct WebFetcher {
    scraper: Arc<dyn PageScraper>,
    extractor: StructuredExtractor,
    topic: String,
}

impl WebFetcher {
    pub fn new(
        scraper: Arc<dyn PageScraper>,
        extractor: StructuredExtractor,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            scraper,
            extractor,
            topic: topic.into(),
        }
    }

    /// The current date is computed once per call and embedded in the text,
    /// so the model scopes to "today" rather than an arbitrary date.
    fn filter_instruction(&self, source: &str, markdown: &str) -> String {
        let today = Local::now().format("%-m/%-d/%Y");
        let topic = &self.topic;
        format!(
            "Today is {today}. Return only today's {topic} story or post headlines and links \
             in JSON from the scraped content below. They must be posted today. The source \
             link is {source}. If a story or post link is not absolute, prepend {source} to \
             make it absolute. If there are no {topic} stories from today, return \
             {{\"stories\": []}}. Return only pure JSON matching the schema, with no extra \
             text and no markdown fences.\n\nScraped content:\n\n{markdown}"
        )
    }
}

#[async_trait]
impl SourceFetcher for WebFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<Item>> {
        let markdown = self
            .scraper
            .scrape(source)
            .await
            .with_context(|| format!("retrieving {source}"))?;
        tracing::debug!(source = %source, bytes = markdown.len(), "page scraped, filtering");

        // An empty extraction is a normal outcome here: the page may simply
        // have nothing on-topic from today.
        let instruction = self.filter_instruction(source, &markdown);
        match self.extractor.extract::<Stories>(&instruction, None).await {
            Some(stories) => {
                tracing::info!(source = %source, count = stories.stories.len(), "stories extracted");
                Ok(stories.stories)
            }
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        "web"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FixedBackend;

    struct StaticScraper(&'static str);

    #[async_trait]
    impl PageScraper for StaticScraper {
        async fn scrape(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
        fn name(&self) -> &'static str {
            "static"
        }
    }

    fn fetcher_with(payload: FixedBackend) -> WebFetcher {
        WebFetcher::new(
            Arc::new(StaticScraper("# Some blog\ncontent")),
            StructuredExtractor::new(Arc::new(payload)),
            "AI and LLM",
        )
    }

    #[test]
    fn instruction_embeds_date_topic_and_source() {
        let fetcher = fetcher_with(FixedBackend::empty());
        let instruction = fetcher.filter_instruction("https://blog.example/post", "body");
        let today = Local::now().format("%-m/%-d/%Y").to_string();
        assert!(instruction.contains(&today));
        assert!(instruction.contains("AI and LLM"));
        assert!(instruction.contains("https://blog.example/post"));
        assert!(instruction.contains("body"));
    }

    #[tokio::test]
    async fn empty_extraction_is_zero_items_not_an_error() {
        let fetcher = fetcher_with(FixedBackend::empty());
        let items = fetcher.fetch("https://blog.example/post").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn extracted_stories_become_items() {
        let fetcher = fetcher_with(FixedBackend::returning(
            r#"{"stories":[{"headline":"h","link":"https://blog.example/h","date_posted":"2026-08-07"}]}"#,
        ));
        let items = fetcher.fetch("https://blog.example/post").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://blog.example/h");
    }
}
