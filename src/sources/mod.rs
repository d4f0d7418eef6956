// src/sources/mod.rs
pub mod social;
pub mod web;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::types::{Item, ItemCollection};

/// Where a configured source identifier gets routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Social,
    Web,
}

/// Classification is a pure string match on the identifier; no network call.
pub fn classify(source: &str) -> SourceKind {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|//|\.)(?:x|twitter)\.com(?:/|$)").expect("social host regex")
    });
    if re.is_match(source) {
        SourceKind::Social
    } else {
        SourceKind::Web
    }
}

/// One kind of source fetch. Errors are the caller's problem; the dispatcher
/// isolates them per source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<Item>>;
    fn name(&self) -> &'static str;
}

/// Routes each source to the matching fetcher and folds the results into one
/// collection.
pub struct Dispatcher {
    social: Arc<dyn SourceFetcher>,
    web: Arc<dyn SourceFetcher>,
}

impl Dispatcher {
    pub fn new(social: Arc<dyn SourceFetcher>, web: Arc<dyn SourceFetcher>) -> Self {
        Self { social, web }
    }

    /// Visit sources strictly in the order received, one in-flight fetch at
    /// a time, so append order stays deterministic. Each source produces a
    /// `Result`; an `Err` is logged, counted, and contributes zero items —
    /// it never aborts the sweep.
    pub async fn run(&self, sources: &[String]) -> ItemCollection {
        let mut collection = ItemCollection::new();
        for source in sources {
            let fetcher = match classify(source) {
                SourceKind::Social => self.social.as_ref(),
                SourceKind::Web => self.web.as_ref(),
            };
            match fetcher.fetch(source).await {
                Ok(items) => {
                    tracing::info!(
                        source = %source,
                        fetcher = fetcher.name(),
                        count = items.len(),
                        "source fetched"
                    );
                    counter!("sources_items_total").increment(items.len() as u64);
                    collection.append(items);
                }
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        source = %source,
                        fetcher = fetcher.name(),
                        "source failed, contributing zero items"
                    );
                    counter!("sources_failed_total").increment(1);
                }
            }
        }
        collection
    }
}
