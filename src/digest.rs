// src/digest.rs
//! Draft curation: one extraction call over the whole collection, then a
//! pure rendering step.

use chrono::Local;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::StructuredExtractor;
use crate::types::{Draft, ItemCollection};

/// What the model returns when asked to pick the most interesting items.
/// Wire names are kept as the draft model knows them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DraftSelections {
    #[serde(rename = "interestingTweets")]
    pub interesting_tweets: Vec<Selection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Selection {
    /// The direct link to the selected post or story.
    pub tweet_link: String,
    /// One sentence on what makes it interesting.
    pub description: String,
}

pub struct Curator {
    extractor: StructuredExtractor,
    topic: String,
}

impl Curator {
    pub fn new(extractor: StructuredExtractor, topic: impl Into<String>) -> Self {
        Self {
            extractor,
            topic: topic.into(),
        }
    }

    /// Produce the run's draft. An empty collection short-circuits without
    /// touching the extraction client; an empty extraction becomes a failed
    /// draft, never an error.
    pub async fn curate(&self, items: &ItemCollection) -> Draft {
        if items.is_empty() {
            return Draft::failure("No items found to process");
        }

        let raw = items.to_json();
        tracing::info!(items = items.len(), bytes = raw.len(), "curating draft");

        let topic = &self.topic;
        let system = format!(
            "You are given a list of raw {topic} items sourced from social posts and web \
             pages. Only respond in valid JSON that matches the provided schema, with no \
             extra keys."
        );
        let user = format!(
            "Your task is to find interesting trends, launches, or interesting examples in \
             the items. For each pick, provide a 'tweet_link' and a one-sentence \
             'description'. Return all relevant picks as separate objects. Aim to pick at \
             least 10 items unless there are fewer than 10 available; if there are fewer, \
             return all of them. Here are the raw items you can pick from:\n\n{raw}"
        );

        match self
            .extractor
            .extract::<DraftSelections>(&system, Some(&user))
            .await
        {
            Some(selections) => {
                let date = Local::now().format("%-m/%-d").to_string();
                Draft::success(render(topic, &date, &selections))
            }
            None => Draft::failure("No output from the draft model"),
        }
    }
}

/// Render the curated selections into the outgoing digest text. Pure: the
/// same selections render to byte-identical text, in model order — the
/// curator never re-sorts.
pub fn render(topic: &str, date: &str, selections: &DraftSelections) -> String {
    let header = format!("🚀 {topic} Trends for {date}");
    let bullets = selections
        .interesting_tweets
        .iter()
        .map(|s| format!("• {}\n  {}", s.description, s.tweet_link))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{header}\n\n{bullets}")
}
