// src/types.rs
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single discovered piece of content. Items are created by a fetcher and
/// never mutated afterwards; duplicate links are allowed (the extraction
/// model may hallucinate duplicates and the pipeline does not deduplicate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Item {
    /// Story or post headline.
    pub headline: String,
    /// A link to the post or story.
    pub link: String,
    /// The date the story or post was published.
    pub date_posted: String,
}

/// The shape the web filter asks the extraction model to fill. Doubles as
/// the machine-checkable schema sent alongside the instruction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Stories {
    /// A list of today's on-topic stories.
    pub stories: Vec<Item>,
}

/// Ordered, append-only accumulation of items for one run. Insertion order
/// is source processing order; the collection is discarded when the run
/// ends. There is deliberately no way to remove or edit an item.
#[derive(Debug, Default)]
pub struct ItemCollection {
    items: Vec<Item>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, batch: Vec<Item>) {
        self.items.extend(batch);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Serialize the whole collection for the curation prompt. The curator
    /// sends everything in one request, never chunked.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Outcome of curation. `succeeded=false` carries a human-readable reason in
/// `text` instead of an error; exactly one draft is produced per run and it
/// is the sole input to delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub succeeded: bool,
    pub text: String,
}

impl Draft {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            text: text.into(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            text: reason.into(),
        }
    }
}
