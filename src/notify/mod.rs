// src/notify/mod.rs
pub mod slack;

pub use slack::SlackWebhook;

use async_trait::async_trait;

/// Outbound delivery of a finished draft. Implementations report the outcome
/// as a human-readable status string and never raise; a failed delivery does
/// not roll back or retry anything upstream.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, text: &str) -> String;
}
