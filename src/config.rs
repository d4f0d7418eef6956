// src/config.rs
//! Run configuration: the source list, topic, schedule, and social search
//! filters live in a JSON file; credentials come from the environment only.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::{env, fs};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "trendwire.json";
pub const ENV_CONFIG_PATH: &str = "TRENDWIRE_CONFIG_PATH";

fn default_topic() -> String {
    "AI and LLM".to_string()
}
fn default_interval_mins() -> u64 {
    // One collection per day.
    24 * 60
}
fn default_max_results() -> u32 {
    10
}
fn default_true() -> bool {
    true
}

/// Social search behavior. The three filters are always-on configuration,
/// not per-call options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_true")]
    pub require_media: bool,
    #[serde(default = "default_true")]
    pub exclude_reshares: bool,
    #[serde(default = "default_true")]
    pub exclude_replies: bool,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            require_media: true,
            exclude_reshares: true,
            exclude_replies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Ordered list of source identifiers: social profile URLs or page URLs.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Minutes between scheduled runs.
    #[serde(default = "default_interval_mins")]
    pub schedule_interval_mins: u64,
    #[serde(default)]
    pub social: SocialConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            sources: Vec::new(),
            schedule_interval_mins: default_interval_mins(),
            social: SocialConfig::default(),
        }
    }
}

impl AppConfig {
    /// Missing or unreadable file falls back to defaults. A file that exists
    /// but does not parse also falls back, with a warning, so a config typo
    /// degrades to an idle service instead of a crash loop.
    pub fn load_or_default(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = ?e, path = %path.display(), "config file did not parse; using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

/// Secrets resolved from the environment (`.env` in development). Empty
/// values disable the corresponding client rather than failing startup.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub x_bearer_token: String,
    pub together_api_key: String,
    pub firecrawl_api_key: String,
    pub webhook_url: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            x_bearer_token: env::var("X_API_BEARER_TOKEN").unwrap_or_default(),
            together_api_key: env::var("TOGETHER_API_KEY").unwrap_or_default(),
            firecrawl_api_key: env::var("FIRECRAWL_API_KEY").unwrap_or_default(),
            webhook_url: env::var("SLACK_WEBHOOK_URL").ok(),
        }
    }
}

/// Yields the ordered source list at run start. The pipeline depends on this
/// trait, not on the concrete store, so tests inject stand-ins.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn sources(&self) -> Vec<String>;
}

/// Shared, editable view of [`AppConfig`], optionally persisted back to the
/// JSON file it was loaded from. The admin surface edits through this handle.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
    path: Option<PathBuf>,
}

impl ConfigHandle {
    /// In-memory handle, nothing persisted. Used by tests.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
            path: None,
        }
    }

    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = AppConfig::load_or_default(&path);
        Self {
            inner: Arc::new(RwLock::new(config)),
            path: Some(path),
        }
    }

    pub fn snapshot(&self) -> AppConfig {
        self.inner.read().expect("config lock poisoned").clone()
    }

    pub fn update<F: FnOnce(&mut AppConfig)>(&self, apply: F) {
        {
            let mut guard = self.inner.write().expect("config lock poisoned");
            apply(&mut guard);
        }
        self.persist();
    }

    /// Append a source identifier; duplicates are rejected.
    pub fn add_source(&self, identifier: String) -> bool {
        let added = {
            let mut guard = self.inner.write().expect("config lock poisoned");
            if guard.sources.iter().any(|s| s == &identifier) {
                false
            } else {
                guard.sources.push(identifier);
                true
            }
        };
        if added {
            self.persist();
        }
        added
    }

    pub fn remove_source(&self, identifier: &str) -> bool {
        let removed = {
            let mut guard = self.inner.write().expect("config lock poisoned");
            let before = guard.sources.len();
            guard.sources.retain(|s| s != identifier);
            guard.sources.len() != before
        };
        if removed {
            self.persist();
        }
        removed
    }

    /// Best-effort write-back; a failed save is logged, not fatal.
    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".to_string());
        if let Err(e) = fs::write(path, json) {
            tracing::warn!(error = ?e, path = %path.display(), "failed to persist config");
        }
    }
}

#[async_trait]
impl SourceStore for ConfigHandle {
    async fn sources(&self) -> Vec<String> {
        self.inner.read().expect("config lock poisoned").sources.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_all_filters_on() {
        let cfg = AppConfig::default();
        assert!(cfg.social.require_media);
        assert!(cfg.social.exclude_reshares);
        assert!(cfg.social.exclude_replies);
        assert_eq!(cfg.social.max_results, 10);
        assert!(cfg.sources.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_or_default(std::path::Path::new("does/not/exist.json"));
        assert_eq!(cfg.topic, "AI and LLM");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"sources": ["https://x.com/acct_a"]}"#).unwrap();
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.schedule_interval_mins, 24 * 60);
        assert!(cfg.social.require_media);
    }

    #[test]
    fn add_source_rejects_duplicates() {
        let handle = ConfigHandle::new(AppConfig::default());
        assert!(handle.add_source("https://x.com/acct_a".to_string()));
        assert!(!handle.add_source("https://x.com/acct_a".to_string()));
        assert_eq!(handle.snapshot().sources.len(), 1);
    }

    #[test]
    fn edits_persist_back_to_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trendwire.json");
        std::fs::write(&path, r#"{"sources": []}"#).unwrap();

        let handle = ConfigHandle::load(&path);
        assert!(handle.add_source("https://x.com/acct_a".to_string()));

        let reloaded = AppConfig::load_or_default(&path);
        assert_eq!(reloaded.sources, vec!["https://x.com/acct_a".to_string()]);
    }

    #[test]
    fn remove_source_by_identifier() {
        let handle = ConfigHandle::new(AppConfig {
            sources: vec!["a".to_string(), "b".to_string()],
            ..AppConfig::default()
        });
        assert!(handle.remove_source("a"));
        assert!(!handle.remove_source("a"));
        assert_eq!(handle.snapshot().sources, vec!["b".to_string()]);
    }
}
