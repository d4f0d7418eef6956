//! Structured extraction client: one schema-constrained completion call per
//! request. The schema descriptor is generated from the same Rust type the
//! payload is validated into, so the contract at each call site is the type
//! itself rather than a casually-typed blob.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One chat-completion request with the response constrained to `schema`.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: Option<String>,
    pub schema: Value,
}

/// Low-level backend: does the *real* remote call. Separated from
/// [`StructuredExtractor`] so tests can swap in a fixed payload.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue the call. `Ok(None)` means the service returned no content.
    async fn complete(&self, req: &CompletionRequest) -> Result<Option<String>>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Wraps a backend with schema generation and payload validation.
///
/// `extract` has exactly three outcomes collapsed into two: a parsed value,
/// or `None` for "service returned nothing", "transport failed", and "output
/// did not match the declared shape". `None` is a normal, frequent outcome;
/// callers log and continue. No retry, no parameter tuning: one call, one
/// outcome.
#[derive(Clone)]
pub struct StructuredExtractor {
    backend: Arc<dyn CompletionBackend>,
}

impl StructuredExtractor {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn extract<T>(&self, system: &str, user: Option<&str>) -> Option<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = match serde_json::to_value(schema_for!(T)) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = ?e, "schema descriptor did not serialize");
                return None;
            }
        };
        let req = CompletionRequest {
            system: system.to_string(),
            user: user.map(str::to_string),
            schema,
        };

        let raw = match self.backend.complete(&req).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(backend = self.backend.name(), "completion returned no content");
                counter!("extractions_empty_total").increment(1);
                return None;
            }
            Err(e) => {
                tracing::warn!(error = ?e, backend = self.backend.name(), "completion call failed");
                counter!("extractions_empty_total").increment(1);
                return None;
            }
        };

        match parse_structured::<T>(&raw) {
            Some(value) => Some(value),
            None => {
                tracing::warn!(
                    backend = self.backend.name(),
                    "completion output did not match the declared schema"
                );
                counter!("extractions_empty_total").increment(1);
                None
            }
        }
    }
}

/// Parse a payload that should already be pure JSON. Models occasionally
/// wrap output in markdown fences despite the instruction; strip them before
/// giving up.
fn parse_structured<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(strip_code_fences(raw)).ok()
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Together chat-completions backend. Constrains the response with
/// `response_format: {type: "json_object", schema}`.
pub struct TogetherBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl TogetherBackend {
    pub const DEFAULT_MODEL: &'static str = "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo";
    const DEFAULT_API_BASE: &'static str = "https://api.together.xyz";

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
            model: Self::DEFAULT_MODEL.to_string(),
            api_base: Self::DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the endpoint, for tests.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

#[async_trait]
impl CompletionBackend for TogetherBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<Option<String>> {
        if self.api_key.is_empty() {
            return Ok(None);
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat<'a> {
            #[serde(rename = "type")]
            kind: &'a str,
            schema: &'a Value,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            response_format: ResponseFormat<'a>,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let mut messages = vec![Msg {
            role: "system",
            content: &req.system,
        }];
        if let Some(user) = &req.user {
            messages.push(Msg {
                role: "user",
                content: user,
            });
        }
        let body = Req {
            model: &self.model,
            messages,
            response_format: ResponseFormat {
                kind: "json_object",
                schema: &req.schema,
            },
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("completion request")?
            .error_for_status()
            .context("completion non-2xx")?;

        let parsed: Resp = resp.json().await.context("completion response body")?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty()))
    }

    fn name(&self) -> &'static str {
        "together"
    }
}

/// Backend returning a canned payload; for tests and local runs.
#[derive(Clone, Default)]
pub struct FixedBackend {
    pub payload: Option<String>,
}

impl FixedBackend {
    pub fn returning(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }

    pub fn empty() -> Self {
        Self { payload: None }
    }
}

#[async_trait]
impl CompletionBackend for FixedBackend {
    async fn complete(&self, _req: &CompletionRequest) -> Result<Option<String>> {
        Ok(self.payload.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stories;

    #[test]
    fn fences_are_stripped_before_parsing() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn shape_mismatch_resolves_to_empty() {
        let extractor = StructuredExtractor::new(Arc::new(FixedBackend::returning(
            r#"{"unexpected": "shape"}"#,
        )));
        let out: Option<Stories> = extractor.extract("sys", None).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn unparsable_output_resolves_to_empty() {
        let extractor =
            StructuredExtractor::new(Arc::new(FixedBackend::returning("sorry, no JSON today")));
        let out: Option<Stories> = extractor.extract("sys", None).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn missing_content_resolves_to_empty() {
        let extractor = StructuredExtractor::new(Arc::new(FixedBackend::empty()));
        let out: Option<Stories> = extractor.extract("sys", None).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn fenced_payload_still_parses() {
        let extractor = StructuredExtractor::new(Arc::new(FixedBackend::returning(
            "```json\n{\"stories\":[{\"headline\":\"h\",\"link\":\"l\",\"date_posted\":\"d\"}]}\n```",
        )));
        let out: Stories = extractor.extract("sys", None).await.unwrap();
        assert_eq!(out.stories.len(), 1);
        assert_eq!(out.stories[0].headline, "h");
    }
}
