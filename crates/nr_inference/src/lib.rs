use std::time::Duration;

pub mod enrichment;
pub mod models;

pub use enrichment::{Enricher, RetryPolicy};
pub use models::create_model;
pub use nr_core::LanguageModel;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Config {
    /// Which model implementation to use: `gemini` or `dummy`.
    pub model_name: String,
    pub api_key: Option<String>,
    /// Overrides the upstream base URL, mostly useful for local testing.
    pub model_url: Option<String>,
    /// Upstream model identifier, e.g. `gemini-1.5-pro-001`.
    pub upstream_model: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Attempts and backoff used when summarizing surfaced articles.
    pub retry_policy: RetryPolicy,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_url", &self.model_url)
            .field("upstream_model", &self.upstream_model)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: "gemini".to_string(),
            api_key: None,
            model_url: None,
            upstream_model: models::gemini::DEFAULT_GEMINI_MODEL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::enrichment::{Enricher, RetryPolicy};
    pub use super::models::create_model;
    pub use nr_core::{Article, EntityExtraction, Error, LanguageModel, Result, SummaryOutcome};
}
