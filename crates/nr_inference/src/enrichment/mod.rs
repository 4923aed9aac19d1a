use nr_core::types::{SUMMARY_INVALID_FORMAT, SUMMARY_UNAVAILABLE};
use nr_core::{Article, CancelSignal, LanguageModel, SummaryOutcome};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const UNAVAILABLE_PREFIX: &str = "Summary unavailable";
const MIN_SUMMARY_CHARS: usize = 20;
const FALLBACK_CHARS: usize = 100;

/// How many times to ask for a summary and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Wait after a failed `attempt` (1-based): linear in the attempt number.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(2000),
        }
    }
}

/// Attaches a model-written summary to each surfaced article.
///
/// Summarization trouble never escapes: every article leaves with some
/// summary string, falling back to sentinels or local text.
pub struct Enricher {
    model: Arc<dyn LanguageModel>,
    policy: RetryPolicy,
}

impl fmt::Debug for Enricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enricher")
            .field("model", &self.model.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Enricher {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// Enrich articles one after another, keeping their order.
    pub async fn enrich_all(
        &self,
        mut articles: Vec<Article>,
        cancel: Option<&CancelSignal>,
    ) -> Vec<Article> {
        for article in articles.iter_mut() {
            self.enrich(article, cancel).await;
        }
        articles
    }

    pub async fn enrich(&self, article: &mut Article, cancel: Option<&CancelSignal>) {
        article.llm_summary = SUMMARY_UNAVAILABLE.to_string();

        let Some(text) = article.summarizable_text().map(str::to_owned) else {
            tracing::warn!(article_id = %article.id, "No content to summarize");
            return;
        };

        let mut rate_limited = false;
        for attempt in 1..=self.policy.max_attempts {
            match self.model.summarize(&text).await {
                Ok(Some(SummaryOutcome::ContentRestricted)) => {
                    tracing::warn!(article_id = %article.id, "Summary withheld by content restrictions");
                    article.llm_summary = SummaryOutcome::ContentRestricted.into_text();
                    break;
                }
                Ok(Some(SummaryOutcome::Generated(summary))) if !summary.trim().is_empty() => {
                    if is_plain_summary(&summary) {
                        tracing::debug!(article_id = %article.id, attempt, "Accepted summary");
                        article.llm_summary = summary;
                    } else {
                        tracing::warn!(article_id = %article.id, response = %summary, "Invalid summary format");
                        article.llm_summary = SUMMARY_INVALID_FORMAT.to_string();
                    }
                    break;
                }
                Ok(_) => {
                    tracing::warn!(article_id = %article.id, attempt, "Empty summary response");
                    rate_limited = true;
                    break;
                }
                Err(e) => {
                    rate_limited = e.is_rate_limit();
                    tracing::warn!(
                        article_id = %article.id,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Summary attempt failed"
                    );
                    if attempt == self.policy.max_attempts {
                        article.llm_summary = SUMMARY_UNAVAILABLE.to_string();
                        break;
                    }
                    if !wait(self.policy.backoff(attempt), cancel).await {
                        tracing::warn!(article_id = %article.id, "Retry wait cancelled");
                        article.llm_summary = SUMMARY_UNAVAILABLE.to_string();
                        break;
                    }
                }
            }
        }

        if rate_limited && article.llm_summary.starts_with(UNAVAILABLE_PREFIX) {
            if let Some(fallback) = fallback_summary(article) {
                tracing::info!(article_id = %article.id, "Using local fallback summary");
                article.llm_summary = fallback;
            }
        }
    }
}

/// Sleep for `delay`; false if the signal fired first.
async fn wait(delay: Duration, cancel: Option<&CancelSignal>) -> bool {
    match cancel {
        Some(signal) => tokio::select! {
            biased;
            _ = signal.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

/// Plain prose of a reasonable length, not a JSON echo or an error message.
fn is_plain_summary(summary: &str) -> bool {
    !summary.trim_start().starts_with('{')
        && summary.chars().count() > MIN_SUMMARY_CHARS
        && !summary.to_lowercase().contains("error")
}

fn fallback_summary(article: &Article) -> Option<String> {
    match article.description.as_deref() {
        Some(description) if description.chars().count() > MIN_SUMMARY_CHARS => {
            let head: String = description.chars().take(FALLBACK_CHARS).collect();
            Some(format!("{}...", head))
        }
        _ if !article.title.trim().is_empty() => Some(article.title.clone()),
        _ => None,
    }
}
