use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of articles returned by any query.
pub const MAX_ARTICLES: usize = 5;

pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";
pub const SUMMARY_INVALID_FORMAT: &str = "Summary unavailable (invalid format).";
pub const SUMMARY_RESTRICTED: &str = "Summary not available due to content restrictions.";
pub const SUMMARY_NOT_AVAILABLE: &str = "Summary not available.";

fn default_summary() -> String {
    SUMMARY_UNAVAILABLE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "llmSummary", default = "default_summary")]
    pub llm_summary: String,
}

impl Article {
    /// Both coordinates, or nothing if either one is missing.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Description if it has any content, otherwise the title.
    ///
    /// Returns `None` when neither carries text worth summarizing.
    pub fn summarizable_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| Some(self.title.as_str()).filter(|t| !t.trim().is_empty()))
    }
}

/// Ranked, enriched articles plus the descriptor of the query that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub articles: Vec<Article>,
    pub query: String,
    pub total_results: usize,
}

impl QueryResult {
    pub fn new(query: impl Into<String>, mut articles: Vec<Article>) -> Self {
        articles.truncate(MAX_ARTICLES);
        Self {
            total_results: articles.len(),
            articles,
            query: query.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Key terms and intent pulled out of a free-text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityExtraction {
    pub entities: Vec<String>,
    pub intent: String,
}

/// A summarize call that reached the model and got an answer back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    /// The upstream refused to answer on safety grounds.
    ContentRestricted,
}

impl SummaryOutcome {
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Generated(text) => text,
            SummaryOutcome::ContentRestricted => SUMMARY_RESTRICTED,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            SummaryOutcome::Generated(text) => text,
            SummaryOutcome::ContentRestricted => SUMMARY_RESTRICTED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    #[serde(rename = "llmSummary")]
    pub llm_summary: String,
}

/// One request against the corpus, by mode.
#[derive(Debug, Clone, PartialEq)]
pub enum NewsQuery {
    Category(String),
    Score(f64),
    Search(String),
    Source(String),
    Nearby { lat: f64, lon: f64, radius_km: f64 },
    Natural(String),
}

impl NewsQuery {
    /// Label echoed back to the caller alongside the results.
    pub fn descriptor(&self) -> String {
        match self {
            NewsQuery::Category(name) => format!("category:{}", name),
            NewsQuery::Score(threshold) => format!("score:{}", threshold),
            NewsQuery::Search(query) | NewsQuery::Natural(query) => query.clone(),
            NewsQuery::Source(name) => format!("source:{}", name),
            NewsQuery::Nearby { lat, lon, radius_km } => {
                format!("nearby:lat={},lon={},radius={}", lat, lon, radius_km)
            }
        }
    }
}

impl fmt::Display for NewsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}
