use std::fmt;
use std::sync::Arc;
use nr_core::types::{SUMMARY_NOT_AVAILABLE, SUMMARY_UNAVAILABLE};
use nr_core::{
    ArticleProvider, ArticleSummary, CancelSignal, Error, LanguageModel, NewsQuery, QueryResult,
    Result,
};
use nr_inference::{Enricher, RetryPolicy};
use crate::ranking::Ranker;

/// Entry point for every query mode: rank, enrich, wrap.
pub struct NewsService {
    provider: Arc<dyn ArticleProvider>,
    ranker: Ranker,
    enricher: Enricher,
}

impl fmt::Debug for NewsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsService")
            .field("ranker", &self.ranker)
            .field("enricher", &self.enricher)
            .finish()
    }
}

impl NewsService {
    pub fn new(provider: Arc<dyn ArticleProvider>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            ranker: Ranker::new(provider.clone(), model.clone()),
            enricher: Enricher::new(model),
            provider,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.enricher = self.enricher.with_policy(policy);
        self
    }

    pub async fn execute(&self, query: NewsQuery, cancel: Option<&CancelSignal>) -> Result<QueryResult> {
        let ranked = match &query {
            NewsQuery::Category(name) => self.ranker.by_category(name).await?,
            NewsQuery::Score(threshold) => self.ranker.by_score(*threshold).await?,
            NewsQuery::Search(text) => self.ranker.search(text).await?,
            NewsQuery::Source(name) => self.ranker.by_source(name).await?,
            NewsQuery::Nearby { lat, lon, radius_km } => {
                self.ranker.nearby(*lat, *lon, *radius_km).await?
            }
            NewsQuery::Natural(text) => self.ranker.natural_query(text).await?,
        };
        tracing::info!(query = %query, matched = ranked.len(), "Ranked articles");

        let enriched = self.enricher.enrich_all(ranked, cancel).await;
        Ok(QueryResult::new(query.descriptor(), enriched))
    }

    pub async fn by_category(&self, name: &str) -> Result<QueryResult> {
        self.execute(NewsQuery::Category(name.to_string()), None).await
    }

    pub async fn by_score(&self, threshold: f64) -> Result<QueryResult> {
        self.execute(NewsQuery::Score(threshold), None).await
    }

    pub async fn search(&self, query: &str) -> Result<QueryResult> {
        self.execute(NewsQuery::Search(query.to_string()), None).await
    }

    pub async fn by_source(&self, name: &str) -> Result<QueryResult> {
        self.execute(NewsQuery::Source(name.to_string()), None).await
    }

    pub async fn nearby(&self, lat: f64, lon: f64, radius_km: f64) -> Result<QueryResult> {
        self.execute(NewsQuery::Nearby { lat, lon, radius_km }, None).await
    }

    pub async fn natural_query(&self, query: &str) -> Result<QueryResult> {
        self.execute(NewsQuery::Natural(query.to_string()), None).await
    }

    /// Summarize one article by id, asking the model exactly once.
    pub async fn summary_by_id(&self, id: &str) -> Result<ArticleSummary> {
        let article = self
            .provider
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No article with id {}", id)))?;

        let llm_summary = match article.summarizable_text() {
            None => SUMMARY_UNAVAILABLE.to_string(),
            Some(text) => match self.enricher.model().summarize(text).await {
                Ok(Some(outcome)) if !outcome.text().trim().is_empty() => outcome.into_text(),
                Ok(_) => {
                    tracing::warn!(article_id = %id, "No summary returned");
                    SUMMARY_NOT_AVAILABLE.to_string()
                }
                Err(e) => {
                    tracing::warn!(article_id = %id, error = %e, "Summary failed");
                    SUMMARY_NOT_AVAILABLE.to_string()
                }
            },
        };

        Ok(ArticleSummary {
            id: id.to_string(),
            llm_summary,
        })
    }
}
