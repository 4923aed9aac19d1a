//! Filtering and ordering of the article corpus for each query mode.
//!
//! Every mode validates its parameters first, then filters the full
//! collection, sorts it with a stable sort (equal keys keep provider order)
//! and keeps the top [`MAX_ARTICLES`].

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use nr_core::geo::{distance_km, is_valid_latitude, is_valid_longitude};
use nr_core::{Article, ArticleProvider, Error, LanguageModel, Result, MAX_ARTICLES};

const TITLE_MATCH_WEIGHT: f64 = 0.5;
const DESCRIPTION_MATCH_WEIGHT: f64 = 0.3;

pub struct Ranker {
    provider: Arc<dyn ArticleProvider>,
    model: Arc<dyn LanguageModel>,
}

impl fmt::Debug for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker")
            .field("provider", &"<dyn ArticleProvider>")
            .field("model", &self.model.name())
            .finish()
    }
}

impl Ranker {
    pub fn new(provider: Arc<dyn ArticleProvider>, model: Arc<dyn LanguageModel>) -> Self {
        Self { provider, model }
    }

    pub async fn by_category(&self, name: &str) -> Result<Vec<Article>> {
        require_text(name, "Category cannot be empty")?;
        Ok(rank_by_category(self.provider.fetch_all().await?, name))
    }

    pub async fn by_score(&self, threshold: f64) -> Result<Vec<Article>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidArgument(
                "Relevance score threshold must be between 0 and 1".to_string(),
            ));
        }
        Ok(rank_by_score(self.provider.fetch_all().await?, threshold))
    }

    pub async fn by_source(&self, name: &str) -> Result<Vec<Article>> {
        require_text(name, "Source name cannot be empty")?;
        Ok(rank_by_source(self.provider.fetch_all().await?, name))
    }

    pub async fn nearby(&self, lat: f64, lon: f64, radius_km: f64) -> Result<Vec<Article>> {
        // written as a negation so NaN is rejected too
        if !(radius_km > 0.0) {
            return Err(Error::InvalidArgument("Radius must be positive".to_string()));
        }
        if !is_valid_latitude(lat) || !is_valid_longitude(lon) {
            return Err(Error::InvalidArgument(
                "Invalid latitude or longitude values".to_string(),
            ));
        }
        Ok(rank_nearby(self.provider.fetch_all().await?, lat, lon, radius_km))
    }

    /// Free-text search. Falls back to the raw query when extraction fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Article>> {
        require_text(query, "Search query cannot be empty")?;
        let terms = match self.model.extract_intent_and_entities(query).await {
            Some(extraction) => {
                tracing::debug!(entities = ?extraction.entities, intent = %extraction.intent, "Extracted search entities");
                extraction.entities
            }
            None => {
                tracing::info!("Entity extraction failed, searching for the raw query");
                vec![query.to_string()]
            }
        };
        Ok(rank_by_text_match(self.provider.fetch_all().await?, &terms))
    }

    /// Natural-language query. No entities means no results.
    pub async fn natural_query(&self, query: &str) -> Result<Vec<Article>> {
        require_text(query, "Query cannot be empty")?;
        let entities = match self.model.extract_intent_and_entities(query).await {
            Some(extraction) if !extraction.entities.is_empty() => extraction.entities,
            _ => {
                tracing::info!("Entity extraction failed or found no entities for query: {}", query);
                return Ok(Vec::new());
            }
        };
        let matching: Vec<Article> = self
            .provider
            .fetch_all()
            .await?
            .into_iter()
            .filter(|article| matches_any(article, &entities))
            .collect();
        Ok(newest_first(matching))
    }
}

fn require_text(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(message.to_string()));
    }
    Ok(())
}

pub fn rank_by_category(articles: Vec<Article>, name: &str) -> Vec<Article> {
    let matching = articles
        .into_iter()
        .filter(|a| a.category.iter().any(|c| c == name))
        .collect();
    newest_first(matching)
}

pub fn rank_by_score(articles: Vec<Article>, threshold: f64) -> Vec<Article> {
    let mut matching: Vec<Article> = articles
        .into_iter()
        .filter(|a| a.relevance_score.map_or(false, |score| score >= threshold))
        .collect();
    matching.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)));
    matching.truncate(MAX_ARTICLES);
    matching
}

pub fn rank_by_source(articles: Vec<Article>, name: &str) -> Vec<Article> {
    let wanted = name.to_lowercase();
    let matching = articles
        .into_iter()
        .filter(|a| a.source_name.to_lowercase() == wanted)
        .collect();
    newest_first(matching)
}

pub fn rank_nearby(articles: Vec<Article>, lat: f64, lon: f64, radius_km: f64) -> Vec<Article> {
    let mut within: Vec<(f64, Article)> = articles
        .into_iter()
        .filter_map(|article| {
            let (a_lat, a_lon) = article.coordinates()?;
            let distance = distance_km(lat, lon, a_lat, a_lon);
            (distance <= radius_km).then_some((distance, article))
        })
        .collect();
    within.sort_by(|a, b| a.0.total_cmp(&b.0));
    within.into_iter().take(MAX_ARTICLES).map(|(_, a)| a).collect()
}

pub fn rank_by_text_match(articles: Vec<Article>, terms: &[String]) -> Vec<Article> {
    let mut scored: Vec<(f64, Article)> = articles
        .into_iter()
        .filter(|article| matches_any(article, terms))
        .map(|article| (text_match_score(&article, terms) + score_of(&article), article))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(MAX_ARTICLES).map(|(_, a)| a).collect()
}

/// True if the title or description mentions any term, ignoring case.
pub fn matches_any(article: &Article, terms: &[String]) -> bool {
    let title = article.title.to_lowercase();
    let description = article.description.as_deref().map(str::to_lowercase);
    terms.iter().any(|term| {
        let term = term.to_lowercase();
        title.contains(&term) || description.as_deref().map_or(false, |d| d.contains(&term))
    })
}

/// +0.5 per term found in the title, +0.3 per term found in the description.
pub fn text_match_score(article: &Article, terms: &[String]) -> f64 {
    let title = article.title.to_lowercase();
    let description = article.description.as_deref().map(str::to_lowercase);
    terms.iter().fold(0.0, |score, term| {
        let term = term.to_lowercase();
        let mut score = score;
        if title.contains(&term) {
            score += TITLE_MATCH_WEIGHT;
        }
        if description.as_deref().map_or(false, |d| d.contains(&term)) {
            score += DESCRIPTION_MATCH_WEIGHT;
        }
        score
    })
}

fn score_of(article: &Article) -> f64 {
    article.relevance_score.unwrap_or(0.0)
}

fn newest_first(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by_cached_key(|a| Reverse(published_key(&a.publication_date)));
    articles.truncate(MAX_ARTICLES);
    articles
}

/// Sort key for publication dates. Unparseable dates order before every
/// parseable one, and among themselves by their raw text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PublishedKey {
    Unparsed(String),
    Parsed(DateTime<Utc>),
}

pub fn published_key(raw: &str) -> PublishedKey {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return PublishedKey::Parsed(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return PublishedKey::Parsed(Utc.from_utc_datetime(&naive));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return PublishedKey::Parsed(Utc.from_utc_datetime(&midnight));
    }
    PublishedKey::Unparsed(raw.to_string())
}
