use async_trait::async_trait;
use nr_core::{Article, ArticleProvider, Error, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { articles: Vec::new() }
    }

    pub fn store_article(&mut self, article: Article) {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.id == article.id) {
            *existing = article;
        } else {
            self.articles.push(article);
        }
    }

    pub fn fetch_all(&self) -> Vec<Article> {
        self.articles.clone()
    }

    pub fn fetch_by_id(&self, id: &str) -> Option<Article> {
        self.articles.iter().find(|a| a.id == id).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Article corpus held in memory, loaded once and read by every request.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: impl IntoIterator<Item = Article>) -> Self {
        let mut store = MemoryStore::new();
        for article in articles {
            store.store_article(with_id(article));
        }
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Parse a JSON array of articles. Records without an id get a fresh one.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let articles: Vec<Article> = serde_json::from_str(json)?;
        Ok(Self::with_articles(articles))
    }

    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Storage(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let storage = Self::from_json_str(&json)?;
        tracing::debug!("Seeded storage from {}", path.display());
        Ok(storage)
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.articles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn with_id(mut article: Article) -> Article {
    if article.id.trim().is_empty() {
        article.id = uuid::Uuid::new_v4().to_string();
    }
    article
}

#[async_trait]
impl ArticleProvider for InMemoryStorage {
    async fn fetch_all(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.fetch_all())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.fetch_by_id(id))
    }
}
