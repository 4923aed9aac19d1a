use async_trait::async_trait;
use crate::types::Article;
use crate::Result;

#[async_trait]
pub trait ArticleProvider: Send + Sync {
    /// Snapshot of every article, in a stable order between calls.
    async fn fetch_all(&self) -> Result<Vec<Article>>;

    /// Look up a single article by its id
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Article>>;
}
