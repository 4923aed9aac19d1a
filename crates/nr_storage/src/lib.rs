use nr_core::{ArticleProvider, Error, Result};
use std::path::Path;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

/// Build the article provider named by `kind`, seeding it from `seed` when given.
pub async fn create_storage(kind: &str, seed: Option<&Path>) -> Result<Arc<dyn ArticleProvider>> {
    match kind {
        "memory" => {
            let storage = match seed {
                Some(path) => InMemoryStorage::from_json_file(path).await?,
                None => InMemoryStorage::new(),
            };
            if storage.is_empty().await {
                tracing::warn!("Storage is empty, every query will return no articles");
            } else {
                tracing::info!("Loaded {} articles into memory", storage.len().await);
            }
            Ok(Arc::new(storage))
        }
        other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_storage;
}
