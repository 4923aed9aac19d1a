pub mod ranking;
pub mod service;

pub use ranking::Ranker;
pub use service::NewsService;

pub mod prelude {
    pub use super::service::NewsService;
    pub use nr_core::{Article, ArticleSummary, Error, NewsQuery, QueryResult, Result};
}
