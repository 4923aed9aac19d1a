pub mod cancel;
pub mod error;
pub mod geo;
pub mod models;
pub mod storage;
pub mod types;

pub use cancel::CancelSignal;
pub use error::Error;
pub use models::LanguageModel;
pub use storage::ArticleProvider;
pub use types::{
    Article, ArticleSummary, EntityExtraction, NewsQuery, QueryResult, SummaryOutcome,
    MAX_ARTICLES,
};

pub type Result<T> = std::result::Result<T, Error>;
